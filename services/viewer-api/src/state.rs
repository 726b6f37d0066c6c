//! Application state and shared resources.

use std::sync::Arc;

use map_common::ViewerResult;

use crate::config::ViewerSettings;
use crate::engine::MapEngine;
use crate::template::ViewerTemplates;

/// Shared application state.
///
/// Built once at startup and never mutated; map descriptions are loaded
/// fresh for every request.
pub struct AppState {
    pub settings: ViewerSettings,
    pub engine: Arc<dyn MapEngine>,
    pub templates: ViewerTemplates,
}

impl AppState {
    pub fn new(settings: ViewerSettings, engine: Arc<dyn MapEngine>) -> ViewerResult<Self> {
        Ok(Self {
            settings,
            engine,
            templates: ViewerTemplates::new()?,
        })
    }
}
