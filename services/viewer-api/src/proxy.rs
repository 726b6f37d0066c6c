//! Render proxy.
//!
//! Loads a fresh map description for every request, applies the global
//! extent and connection overrides, and lets the engine render it with the
//! request's parameters forwarded untouched.

use std::time::Instant;

use bytes::Bytes;
use map_common::ViewerResult;
use ows_protocol::RenderRequest;
use tracing::{info, warn};

use crate::config::ViewerSettings;
use crate::engine::MapEngine;
use crate::metrics;

/// Engine output and the content type to serve it with.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub content_type: String,
    pub body: Bytes,
}

pub struct RenderProxy<'a> {
    settings: &'a ViewerSettings,
    engine: &'a dyn MapEngine,
}

impl<'a> RenderProxy<'a> {
    pub fn new(settings: &'a ViewerSettings, engine: &'a dyn MapEngine) -> Self {
        Self { settings, engine }
    }

    pub async fn handle(&self, request: &RenderRequest) -> ViewerResult<RenderOutput> {
        let identifier = request.map_identifier()?;
        let kind = request.kind()?;
        let content_type = request.content_type(kind)?.to_string();

        let mut document = self.engine.load(identifier).await?;
        if let Some(extent) = self.settings.extent_override {
            document.set_extent(extent);
        }
        if let Some(connection) = &self.settings.connection_override {
            document.set_layer_connection(connection.clone());
        }

        let started = Instant::now();
        let rendered = self.engine.render(&document, request, kind).await;
        metrics::record_render(started.elapsed(), rendered.is_ok());

        match rendered {
            Ok(body) => {
                info!(
                    request = %kind,
                    layers = request.layers.as_deref().unwrap_or(""),
                    bytes = body.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Rendered"
                );
                Ok(RenderOutput { content_type, body })
            }
            Err(e) => {
                warn!(request = %kind, error = %e, "Render failed");
                Err(e.into())
            }
        }
    }
}
