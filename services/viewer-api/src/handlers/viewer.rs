//! Viewer page handler.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use map_common::ViewerResult;
use tracing::{error, instrument};

use super::common::error_response;
use crate::state::AppState;
use crate::viewer_config::{self, RenderEndpoint, ViewerOverrides};

#[instrument(skip(state))]
pub async fn viewer_handler(state: Arc<AppState>) -> Response {
    match render_viewer(&state).await {
        Ok(html) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Failed to build viewer page");
            let settings = &state.settings;
            error_response(&e, &[settings.mapfile.as_path(), settings.static_dir.as_path()])
        }
    }
}

/// Load the configured mapfile and render the viewer page for it.
pub async fn render_viewer(state: &AppState) -> ViewerResult<String> {
    let settings = &state.settings;
    let document = state.engine.load(&settings.mapfile_identifier()).await?;

    let config = viewer_config::build(
        document.description(),
        &settings.scales,
        &ViewerOverrides::from(settings),
        &RenderEndpoint::from(settings),
    )?;
    state.templates.render_viewer(&config)
}
