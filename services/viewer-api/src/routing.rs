//! Request classification and dispatch.
//!
//! Requests are classified by their first path segment alone, so the whole
//! routing table is one fallback handler rather than a set of axum routes.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{Method, StatusCode, Uri},
    response::Response,
    Router,
};
use bytes::Bytes;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::handlers::{ows_handler, plain_text, static_handler, viewer_handler};
use crate::metrics;
use crate::state::AppState;

/// What an inbound request path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// `/`
    ViewerPage,
    /// `/static/...`, with the segments after `static`.
    StaticAsset(Vec<String>),
    /// `/ows...`
    RenderProxy,
    Unknown,
}

impl RouteKind {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RouteKind::ViewerPage => "viewer",
            RouteKind::StaticAsset(_) => "static",
            RouteKind::RenderProxy => "ows",
            RouteKind::Unknown => "unknown",
        }
    }
}

/// Classify a request path by its first segment.
pub fn classify(path: &str) -> RouteKind {
    let mut segments = path.split('/').skip(1);
    match segments.next().unwrap_or("") {
        "" => RouteKind::ViewerPage,
        "static" => RouteKind::StaticAsset(segments.map(str::to_string).collect()),
        "ows" => RouteKind::RenderProxy,
        _ => RouteKind::Unknown,
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

async fn dispatch(
    Extension(state): Extension<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let route = classify(uri.path());
    metrics::record_request(&route);
    debug!(path = uri.path(), route = route.label(), "Dispatching");

    let read_only = method == Method::GET || method == Method::HEAD;
    match route {
        RouteKind::ViewerPage if read_only => viewer_handler(state).await,
        RouteKind::StaticAsset(segments) if read_only => {
            static_handler(&state.settings.static_dir, &segments).await
        }
        RouteKind::ViewerPage | RouteKind::StaticAsset(_) => {
            plain_text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
        }
        RouteKind::RenderProxy => {
            ows_handler(state, method, uri.query().map(str::to_string), body).await
        }
        RouteKind::Unknown => plain_text(StatusCode::INTERNAL_SERVER_ERROR, "ERROR"),
    }
}
