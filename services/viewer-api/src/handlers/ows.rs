//! Render proxy handler.

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use ows_protocol::RenderRequest;
use tracing::{error, instrument};

use super::common::{error_response, plain_text};
use crate::proxy::RenderProxy;
use crate::state::AppState;

/// Build the request from the query string, or from a form body when a
/// POST carries no query.
pub fn parse_request(method: &Method, query: Option<&str>, body: &[u8]) -> RenderRequest {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => RenderRequest::from_query(query),
        None if method == Method::POST => RenderRequest::from_query(&String::from_utf8_lossy(body)),
        None => RenderRequest::default(),
    }
}

#[instrument(skip(state, body))]
pub async fn ows_handler(
    state: Arc<AppState>,
    method: Method,
    query: Option<String>,
    body: Bytes,
) -> Response {
    if method != Method::GET && method != Method::HEAD && method != Method::POST {
        return plain_text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    }

    let request = parse_request(&method, query.as_deref(), &body);
    let proxy = RenderProxy::new(&state.settings, state.engine.as_ref());

    match proxy.handle(&request).await {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, output.content_type)],
            output.body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Render proxy request failed");
            let settings = &state.settings;
            let mut paths: Vec<&Path> = vec![settings.mapfile.as_path(), settings.static_dir.as_path()];
            if let Some(parent) = settings.mapfile.parent() {
                paths.push(parent);
            }
            error_response(&e, &paths)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wins_over_body() {
        let request = parse_request(&Method::POST, Some("MAP=a"), b"MAP=b");
        assert_eq!(request.map.as_deref(), Some("a"));
    }

    #[test]
    fn test_post_form_body() {
        let request = parse_request(&Method::POST, None, b"MAP=b&REQUEST=GetMap");
        assert_eq!(request.map.as_deref(), Some("b"));
        assert_eq!(request.request.as_deref(), Some("GetMap"));
    }

    #[test]
    fn test_get_ignores_body() {
        let request = parse_request(&Method::GET, Some(""), b"MAP=b");
        assert!(request.map.is_none());
    }
}
