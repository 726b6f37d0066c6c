//! Static asset serving.
//!
//! Assets are resolved under the configured root and canonicalized, so
//! `..` segments and symlinks cannot reach files outside it.

use std::path::{Path, PathBuf};

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use map_common::{ViewerError, ViewerResult};
use tracing::{debug, instrument};

use super::common::plain_text;

/// Content type for a served file name, by extension.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?;
    match extension.to_ascii_lowercase().as_str() {
        "css" => Some("text/css"),
        "js" => Some("text/javascript"),
        "html" => Some("text/html"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Resolve `segments` under `root`, returning the file and its content type.
pub async fn resolve_asset(root: &Path, segments: &[String]) -> ViewerResult<(PathBuf, &'static str)> {
    let file_name = segments
        .last()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ViewerError::Resource("no static asset named".to_string()))?;
    let content_type = content_type_for(file_name).ok_or_else(|| {
        ViewerError::Classification(format!("unsupported static asset type: {}", file_name))
    })?;

    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|_| ViewerError::Resource("static asset root is not available".to_string()))?;
    let candidate = segments.iter().fold(root.clone(), |path, segment| path.join(segment));
    let resolved = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|_| ViewerError::Resource(format!("static asset not found: {}", file_name)))?;

    if !resolved.starts_with(&root) {
        return Err(ViewerError::Resource(format!(
            "static asset not found: {}",
            file_name
        )));
    }
    Ok((resolved, content_type))
}

#[instrument(skip(root))]
pub async fn static_handler(root: &Path, segments: &[String]) -> Response {
    let (path, content_type) = match resolve_asset(root, segments).await {
        Ok(found) => found,
        Err(e) => {
            debug!(error = %e, "Static asset rejected");
            return plain_text(StatusCode::NOT_FOUND, e.to_string());
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(_) => plain_text(StatusCode::NOT_FOUND, "static asset not readable"),
    }
}
