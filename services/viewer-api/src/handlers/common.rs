//! Shared response helpers.

use std::path::Path;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use map_common::ViewerError;

/// Placeholder substituted for filesystem paths in client-facing errors.
pub const REDACTED_PATH: &str = "<path>";

/// Plain-text response with the given status.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

/// 500 response carrying the error text with `paths` removed.
pub fn error_response(err: &ViewerError, paths: &[&Path]) -> Response {
    plain_text(
        StatusCode::INTERNAL_SERVER_ERROR,
        redact_paths(&err.to_string(), paths),
    )
}

/// Replace every occurrence of `paths` in `text` with [`REDACTED_PATH`].
///
/// Only absolute paths below the root are redacted. Longer paths are
/// replaced first so a file is not half-redacted by its parent directory.
pub fn redact_paths(text: &str, paths: &[&Path]) -> String {
    let mut needles: Vec<String> = paths
        .iter()
        .filter(|p| p.is_absolute() && p.parent().is_some())
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    needles.sort_by(|a, b| b.len().cmp(&a.len()));

    needles
        .iter()
        .fold(text.to_string(), |acc, needle| acc.replace(needle.as_str(), REDACTED_PATH))
}
