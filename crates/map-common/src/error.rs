//! Error types for the mapfile viewer.

use thiserror::Error;

use crate::extent::ExtentParseError;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type shared by the viewer components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// Bad or unsupported unit code, malformed override extent, unusable
    /// scale/unit/DPI combination.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Map description missing or unparsable, static asset missing.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Unrecognized request path or static asset extension.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Failure reported by the rendering engine. The text is engine-owned.
    #[error("{0}")]
    Engine(String),
}

impl ViewerError {
    /// Short category name used in log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ViewerError::Configuration(_) => "configuration",
            ViewerError::Resource(_) => "resource",
            ViewerError::Classification(_) => "classification",
            ViewerError::Engine(_) => "engine",
        }
    }
}

impl From<ExtentParseError> for ViewerError {
    fn from(err: ExtentParseError) -> Self {
        ViewerError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        ViewerError::Resource(err.to_string())
    }
}
