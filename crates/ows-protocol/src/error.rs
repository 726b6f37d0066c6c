//! OWS request errors.

use map_common::ViewerError;
use thiserror::Error;

pub type OwsResult<T> = Result<T, OwsError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OwsError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),
}

impl From<OwsError> for ViewerError {
    fn from(err: OwsError) -> Self {
        match err {
            OwsError::MissingParameter(_) => ViewerError::Resource(err.to_string()),
            OwsError::UnsupportedRequest(_) => ViewerError::Classification(err.to_string()),
        }
    }
}
