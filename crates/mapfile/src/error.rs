//! Mapfile errors.

use std::path::PathBuf;

use map_common::ViewerError;
use thiserror::Error;

/// Errors raised while reading, parsing or concatenating mapfiles.
///
/// Messages never include filesystem paths; use [`MapfileError::path`] when
/// a diagnostic for the operator needs one.
#[derive(Debug, Error)]
pub enum MapfileError {
    #[error("cannot read map description: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: cannot read included file: {source}")]
    Include {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: INCLUDE nested deeper than {max} levels")]
    IncludeDepth { line: usize, max: usize },

    #[error("line {line}: expected MAP keyword, found '{found}'")]
    ExpectedMap { found: String, line: usize },

    #[error("empty map description")]
    Empty,

    #[error("line {line}: {block} block is not terminated by END")]
    Unterminated { block: String, line: usize },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: {keyword} requires a value")]
    MissingValue { keyword: String, line: usize },

    #[error("line {line}: invalid value '{value}' for {keyword}")]
    InvalidValue {
        keyword: String,
        value: String,
        line: usize,
    },

    #[error("line {line}: unexpected content after the final END")]
    TrailingContent { line: usize },

    #[error("fragment {index} must not contain the MAP/END wrapper")]
    FragmentHasWrapper { index: usize },

    #[error("no mapfile fragments given")]
    NoFragments,
}

impl MapfileError {
    /// Path of the file involved, when the failure was an I/O error.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            MapfileError::Io { path, .. } | MapfileError::Include { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<MapfileError> for ViewerError {
    fn from(err: MapfileError) -> Self {
        ViewerError::Resource(err.to_string())
    }
}
