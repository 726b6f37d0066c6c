//! Rendering engine seam.
//!
//! The viewer never draws maps itself. It loads map descriptions and hands
//! render requests to a [`MapEngine`]; the production implementation is
//! [`MapservEngine`], which drives the MapServer CGI binary.

mod mapserv;

pub use mapserv::{engine_params, split_cgi_output, CgiOutput, MapservEngine};

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use map_common::ViewerError;
use mapfile::{MapDocument, MapfileError};
use ows_protocol::{RenderRequest, RequestKind};
use thiserror::Error;

/// Errors reported while rendering.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start rendering engine: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("cannot prepare map description for rendering: {0}")]
    Io(#[source] std::io::Error),

    /// Engine-owned failure text.
    #[error("{0}")]
    Failed(String),

    #[error("rendering engine returned malformed output")]
    MalformedOutput,
}

impl From<EngineError> for ViewerError {
    fn from(err: EngineError) -> Self {
        ViewerError::Engine(err.to_string())
    }
}

#[async_trait]
pub trait MapEngine: Send + Sync {
    /// Load a map description by identifier.
    ///
    /// The default reads the identifier as a filesystem path.
    async fn load(&self, identifier: &str) -> Result<MapDocument, MapfileError> {
        let path = PathBuf::from(identifier);
        tokio::task::spawn_blocking(move || MapDocument::from_path(&path))
            .await
            .map_err(|e| MapfileError::Io {
                path: PathBuf::from(identifier),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?
    }

    /// Render `document` for `request`, returning the raw output bytes.
    async fn render(
        &self,
        document: &MapDocument,
        request: &RenderRequest,
        kind: RequestKind,
    ) -> Result<Bytes, EngineError>;
}
