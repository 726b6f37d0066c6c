//! MapServer CGI rendering.
//!
//! Each render spawns `mapserv` with the forwarded parameters in
//! `QUERY_STRING`, adjusted for the operation the request asks for. When
//! overrides were applied, the rewritten mapfile is written next to the
//! original so relative paths inside it still resolve, and removed once the
//! engine has finished.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use mapfile::MapDocument;
use ows_protocol::{encode_query, RenderRequest, RequestKind, DEFAULT_LEGEND_FORMAT};
use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{EngineError, MapEngine};

/// Placeholder substituted for the mapfile path in engine messages.
const REDACTED_MAPFILE: &str = "<mapfile>";

/// WMS version assumed for GetMap requests that do not name one.
const DEFAULT_WMS_VERSION: &str = "1.1.1";

/// Keys removed from legend requests so mapserv does not route them to its
/// WMS dispatcher.
const LEGEND_DROPPED_KEYS: &[&str] = &["SERVICE", "VERSION", "REQUEST", "LAYERS", "LAYER", "MODE"];

/// Renders through the MapServer CGI executable.
#[derive(Debug, Clone)]
pub struct MapservEngine {
    binary: PathBuf,
}

impl MapservEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl MapEngine for MapservEngine {
    async fn render(
        &self,
        document: &MapDocument,
        request: &RenderRequest,
        kind: RequestKind,
    ) -> Result<Bytes, EngineError> {
        // Keeps the rewritten file alive until the engine exits
        let mut rewritten: Option<TempPath> = None;
        let map_path = match document.path() {
            Some(path) if !document.is_modified() => path.to_path_buf(),
            _ => {
                let temp = write_rewritten(document).await?;
                let path = temp.to_path_buf();
                rewritten = Some(temp);
                path
            }
        };
        let map_arg = map_path.to_string_lossy().into_owned();

        let query = encode_query(&engine_params(request, kind, &map_arg));
        debug!(binary = %self.binary.display(), request = %kind, "Invoking mapserv");

        let output = Command::new(&self.binary)
            .env("QUERY_STRING", &query)
            .env("REQUEST_METHOD", "GET")
            .env("MS_MAPFILE", &map_arg)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(EngineError::Spawn)?;
        drop(rewritten);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!("rendering engine exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            warn!(status = %output.status, "mapserv failed");
            return Err(EngineError::Failed(message.replace(&map_arg, REDACTED_MAPFILE)));
        }

        let cgi = split_cgi_output(&output.stdout)?;
        let expected = request.content_type(kind).unwrap_or(DEFAULT_LEGEND_FORMAT);
        if cgi.is_exception(expected) {
            let text = String::from_utf8_lossy(&cgi.body);
            return Err(EngineError::Failed(
                text.trim().replace(&map_arg, REDACTED_MAPFILE),
            ));
        }

        Ok(cgi.body)
    }
}

/// Parameters to hand to mapserv for `kind`.
///
/// GetMap goes through the WMS dispatcher, so `SERVICE` and `VERSION` are
/// filled in when the client left them out. Legends are drawn for the whole
/// requested layer set with the CGI `mode=legend` operation, which takes a
/// space separated `layers` list.
pub fn engine_params(request: &RenderRequest, kind: RequestKind, map: &str) -> Vec<(String, String)> {
    let mut params = request.forwarded_params(map);
    match kind {
        RequestKind::GetMap => {
            if !has_key(&params, "SERVICE") {
                params.push(("SERVICE".to_string(), "WMS".to_string()));
            }
            if !has_key(&params, "VERSION") {
                params.push(("VERSION".to_string(), DEFAULT_WMS_VERSION.to_string()));
            }
        }
        RequestKind::GetLegendGraphic => {
            params.retain(|(key, _)| !LEGEND_DROPPED_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)));
            params.push(("mode".to_string(), "legend".to_string()));
            if let Some(layers) = request.layers.as_deref() {
                let names: Vec<&str> = layers
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect();
                params.push(("layers".to_string(), names.join(" ")));
            }
        }
    }
    params
}

fn has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
}

/// Write the overridden mapfile text to a temporary file.
///
/// The file goes into the original's directory, or the system temp
/// directory for documents that were never on disk.
async fn write_rewritten(document: &MapDocument) -> Result<TempPath, EngineError> {
    let directory = document
        .path()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    let text = document.to_mapfile_string();

    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix(".viewer-")
            .suffix(".map")
            .tempfile_in(&directory)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok::<_, std::io::Error>(file.into_temp_path())
    })
    .await
    .map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    .map_err(EngineError::Io)
}

/// CGI response split into its header block and body.
#[derive(Debug, Clone, PartialEq)]
pub struct CgiOutput {
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl CgiOutput {
    /// True when the engine answered with an error document instead of
    /// the requested output.
    ///
    /// OGC service exceptions always count. A textual reply counts when a
    /// non-textual format was requested, which is how mapserv reports
    /// mapfile errors.
    pub fn is_exception(&self, expected: &str) -> bool {
        let content_type = match &self.content_type {
            Some(ct) => ct.to_ascii_lowercase(),
            None => return false,
        };
        if content_type.starts_with("application/vnd.ogc.se") {
            return true;
        }
        content_type.starts_with("text/") && !expected.to_ascii_lowercase().starts_with("text/")
    }
}

/// Separate CGI headers from the body.
pub fn split_cgi_output(stdout: &[u8]) -> Result<CgiOutput, EngineError> {
    let (header_end, body_start) = find_header_end(stdout).ok_or(EngineError::MalformedOutput)?;
    let headers = String::from_utf8_lossy(&stdout[..header_end]);

    let content_type = headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-type")
            .then(|| value.trim().to_string())
    });

    Ok(CgiOutput {
        content_type,
        body: Bytes::copy_from_slice(&stdout[body_start..]),
    })
}

fn find_header_end(data: &[u8]) -> Option<(usize, usize)> {
    let crlf = data.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = data.windows(2).position(|w| w == b"\n\n").map(|i| (i, i + 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_crlf() {
        let out = split_cgi_output(b"Content-Type: image/png\r\n\r\n\x89PNG").unwrap();
        assert_eq!(out.content_type.as_deref(), Some("image/png"));
        assert_eq!(&out.body[..], b"\x89PNG");
    }

    #[test]
    fn test_split_lf_and_body_with_blank_lines() {
        let out = split_cgi_output(b"Status: 200\ncontent-type: text/xml\n\n<a>\n\n</a>").unwrap();
        assert_eq!(out.content_type.as_deref(), Some("text/xml"));
        assert_eq!(&out.body[..], b"<a>\n\n</a>");
    }

    #[test]
    fn test_missing_separator() {
        assert!(matches!(
            split_cgi_output(b"no headers here"),
            Err(EngineError::MalformedOutput)
        ));
    }

    #[test]
    fn test_exception_detection() {
        let ogc = CgiOutput {
            content_type: Some("application/vnd.ogc.se_xml".to_string()),
            body: Bytes::new(),
        };
        assert!(ogc.is_exception("image/png"));

        let html = CgiOutput {
            content_type: Some("text/html".to_string()),
            body: Bytes::new(),
        };
        assert!(html.is_exception("image/png"));
        assert!(!html.is_exception("text/html"));

        let png = CgiOutput {
            content_type: Some("image/png".to_string()),
            body: Bytes::new(),
        };
        assert!(!png.is_exception("image/png"));
    }

    #[test]
    fn test_get_map_query_targets_wms() {
        let request = RenderRequest::from_query("MAP=x&REQUEST=GetMap&FORMAT=image/png&LAYERS=a,b");
        let query = encode_query(&engine_params(&request, RequestKind::GetMap, "/m/r.map"));
        assert_eq!(
            query,
            "MAP=%2Fm%2Fr.map&REQUEST=GetMap&FORMAT=image%2Fpng&LAYERS=a%2Cb&SERVICE=WMS&VERSION=1.1.1"
        );
    }

    #[test]
    fn test_get_map_keeps_client_service_and_version() {
        let request = RenderRequest::from_query("map=x&service=wms&version=1.3.0&REQUEST=GetMap&FORMAT=image/png");
        let query = encode_query(&engine_params(&request, RequestKind::GetMap, "/m/r.map"));
        assert_eq!(
            query,
            "map=%2Fm%2Fr.map&service=wms&version=1.3.0&REQUEST=GetMap&FORMAT=image%2Fpng"
        );
    }

    #[test]
    fn test_legend_query_draws_layer_set() {
        let request = RenderRequest::from_query(
            "MAP=x&SERVICE=WMS&VERSION=1.1.1&REQUEST=GetLegendGraphic&LAYERS=roads,water&FORMAT=image/png",
        );
        let query = encode_query(&engine_params(&request, RequestKind::GetLegendGraphic, "/m/r.map"));
        assert_eq!(query, "MAP=%2Fm%2Fr.map&FORMAT=image%2Fpng&mode=legend&layers=roads+water");
    }

    #[test]
    fn test_legend_query_without_layers() {
        let request = RenderRequest::from_query("MAP=x&REQUEST=GetLegendGraphic");
        let query = encode_query(&engine_params(&request, RequestKind::GetLegendGraphic, "/m/r.map"));
        assert_eq!(query, "MAP=%2Fm%2Fr.map&mode=legend");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let engine = MapservEngine::new("/nonexistent/mapserv-binary");
        let document = MapDocument::parse("MAP LAYER NAME a END END").unwrap();
        let request = RenderRequest::from_query("MAP=x&REQUEST=GetMap&FORMAT=image/png");

        let err = engine
            .render(&document, &request, RequestKind::GetMap)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn(_)));
    }
}
