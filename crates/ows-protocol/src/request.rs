//! Typed view of a render proxy request.
//!
//! The proxy forwards every parameter to the rendering engine untouched, so
//! the original pairs are kept in order next to the few keys the proxy itself
//! needs to look at.

use serde::Serialize;
use std::fmt;
use url::form_urlencoded;

use crate::error::{OwsError, OwsResult};

/// Content type used for legend graphics when `FORMAT` is absent.
pub const DEFAULT_LEGEND_FORMAT: &str = "image/png";

/// Rendering operations the proxy knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestKind {
    GetMap,
    GetLegendGraphic,
}

impl RequestKind {
    /// Parse a `REQUEST` value, ignoring case.
    pub fn parse(value: &str) -> OwsResult<Self> {
        match value.to_uppercase().as_str() {
            "GETMAP" => Ok(RequestKind::GetMap),
            "GETLEGENDGRAPHIC" => Ok(RequestKind::GetLegendGraphic),
            _ => Err(OwsError::UnsupportedRequest(value.to_string())),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::GetMap => f.write_str("GetMap"),
            RequestKind::GetLegendGraphic => f.write_str("GetLegendGraphic"),
        }
    }
}

/// Query parameters of a render proxy call.
///
/// Recognized keys are matched case-insensitively; when a key repeats, the
/// last value wins, as it does for the engine. The exception is `MAP`: an
/// upper-case `MAP` takes precedence over any other spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderRequest {
    /// `MAP`: identifier of the map description to load.
    pub map: Option<String>,
    /// `REQUEST`: engine operation.
    pub request: Option<String>,
    /// `FORMAT`: MIME type of the rendered output.
    pub format: Option<String>,
    /// `LAYERS`
    pub layers: Option<String>,
    /// `SRS` (WMS 1.1.1) or `CRS` (WMS 1.3.0).
    pub crs: Option<String>,
    /// `BBOX`
    pub bbox: Option<String>,
    /// Every received pair, recognized or not, in arrival order.
    params: Vec<(String, String)>,
}

impl RenderRequest {
    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = RenderRequest::default();
        let mut exact_map = false;
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            let slot = match key.to_uppercase().as_str() {
                "MAP" if key == "MAP" => {
                    exact_map = true;
                    Some(&mut request.map)
                }
                "MAP" if exact_map => None,
                "MAP" => Some(&mut request.map),
                "REQUEST" => Some(&mut request.request),
                "FORMAT" => Some(&mut request.format),
                "LAYERS" => Some(&mut request.layers),
                "SRS" | "CRS" => Some(&mut request.crs),
                "BBOX" => Some(&mut request.bbox),
                _ => None,
            };
            if let Some(slot) = slot {
                *slot = Some(value.clone());
            }
            request.params.push((key, value));
        }
        request
    }

    /// All received pairs in arrival order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Identifier of the map description to load.
    pub fn map_identifier(&self) -> OwsResult<&str> {
        self.map
            .as_deref()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| OwsError::MissingParameter("MAP".to_string()))
    }

    /// Operation requested from the engine.
    pub fn kind(&self) -> OwsResult<RequestKind> {
        let request = self
            .request
            .as_deref()
            .ok_or_else(|| OwsError::MissingParameter("REQUEST".to_string()))?;
        RequestKind::parse(request)
    }

    /// Content type of the response for `kind`.
    ///
    /// GetMap requires `FORMAT`. Legend requests fall back to PNG because
    /// clients commonly omit `FORMAT` there.
    pub fn content_type(&self, kind: RequestKind) -> OwsResult<&str> {
        match (kind, self.format.as_deref()) {
            (_, Some(format)) if !format.is_empty() => Ok(format),
            (RequestKind::GetLegendGraphic, _) => Ok(DEFAULT_LEGEND_FORMAT),
            (RequestKind::GetMap, _) => Err(OwsError::MissingParameter("FORMAT".to_string())),
        }
    }

    /// Pairs to hand to the engine, with every `MAP` value replaced by `map`.
    pub fn forwarded_params(&self, map: &str) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("MAP") {
                    (key.clone(), map.to_string())
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}

/// Encode pairs as a query string.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
