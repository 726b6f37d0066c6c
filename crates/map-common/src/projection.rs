//! Projection code extraction.
//!
//! Map descriptions declare their projection as a list of PROJ parameters
//! (`"init=epsg:3857"`) or, in newer files, as a single `"EPSG:3857"` string.
//! The client only needs the short authority code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Code used when a description declares no usable projection.
pub const FALLBACK_PROJECTION: &str = "epsg:4326";

/// Authority code of a map projection, e.g. `epsg:3857`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionCode(String);

impl ProjectionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Extract the projection code from the raw PROJECTION entries.
    ///
    /// Lenient: missing or unrecognized declarations yield
    /// [`FALLBACK_PROJECTION`] instead of an error.
    pub fn from_declaration(entries: &[String]) -> Self {
        Self::try_from_declaration(entries).unwrap_or_else(Self::fallback)
    }

    fn try_from_declaration(entries: &[String]) -> Option<Self> {
        for entry in entries {
            for param in entry.split_whitespace() {
                let param = param.trim_start_matches('+');
                if let Some((key, value)) = param.split_once('=') {
                    if key.eq_ignore_ascii_case("init") && !value.is_empty() {
                        return Some(Self(value.to_string()));
                    }
                }
            }
        }

        // Single "EPSG:nnnn" form
        if let [single] = entries {
            let single = single.trim();
            if let Some((authority, code)) = single.split_once(':') {
                if authority.eq_ignore_ascii_case("epsg")
                    && !code.is_empty()
                    && code.chars().all(|c| c.is_ascii_digit())
                {
                    return Some(Self(format!("epsg:{}", code)));
                }
            }
        }

        None
    }

    pub fn fallback() -> Self {
        Self(FALLBACK_PROJECTION.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
