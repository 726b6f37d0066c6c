//! Map units and scale-to-resolution conversion.
//!
//! A scale denominator says how many real-world inches one inch on screen
//! covers. Combined with the device DPI and the map's unit system this yields
//! the display resolution (map units per pixel) the client needs for each
//! zoom level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ViewerError;

/// Unit systems a map description can declare.
///
/// Serialized with the short keys the browser mapping library understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "ft")]
    Foot,
    #[serde(rename = "mi")]
    Mile,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "km")]
    Kilometer,
    #[serde(rename = "dd")]
    DecimalDegree,
    #[serde(rename = "px")]
    Pixel,
}

impl UnitKind {
    /// Map the rendering engine's numeric unit code to a unit.
    ///
    /// Codes 7 (percentages) and 8 (nautical miles) exist in the engine but have
    /// no client-side counterpart, so they are rejected like any unknown code.
    pub fn from_engine_code(code: i32) -> Result<Self, ViewerError> {
        match code {
            0 => Ok(UnitKind::Inch),
            1 => Ok(UnitKind::Foot),
            2 => Ok(UnitKind::Mile),
            3 => Ok(UnitKind::Meter),
            4 => Ok(UnitKind::Kilometer),
            5 => Ok(UnitKind::DecimalDegree),
            6 => Ok(UnitKind::Pixel),
            other => Err(ViewerError::Configuration(format!(
                "unsupported map unit code: {}",
                other
            ))),
        }
    }

    /// Parse the short client-facing key (`m`, `dd`, ...).
    pub fn from_key(key: &str) -> Result<Self, ViewerError> {
        match key.trim().to_lowercase().as_str() {
            "in" | "inches" => Ok(UnitKind::Inch),
            "ft" | "feet" => Ok(UnitKind::Foot),
            "mi" | "miles" => Ok(UnitKind::Mile),
            "m" | "meters" => Ok(UnitKind::Meter),
            "km" | "kilometers" => Ok(UnitKind::Kilometer),
            "dd" | "degrees" => Ok(UnitKind::DecimalDegree),
            "px" | "pixels" => Ok(UnitKind::Pixel),
            other => Err(ViewerError::Configuration(format!(
                "unsupported map unit: {}",
                other
            ))),
        }
    }

    /// Short key understood by the browser mapping library.
    pub fn key(&self) -> &'static str {
        match self {
            UnitKind::Inch => "in",
            UnitKind::Foot => "ft",
            UnitKind::Mile => "mi",
            UnitKind::Meter => "m",
            UnitKind::Kilometer => "km",
            UnitKind::DecimalDegree => "dd",
            UnitKind::Pixel => "px",
        }
    }

    /// Inches covered by one unit.
    ///
    /// The decimal degree value assumes ~111 km per degree at the equator and is
    /// not geodetically exact. Pixels count as one inch, as the engine does.
    pub fn inches_per_unit(&self) -> f64 {
        match self {
            UnitKind::Inch => 1.0,
            UnitKind::Foot => 12.0,
            UnitKind::Mile => 63360.0,
            UnitKind::Meter => 39.3701,
            UnitKind::Kilometer => 39370.1,
            UnitKind::DecimalDegree => 4374754.0,
            UnitKind::Pixel => 1.0,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered list of scale denominators.
///
/// Order drives client zoom levels and is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleList(Vec<u64>);

impl ScaleList {
    pub fn new(scales: Vec<u64>) -> Result<Self, ViewerError> {
        if scales.is_empty() {
            return Err(ViewerError::Configuration(
                "scale list must not be empty".to_string(),
            ));
        }
        if scales.contains(&0) {
            return Err(ViewerError::Configuration(
                "scale denominators must be positive".to_string(),
            ));
        }
        Ok(Self(scales))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ScaleList {
    fn default() -> Self {
        Self(vec![10000, 5000, 2000, 1000, 500])
    }
}

impl FromStr for ScaleList {
    type Err = ViewerError;

    /// Parse a comma-separated list such as `10000,5000,2000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let scales = s
            .split(',')
            .map(str::trim)
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    ViewerError::Configuration(format!("invalid scale denominator: '{}'", part))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(scales)
    }
}

impl fmt::Display for ScaleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        f.write_str(&joined.join(","))
    }
}

/// Compute display resolutions (map units per pixel) for each scale.
///
/// The result has the same length and order as `scales`.
pub fn resolutions(scales: &[u64], unit: UnitKind, device_dpi: f64) -> Result<Vec<f64>, ViewerError> {
    if !device_dpi.is_finite() || device_dpi <= 0.0 {
        return Err(ViewerError::Configuration(format!(
            "device resolution must be a positive number of DPI, got {}",
            device_dpi
        )));
    }

    let inches_per_pixel = 1.0 / device_dpi;
    let monitor_unit = inches_per_pixel / unit.inches_per_unit();

    Ok(scales.iter().map(|&scale| monitor_unit * scale as f64).collect())
}
