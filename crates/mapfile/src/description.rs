//! Declared properties of a map description.

use map_common::{Extent, ProjectionCode, UnitKind, ViewerError, ViewerResult};

/// Map name the engine assigns when a mapfile declares none.
pub const DEFAULT_MAP_NAME: &str = "MS";

/// Device resolution the engine assumes when `RESOLUTION` is absent.
pub const DEFAULT_RESOLUTION_DPI: f64 = 72.0;

/// Engine unit code for meters, the default when `UNITS` is absent.
pub const METERS_UNIT_CODE: i32 = 3;

/// A single `LAYER` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerInfo {
    pub name: Option<String>,
    pub connection: Option<String>,
}

/// Immutable view of the settings a mapfile declares.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDescription {
    /// `NAME` of the map itself.
    pub root_name: String,
    /// Engine unit code (0 inches .. 8 nautical miles).
    pub unit_code: i32,
    pub resolution_dpi: f64,
    pub projection: ProjectionCode,
    /// `EXTENT` exactly as declared, possibly malformed.
    pub declared_extent: Option<[f64; 4]>,
    /// Layers in declaration order.
    pub layers: Vec<LayerInfo>,
}

impl MapDescription {
    /// Semantic unit of the map.
    pub fn units(&self) -> ViewerResult<UnitKind> {
        UnitKind::from_engine_code(self.unit_code)
    }

    /// Declared extent, validated.
    pub fn extent(&self) -> ViewerResult<Extent> {
        let [min_x, min_y, max_x, max_y] = self.declared_extent.ok_or_else(|| {
            ViewerError::Configuration("map description declares no EXTENT".to_string())
        })?;
        Ok(Extent::new(min_x, min_y, max_x, max_y)?)
    }

    /// Names of all named layers, in declaration order.
    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().filter_map(|l| l.name.clone()).collect()
    }

    /// Number of `LAYER` blocks, named or not.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}
