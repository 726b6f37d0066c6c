//! Common test fixtures for mapfile-viewer tests.
//!
//! This module provides sample mapfiles that cover the constructs the viewer
//! cares about: map-level settings, layers with and without connections,
//! nested blocks, comments and quoting styles.

/// A complete mapfile with two named layers.
///
/// Declares meters, 96 DPI, a 0..10 square extent and EPSG:3857.
pub const SIMPLE_MAPFILE: &str = r#"# Demo map used by the viewer tests
MAP
  NAME "demo"
  UNITS METERS
  RESOLUTION 96
  EXTENT 0 0 10 10
  SIZE 800 600
  SHAPEPATH "data"

  PROJECTION
    "init=epsg:3857"
  END

  WEB
    METADATA
      "wms_title" "Demo"
      "wms_enable_request" "*"
    END
  END

  LAYER
    NAME "roads"
    TYPE LINE
    STATUS ON
    CONNECTIONTYPE POSTGIS
    CONNECTION "host=db dbname=gis user=viewer"
    DATA "geom from roads"
    CLASS
      NAME 'Roads'
      STYLE
        COLOR 120 120 120
        WIDTH 2
      END
    END
  END

  LAYER
    NAME "water"
    TYPE POLYGON
    STATUS ON
    DATA "water.shp"
    CLASS
      EXPRESSION ([area] > 100)
      STYLE
        COLOR 0 0 255
      END
    END
  END
END
"#;

/// A mapfile that declares nothing but layers; every map-level setting takes
/// its engine default.
pub const MINIMAL_MAPFILE: &str = r#"MAP
  LAYER
    NAME "only"
    TYPE POINT
  END
END
"#;

/// A mapfile whose units have no client-side counterpart.
pub const NAUTICAL_MAPFILE: &str = r#"MAP
  NAME "sea"
  UNITS NAUTICALMILES
  EXTENT 0 0 100 100
  LAYER
    NAME "buoys"
  END
END
"#;

/// A mapfile with an unterminated LAYER block.
pub const BROKEN_MAPFILE: &str = r#"MAP
  NAME "broken"
  LAYER
    NAME "dangling"
"#;

/// First fragment for concatenation: map-level settings, no MAP/END wrapper.
pub const FRAGMENT_BASE: &str = r#"NAME "combined"
UNITS DD
RESOLUTION 72
EXTENT -180 -90 180 90
PROJECTION
  "init=epsg:4326"
END"#;

/// Second fragment for concatenation: layers only, no MAP/END wrapper.
pub const FRAGMENT_LAYERS: &str = r#"LAYER
  NAME "countries"
  TYPE POLYGON
END
LAYER
  NAME "cities"
  TYPE POINT
END"#;

/// A mapfile whose layers live in `layers.inc`, see [`INCLUDED_LAYERS`].
pub const INCLUDING_MAPFILE: &str = r#"MAP
  NAME "split"
  EXTENT 0 0 10 10
  INCLUDE "layers.inc"
END
"#;

/// Layer definitions pulled in by [`INCLUDING_MAPFILE`].
pub const INCLUDED_LAYERS: &str = r#"# shared layers
LAYER
  NAME "parcels"
  CONNECTION "host=db"
  TYPE POLYGON
END
LAYER
  NAME "labels"
  TYPE POINT
END
"#;

/// A 1x1 white PNG image.
pub const WHITE_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
    0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8, 0xFF, 0xFF, 0x3F,
    0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC, 0xCC, 0x59, 0xE7, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E,
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Common extents for testing, as (min_x, min_y, max_x, max_y).
pub mod extent {
    /// The extent declared by [`super::SIMPLE_MAPFILE`].
    pub const SIMPLE: (f64, f64, f64, f64) = (0.0, 0.0, 10.0, 10.0);

    /// Global geographic extent
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Zero-height rectangle
    pub const DEGENERATE: (f64, f64, f64, f64) = (0.0, 0.0, 20.0, 0.0);
}
