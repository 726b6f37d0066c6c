//! Client-side viewing parameters derived from a map description.

use map_common::{resolutions, Extent, ProjectionCode, ScaleList, UnitKind, ViewerResult};
use mapfile::MapDescription;
use serde::Serialize;
use url::form_urlencoded;

use crate::config::ViewerSettings;

/// Caller-supplied values that win over the map description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerOverrides {
    pub units: Option<UnitKind>,
    pub resolution_dpi: Option<f64>,
    pub extent: Option<Extent>,
    pub layers: Option<Vec<String>>,
    /// Prepend the map NAME as an aggregate first layer.
    pub root_layer: bool,
}

impl From<&ViewerSettings> for ViewerOverrides {
    fn from(settings: &ViewerSettings) -> Self {
        Self {
            units: settings.units_override,
            resolution_dpi: settings.resolution_override,
            extent: settings.extent_override,
            layers: settings.layer_override.clone(),
            root_layer: settings.root_layer,
        }
    }
}

/// Where the browser sends render requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEndpoint {
    pub port: u16,
    pub map_identifier: String,
}

impl RenderEndpoint {
    /// `http://127.0.0.1:<port>/ows/?map=<identifier>`
    pub fn url(&self) -> String {
        let map: String = form_urlencoded::byte_serialize(self.map_identifier.as_bytes()).collect();
        format!("http://127.0.0.1:{}/ows/?map={}", self.port, map)
    }
}

impl From<&ViewerSettings> for RenderEndpoint {
    fn from(settings: &ViewerSettings) -> Self {
        Self {
            port: settings.port,
            map_identifier: settings.mapfile_identifier(),
        }
    }
}

/// Everything the viewer page needs to set up the client map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerConfig {
    pub mapfile: String,
    pub projection: ProjectionCode,
    pub units: UnitKind,
    pub resolution_dpi: f64,
    pub scales: Vec<u64>,
    /// Map units per pixel, one per scale.
    pub resolutions: Vec<f64>,
    pub extent: Extent,
    pub center: [f64; 2],
    pub layers: Vec<String>,
    pub ows_url: String,
    pub root_layer: String,
}

/// Combine a description, the scale list and overrides into a [`ViewerConfig`].
pub fn build(
    description: &MapDescription,
    scales: &ScaleList,
    overrides: &ViewerOverrides,
    endpoint: &RenderEndpoint,
) -> ViewerResult<ViewerConfig> {
    let units = match overrides.units {
        Some(units) => units,
        None => description.units()?,
    };
    let resolution_dpi = overrides.resolution_dpi.unwrap_or(description.resolution_dpi);
    let extent = match overrides.extent {
        Some(extent) => extent,
        None => description.extent()?,
    };
    let (center_x, center_y) = extent.center();

    let layers = match &overrides.layers {
        Some(layers) => layers.clone(),
        None if overrides.root_layer => std::iter::once(description.root_name.clone())
            .chain(description.layer_names())
            .collect(),
        None => description.layer_names(),
    };

    Ok(ViewerConfig {
        mapfile: endpoint.map_identifier.clone(),
        projection: description.projection.clone(),
        units,
        resolution_dpi,
        scales: scales.as_slice().to_vec(),
        resolutions: resolutions(scales.as_slice(), units, resolution_dpi)?,
        extent,
        center: [center_x, center_y],
        layers,
        ows_url: endpoint.url(),
        root_layer: description.root_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapfile::MapDocument;

    const MAP: &str = r#"MAP
  NAME "demo"
  UNITS METERS
  RESOLUTION 96
  EXTENT 0 0 10 10
  PROJECTION "init=epsg:3857" END
  LAYER NAME "roads" END
  LAYER NAME "water" END
END"#;

    fn description() -> MapDescription {
        MapDocument::parse(MAP).unwrap().description().clone()
    }

    fn endpoint() -> RenderEndpoint {
        RenderEndpoint {
            port: 9991,
            map_identifier: "/maps/demo map.map".to_string(),
        }
    }

    #[test]
    fn test_from_description() {
        let config = build(
            &description(),
            &ScaleList::new(vec![10000, 5000]).unwrap(),
            &ViewerOverrides::default(),
            &endpoint(),
        )
        .unwrap();

        assert_eq!(config.units, UnitKind::Meter);
        assert_eq!(config.resolution_dpi, 96.0);
        assert_eq!(config.projection.as_str(), "epsg:3857");
        assert_eq!(config.center, [5.0, 5.0]);
        assert_eq!(config.layers, vec!["roads", "water"]);
        assert_eq!(config.resolutions.len(), 2);
        assert!((config.resolutions[0] - 2.645833).abs() < 1e-4);
        assert_eq!(config.root_layer, "demo");
        assert_eq!(
            config.ows_url,
            "http://127.0.0.1:9991/ows/?map=%2Fmaps%2Fdemo+map.map"
        );
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ViewerOverrides {
            units: Some(UnitKind::Foot),
            resolution_dpi: Some(72.0),
            extent: Some(Extent::new(-20.0, -20.0, 0.0, 0.0).unwrap()),
            layers: Some(vec!["water".to_string()]),
            root_layer: true,
        };
        let config = build(&description(), &ScaleList::default(), &overrides, &endpoint()).unwrap();

        assert_eq!(config.units, UnitKind::Foot);
        assert_eq!(config.resolution_dpi, 72.0);
        assert_eq!(config.center, [-10.0, -10.0]);
        // An explicit layer list suppresses the root layer
        assert_eq!(config.layers, vec!["water"]);
        assert_eq!(config.resolutions.len(), 5);
    }

    #[test]
    fn test_root_layer_prepended() {
        let overrides = ViewerOverrides {
            root_layer: true,
            ..Default::default()
        };
        let config = build(&description(), &ScaleList::default(), &overrides, &endpoint()).unwrap();
        assert_eq!(config.layers, vec!["demo", "roads", "water"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let description = description();
        let scales = ScaleList::default();
        let overrides = ViewerOverrides::default();
        let first = build(&description, &scales, &overrides, &endpoint()).unwrap();
        let second = build(&description, &scales, &overrides, &endpoint()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_declared_extent() {
        let description = MapDocument::parse("MAP EXTENT 10 0 0 10 END")
            .unwrap()
            .description()
            .clone();
        let err = build(
            &description,
            &ScaleList::default(),
            &ViewerOverrides::default(),
            &endpoint(),
        )
        .unwrap_err();
        assert!(matches!(err, map_common::ViewerError::Configuration(_)));
    }

    #[test]
    fn test_serialized_units_use_client_keys() {
        let config = build(
            &description(),
            &ScaleList::default(),
            &ViewerOverrides::default(),
            &endpoint(),
        )
        .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["units"], "m");
        assert_eq!(json["projection"], "epsg:3857");
        assert_eq!(json["extent"]["min_x"], 0.0);
    }
}
