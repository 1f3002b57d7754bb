//! GeoJSON → image-server polygon conversion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlertsError, Result};

type Ring = Vec<Vec<f64>>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeoJsonPolygon {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

/// Polygon in the shape the image server's `geometry` form field expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsriPolygon {
    #[serde(rename = "type")]
    kind: &'static str,
    pub rings: Vec<Ring>,
}

impl EsriPolygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self {
            kind: "polygon",
            rings,
        }
    }
}

/// Returns the geometry carried by a GeoJSON document.
///
/// A `FeatureCollection` yields its first feature's geometry, a `Feature`
/// yields its own geometry, anything else is assumed to be a bare geometry.
pub fn extract_geometry(geojson: &Value) -> Result<&Value> {
    match geojson.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => geojson
            .get("features")
            .and_then(Value::as_array)
            .and_then(|features| features.first())
            .and_then(|feature| feature.get("geometry"))
            .ok_or_else(|| AlertsError::InvalidGeometry("feature collection has no features".into())),
        Some("Feature") => geojson
            .get("geometry")
            .ok_or_else(|| AlertsError::InvalidGeometry("feature has no geometry".into())),
        _ => Ok(geojson),
    }
}

/// Converts a GeoJSON `Polygon` or `MultiPolygon` into an [`EsriPolygon`].
///
/// Only the first polygon of a `MultiPolygon` is kept.
pub fn to_esri_polygon(geometry: &Value) -> Result<EsriPolygon> {
    let parsed: GeoJsonPolygon = serde_json::from_value(geometry.clone()).map_err(|e| {
        let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("unknown");
        AlertsError::InvalidGeometry(format!("unsupported {kind} geometry: {e}"))
    })?;

    let rings = match parsed {
        GeoJsonPolygon::Polygon { coordinates } => coordinates,
        GeoJsonPolygon::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .next()
            .ok_or_else(|| AlertsError::InvalidGeometry("empty multipolygon".into()))?,
    };

    Ok(EsriPolygon::new(rings))
}
