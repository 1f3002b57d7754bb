//! Region keys and the boundaries they resolve to.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::AlertsError;

/// Land-use concession layers that can be queried by row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandUseKind {
    Mining,
    OilPalm,
    Fiber,
    Logging,
}

impl LandUseKind {
    pub fn name(&self) -> &'static str {
        match self {
            LandUseKind::Mining => "mining",
            LandUseKind::OilPalm => "oilpalm",
            LandUseKind::Fiber => "fiber",
            LandUseKind::Logging => "logging",
        }
    }
}

impl FromStr for LandUseKind {
    type Err = AlertsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mining" => Ok(LandUseKind::Mining),
            "oilpalm" => Ok(LandUseKind::OilPalm),
            "fiber" => Ok(LandUseKind::Fiber),
            "logging" => Ok(LandUseKind::Logging),
            other => Err(AlertsError::InvalidLandUse(other.to_string())),
        }
    }
}

/// What the caller wants alerts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionKey {
    National { iso: String },
    Subnational { iso: String, id1: u32 },
    ProtectedArea { wdpaid: u64 },
    LandUse { kind: LandUseKind, id: u64 },
    Geostore { hash: String },
}

impl RegionKey {
    pub fn kind(&self) -> &'static str {
        match self {
            RegionKey::National { .. } => "national",
            RegionKey::Subnational { .. } => "subnational",
            RegionKey::ProtectedArea { .. } => "protected_area",
            RegionKey::LandUse { .. } => "land_use",
            RegionKey::Geostore { .. } => "geostore",
        }
    }

    /// Path of this region below the geostore service root.
    pub fn geostore_path(&self) -> String {
        match self {
            RegionKey::National { iso } => format!("/admin/{iso}"),
            RegionKey::Subnational { iso, id1 } => format!("/admin/{iso}/{id1}"),
            RegionKey::ProtectedArea { wdpaid } => format!("/wdpa/{wdpaid}"),
            RegionKey::LandUse { kind, id } => format!("/use/{}/{id}", kind.name()),
            RegionKey::Geostore { hash } => format!("/{hash}"),
        }
    }

    /// SQL filter selecting this region's rows in the pre-aggregated table.
    ///
    /// Admin regions filter on attributes; every other kind intersects the
    /// resolved boundary geometry.
    pub fn sql_filter(&self, geometry: &Value) -> String {
        match self {
            RegionKey::National { iso } => {
                format!("iso = '{}'", sql_escape(&iso.to_uppercase()))
            }
            RegionKey::Subnational { iso, id1 } => {
                format!("iso = '{}' and adm1 = {id1}", sql_escape(&iso.to_uppercase()))
            }
            _ => format!(
                "ST_Intersects(the_geom, ST_SetSRID(ST_GeomFromGeoJSON('{}'), 4326))",
                sql_escape(&geometry.to_string())
            ),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind(), self.geostore_path())
    }
}

/// Doubles single quotes so `value` can sit inside a SQL string literal.
pub fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Geometry, area and identifier resolved for a [`RegionKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    /// GeoJSON geometry, feature or feature collection.
    pub geojson: Value,
    pub area_ha: f64,
    pub id: String,
}
