//! Deployment configuration.
//!
//! Stored as a JSON object on disk; every field is optional and falls back
//! to the production defaults:
//! ```json
//! {
//!   "strategy": "histogram",
//!   "fetch_mode": "sequential",
//!   "rasters": { "all": { "2015": 6, "2016": 4 }, "confirmed_only": { "2015": 7, "2016": 5 } },
//!   "coverage": { "start": "2015-01-01", "end": "2016-12-31" }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{RasterCatalog, RasterTables};
use crate::coverage::CoverageWindow;

/// Where alert counts come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// Sum per-raster histograms from the image server.
    #[default]
    Histogram,
    /// Sum pre-aggregated rows through the SQL endpoint.
    Sql,
}

/// How the per-raster histogram requests of one call are issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcgisConfig {
    pub image_server: String,
    pub confirmed_image_server: String,
    /// `error.code` the image server reports for oversized geometries.
    pub area_too_large_code: i64,
}

impl Default for ArcgisConfig {
    fn default() -> Self {
        Self {
            image_server: "http://gis-gfw.wri.org/arcgis/rest/services/image_services/glad_alerts_analysis/ImageServer/".to_string(),
            confirmed_image_server: "http://gis-gfw.wri.org/arcgis/rest/services/image_services/glad_alerts_con_analysis/ImageServer/".to_string(),
            area_too_large_code: 400,
        }
    }
}

impl ArcgisConfig {
    pub fn server(&self, confirmed_only: bool) -> &str {
        if confirmed_only {
            &self.confirmed_image_server
        } else {
            &self.image_server
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeostoreConfig {
    pub base_url: String,
}

impl Default for GeostoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://production-api.globalforestwatch.org/v1/geostore".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartoConfig {
    pub sql_endpoint: String,
    /// Pre-aggregated table with `year`, `day`, `alerts` and region columns.
    pub sum_table: String,
    /// Row-level table with `lat`, `lon`, `confidence`, `year`, `julian_day`.
    pub export_table: String,
    pub confirmed_count_filter: String,
    pub confirmed_download_filter: String,
}

impl Default for CartoConfig {
    fn default() -> Self {
        Self {
            sql_endpoint: "https://wri-01.carto.com/api/v2/sql".to_string(),
            sum_table: "glad_alerts_sum".to_string(),
            export_table: "gfw_glad_alerts".to_string(),
            confirmed_count_filter: "confidence like '3'".to_string(),
            confirmed_download_filter: "confidence = 3".to_string(),
        }
    }
}

impl CartoConfig {
    pub fn count_filter(&self, confirmed_only: bool) -> Option<&str> {
        confirmed_only.then_some(self.confirmed_count_filter.as_str())
    }

    pub fn download_filter(&self, confirmed_only: bool) -> Option<&str> {
        confirmed_only.then_some(self.confirmed_download_filter.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub base_url: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: "https://production-api.globalforestwatch.org/v1/download/gfw_glad_alerts".to_string(),
        }
    }
}

/// Everything that differs between deployments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub strategy: CountStrategy,
    pub fetch_mode: FetchMode,
    pub rasters: RasterTables,
    pub coverage: CoverageWindow,
    pub arcgis: ArcgisConfig,
    pub geostore: GeostoreConfig,
    pub carto: CartoConfig,
    pub download: DownloadConfig,
}

impl AlertsConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config '{path}'"))?;
        Ok(config)
    }

    pub fn catalog(&self) -> RasterCatalog {
        RasterCatalog::new(self.rasters.clone())
    }
}
