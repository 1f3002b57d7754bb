use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::catalog::RasterId;
use crate::config::ArcgisConfig;
use crate::error::{AlertsError, Result};
use crate::fetch::{HttpClient, get_json, post_form};
use crate::geometry::EsriPolygon;
use crate::services::HistogramApi;

/// Restricts a histogram computation to a single raster of the mosaic.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MosaicRule {
    mosaic_method: &'static str,
    ascending: bool,
    mosaic_operation: &'static str,
    lock_raster_ids: [RasterId; 1],
}

impl MosaicRule {
    fn lock(raster: RasterId) -> Self {
        Self {
            mosaic_method: "esriMosaicLockRaster",
            ascending: true,
            mosaic_operation: "MT_FIRST",
            lock_raster_ids: [raster],
        }
    }
}

#[derive(Deserialize)]
struct HistogramResponse {
    #[serde(default)]
    histograms: Vec<HistogramBody>,
}

#[derive(Deserialize)]
struct HistogramBody {
    #[serde(default)]
    counts: Vec<u64>,
}

pub struct ArcgisClient<C> {
    http: C,
    config: ArcgisConfig,
}

impl<C: HttpClient> ArcgisClient<C> {
    pub fn new(http: C, config: ArcgisConfig) -> Self {
        Self { http, config }
    }
}

/// Maps an image-server reply onto the first histogram's counts.
///
/// An `error` object in the body wins over the HTTP status: the server
/// reports most failures with a 200.
fn parse_histogram_response(status: StatusCode, body: Value, too_large_code: i64) -> Result<Vec<u64>> {
    if let Some(err) = body.get("error") {
        let code = err.get("code").and_then(Value::as_i64);
        let message = err.get("message").and_then(Value::as_str).unwrap_or("");
        if code == Some(too_large_code) {
            return Err(AlertsError::AreaTooLarge);
        }
        return Err(anyhow!("image server error {code:?}: {message}").into());
    }

    if !status.is_success() {
        return Err(anyhow!("image server returned status {status}").into());
    }

    let parsed: HistogramResponse = serde_json::from_value(body)
        .map_err(|e| anyhow!("failed to parse histogram response: {e}"))?;

    Ok(parsed
        .histograms
        .into_iter()
        .next()
        .map(|h| h.counts)
        .unwrap_or_default())
}

#[async_trait]
impl<C: HttpClient> HistogramApi for ArcgisClient<C> {
    #[tracing::instrument(skip(self, geometry))]
    async fn compute_histogram(
        &self,
        raster: RasterId,
        geometry: &EsriPolygon,
        confirmed_only: bool,
    ) -> Result<Vec<u64>> {
        let url = format!("{}computeHistograms", self.config.server(confirmed_only));
        let geometry = serde_json::to_string(geometry).map_err(anyhow::Error::from)?;
        let mosaic_rule = serde_json::to_string(&MosaicRule::lock(raster)).map_err(anyhow::Error::from)?;

        debug!(url = %url, mosaic_rule = %mosaic_rule, "Requesting histogram");
        let fields = [
            ("geometry", geometry),
            ("geometryType", "esriGeometryPolygon".to_string()),
            ("mosaicRule", mosaic_rule),
            ("f", "pjson".to_string()),
        ];
        let (status, body) = post_form(&self.http, &url, &fields).await?;

        parse_histogram_response(status, body, self.config.area_too_large_code).inspect_err(|e| {
            error!(error = %e, "Failed to obtain histogram from image server");
        })
    }

    #[tracing::instrument(skip(self))]
    async fn raster_histogram(&self, raster: RasterId) -> Result<Vec<u64>> {
        let url = format!("{}{raster}/info/histograms?f=pjson", self.config.image_server);
        debug!(url = %url, "Requesting full raster histogram");
        let (status, body) = get_json(&self.http, &url).await?;

        parse_histogram_response(status, body, self.config.area_too_large_code).inspect_err(|e| {
            error!(error = %e, "Failed to obtain raster histogram");
        })
    }
}
