use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GeostoreConfig;
use crate::fetch::{HttpClient, get_json};
use crate::region::{RegionBoundary, RegionKey};
use crate::services::BoundaryApi;

/// JSON:API document returned for a single geostore.
#[derive(Deserialize)]
struct GeostoreDocument {
    data: GeostoreData,
}

#[derive(Deserialize)]
struct GeostoreData {
    id: String,
    attributes: GeostoreAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeostoreAttributes {
    geojson: Value,
    #[serde(default)]
    area_ha: f64,
}

pub struct GeostoreClient<C> {
    http: C,
    base_url: String,
}

impl<C: HttpClient> GeostoreClient<C> {
    pub fn new(http: C, config: &GeostoreConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse_geostore(status: StatusCode, body: Value) -> Result<Option<RegionBoundary>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(anyhow!("geostore returned status {status}: {body}"));
    }

    let doc: GeostoreDocument =
        serde_json::from_value(body).map_err(|e| anyhow!("failed to parse geostore response: {e}"))?;

    Ok(Some(RegionBoundary {
        geojson: doc.data.attributes.geojson,
        area_ha: doc.data.attributes.area_ha,
        id: doc.data.id,
    }))
}

#[async_trait]
impl<C: HttpClient> BoundaryApi for GeostoreClient<C> {
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    async fn lookup(&self, key: &RegionKey) -> Result<Option<RegionBoundary>> {
        let url = format!("{}{}", self.base_url, key.geostore_path());
        debug!(url = %url, "Obtaining geostore");

        let (status, body) = get_json(&self.http, &url).await?;
        let boundary = parse_geostore(status, body)?;
        if boundary.is_none() {
            warn!("Geostore not found");
        }
        Ok(boundary)
    }
}
