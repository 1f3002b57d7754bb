use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, Request, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::fetch::{HttpClient, send_json};
use crate::services::QueryApi;

#[derive(Deserialize)]
struct SqlResponse {
    #[serde(default)]
    rows: Vec<Value>,
}

pub struct CartoClient<C> {
    http: C,
    endpoint: String,
}

impl<C: HttpClient> CartoClient<C> {
    pub fn new(http: C, endpoint: String) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl<C: HttpClient> QueryApi for CartoClient<C> {
    #[tracing::instrument(skip(self, sql))]
    async fn query(&self, sql: &str) -> Result<Vec<Value>> {
        debug!(sql, "Executing SQL");
        let url = Url::parse_with_params(&self.endpoint, &[("q", sql)])?;
        let (status, body) = send_json(&self.http, Request::new(Method::GET, url)).await?;

        if !status.is_success() {
            return Err(anyhow!("SQL API returned status {status}: {body}"));
        }

        let resp: SqlResponse =
            serde_json::from_value(body).map_err(|e| anyhow!("failed to parse SQL response: {e}"))?;
        Ok(resp.rows)
    }
}
