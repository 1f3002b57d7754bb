//! HTTP transport shared by the provider clients.

pub mod auth;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, Request, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}

/// Plain `reqwest` client with connect and request timeouts.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// Sends `req` and decodes the body as JSON.
///
/// The status is returned alongside the body so callers can map provider
/// specific failures; an empty or non-JSON body decodes to `Value::Null`.
pub async fn send_json<C: HttpClient + ?Sized>(client: &C, req: Request) -> Result<(StatusCode, Value)> {
    let url = req.url().clone();
    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .with_context(|| format!("failed to read response from {url}"))?;
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);

    Ok((status, body))
}

pub async fn get_json<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<(StatusCode, Value)> {
    let req = Request::new(Method::GET, url.parse()?);
    send_json(client, req).await
}

/// POSTs `fields` as an `application/x-www-form-urlencoded` body.
pub async fn post_form<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    fields: &[(&str, String)],
) -> Result<(StatusCode, Value)> {
    let mut req = Request::new(Method::POST, url.parse()?);
    let body = reqwest::Url::parse_with_params("http://form.invalid/", fields)?
        .query()
        .unwrap_or_default()
        .to_string();
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    *req.body_mut() = Some(body.into());
    send_json(client, req).await
}
