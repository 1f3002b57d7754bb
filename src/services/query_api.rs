use anyhow::Result;
use serde_json::Value;

/// Abstraction over a SQL endpoint returning rows as JSON objects.
#[async_trait::async_trait]
pub trait QueryApi: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Vec<Value>>;
}
