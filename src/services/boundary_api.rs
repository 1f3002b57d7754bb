use anyhow::Result;

use crate::region::{RegionBoundary, RegionKey};

/// Abstraction over a boundary lookup provider (e.g., the geostore service).
#[async_trait::async_trait]
pub trait BoundaryApi: Send + Sync {
    /// Returns the boundary for `key`, or `None` if the provider does not know it.
    async fn lookup(&self, key: &RegionKey) -> Result<Option<RegionBoundary>>;
}
