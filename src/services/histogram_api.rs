use crate::catalog::RasterId;
use crate::error::Result;
use crate::geometry::EsriPolygon;

/// Abstraction over the image server computing per-raster histograms.
///
/// Counts are ordered by day of year, `counts[0]` being January 1st.
#[async_trait::async_trait]
pub trait HistogramApi: Send + Sync {
    /// Daily counts of `raster` inside `geometry`.
    ///
    /// # Errors
    ///
    /// [`AlertsError::AreaTooLarge`](crate::error::AlertsError::AreaTooLarge)
    /// when the provider rejects the geometry's size, `Provider` otherwise.
    async fn compute_histogram(
        &self,
        raster: RasterId,
        geometry: &EsriPolygon,
        confirmed_only: bool,
    ) -> Result<Vec<u64>>;

    /// Daily counts of `raster` over its whole extent.
    async fn raster_histogram(&self, raster: RasterId) -> Result<Vec<u64>>;
}
