//! Error taxonomy for alert-count aggregation.

use thiserror::Error;

/// Failures surfaced by the aggregation engine and its collaborators.
///
/// A missing boundary is not an error: entry points return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum AlertsError {
    /// The histogram provider refused the geometry as too large or complex.
    #[error("The requested area is too large to analyze, please select a smaller area and try again")]
    AreaTooLarge,

    /// Any other histogram-fetch, boundary-lookup or tabular-query failure.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid land use name: {0}")]
    InvalidLandUse(String),

    /// The catalog has no raster for a year inside the coverage window.
    #[error("No raster configured for year {year} (confirmed_only = {confirmed_only})")]
    MissingRaster { year: i32, confirmed_only: bool },
}

impl AlertsError {
    /// Returns `true` for errors the caller should report as bad input rather
    /// than a service failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AlertsError::AreaTooLarge
                | AlertsError::InvalidGeometry(_)
                | AlertsError::InvalidPeriod(_)
                | AlertsError::InvalidLandUse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AlertsError>;
