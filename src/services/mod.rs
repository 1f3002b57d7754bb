//! Collaborator contracts consumed by the alert counter.
//!
//! [`BoundaryApi`] resolves region keys, [`HistogramApi`] serves raster
//! histograms and [`QueryApi`] runs SQL against the tabular datasets.

pub mod boundary_api;
pub mod histogram_api;
pub mod query_api;

pub use boundary_api::BoundaryApi;
pub use histogram_api::HistogramApi;
pub use query_api::QueryApi;
