//! Alert-count aggregation.
//!
//! [`aggregate`] sums raster histograms over a date range, [`sql`] builds
//! the equivalent predicates for the tabular datasets, and [`types`] holds
//! the records both paths produce.

pub mod aggregate;
pub mod sql;
pub mod types;
