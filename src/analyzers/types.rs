//! Result types produced by the aggregation pipeline.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::RasterId;

/// Per-raster daily counts as returned by the histogram provider.
///
/// `counts[0]` is January 1st of the raster's year.
pub type Histograms = BTreeMap<RasterId, Vec<u64>>;

/// Bulk-download links for the alerts behind a count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadUrls {
    pub csv: String,
    pub json: String,
}

/// Alert count for one region over one date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub value: u64,
    pub area_ha: f64,
    pub download_urls: DownloadUrls,
}

/// Full, region-independent histogram of every covered year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestHistogram {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub counts: BTreeMap<i32, Vec<u64>>,
}
