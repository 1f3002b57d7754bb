//! Per-region alert counting.
//!
//! [`AlertCounter`] resolves a region's boundary, clamps the requested
//! period to the data coverage, counts alerts through either the raster
//! histograms or the SQL dataset, and attaches area and download links.

use chrono::{Datelike, Days, NaiveDate};
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::analyzers::aggregate::alert_count;
use crate::analyzers::sql::{
    count_predicate, count_query, download_predicate, download_query, download_urls,
};
use crate::analyzers::types::{AlertRecord, DownloadUrls, Histograms, LatestHistogram};
use crate::catalog::{RasterCatalog, RasterId};
use crate::config::{AlertsConfig, CountStrategy, FetchMode};
use crate::dates::DateRange;
use crate::error::Result;
use crate::geometry::{EsriPolygon, extract_geometry, to_esri_polygon};
use crate::region::{LandUseKind, RegionKey};
use crate::services::{BoundaryApi, HistogramApi, QueryApi};

pub struct AlertCounter<B, H, Q> {
    config: AlertsConfig,
    catalog: RasterCatalog,
    boundaries: B,
    histograms: H,
    tabular: Q,
}

impl<B, H, Q> AlertCounter<B, H, Q>
where
    B: BoundaryApi,
    H: HistogramApi,
    Q: QueryApi,
{
    pub fn new(config: AlertsConfig, boundaries: B, histograms: H, tabular: Q) -> Self {
        let catalog = config.catalog();
        Self {
            config,
            catalog,
            boundaries,
            histograms,
            tabular,
        }
    }

    pub fn histogram_api(&self) -> &H {
        &self.histograms
    }

    pub fn query_api(&self) -> &Q {
        &self.tabular
    }

    pub async fn count_national(
        &self,
        iso: &str,
        range: DateRange,
        confirmed_only: bool,
    ) -> Result<Option<AlertRecord>> {
        let key = RegionKey::National { iso: iso.to_string() };
        self.count(&key, range, confirmed_only).await
    }

    pub async fn count_subnational(
        &self,
        iso: &str,
        id1: u32,
        range: DateRange,
        confirmed_only: bool,
    ) -> Result<Option<AlertRecord>> {
        let key = RegionKey::Subnational {
            iso: iso.to_string(),
            id1,
        };
        self.count(&key, range, confirmed_only).await
    }

    pub async fn count_protected_area(
        &self,
        wdpaid: u64,
        range: DateRange,
        confirmed_only: bool,
    ) -> Result<Option<AlertRecord>> {
        self.count(&RegionKey::ProtectedArea { wdpaid }, range, confirmed_only)
            .await
    }

    pub async fn count_land_use(
        &self,
        kind: LandUseKind,
        id: u64,
        range: DateRange,
        confirmed_only: bool,
    ) -> Result<Option<AlertRecord>> {
        self.count(&RegionKey::LandUse { kind, id }, range, confirmed_only)
            .await
    }

    pub async fn count_geostore(
        &self,
        hash: &str,
        range: DateRange,
        confirmed_only: bool,
    ) -> Result<Option<AlertRecord>> {
        let key = RegionKey::Geostore {
            hash: hash.to_string(),
        };
        self.count(&key, range, confirmed_only).await
    }

    /// Counts alerts for any region kind.
    ///
    /// Returns `Ok(None)` when the boundary lookup does not know `key`.
    /// A period entirely outside the coverage window counts zero alerts.
    #[tracing::instrument(skip(self, key), fields(region = %key))]
    pub async fn count(
        &self,
        key: &RegionKey,
        range: DateRange,
        confirmed_only: bool,
    ) -> Result<Option<AlertRecord>> {
        info!(begin = %range.begin, end = %range.end, confirmed_only, "Counting alerts");

        let Some(boundary) = self.boundaries.lookup(key).await? else {
            info!("Boundary not found");
            return Ok(None);
        };
        let geometry = extract_geometry(&boundary.geojson)?;

        let (range, value) = match self.config.coverage.clamp(&range) {
            Some(clamped) => {
                let value = match self.config.strategy {
                    CountStrategy::Histogram => {
                        self.histogram_count(&clamped, geometry, confirmed_only).await?
                    }
                    CountStrategy::Sql => {
                        self.sql_count(key, &clamped, geometry, confirmed_only).await?
                    }
                };
                (clamped, value)
            }
            None => {
                warn!(
                    coverage_start = %self.config.coverage.start,
                    coverage_end = %self.config.coverage.end,
                    "Period outside data coverage"
                );
                (range, 0)
            }
        };

        let download_urls = self.download_urls(&range, &boundary.id, confirmed_only)?;
        info!(value, area_ha = boundary.area_ha, "Alert count complete");

        Ok(Some(AlertRecord {
            begin: range.begin,
            end: range.end,
            value,
            area_ha: boundary.area_ha,
            download_urls,
        }))
    }

    async fn histogram_count(
        &self,
        range: &DateRange,
        geometry: &Value,
        confirmed_only: bool,
    ) -> Result<u64> {
        let polygon = to_esri_polygon(geometry)?;
        let rasters = self.catalog.rasters_for_period(range, confirmed_only)?;
        debug!(?rasters, "Rasters selected");

        let histograms = self.fetch_histograms(&rasters, &polygon, confirmed_only).await?;
        Ok(alert_count(range, &histograms, &self.catalog))
    }

    async fn fetch_histograms(
        &self,
        rasters: &[RasterId],
        polygon: &EsriPolygon,
        confirmed_only: bool,
    ) -> Result<Histograms> {
        match self.config.fetch_mode {
            FetchMode::Sequential => {
                let mut histograms = Histograms::new();
                for &raster in rasters {
                    let counts = self
                        .histograms
                        .compute_histogram(raster, polygon, confirmed_only)
                        .await?;
                    histograms.insert(raster, counts);
                }
                Ok(histograms)
            }
            FetchMode::Parallel => {
                let fetches = rasters.iter().map(|&raster| async move {
                    self.histograms
                        .compute_histogram(raster, polygon, confirmed_only)
                        .await
                        .map(|counts| (raster, counts))
                });
                Ok(try_join_all(fetches).await?.into_iter().collect())
            }
        }
    }

    async fn sql_count(
        &self,
        key: &RegionKey,
        range: &DateRange,
        geometry: &Value,
        confirmed_only: bool,
    ) -> Result<u64> {
        let carto = &self.config.carto;
        let predicate = count_predicate(
            &range.day_span(),
            &key.sql_filter(geometry),
            carto.count_filter(confirmed_only),
        );
        let sql = count_query(&carto.sum_table, &predicate);

        let rows = self.tabular.query(&sql).await?;
        let value = rows
            .first()
            .and_then(|row| row.get("value"))
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
            .unwrap_or(0);
        debug!(rows = rows.len(), value, "SQL count returned");

        Ok(value)
    }

    fn download_urls(
        &self,
        range: &DateRange,
        id: &str,
        confirmed_only: bool,
    ) -> Result<DownloadUrls> {
        let carto = &self.config.carto;
        let predicate =
            download_predicate(&range.day_span(), carto.download_filter(confirmed_only));
        let sql = download_query(&carto.export_table, &predicate);
        Ok(download_urls(&self.config.download.base_url, &sql, id)?)
    }

    /// Full histogram of every raster inside the coverage window.
    #[tracing::instrument(skip(self))]
    pub async fn latest(&self) -> Result<LatestHistogram> {
        let coverage = self.config.coverage;
        let mut counts = BTreeMap::new();

        for raster in self.catalog.descriptors(false) {
            if raster.year < coverage.start.year() || raster.year > coverage.end.year() {
                continue;
            }
            let year_counts = self.histograms.raster_histogram(raster.id).await?;
            debug!(
                raster = raster.id,
                year = raster.year,
                days = year_counts.len(),
                "Raster histogram fetched"
            );
            counts.insert(raster.year, year_counts);
        }

        let max_date = last_covered_day(&counts).unwrap_or(coverage.start);
        Ok(LatestHistogram {
            min_date: coverage.start,
            max_date,
            counts,
        })
    }
}

/// Last day with a count in the most recent year of `counts`.
fn last_covered_day(counts: &BTreeMap<i32, Vec<u64>>) -> Option<NaiveDate> {
    let (&year, days) = counts.last_key_value()?;
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    first.checked_add_days(Days::new(days.len().saturating_sub(1) as u64))
}
