use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use glad_alerts::catalog::RasterId;
use glad_alerts::config::{AlertsConfig, CountStrategy, FetchMode};
use glad_alerts::dates::DateRange;
use glad_alerts::error::AlertsError;
use glad_alerts::geometry::EsriPolygon;
use glad_alerts::orchestrator::AlertCounter;
use glad_alerts::region::{LandUseKind, RegionBoundary, RegionKey};
use glad_alerts::services::{BoundaryApi, HistogramApi, QueryApi};
use reqwest::Url;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn square() -> Value {
    json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]})
}

/// Counts where day N of the year holds the value N.
fn ramp(days: u64) -> Vec<u64> {
    (1..=days).collect()
}

#[derive(Default)]
struct FakeBoundaries {
    by_path: HashMap<String, RegionBoundary>,
    fail: bool,
}

impl FakeBoundaries {
    fn with(mut self, path: &str, geojson: Value, area_ha: f64, id: &str) -> Self {
        self.by_path.insert(
            path.to_string(),
            RegionBoundary {
                geojson,
                area_ha,
                id: id.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl BoundaryApi for FakeBoundaries {
    async fn lookup(&self, key: &RegionKey) -> anyhow::Result<Option<RegionBoundary>> {
        if self.fail {
            return Err(anyhow!("geostore returned status 503"));
        }
        Ok(self.by_path.get(&key.geostore_path()).cloned())
    }
}

enum Failure {
    TooLarge,
    Generic,
}

#[derive(Default)]
struct FakeHistograms {
    counts: HashMap<RasterId, Vec<u64>>,
    failure: Option<Failure>,
    calls: Mutex<Vec<(RasterId, bool)>>,
    polygons: Mutex<Vec<EsriPolygon>>,
}

impl FakeHistograms {
    fn with(mut self, raster: RasterId, counts: Vec<u64>) -> Self {
        self.counts.insert(raster, counts);
        self
    }

    fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(RasterId, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistogramApi for FakeHistograms {
    async fn compute_histogram(
        &self,
        raster: RasterId,
        geometry: &EsriPolygon,
        confirmed_only: bool,
    ) -> glad_alerts::error::Result<Vec<u64>> {
        self.calls.lock().unwrap().push((raster, confirmed_only));
        self.polygons.lock().unwrap().push(geometry.clone());
        match self.failure {
            Some(Failure::TooLarge) => Err(AlertsError::AreaTooLarge),
            Some(Failure::Generic) => Err(anyhow!("image server returned status 500").into()),
            None => Ok(self.counts.get(&raster).cloned().unwrap_or_default()),
        }
    }

    async fn raster_histogram(&self, raster: RasterId) -> glad_alerts::error::Result<Vec<u64>> {
        self.calls.lock().unwrap().push((raster, false));
        Ok(self.counts.get(&raster).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeQuery {
    rows: Vec<Value>,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl QueryApi for FakeQuery {
    async fn query(&self, sql: &str) -> anyhow::Result<Vec<Value>> {
        self.queries.lock().unwrap().push(sql.to_string());
        Ok(self.rows.clone())
    }
}

fn abc_boundaries() -> FakeBoundaries {
    FakeBoundaries::default().with("/admin/ABC", square(), 1000.0, "abc-geostore")
}

fn year_end_histograms() -> FakeHistograms {
    FakeHistograms::default()
        .with(6, ramp(365))
        .with(4, vec![10, 20, 30, 40])
        .with(7, vec![1; 365])
        .with(5, vec![2; 366])
}

fn year_end_range() -> DateRange {
    DateRange::new(date(2015, 12, 30), date(2016, 1, 2))
}

#[tokio::test]
async fn test_national_count_across_year_boundary() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        year_end_histograms(),
        FakeQuery::default(),
    );

    let record = counter
        .count_national("ABC", year_end_range(), false)
        .await
        .unwrap()
        .expect("boundary exists");

    assert_eq!(record.begin, date(2015, 12, 30));
    assert_eq!(record.end, date(2016, 1, 2));
    // Dec 30 + Dec 31 of 2015, Jan 1 + Jan 2 of 2016
    assert_eq!(record.value, 364 + 365 + 10 + 20);
    assert_eq!(record.area_ha, 1000.0);

    let calls = counter_calls(&counter);
    assert_eq!(calls, vec![(6, false), (4, false)]);

    for (url, format) in [(&record.download_urls.csv, "csv"), (&record.download_urls.json, "json")] {
        let parsed = Url::parse(url).unwrap();
        let pairs: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["format"], format);
        assert_eq!(pairs["geostore"], "abc-geostore");
        assert_eq!(
            pairs["sql"],
            "SELECT lat, lon, confidence, year, julian_day FROM gfw_glad_alerts WHERE \
             ((year = 2015 and julian_day >= 364) OR (year = 2016 and julian_day <= 2))"
        );
    }
}

fn counter_calls(counter: &AlertCounter<FakeBoundaries, FakeHistograms, FakeQuery>) -> Vec<(RasterId, bool)> {
    counter.histogram_api().calls()
}

#[tokio::test]
async fn test_confirmed_only_uses_confirmed_rasters() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        year_end_histograms(),
        FakeQuery::default(),
    );

    let record = counter
        .count_national("ABC", year_end_range(), true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 1 + 1 + 2 + 2);
    assert_eq!(counter_calls(&counter), vec![(7, true), (5, true)]);
    let pairs: HashMap<String, String> = Url::parse(&record.download_urls.csv)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect();
    assert!(pairs["sql"].ends_with(" and confidence = 3"));
}

#[tokio::test]
async fn test_single_day_returns_that_days_count() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        year_end_histograms(),
        FakeQuery::default(),
    );
    let day = date(2015, 7, 4);

    let record = counter
        .count_national("ABC", DateRange::new(day, day), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 185);
    assert_eq!(counter_calls(&counter), vec![(6, false)]);
}

#[tokio::test]
async fn test_unknown_boundary_is_none() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        year_end_histograms(),
        FakeQuery::default(),
    );

    let record = counter
        .count_national("XYZ", year_end_range(), false)
        .await
        .unwrap();

    assert!(record.is_none());
    assert!(counter_calls(&counter).is_empty());
}

#[tokio::test]
async fn test_area_too_large_propagates() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        FakeHistograms::failing(Failure::TooLarge),
        FakeQuery::default(),
    );

    let err = counter
        .count_national("ABC", year_end_range(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, AlertsError::AreaTooLarge));
    assert!(err.to_string().contains("select a smaller area and try again"));
    // The first failing fetch stops the request.
    assert_eq!(counter_calls(&counter), vec![(6, false)]);
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        FakeHistograms::failing(Failure::Generic),
        FakeQuery::default(),
    );

    let err = counter
        .count_national("ABC", year_end_range(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AlertsError::Provider(_)));
}

#[tokio::test]
async fn test_boundary_lookup_failure_is_provider_error() {
    let boundaries = FakeBoundaries {
        fail: true,
        ..FakeBoundaries::default()
    };
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        boundaries,
        year_end_histograms(),
        FakeQuery::default(),
    );

    let err = counter
        .count_protected_area(555, year_end_range(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AlertsError::Provider(_)));
}

#[tokio::test]
async fn test_geostore_uses_first_feature_geometry() {
    let collection = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]],
                    [[[9.0, 9.0], [8.0, 9.0], [8.0, 8.0], [9.0, 9.0]]]
                ]
            }
        }]
    });
    let boundaries = FakeBoundaries::default().with("/deadbeef", collection, 42.5, "deadbeef");
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        boundaries,
        year_end_histograms(),
        FakeQuery::default(),
    );

    let record = counter
        .count_geostore("deadbeef", year_end_range(), false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.area_ha, 42.5);

    let polygons = counter.histogram_api().polygons.lock().unwrap().clone();
    assert_eq!(polygons.len(), 2);
    assert_eq!(
        polygons[0].rings,
        vec![vec![vec![0.0, 0.0], vec![2.0, 0.0], vec![2.0, 2.0], vec![0.0, 0.0]]]
    );
    assert_eq!(polygons[0], polygons[1]);
}

#[tokio::test]
async fn test_unsupported_geometry_is_rejected() {
    let boundaries = FakeBoundaries::default().with(
        "/use/mining/3",
        json!({"type": "Point", "coordinates": [1.0, 1.0]}),
        1.0,
        "mine",
    );
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        boundaries,
        year_end_histograms(),
        FakeQuery::default(),
    );

    let err = counter
        .count_land_use(LandUseKind::Mining, 3, year_end_range(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AlertsError::InvalidGeometry(_)));
    assert!(counter_calls(&counter).is_empty());
}

#[tokio::test]
async fn test_period_is_clamped_to_coverage() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        year_end_histograms(),
        FakeQuery::default(),
    );

    let record = counter
        .count_national("ABC", DateRange::new(date(2013, 6, 1), date(2015, 1, 3)), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.begin, date(2015, 1, 1));
    assert_eq!(record.end, date(2015, 1, 3));
    assert_eq!(record.value, 1 + 2 + 3);
    assert_eq!(counter_calls(&counter), vec![(6, false)]);
}

#[tokio::test]
async fn test_period_outside_coverage_counts_zero() {
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        abc_boundaries(),
        year_end_histograms(),
        FakeQuery::default(),
    );

    let record = counter
        .count_national("ABC", DateRange::new(date(2018, 1, 1), date(2018, 2, 1)), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 0);
    assert_eq!(record.begin, date(2018, 1, 1));
    assert!(counter_calls(&counter).is_empty());
}

#[tokio::test]
async fn test_parallel_fetch_matches_sequential() {
    let config = AlertsConfig {
        fetch_mode: FetchMode::Parallel,
        ..AlertsConfig::default()
    };
    let counter = AlertCounter::new(config, abc_boundaries(), year_end_histograms(), FakeQuery::default());

    let record = counter
        .count_national("ABC", year_end_range(), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 364 + 365 + 10 + 20);
    let mut calls = counter_calls(&counter);
    calls.sort();
    assert_eq!(calls, vec![(4, false), (6, false)]);
}

#[tokio::test]
async fn test_three_year_range_undercounts_intermediate_year() {
    // Only the begin-year and end-year rasters are fetched, so every alert
    // of 2016 is missing from the total.
    let mut config = AlertsConfig::default();
    config.rasters.all.insert(2017, 8);
    config.coverage.end = date(2017, 12, 31);
    let histograms = FakeHistograms::default()
        .with(6, ramp(365))
        .with(4, vec![1000; 366])
        .with(8, vec![7; 365]);
    let counter = AlertCounter::new(config, abc_boundaries(), histograms, FakeQuery::default());

    let record = counter
        .count_national("ABC", DateRange::new(date(2015, 12, 31), date(2017, 1, 1)), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(counter_calls(&counter), vec![(6, false), (8, false)]);
    assert_eq!(record.value, 365 + 7);
}

#[tokio::test]
async fn test_sql_strategy_national() {
    let config = AlertsConfig {
        strategy: CountStrategy::Sql,
        ..AlertsConfig::default()
    };
    let query = FakeQuery {
        rows: vec![json!({"value": 321})],
        ..FakeQuery::default()
    };
    let counter = AlertCounter::new(config, abc_boundaries(), FakeHistograms::default(), query);

    let record = counter
        .count_national("ABC", year_end_range(), true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 321);
    assert_eq!(record.area_ha, 1000.0);
    assert!(counter_calls(&counter).is_empty());

    let queries = counter.query_api().queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![
            "SELECT SUM(alerts)::int AS value FROM glad_alerts_sum WHERE iso = 'ABC' and \
             ((year like '2015' and day::int >= 364) OR (year like '2016' and day::int <= 2)) \
             and confidence like '3'"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn test_sql_strategy_without_rows_is_zero() {
    let config = AlertsConfig {
        strategy: CountStrategy::Sql,
        ..AlertsConfig::default()
    };
    let boundaries = FakeBoundaries::default().with("/wdpa/77", square(), 12.0, "wdpa-77");
    let counter = AlertCounter::new(config, boundaries, FakeHistograms::default(), FakeQuery::default());

    let record = counter
        .count_protected_area(77, year_end_range(), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 0);
    let queries = counter.query_api().queries.lock().unwrap().clone();
    assert!(queries[0].contains("ST_Intersects(the_geom"));
}

#[tokio::test]
async fn test_sql_strategy_subnational_filter() {
    let config = AlertsConfig {
        strategy: CountStrategy::Sql,
        ..AlertsConfig::default()
    };
    let boundaries = FakeBoundaries::default().with("/admin/BRA/4", square(), 5.0, "bra-4");
    let query = FakeQuery {
        rows: vec![json!({"value": null})],
        ..FakeQuery::default()
    };
    let counter = AlertCounter::new(config, boundaries, FakeHistograms::default(), query);

    let day = date(2016, 5, 5);
    let record = counter
        .count_subnational("BRA", 4, DateRange::new(day, day), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.value, 0);
    let queries = counter.query_api().queries.lock().unwrap().clone();
    assert!(queries[0].contains("iso = 'BRA' and adm1 = 4 and (year like '2016' and day::int >= 126 and day::int <= 126)"));
}

#[tokio::test]
async fn test_latest_histogram() {
    let histograms = FakeHistograms::default()
        .with(6, vec![1; 365])
        .with(4, vec![2; 100]);
    let counter = AlertCounter::new(
        AlertsConfig::default(),
        FakeBoundaries::default(),
        histograms,
        FakeQuery::default(),
    );

    let latest = counter.latest().await.unwrap();
    assert_eq!(latest.min_date, date(2015, 1, 1));
    // Day 100 of 2016
    assert_eq!(latest.max_date, date(2016, 4, 9));
    assert_eq!(latest.counts[&2015].len(), 365);
    assert_eq!(latest.counts[&2016].len(), 100);
}
