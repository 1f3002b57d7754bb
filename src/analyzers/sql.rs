//! SQL predicates over the year/day partitioned alert tables.
//!
//! Both predicates cover the inclusive `(year_begin, day_begin)` to
//! `(year_end, day_end)` span. Across several years the first year is
//! bounded below, the last above, and every year in between is taken
//! whole. Callers escape anything they interpolate into `region_filter`.

use anyhow::Context;
use reqwest::Url;

use crate::analyzers::types::DownloadUrls;
use crate::dates::DaySpan;

const DOWNLOAD_COLUMNS: &str = "lat, lon, confidence, year, julian_day";

/// Day-range clause of `span` for the given year/day column rendering.
fn year_day_clause(span: &DaySpan, year: impl Fn(i32) -> String, day: &str) -> String {
    let DaySpan {
        year_begin,
        day_begin,
        year_end,
        day_end,
    } = *span;

    if year_begin == year_end {
        return format!(
            "{} and {day} >= {day_begin} and {day} <= {day_end}",
            year(year_begin)
        );
    }

    (year_begin..=year_end)
        .map(|y| {
            if y == year_begin {
                format!("({} and {day} >= {day_begin})", year(y))
            } else if y == year_end {
                format!("({} and {day} <= {day_end})", year(y))
            } else {
                format!("({})", year(y))
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Predicate over the pre-aggregated count table (`year`, `day` columns).
pub fn count_predicate(span: &DaySpan, region_filter: &str, confirmed_filter: Option<&str>) -> String {
    let days = year_day_clause(span, |y| format!("year like '{y}'"), "day::int");
    let mut predicate = format!("{region_filter} and ({days})");
    if let Some(filter) = confirmed_filter {
        predicate.push_str(" and ");
        predicate.push_str(filter);
    }
    predicate
}

/// Predicate over the row-level export table (`year`, `julian_day` columns).
pub fn download_predicate(span: &DaySpan, confirmed_filter: Option<&str>) -> String {
    let days = year_day_clause(span, |y| format!("year = {y}"), "julian_day");
    match confirmed_filter {
        Some(filter) => format!("({days}) and {filter}"),
        None => format!("({days})"),
    }
}

/// Summed alert count for rows matching `predicate`.
pub fn count_query(table: &str, predicate: &str) -> String {
    format!("SELECT SUM(alerts)::int AS value FROM {table} WHERE {predicate}")
}

/// Row-level alert export for rows matching `predicate`.
pub fn download_query(table: &str, predicate: &str) -> String {
    format!("SELECT {DOWNLOAD_COLUMNS} FROM {table} WHERE {predicate}")
}

/// One download link per export format for `sql`, scoped to boundary `id`.
pub fn download_urls(base_url: &str, sql: &str, id: &str) -> anyhow::Result<DownloadUrls> {
    let link = |format: &str| -> anyhow::Result<String> {
        let url = Url::parse_with_params(
            base_url,
            &[("sql", sql), ("geostore", id), ("format", format)],
        )
        .with_context(|| format!("invalid download base url '{base_url}'"))?;
        Ok(url.to_string())
    };

    Ok(DownloadUrls {
        csv: link("csv")?,
        json: link("json")?,
    })
}
