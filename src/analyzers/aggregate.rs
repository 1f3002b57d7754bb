use chrono::Datelike;
use tracing::{debug, warn};

use crate::analyzers::types::Histograms;
use crate::catalog::RasterCatalog;
use crate::dates::{DateRange, day_of_year, days_in_year};

/// First and last 1-based day index of `raster_year` covered by `range`.
///
/// A raster whose year differs from the range's begin year starts on
/// January 1st; one whose year differs from the end year runs through
/// December 31st.
pub fn day_indexes(range: &DateRange, raster_year: i32) -> (u32, u32) {
    let start = if range.begin.year() == raster_year {
        day_of_year(range.begin)
    } else {
        1
    };
    let end = if range.end.year() == raster_year {
        day_of_year(range.end)
    } else {
        days_in_year(raster_year)
    };
    (start, end)
}

/// Sums `counts` over the inclusive 1-based `[start, end]` day indexes.
///
/// Indexes past the end of `counts` contribute nothing.
pub fn sum_days(counts: &[u64], start: u32, end: u32) -> u64 {
    if start == 0 || start > end {
        return 0;
    }
    let from = (start - 1) as usize;
    let to = (end as usize).min(counts.len());
    if from >= to {
        return 0;
    }
    counts[from..to].iter().sum()
}

/// Total alerts in `range` across every raster in `histograms`.
///
/// Each raster contributes the slice of its year that `range` overlaps,
/// so a begin-year raster and an end-year raster together cover a range
/// crossing New Year. Rasters unknown to `catalog` are skipped.
pub fn alert_count(range: &DateRange, histograms: &Histograms, catalog: &RasterCatalog) -> u64 {
    let mut total = 0;

    for (&raster, counts) in histograms {
        let Some(year) = catalog.year_for_raster(raster) else {
            warn!(raster, "No year configured for raster, skipping");
            continue;
        };

        let (start, end) = day_indexes(range, year);
        let sum = sum_days(counts, start, end);
        debug!(raster, year, start, end, sum, "Raster slice summed");

        total += sum;
    }

    total
}
