//! Clamping of requested ranges to the dates the rasters actually cover.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;

/// Inclusive window of dates for which alert data exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for CoverageWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2016, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl CoverageWindow {
    /// Pulls `range` inside the window.
    ///
    /// Returns `None` when nothing of `range` lies inside the window, i.e.
    /// the clamped begin would fall after the clamped end.
    pub fn clamp(&self, range: &DateRange) -> Option<DateRange> {
        let begin = range.begin.max(self.start);
        let end = range.end.min(self.end);
        (begin <= end).then(|| DateRange::new(begin, end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
