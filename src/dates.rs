//! Date to grid-index conversion.
//!
//! Every raster holds one count per calendar day, indexed from 1 on
//! January 1st. All dates are UTC calendar dates, so there is no
//! daylight-saving skew to account for.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive `[begin, end]` range of UTC calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        Self { begin, end }
    }

    /// Year and day-of-year of both ends of the range.
    pub fn day_span(&self) -> DaySpan {
        DaySpan {
            year_begin: self.begin.year(),
            day_begin: day_of_year(self.begin),
            year_end: self.end.year(),
            day_end: day_of_year(self.end),
        }
    }
}

/// A date range expressed as `(year, day-of-year)` pairs, the shape the
/// SQL datasets are partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySpan {
    pub year_begin: i32,
    pub day_begin: u32,
    pub year_end: i32,
    pub day_end: u32,
}

/// Day ordinal of `date` within its year, January 1st being `1`.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Number of days in `year`: 366 for leap years, 365 otherwise.
pub fn days_in_year(year: i32) -> u32 {
    match NaiveDate::from_ymd_opt(year, 12, 31) {
        Some(last) => last.ordinal(),
        None => 365,
    }
}
