//! Parser for the `begin,end` period strings accepted by the alert endpoints.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::dates::DateRange;
use crate::error::{AlertsError, Result};

/// Parses a `"YYYY-MM-DD,YYYY-MM-DD"` period into an inclusive [`DateRange`].
///
/// Month and day need not be zero-padded. RFC 3339 timestamps are also
/// accepted and reduced to their UTC calendar date.
///
/// # Errors
///
/// Returns [`AlertsError::InvalidPeriod`] when either date is malformed, the
/// separator is missing, or `begin` falls after `end`.
pub fn parse_period(period: &str) -> Result<DateRange> {
    let (begin, end) = period
        .split_once(',')
        .ok_or_else(|| AlertsError::InvalidPeriod(format!("expected 'begin,end', got '{period}'")))?;

    let begin = parse_date(begin)?;
    let end = parse_date(end)?;

    if begin > end {
        return Err(AlertsError::InvalidPeriod(format!(
            "begin {begin} is after end {end}"
        )));
    }

    Ok(DateRange::new(begin, end))
}

/// Range used when no period is supplied: yesterday through today.
pub fn default_period(today: NaiveDate) -> DateRange {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    DateRange::new(yesterday, today)
}

/// Parses `period` if present, falling back to [`default_period`] for today (UTC).
pub fn period_or_default(period: Option<&str>) -> Result<DateRange> {
    match period {
        Some(p) => parse_period(p),
        None => Ok(default_period(Utc::now().date_naive())),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| AlertsError::InvalidPeriod(format!("cannot parse date '{raw}'")))
}
