//! Market calendar and the expected-row model.

use crate::errors::{IfnsError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Hourly bars on a regular session.
pub const HOURLY_BARS_FULL_DAY: u64 = 7;
/// Hourly bars on an early-close (half) day.
pub const HOURLY_BARS_EARLY_CLOSE: u64 = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Market closures and early-close days, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarketCalendar {
    #[serde(default)]
    pub closed: BTreeSet<String>,
    /// Early-close days; the value (usually a close time) is not interpreted
    #[serde(default)]
    pub early_close: BTreeMap<String, Value>,
}

impl MarketCalendar {
    pub fn is_closed(&self, day: NaiveDate) -> bool {
        self.closed.contains(&day.format(DATE_FORMAT).to_string())
    }

    pub fn is_early_close(&self, day: NaiveDate) -> bool {
        self.early_close
            .contains_key(&day.format(DATE_FORMAT).to_string())
    }
}

/// Load a calendar file. No path, or a path that does not exist, yields an
/// empty calendar.
///
/// # Errors
///
/// - `Io`: the file exists but could not be read
/// - `InvalidCalendar`: the file is not a calendar JSON object
pub fn load_calendar(path: Option<&Path>) -> Result<MarketCalendar> {
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(MarketCalendar::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| IfnsError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| IfnsError::InvalidCalendar {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Every calendar day from `start` to `end`, inclusive.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Expected observation rows for a window.
///
/// Weekends are counted like any other day unless the calendar lists them as
/// closed. Frequencies other than `1d` and `1h` expect no rows.
pub fn expected_rows_for_week(
    start: NaiveDate,
    end: NaiveDate,
    frequency: &str,
    calendar: &MarketCalendar,
) -> u64 {
    days_inclusive(start, end)
        .filter(|d| !calendar.is_closed(*d))
        .map(|d| match frequency {
            "1d" => 1,
            "1h" if calendar.is_early_close(d) => HOURLY_BARS_EARLY_CLOSE,
            "1h" => HOURLY_BARS_FULL_DAY,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn calendar() -> MarketCalendar {
        serde_json::from_value(json!({
            "closed": ["2025-07-04"],
            "early_close": {"2025-07-03": "13:00"}
        }))
        .unwrap()
    }

    #[test]
    fn test_daily_counts_every_open_day() {
        let n = expected_rows_for_week(day("2025-06-28"), day("2025-07-04"), "1d", &calendar());
        assert_eq!(n, 6);
    }

    #[test]
    fn test_hourly_applies_early_close() {
        let n = expected_rows_for_week(day("2025-06-28"), day("2025-07-04"), "1h", &calendar());
        // 5 full days + 1 early close, 07-04 closed
        assert_eq!(n, 5 * HOURLY_BARS_FULL_DAY + HOURLY_BARS_EARLY_CLOSE);
    }

    #[test]
    fn test_unknown_frequency_expects_nothing() {
        let n = expected_rows_for_week(day("2025-06-28"), day("2025-07-04"), "5m", &calendar());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_missing_calendar_is_empty() {
        let cal = load_calendar(Some(Path::new("/nonexistent/calendar.json"))).unwrap();
        assert_eq!(cal, MarketCalendar::default());
        assert_eq!(load_calendar(None).unwrap(), MarketCalendar::default());
    }

    #[test]
    fn test_days_inclusive_covers_both_ends() {
        let days: Vec<_> = days_inclusive(day("2025-01-30"), day("2025-02-02")).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], day("2025-01-30"));
        assert_eq!(days[3], day("2025-02-02"));
    }
}
