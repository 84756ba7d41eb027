//! Timestamp parsing and period flooring for datetime columns.
//!
//! A cell is read as a timestamp when it is a number (Unix epoch
//! milliseconds) or text in one of [`DATETIME_FORMATS`] / RFC 3339.
//! Parsed timestamps are floored to the start of a [`Granularity`] period
//! before frequencies are counted.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dataset::Value;

/// Accepted text layouts after RFC 3339.
pub const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Accepted date-only layouts.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Calendar period a timestamp is floored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Month,
    /// ISO week starting on Monday.
    Week,
    #[default]
    Day,
}

impl Granularity {
    /// First day of the period containing `date`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use u_inference::temporal::Granularity;
    ///
    /// let d = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(); // Thursday
    /// assert_eq!(Granularity::Week.floor(d), NaiveDate::from_ymd_opt(2024, 3, 11));
    /// assert_eq!(Granularity::Month.floor(d), NaiveDate::from_ymd_opt(2024, 3, 1));
    /// ```
    pub fn floor(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Self::Week => {
                let back = date.weekday().num_days_from_monday();
                date.checked_sub_days(Days::new(u64::from(back)))
            }
            Self::Day => Some(date),
        }
    }

    /// Display label of the period that starts on `start`.
    pub fn label(self, start: NaiveDate) -> String {
        match self {
            Self::Year => start.format("%Y").to_string(),
            Self::Month => start.format("%Y-%m").to_string(),
            Self::Week | Self::Day => start.format("%Y-%m-%d").to_string(),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        };
        f.write_str(name)
    }
}

/// Parses a cell into a naive (UTC) timestamp.
///
/// Returns `None` for missing cells, booleans and unparseable text.
///
/// ```
/// use u_inference::dataset::Value;
/// use u_inference::temporal::parse_timestamp;
///
/// assert!(parse_timestamp(&Value::from("2024-03-14")).is_some());
/// assert!(parse_timestamp(&Value::from("2024-03-14T08:30:00Z")).is_some());
/// assert!(parse_timestamp(&Value::from(0.0)).is_some());
/// assert!(parse_timestamp(&Value::from("soon")).is_none());
/// ```
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    if value.is_missing() {
        return None;
    }
    match value {
        Value::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.naive_utc())
        }
        Value::Text(s) => parse_text(s.trim()),
        _ => None,
    }
}

fn parse_text(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses and floors a cell, returning the period start date.
pub fn floor_value(value: &Value, granularity: Granularity) -> Option<NaiveDate> {
    parse_timestamp(value).and_then(|ts| granularity.floor(ts.date()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_layouts() {
        let expect = date(2024, 3, 14);
        for s in [
            "2024-03-14",
            "2024/03/14",
            "2024-03-14 10:20:30",
            "2024-03-14T10:20:30",
            "2024-03-14T10:20:30+00:00",
            " 2024-03-14 ",
        ] {
            let ts = parse_timestamp(&Value::from(s)).unwrap_or_else(|| panic!("failed on {s}"));
            assert_eq!(ts.date(), expect, "layout {s}");
        }
    }

    #[test]
    fn rfc3339_offsets_normalize_to_utc() {
        let ts = parse_timestamp(&Value::from("2024-03-14T23:30:00-02:00")).unwrap();
        assert_eq!(ts.date(), date(2024, 3, 15));
    }

    #[test]
    fn epoch_millis() {
        // 2021-01-01T00:00:00Z
        let ts = parse_timestamp(&Value::from(1_609_459_200_000.0)).unwrap();
        assert_eq!(ts.date(), date(2021, 1, 1));
    }

    #[test]
    fn rejects_non_timestamps() {
        assert!(parse_timestamp(&Value::Null).is_none());
        assert!(parse_timestamp(&Value::from("NA")).is_none());
        assert!(parse_timestamp(&Value::from(true)).is_none());
        assert!(parse_timestamp(&Value::from("2024-13-40")).is_none());
        assert!(parse_timestamp(&Value::from(f64::NAN)).is_none());
    }

    #[test]
    fn floors_each_granularity() {
        // Sunday
        let d = date(2024, 3, 17);
        assert_eq!(Granularity::Year.floor(d), Some(date(2024, 1, 1)));
        assert_eq!(Granularity::Month.floor(d), Some(date(2024, 3, 1)));
        assert_eq!(Granularity::Week.floor(d), Some(date(2024, 3, 11)));
        assert_eq!(Granularity::Day.floor(d), Some(d));
        // Monday is its own week start
        assert_eq!(Granularity::Week.floor(date(2024, 3, 11)), Some(date(2024, 3, 11)));
    }

    #[test]
    fn week_floor_crosses_year_boundary() {
        // 2025-01-01 is a Wednesday
        assert_eq!(Granularity::Week.floor(date(2025, 1, 1)), Some(date(2024, 12, 30)));
    }

    #[test]
    fn labels() {
        let d = date(2024, 3, 1);
        assert_eq!(Granularity::Year.label(date(2024, 1, 1)), "2024");
        assert_eq!(Granularity::Month.label(d), "2024-03");
        assert_eq!(Granularity::Week.label(d), "2024-03-01");
        assert_eq!(Granularity::Day.label(d), "2024-03-01");
        assert_eq!(Granularity::Week.to_string(), "week");
    }

    #[test]
    fn floor_value_combines_parse_and_floor() {
        let v = Value::from("2024-07-19 12:00:00");
        assert_eq!(floor_value(&v, Granularity::Month), Some(date(2024, 7, 1)));
        assert_eq!(floor_value(&Value::from("x"), Granularity::Month), None);
    }
}
