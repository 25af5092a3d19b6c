//! Timestamp normalization
//!
//! Each export writes timestamps its own way:
//! - Concept2: `2025-11-16 07:12:00`
//! - WHOOP: `2025-11-16 06:30:00`, occasionally with a UTC offset
//! - Apple Health: a single instant or a `start - end` range
//!
//! This module reduces any of these to one wall-clock instant and, from that,
//! to the calendar day used as the grouping key.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{MergeError, Result};
use crate::types::CalendarDay;

/// Separator between the two ends of a timestamp range
pub const RANGE_DELIMITER: &str = " - ";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Normalizer for heterogeneous timestamp fields
pub struct DateNormalizer;

impl DateNormalizer {
    /// Normalize a timestamp field to a single instant.
    ///
    /// Returns `Ok(None)` for a missing or blank field and `Err` for text that
    /// matches none of the known formats. For a range only the left-hand side
    /// is parsed. Values carrying a UTC offset keep their local wall-clock time.
    pub fn normalize(raw: Option<&str>) -> Result<Option<NaiveDateTime>> {
        let text = match raw.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(None),
        };

        let start = match text.split_once(RANGE_DELIMITER) {
            Some((left, _)) => left.trim(),
            None => text,
        };

        parse_instant(start)
            .map(Some)
            .ok_or_else(|| MergeError::DateParse(format!("unrecognised timestamp {text:?}")))
    }

    /// Normalize a timestamp field and truncate it to its calendar day
    pub fn day_key(raw: Option<&str>) -> Result<Option<CalendarDay>> {
        Ok(Self::normalize(raw)?.map(|dt| dt.date()))
    }
}

fn parse_instant(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.naive_local());
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> CalendarDay {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_plain_timestamp() {
        let dt = DateNormalizer::normalize(Some("2025-11-16 00:07:48"))
            .unwrap()
            .unwrap();
        assert_eq!(dt.to_string(), "2025-11-16 00:07:48");
    }

    #[test]
    fn test_range_takes_left_side() {
        let dt = DateNormalizer::normalize(Some("2025-11-16 23:59:46 - 2025-11-17 00:01:46"))
            .unwrap()
            .unwrap();
        assert_eq!(dt.to_string(), "2025-11-16 23:59:46");
        assert_eq!(
            DateNormalizer::day_key(Some("2025-11-16 23:59:46 - 2025-11-17 00:01:46")).unwrap(),
            Some(day("2025-11-16"))
        );
    }

    #[test]
    fn test_missing_is_no_value_not_error() {
        assert_eq!(DateNormalizer::normalize(None).unwrap(), None);
        assert_eq!(DateNormalizer::normalize(Some("")).unwrap(), None);
        assert_eq!(DateNormalizer::normalize(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_unparseable_is_error() {
        let err = DateNormalizer::normalize(Some("yesterday")).unwrap_err();
        assert!(matches!(err, MergeError::DateParse(_)));
    }

    #[test]
    fn test_offset_keeps_local_date() {
        assert_eq!(
            DateNormalizer::day_key(Some("2025-11-16 23:30:00 -0500")).unwrap(),
            Some(day("2025-11-16"))
        );
        assert_eq!(
            DateNormalizer::day_key(Some("2024-01-15T22:30:00-05:00")).unwrap(),
            Some(day("2024-01-15"))
        );
    }

    #[test]
    fn test_other_layouts() {
        for raw in [
            "2024-01-15T08:30:00.000Z",
            "2024-01-15 08:30",
            "01/15/2024 08:30:00",
            "2024/01/15 08:30:00",
            "2024-01-15",
        ] {
            assert_eq!(
                DateNormalizer::day_key(Some(raw)).unwrap(),
                Some(day("2024-01-15")),
                "{raw}"
            );
        }
    }
}
