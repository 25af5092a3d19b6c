//! Source aggregators
//!
//! This module provides the aggregators that roll each export up to one row per
//! calendar day. Fixed-schema sources (Concept2, WHOOP) use a declared
//! field→reducer spec; the Apple Health export, whose columns depend on the
//! export configuration, classifies its columns by name.

mod apple;
mod concept2;
mod fixed;
mod heuristic;
mod whoop;

pub use apple::{apple_health_aggregator, APPLE_TIMESTAMP_COLUMN};
pub use concept2::CONCEPT2_SPEC;
pub use fixed::FixedSchemaAggregator;
pub use heuristic::{
    classify_by_name, ClassificationOrigin, ColumnClassification, HeuristicSchemaAggregator,
};
pub use whoop::{WHOOP_CYCLES_SPEC, WHOOP_SLEEPS_SPEC, WHOOP_WORKOUTS_SPEC};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{MergeError, Result};
use crate::normalizer::DateNormalizer;
use crate::types::{CalendarDay, DailyTable, RawRecord, RawTable, SourceKind};

/// What to do with a row whose timestamp is missing or unparseable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidDayPolicy {
    /// Discard the row and keep going
    #[default]
    Drop,
    /// Abort the load
    Fail,
}

/// Trait for per-source daily aggregators
pub trait SourceAggregator {
    /// Source this aggregator handles
    fn kind(&self) -> SourceKind;

    /// Column that carries each row's timestamp or range
    fn timestamp_column(&self) -> &str;

    /// Reduce the source table to one row per calendar day
    fn aggregate(&self, table: &RawTable, policy: InvalidDayPolicy) -> Result<DailyTable>;
}

/// Records of one source grouped by calendar day
pub(crate) struct DayGroups<'a> {
    pub groups: BTreeMap<CalendarDay, Vec<&'a RawRecord>>,
    pub dropped: usize,
}

/// Group records by the calendar day of `timestamp_column`, applying `policy`
/// to rows without a usable timestamp.
pub(crate) fn group_by_day<'a>(
    kind: SourceKind,
    table: &'a RawTable,
    timestamp_column: &str,
    policy: InvalidDayPolicy,
) -> Result<DayGroups<'a>> {
    let mut groups: BTreeMap<CalendarDay, Vec<&RawRecord>> = BTreeMap::new();
    let mut dropped = 0;

    for (row, record) in table.records.iter().enumerate() {
        let raw = record.get(timestamp_column);
        let day = DateNormalizer::day_key(raw).unwrap_or(None);

        match (day, policy) {
            (Some(day), _) => groups.entry(day).or_default().push(record),
            (None, InvalidDayPolicy::Drop) => dropped += 1,
            (None, InvalidDayPolicy::Fail) => {
                return Err(MergeError::InvalidTimestamp {
                    source_kind: kind,
                    row: row + 1,
                    value: raw.map(str::to_string),
                });
            }
        }
    }

    if dropped > 0 {
        warn!(
            source = %kind,
            dropped,
            "dropped rows without a usable {:?} timestamp", timestamp_column
        );
    }

    Ok(DayGroups { groups, dropped })
}

/// Number of rows whose timestamp yields no calendar day
pub fn undated_rows(table: &RawTable, timestamp_column: &str) -> usize {
    table
        .records
        .iter()
        .filter(|r| !matches!(DateNormalizer::day_key(r.get(timestamp_column)), Ok(Some(_))))
        .count()
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::types::{RawRecord, RawTable};

    /// Build a table from CSV text, header first
    pub fn table(csv_text: &str) -> RawTable {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.trim().as_bytes());
        let columns: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let records = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                columns
                    .iter()
                    .zip(r.iter())
                    .map(|(c, v)| (c.clone(), v.to_string()))
                    .collect::<RawRecord>()
            })
            .collect();
        RawTable { columns, records }
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::table;
    use super::*;

    const CSV: &str = r#"
When,Value
2024-01-15 08:00:00,1
garbage,2
,3
2024-01-16 08:00:00,4
"#;

    #[test]
    fn test_drop_policy_discards_bad_rows() {
        let t = table(CSV);
        let groups = group_by_day(SourceKind::Concept2, &t, "When", InvalidDayPolicy::Drop).unwrap();

        assert_eq!(groups.dropped, 2);
        assert_eq!(groups.groups.len(), 2);
        assert!(groups.groups.values().all(|g| g.len() == 1));
    }

    #[test]
    fn test_fail_policy_reports_first_bad_row() {
        let t = table(CSV);
        let err = group_by_day(SourceKind::Concept2, &t, "When", InvalidDayPolicy::Fail)
            .err()
            .unwrap();

        match err {
            MergeError::InvalidTimestamp {
                source_kind,
                row,
                value,
            } => {
                assert_eq!(source_kind, SourceKind::Concept2);
                assert_eq!(row, 2);
                assert_eq!(value.as_deref(), Some("garbage"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_undated_rows_matches_drop_count() {
        let t = table(CSV);
        assert_eq!(undated_rows(&t, "When"), 2);
        assert_eq!(undated_rows(&t, "Missing"), t.len());
    }

    #[test]
    fn test_policy_serde() {
        let p: InvalidDayPolicy = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(p, InvalidDayPolicy::Fail);
        assert_eq!(InvalidDayPolicy::default(), InvalidDayPolicy::Drop);
    }
}
