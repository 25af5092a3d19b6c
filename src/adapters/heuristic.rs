//! Heuristic-schema aggregator
//!
//! For exports whose column set depends on how the export was configured.
//! Every column other than the timestamp is reduced per day; the reducer is
//! picked once per column, from its name alone:
//! 1. an explicitly declared reducer, if the column is in the declared table
//! 2. otherwise the name heuristic: duration-like names sum, the rest average

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{MergeError, Result};
use crate::reducer::Reducer;
use crate::types::{Cell, DailyTable, RawTable, SourceKind};

use super::{group_by_day, InvalidDayPolicy, SourceAggregator};

/// Name fragments that mark a column as a duration
const DURATION_MARKERS: &[&str] = &["time ", " duration", "(hr)", "(min)"];

/// Classify a column by name: sum for duration-like columns, mean otherwise
pub fn classify_by_name(column: &str) -> Reducer {
    let lower = column.to_lowercase();
    if DURATION_MARKERS.iter().any(|m| lower.contains(m)) {
        Reducer::Sum
    } else {
        Reducer::Mean
    }
}

/// Where a column's reducer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOrigin {
    Declared,
    Heuristic,
}

/// Reducer chosen for one input column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnClassification {
    pub column: String,
    pub output: String,
    pub reducer: Reducer,
    pub origin: ClassificationOrigin,
}

/// Aggregator for sources with an open column set
#[derive(Debug, Clone)]
pub struct HeuristicSchemaAggregator {
    kind: SourceKind,
    timestamp_column: String,
    declared: BTreeMap<String, Reducer>,
}

impl HeuristicSchemaAggregator {
    pub fn new(kind: SourceKind, timestamp_column: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp_column: timestamp_column.into(),
            declared: BTreeMap::new(),
        }
    }

    /// Add declared reducers; later entries replace earlier ones
    pub fn with_declared<I, S>(mut self, declared: I) -> Self
    where
        I: IntoIterator<Item = (S, Reducer)>,
        S: Into<String>,
    {
        self.declared
            .extend(declared.into_iter().map(|(c, r)| (c.into(), r)));
        self
    }

    /// Classify one column
    pub fn classify(&self, column: &str) -> ColumnClassification {
        let (reducer, origin) = match self.declared.get(column) {
            Some(r) => (*r, ClassificationOrigin::Declared),
            None => (classify_by_name(column), ClassificationOrigin::Heuristic),
        };
        ColumnClassification {
            column: column.to_string(),
            output: format!("{}{}", self.kind.prefix(), column),
            reducer,
            origin,
        }
    }

    /// Classify every value column of `columns`, in order
    pub fn classifications(&self, columns: &[String]) -> Vec<ColumnClassification> {
        columns
            .iter()
            .filter(|c| **c != self.timestamp_column)
            .map(|c| self.classify(c))
            .collect()
    }
}

impl SourceAggregator for HeuristicSchemaAggregator {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    fn aggregate(&self, table: &RawTable, policy: InvalidDayPolicy) -> Result<DailyTable> {
        if !table.has_column(&self.timestamp_column) {
            return Err(MergeError::Schema {
                source_kind: self.kind,
                field: self.timestamp_column.clone(),
            });
        }

        let plan = self.classifications(&table.columns);
        for c in &plan {
            debug!(
                source = %self.kind,
                column = %c.column,
                reducer = %c.reducer,
                origin = ?c.origin,
                "classified column"
            );
        }

        let grouped = group_by_day(self.kind, table, &self.timestamp_column, policy)?;
        let mut daily = DailyTable::new(plan.iter().map(|c| c.output.clone()).collect());

        for (day, records) in grouped.groups {
            let cells: Vec<Cell> = plan
                .iter()
                .map(|c| {
                    let values: Vec<f64> =
                        records.iter().filter_map(|r| r.number(&c.column)).collect();
                    c.reducer.apply(records.len(), &values)
                })
                .collect();
            daily.insert_row(day, cells);
        }

        info!(
            source = %self.kind,
            rows = table.len(),
            columns = plan.len(),
            days = daily.len(),
            dropped = grouped.dropped,
            "aggregated source"
        );

        Ok(daily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_util::table;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_name_heuristic() {
        assert_eq!(classify_by_name("Apple Exercise Time (min)"), Reducer::Sum);
        assert_eq!(classify_by_name("Sleep Analysis [Asleep] (hr)"), Reducer::Sum);
        assert_eq!(classify_by_name("Mindful Time (min)"), Reducer::Sum);
        assert_eq!(classify_by_name("Walking Speed (mi/hr)"), Reducer::Mean);
        assert_eq!(classify_by_name("Workout Duration (s)"), Reducer::Sum);
        assert_eq!(classify_by_name("Heart Rate [Avg] (count/min)"), Reducer::Mean);
        assert_eq!(classify_by_name("Heart Rate Variability (ms)"), Reducer::Mean);
    }

    #[test]
    fn test_classification_depends_on_name_only() {
        let agg = HeuristicSchemaAggregator::new(SourceKind::AppleHealth, "Date");
        let first = table("Date,Stand Time (min)\n2024-01-15 08:00:00,5");
        let second = table("Date,Stand Time (min)\n2024-01-15 08:00:00,not numeric");

        assert_eq!(
            agg.classifications(&first.columns),
            agg.classifications(&second.columns)
        );
    }

    #[test]
    fn test_declared_reducer_wins_over_heuristic() {
        let agg = HeuristicSchemaAggregator::new(SourceKind::AppleHealth, "Date")
            .with_declared([("Step Count (count)", Reducer::Sum)]);

        let declared = agg.classify("Step Count (count)");
        assert_eq!(declared.reducer, Reducer::Sum);
        assert_eq!(declared.origin, ClassificationOrigin::Declared);
        assert_eq!(declared.output, "apple_Step Count (count)");

        let fallback = agg.classify("Resting Heart Rate (count/min)");
        assert_eq!(fallback.reducer, Reducer::Mean);
        assert_eq!(fallback.origin, ClassificationOrigin::Heuristic);
    }

    #[test]
    fn test_aggregates_ranges_and_drops_bad_dates() {
        let export = table(
            r#"
Date,Heart Rate [Avg] (count/min),Apple Stand Time (min)
2025-11-16 00:00:46 - 2025-11-16 00:01:46,60,1
2025-11-16 00:07:48,80,2
,70,100
2025-11-17 09:00:00,55,
"#,
        );
        let agg = HeuristicSchemaAggregator::new(SourceKind::AppleHealth, "Date");
        let daily = agg.aggregate(&export, InvalidDayPolicy::Drop).unwrap();

        assert_eq!(
            daily.columns(),
            &[
                "apple_Heart Rate [Avg] (count/min)",
                "apple_Apple Stand Time (min)"
            ]
        );
        assert_eq!(daily.len(), 2);
        assert_eq!(
            daily.row(day("2025-11-16")),
            Some(&[Some(70.0), Some(3.0)][..])
        );
        assert_eq!(
            daily.row(day("2025-11-17")),
            Some(&[Some(55.0), None][..])
        );
    }

    #[test]
    fn test_sum_is_additive_per_day() {
        let mut full = table(
            r#"
Date,Apple Exercise Time (min),Step Count (count)
2025-11-16 07:00:00,12,3000
2025-11-16 12:30:00 - 2025-11-16 12:45:00,15,1500
2025-11-16 18:00:00,20,2500
2025-11-17 08:00:00,5,900
"#,
        );
        let agg = HeuristicSchemaAggregator::new(SourceKind::AppleHealth, "Date")
            .with_declared([("Step Count (count)", Reducer::Sum)]);
        let before = agg.aggregate(&full, InvalidDayPolicy::Drop).unwrap();

        full.records.remove(1);
        let after = agg.aggregate(&full, InvalidDayPolicy::Drop).unwrap();

        let d = day("2025-11-16");
        for (column, removed) in [
            ("apple_Apple Exercise Time (min)", 15.0),
            ("apple_Step Count (count)", 1500.0),
        ] {
            assert_eq!(
                before.value(d, column).unwrap() - after.value(d, column).unwrap(),
                removed,
                "{column}"
            );
        }
        assert_eq!(
            before.row(day("2025-11-17")),
            after.row(day("2025-11-17"))
        );
    }

    #[test]
    fn test_missing_timestamp_column_is_schema_error() {
        let export = table("When,Steps\n2025-11-16 00:00:00,5");
        let err = HeuristicSchemaAggregator::new(SourceKind::AppleHealth, "Date")
            .aggregate(&export, InvalidDayPolicy::Drop)
            .unwrap_err();
        assert!(matches!(err, MergeError::Schema { .. }));
    }
}
