//! Multi-source outer join on the calendar day
//!
//! The master table is a left fold of full outer joins over the per-source
//! daily tables. Column sets must be disjoint; values are never reconciled
//! across sources.

use std::collections::{BTreeSet, HashSet};
use tracing::info;

use crate::error::{MergeError, Result};
use crate::types::{Cell, DailyTable, MasterTable};

/// Full outer join of two day-keyed tables.
///
/// The result holds every day present in either operand; cells from the side
/// that lacks a day are null. Fails if the operands share a column name.
pub fn outer_join(left: &DailyTable, right: &DailyTable) -> Result<DailyTable> {
    let left_columns: HashSet<&str> = left.columns().iter().map(String::as_str).collect();
    if let Some(dup) = right
        .columns()
        .iter()
        .find(|c| left_columns.contains(c.as_str()))
    {
        return Err(MergeError::ColumnCollision(dup.clone()));
    }

    let columns: Vec<String> = left
        .columns()
        .iter()
        .chain(right.columns())
        .cloned()
        .collect();
    let days: BTreeSet<_> = left.days().chain(right.days()).collect();

    let left_nulls: Vec<Cell> = vec![None; left.columns().len()];
    let right_nulls: Vec<Cell> = vec![None; right.columns().len()];

    let mut joined = DailyTable::new(columns);
    for day in days {
        let mut cells: Vec<Cell> = Vec::with_capacity(joined.columns().len());
        cells.extend_from_slice(left.row(day).unwrap_or(left_nulls.as_slice()));
        cells.extend_from_slice(right.row(day).unwrap_or(right_nulls.as_slice()));
        joined.insert_row(day, cells);
    }

    Ok(joined)
}

/// Fold `tables` into one master table, in the order given
pub fn merge_all<I>(tables: I) -> Result<MasterTable>
where
    I: IntoIterator<Item = DailyTable>,
{
    let mut tables = tables.into_iter();
    let first = tables.next().unwrap_or_default();
    let master = tables.try_fold(first, |acc, next| outer_join(&acc, &next))?;

    info!(
        rows = master.len(),
        columns = master.columns().len(),
        "merged master table"
    );

    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CalendarDay;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(s: &str) -> CalendarDay {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn daily(columns: &[&str], rows: &[(&str, Vec<Cell>)]) -> DailyTable {
        let mut t = DailyTable::new(columns.iter().map(|c| c.to_string()).collect());
        for (d, cells) in rows {
            t.insert_row(day(d), cells.clone());
        }
        t
    }

    #[test]
    fn test_outer_join_keeps_unmatched_days() {
        let left = daily(
            &["c2_workouts"],
            &[("2024-01-01", vec![Some(1.0)]), ("2024-01-02", vec![Some(2.0)])],
        );
        let right = daily(
            &["whoop_workouts"],
            &[("2024-01-02", vec![Some(3.0)]), ("2024-01-03", vec![Some(4.0)])],
        );

        let joined = outer_join(&left, &right).unwrap();

        assert_eq!(joined.columns(), &["c2_workouts", "whoop_workouts"]);
        let rows: Vec<(CalendarDay, Vec<Cell>)> =
            joined.rows().map(|(d, c)| (d, c.to_vec())).collect();
        assert_eq!(
            rows,
            vec![
                (day("2024-01-01"), vec![Some(1.0), None]),
                (day("2024-01-02"), vec![Some(2.0), Some(3.0)]),
                (day("2024-01-03"), vec![None, Some(4.0)]),
            ]
        );
    }

    #[test]
    fn test_colliding_columns_are_rejected() {
        let left = daily(&["whoop_avg_hr"], &[("2024-01-01", vec![Some(1.0)])]);
        let right = daily(&["whoop_avg_hr"], &[("2024-01-01", vec![Some(2.0)])]);

        let err = outer_join(&left, &right).unwrap_err();
        assert!(matches!(err, MergeError::ColumnCollision(ref c) if c == "whoop_avg_hr"));
    }

    #[test]
    fn test_merge_day_set_is_union_and_sorted() {
        let tables = vec![
            daily(&["a"], &[("2024-01-05", vec![Some(1.0)])]),
            daily(&["b"], &[("2024-01-01", vec![Some(1.0)])]),
            daily(&["c"], &[]),
            daily(&["d"], &[("2024-01-03", vec![Some(1.0)]), ("2024-01-05", vec![None])]),
            daily(&["e"], &[("2023-12-31", vec![Some(9.0)])]),
        ];

        let master = merge_all(tables).unwrap();

        let days: Vec<_> = master.days().collect();
        assert_eq!(
            days,
            vec![
                day("2023-12-31"),
                day("2024-01-01"),
                day("2024-01-03"),
                day("2024-01-05"),
            ]
        );
        assert!(days.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(master.columns(), &["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_single_source_day_has_nulls_elsewhere() {
        let tables = vec![
            daily(&["c2_workouts"], &[("2024-01-02", vec![Some(1.0)])]),
            daily(&["apple_steps"], &[("2024-01-01", vec![Some(8000.0)])]),
        ];
        let master = merge_all(tables).unwrap();

        let d0 = day("2024-01-01");
        assert_eq!(master.value(d0, "apple_steps"), Some(8000.0));
        assert_eq!(master.value(d0, "c2_workouts"), None);
        assert!(master.contains_day(d0));
    }

    #[test]
    fn test_join_order_does_not_change_values() {
        let a = daily(&["a"], &[("2024-01-01", vec![Some(1.0)])]);
        let b = daily(&["b"], &[("2024-01-02", vec![Some(2.0)])]);

        let ab = outer_join(&a, &b).unwrap();
        let ba = outer_join(&b, &a).unwrap();

        for d in ab.days() {
            for column in ["a", "b"] {
                assert_eq!(ab.value(d, column), ba.value(d, column));
            }
        }
        assert_eq!(ab.days().collect::<Vec<_>>(), ba.days().collect::<Vec<_>>());
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        let master = merge_all(Vec::new()).unwrap();
        assert!(master.is_empty());
        assert!(master.columns().is_empty());
    }
}
