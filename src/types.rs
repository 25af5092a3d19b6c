//! Core types for the fitmerge pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw source tables, per-source daily tables, and the master table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Calendar date used as the grouping and join key
pub type CalendarDay = NaiveDate;

/// One reduced value; `None` is a null cell
pub type Cell = Option<f64>;

/// The five export shapes consolidated by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Concept2 logbook export (rowing ergometer)
    Concept2,
    /// WHOOP workouts export
    WhoopWorkouts,
    /// WHOOP physiological cycles export
    WhoopCycles,
    /// WHOOP sleeps export
    WhoopSleeps,
    /// Apple Health (Health Auto Export) general export
    AppleHealth,
}

impl SourceKind {
    /// All sources in merge order
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Concept2,
        SourceKind::WhoopWorkouts,
        SourceKind::WhoopCycles,
        SourceKind::WhoopSleeps,
        SourceKind::AppleHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Concept2 => "concept2",
            SourceKind::WhoopWorkouts => "whoop_workouts",
            SourceKind::WhoopCycles => "whoop_cycles",
            SourceKind::WhoopSleeps => "whoop_sleeps",
            SourceKind::AppleHealth => "apple_health",
        }
    }

    /// Column prefix applied to every output column of this source
    pub fn prefix(&self) -> &'static str {
        match self {
            SourceKind::Concept2 => "c2_",
            SourceKind::WhoopWorkouts | SourceKind::WhoopCycles | SourceKind::WhoopSleeps => {
                "whoop_"
            }
            SourceKind::AppleHealth => "apple_",
        }
    }

    /// File name the export tool writes by default
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceKind::Concept2 => "concept2-season-2026-2.csv",
            SourceKind::WhoopWorkouts => "workouts.csv",
            SourceKind::WhoopCycles => "physiological_cycles.csv",
            SourceKind::WhoopSleeps => "sleeps.csv",
            SourceKind::AppleHealth => "Export.csv",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a source file, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Raw cell text, exactly as read
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Trimmed cell text; empty cells read as absent
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Cell parsed as a number; empty and non-numeric cells read as absent
    pub fn number(&self, column: &str) -> Option<f64> {
        self.value(column).and_then(parse_number)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A source file loaded into memory: ordered header plus rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Day-keyed table with one row per calendar day
///
/// Used both for a single source's daily aggregate and for the merged master
/// table. Rows are held in a `BTreeMap`, so iteration is always ascending by
/// day and a day can never appear twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyTable {
    columns: Vec<String>,
    rows: BTreeMap<CalendarDay, Vec<Cell>>,
}

/// The merged output of all sources
pub type MasterTable = DailyTable;

impl DailyTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Insert or replace the row for `day`
    ///
    /// Short rows are padded with nulls; extra cells are discarded.
    pub fn insert_row(&mut self, day: CalendarDay, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), None);
        self.rows.insert(day, cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Days present in the table, ascending
    pub fn days(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.rows.keys().copied()
    }

    /// Rows in ascending day order
    pub fn rows(&self) -> impl Iterator<Item = (CalendarDay, &[Cell])> + '_ {
        self.rows.iter().map(|(day, cells)| (*day, cells.as_slice()))
    }

    pub fn row(&self, day: CalendarDay) -> Option<&[Cell]> {
        self.rows.get(&day).map(Vec::as_slice)
    }

    /// Value of `column` on `day`; `None` when the day, the column or the value is absent
    pub fn value(&self, day: CalendarDay, column: &str) -> Cell {
        let idx = self.column_index(column)?;
        self.rows.get(&day).and_then(|cells| cells[idx])
    }

    pub fn contains_day(&self, day: CalendarDay) -> bool {
        self.rows.contains_key(&day)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
