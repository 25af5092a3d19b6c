//! Daily reducers and declared reducer specs
//!
//! A reducer folds every value of one field within one day's group into a
//! single cell. Missing values are skipped; a group with nothing to reduce
//! yields a null cell rather than zero. `count` is the exception: it counts
//! rows, whatever the field holds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Cell, SourceKind};

/// Aggregation applied to one field within one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Count,
    Sum,
    Mean,
    Max,
}

impl Reducer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reducer::Count => "count",
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Max => "max",
        }
    }

    /// Reduce one day's group.
    ///
    /// `rows` is the number of records in the group and `values` the numeric
    /// values present for the field.
    pub fn apply(&self, rows: usize, values: &[f64]) -> Cell {
        match self {
            Reducer::Count => Some(rows as f64),
            _ if values.is_empty() => None,
            Reducer::Sum => Some(values.iter().sum()),
            Reducer::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Reducer::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared output column: source field reduced by a reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output column name without the source prefix
    pub output: &'static str,
    /// Column in the source file
    pub field: &'static str,
    pub reducer: Reducer,
}

impl FieldSpec {
    pub const fn new(output: &'static str, field: &'static str, reducer: Reducer) -> Self {
        Self {
            output,
            field,
            reducer,
        }
    }
}

/// Declared layout of a fixed-schema source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec {
    pub kind: SourceKind,
    /// Column the calendar day is derived from
    pub timestamp_column: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SourceSpec {
    /// Prefixed output column names, in declaration order
    pub fn output_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| format!("{}{}", self.kind.prefix(), f.output))
            .collect()
    }

    /// Source columns the file must provide
    pub fn required_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.timestamp_column).chain(self.fields.iter().map(|f| f.field))
    }
}
