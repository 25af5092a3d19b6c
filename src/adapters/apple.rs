//! Apple Health adapter
//!
//! Health Auto Export writes one `Date` column (a single instant or a
//! `start - end` range) followed by whichever metrics the user selected.
//! Columns named in the configured reducer table use that reducer; every
//! other column falls back to the name heuristic.

use std::collections::BTreeMap;

use crate::reducer::Reducer;
use crate::types::SourceKind;

use super::HeuristicSchemaAggregator;

/// Timestamp column of the Health Auto Export CSV
pub const APPLE_TIMESTAMP_COLUMN: &str = "Date";

/// Aggregator for the Apple Health export.
///
/// `declared` comes from configuration; an empty table classifies every
/// column by name.
pub fn apple_health_aggregator(declared: &BTreeMap<String, Reducer>) -> HeuristicSchemaAggregator {
    HeuristicSchemaAggregator::new(SourceKind::AppleHealth, APPLE_TIMESTAMP_COLUMN)
        .with_declared(declared.iter().map(|(c, r)| (c.clone(), *r)))
}
