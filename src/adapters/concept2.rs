//! Concept2 logbook adapter
//!
//! The logbook export has one row per rowing session. Sessions are grouped by
//! the day of their `Date` column.

use crate::reducer::{FieldSpec, Reducer, SourceSpec};
use crate::types::SourceKind;

const CONCEPT2_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("workouts", "Log ID", Reducer::Count),
    FieldSpec::new("distance_m", "Work Distance", Reducer::Sum),
    FieldSpec::new("work_time_s", "Work Time (Seconds)", Reducer::Sum),
    FieldSpec::new("avg_watts", "Avg Watts", Reducer::Mean),
    FieldSpec::new("avg_hr", "Avg Heart Rate", Reducer::Mean),
    FieldSpec::new("total_cal", "Total Cal", Reducer::Sum),
];

/// Declared layout of the Concept2 logbook export
pub const CONCEPT2_SPEC: SourceSpec = SourceSpec {
    kind: SourceKind::Concept2,
    timestamp_column: "Date",
    fields: CONCEPT2_FIELDS,
};
