//! WHOOP export adapters
//!
//! The WHOOP data export ships three CSV files that share the `whoop_` prefix:
//! workouts, physiological cycles and sleeps. Their output column names are
//! disjoint so the three can sit side by side in the master table.

use crate::reducer::{FieldSpec, Reducer, SourceSpec};
use crate::types::SourceKind;

const WORKOUT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("workouts", "Workout start time", Reducer::Count),
    FieldSpec::new("duration_min", "Duration (min)", Reducer::Sum),
    FieldSpec::new("activity_strain", "Activity Strain", Reducer::Sum),
    FieldSpec::new("energy_cal", "Energy burned (cal)", Reducer::Sum),
    FieldSpec::new("avg_hr", "Average HR (bpm)", Reducer::Mean),
    FieldSpec::new("max_hr", "Max HR (bpm)", Reducer::Max),
];

/// Declared layout of `workouts.csv`
pub const WHOOP_WORKOUTS_SPEC: SourceSpec = SourceSpec {
    kind: SourceKind::WhoopWorkouts,
    timestamp_column: "Workout start time",
    fields: WORKOUT_FIELDS,
};

// One cycle per day is the normal case; mean tolerates duplicates.
const CYCLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("recovery_pct", "Recovery score %", Reducer::Mean),
    FieldSpec::new("rhr_bpm", "Resting heart rate (bpm)", Reducer::Mean),
    FieldSpec::new("hrv_ms", "Heart rate variability (ms)", Reducer::Mean),
    FieldSpec::new("skin_temp_c", "Skin temp (celsius)", Reducer::Mean),
    FieldSpec::new("blood_oxygen_pct", "Blood oxygen %", Reducer::Mean),
    FieldSpec::new("day_strain", "Day Strain", Reducer::Mean),
    FieldSpec::new("day_energy_cal", "Energy burned (cal)", Reducer::Mean),
    FieldSpec::new("sleep_performance_pct", "Sleep performance %", Reducer::Mean),
    FieldSpec::new("sleep_efficiency_pct", "Sleep efficiency %", Reducer::Mean),
];

/// Declared layout of `physiological_cycles.csv`
pub const WHOOP_CYCLES_SPEC: SourceSpec = SourceSpec {
    kind: SourceKind::WhoopCycles,
    timestamp_column: "Cycle start time",
    fields: CYCLE_FIELDS,
};

const SLEEP_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("asleep_min", "Asleep duration (min)", Reducer::Sum),
    FieldSpec::new("in_bed_min", "In bed duration (min)", Reducer::Sum),
    FieldSpec::new("light_sleep_min", "Light sleep duration (min)", Reducer::Sum),
    FieldSpec::new("deep_sleep_min", "Deep (SWS) duration (min)", Reducer::Sum),
    FieldSpec::new("rem_sleep_min", "REM duration (min)", Reducer::Sum),
    FieldSpec::new("awake_min", "Awake duration (min)", Reducer::Sum),
    FieldSpec::new("sleep_need_min", "Sleep need (min)", Reducer::Mean),
    FieldSpec::new("sleep_debt_min", "Sleep debt (min)", Reducer::Mean),
];

/// Declared layout of `sleeps.csv`
///
/// A sleep belongs to the day the sleeper wakes on, so the key is `Wake onset`.
pub const WHOOP_SLEEPS_SPEC: SourceSpec = SourceSpec {
    kind: SourceKind::WhoopSleeps,
    timestamp_column: "Wake onset",
    fields: SLEEP_FIELDS,
};
