//! Pipeline orchestration
//!
//! This module provides the public API for fitmerge. It runs the full
//! pipeline from five export files to one master table:
//!
//! 1. Reader - load each export into a [`RawTable`]
//! 2. SourceAggregator - reduce each table to one row per calendar day
//! 3. Merge - outer-join the daily tables on the day key
//! 4. TableEncoder - write the master table
//!
//! [`build_master_table`] covers stages 2 and 3 and never touches the
//! filesystem; [`run`] wraps it with loading and writing.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::adapters::{
    apple_health_aggregator, undated_rows, FixedSchemaAggregator, InvalidDayPolicy,
    SourceAggregator, CONCEPT2_SPEC, WHOOP_CYCLES_SPEC, WHOOP_SLEEPS_SPEC, WHOOP_WORKOUTS_SPEC,
};
use crate::config::{MergeConfig, SourcePaths};
use crate::encoder::{OutputFormat, TableEncoder};
use crate::error::Result;
use crate::merge::merge_all;
use crate::reader::read_source;
use crate::reducer::Reducer;
use crate::types::{DailyTable, MasterTable, RawTable, SourceKind};

/// The five exports, already loaded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceInputs {
    pub concept2: RawTable,
    pub whoop_workouts: RawTable,
    pub whoop_cycles: RawTable,
    pub whoop_sleeps: RawTable,
    pub apple_health: RawTable,
}

impl SourceInputs {
    pub fn get(&self, kind: SourceKind) -> &RawTable {
        match kind {
            SourceKind::Concept2 => &self.concept2,
            SourceKind::WhoopWorkouts => &self.whoop_workouts,
            SourceKind::WhoopCycles => &self.whoop_cycles,
            SourceKind::WhoopSleeps => &self.whoop_sleeps,
            SourceKind::AppleHealth => &self.apple_health,
        }
    }
}

/// Aggregation knobs shared by every source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub invalid_day_policy: InvalidDayPolicy,
    pub apple_reducers: BTreeMap<String, Reducer>,
}

impl From<&MergeConfig> for PipelineOptions {
    fn from(config: &MergeConfig) -> Self {
        Self {
            invalid_day_policy: config.invalid_day_policy,
            apple_reducers: config.apple_reducers.clone(),
        }
    }
}

/// Per-source counts for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: SourceKind,
    pub rows: usize,
    pub days: usize,
    pub dropped_rows: usize,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
    pub master_rows: usize,
    pub master_columns: usize,
    /// `None` when the table went to a caller-supplied writer
    pub output: Option<PathBuf>,
}

/// Availability and schema conformance of one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCheck {
    pub source: SourceKind,
    pub path: PathBuf,
    pub available: bool,
    pub rows: Option<usize>,
    pub days: Option<usize>,
    pub error: Option<String>,
}

impl SourceCheck {
    pub fn is_ok(&self) -> bool {
        self.available && self.error.is_none()
    }
}

/// Aggregators for every source, in merge order
pub fn aggregators(options: &PipelineOptions) -> Vec<Box<dyn SourceAggregator>> {
    vec![
        Box::new(FixedSchemaAggregator::new(CONCEPT2_SPEC)),
        Box::new(FixedSchemaAggregator::new(WHOOP_WORKOUTS_SPEC)),
        Box::new(FixedSchemaAggregator::new(WHOOP_CYCLES_SPEC)),
        Box::new(FixedSchemaAggregator::new(WHOOP_SLEEPS_SPEC)),
        Box::new(apple_health_aggregator(&options.apple_reducers)),
    ]
}

/// Aggregate every source and merge the results into the master table.
///
/// Pure: no file is read or written.
pub fn build_master_table(inputs: &SourceInputs, options: &PipelineOptions) -> Result<MasterTable> {
    build_with_summary(inputs, options).map(|(master, _)| master)
}

fn build_with_summary(
    inputs: &SourceInputs,
    options: &PipelineOptions,
) -> Result<(MasterTable, Vec<SourceSummary>)> {
    let mut dailies: Vec<DailyTable> = Vec::with_capacity(SourceKind::ALL.len());
    let mut summaries = Vec::with_capacity(SourceKind::ALL.len());

    for aggregator in aggregators(options) {
        let table = inputs.get(aggregator.kind());
        let daily = aggregator.aggregate(table, options.invalid_day_policy)?;

        summaries.push(SourceSummary {
            source: aggregator.kind(),
            rows: table.len(),
            days: daily.len(),
            dropped_rows: undated_rows(table, aggregator.timestamp_column()),
        });
        dailies.push(daily);
    }

    let master = merge_all(dailies)?;
    Ok((master, summaries))
}

/// Load all five exports. The first unreadable file aborts the load.
pub fn load_sources(paths: &SourcePaths) -> Result<SourceInputs> {
    Ok(SourceInputs {
        concept2: read_source(SourceKind::Concept2, &paths.concept2)?,
        whoop_workouts: read_source(SourceKind::WhoopWorkouts, &paths.whoop_workouts)?,
        whoop_cycles: read_source(SourceKind::WhoopCycles, &paths.whoop_cycles)?,
        whoop_sleeps: read_source(SourceKind::WhoopSleeps, &paths.whoop_sleeps)?,
        apple_health: read_source(SourceKind::AppleHealth, &paths.apple_health)?,
    })
}

/// Load, merge and write the master table to `config.output`.
///
/// The table is encoded in memory first; nothing is written unless every
/// source loads, aggregates and encodes.
pub fn run(config: &MergeConfig) -> Result<RunSummary> {
    let (master, sources) = build_from_config(config)?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut encoded = Vec::new();
    TableEncoder::write(&master, config.output_format, &mut encoded)?;
    fs::write(&config.output, encoded)?;

    info!(
        rows = master.len(),
        path = %config.output.display(),
        "saved master table"
    );

    Ok(summarize(&master, sources, Some(config.output.clone())))
}

/// Load and merge as configured, writing the master table to `writer` in `format`
pub fn merge_to_writer<W: Write>(
    config: &MergeConfig,
    mut writer: W,
    format: OutputFormat,
) -> Result<RunSummary> {
    let (master, sources) = build_from_config(config)?;

    TableEncoder::write(&master, format, &mut writer)?;
    writer.flush()?;

    Ok(summarize(&master, sources, None))
}

fn build_from_config(config: &MergeConfig) -> Result<(MasterTable, Vec<SourceSummary>)> {
    let inputs = load_sources(&config.sources)?;
    build_with_summary(&inputs, &PipelineOptions::from(config))
}

fn summarize(master: &MasterTable, sources: Vec<SourceSummary>, output: Option<PathBuf>) -> RunSummary {
    RunSummary {
        sources,
        master_rows: master.len(),
        master_columns: master.columns().len(),
        output,
    }
}

/// Check that every source file exists and matches its expected layout
pub fn check_sources(paths: &SourcePaths, options: &PipelineOptions) -> Vec<SourceCheck> {
    aggregators(options)
        .iter()
        .map(|aggregator| check_source(aggregator.as_ref(), paths.get(aggregator.kind()), options))
        .collect()
}

fn check_source(
    aggregator: &dyn SourceAggregator,
    path: &Path,
    options: &PipelineOptions,
) -> SourceCheck {
    let mut check = SourceCheck {
        source: aggregator.kind(),
        path: path.to_path_buf(),
        available: false,
        rows: None,
        days: None,
        error: None,
    };

    let table = match read_source(aggregator.kind(), path) {
        Ok(table) => table,
        Err(e) => {
            check.error = Some(e.to_string());
            return check;
        }
    };
    check.available = true;
    check.rows = Some(table.len());

    match aggregator.aggregate(&table, options.invalid_day_policy) {
        Ok(daily) => check.days = Some(daily.len()),
        Err(e) => check.error = Some(e.to_string()),
    }

    check
}
