//! fitmerge - Daily consolidation of personal fitness exports
//!
//! fitmerge turns five independently produced exports (a Concept2 rowing
//! logbook, three WHOOP files and a Health Auto Export CSV) into one table with
//! exactly one row per calendar day through a deterministic pipeline:
//! read → normalize timestamps → aggregate per day → outer-join → encode.
//!
//! ## Modules
//!
//! - **Aggregation**: per-source reduction to daily rows ([`adapters`], [`reducer`])
//! - **Merge**: day-keyed full outer join into the master table ([`merge`])
//! - **I/O**: CSV loading and CSV/JSON output ([`reader`], [`encoder`])

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod merge;
pub mod normalizer;
pub mod pipeline;
pub mod reader;
pub mod reducer;
pub mod types;

pub use adapters::{InvalidDayPolicy, SourceAggregator};
pub use config::{MergeConfig, SourcePaths};
pub use encoder::{OutputFormat, TableEncoder};
pub use error::{MergeError, Result};
pub use pipeline::{
    build_master_table, check_sources, load_sources, run, PipelineOptions, RunSummary,
    SourceInputs,
};
pub use reducer::Reducer;
pub use types::{CalendarDay, Cell, DailyTable, MasterTable, RawRecord, RawTable, SourceKind};

/// fitmerge version
pub const FITMERGE_VERSION: &str = env!("CARGO_PKG_VERSION");
