//! Error types for fitmerge

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SourceKind;

/// Errors that can occur while loading, aggregating or merging sources
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Source {source_kind} unavailable at {}: {io}", path.display())]
    SourceUnavailable {
        source_kind: SourceKind,
        path: PathBuf,
        #[source]
        io: std::io::Error,
    },

    #[error("Source {source_kind} is missing declared column: {field}")]
    Schema {
        source_kind: SourceKind,
        field: String,
    },

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Source {source_kind} row {row} has no usable timestamp: {value:?}")]
    InvalidTimestamp {
        source_kind: SourceKind,
        row: usize,
        value: Option<String>,
    },

    #[error("Column appears in more than one source table: {0}")]
    ColumnCollision(String),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, MergeError>;
