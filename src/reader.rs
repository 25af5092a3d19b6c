//! Delimited-file loading
//!
//! Reads an export CSV into a [`RawTable`]. Rows shorter than the header are
//! padded with empty cells; extra trailing cells are ignored.

use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::types::{RawRecord, RawTable, SourceKind};

/// Load the export file for `kind` from `path`.
///
/// A file that cannot be opened is reported as [`MergeError::SourceUnavailable`].
pub fn read_source(kind: SourceKind, path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|io| MergeError::SourceUnavailable {
        source_kind: kind,
        path: path.to_path_buf(),
        io,
    })?;
    let table = read_table(file)?;

    debug!(
        source = %kind,
        path = %path.display(),
        rows = table.len(),
        columns = table.columns.len(),
        "loaded source"
    );

    Ok(table)
}

/// Read CSV with a header row from any reader
pub fn read_table<R: Read>(input: R) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();
    let columns = dedupe_headers(headers);

    let mut table = RawTable::new(columns);
    for record in reader.records() {
        let record = record?;
        let mut row = RawRecord::new();
        for (i, column) in table.columns.iter().enumerate() {
            row.insert(column.as_str(), record.get(i).unwrap_or(""));
        }
        table.records.push(row);
    }

    Ok(table)
}

/// Suffix repeated header names with `.1`, `.2`, ... so every column stays addressable
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .map(|h| {
            let mut name = h.clone();
            let mut n = 0;
            while !seen.insert(name.clone()) {
                n += 1;
                name = format!("{h}.{n}");
            }
            name
        })
        .collect()
}
