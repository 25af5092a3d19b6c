//! Master table encoding
//!
//! Serializes the master table as CSV (the default), a JSON array, or NDJSON.
//! Every format carries a leading `date` field followed by the master columns
//! in order; null cells are empty in CSV and `null` in JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;

use crate::error::Result;
use crate::types::{Cell, MasterTable};

/// Name of the day-key column in every output format
pub const DATE_COLUMN: &str = "date";

const DATE_FORMAT: &str = "%Y-%m-%d";

// Integers beyond this are not exactly representable in f64
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Output format for the master table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    JsonPretty,
    Ndjson,
}

/// Encoder for the master table
pub struct TableEncoder;

impl TableEncoder {
    /// Write `table` to `writer` in `format`
    pub fn write<W: Write>(table: &MasterTable, format: OutputFormat, mut writer: W) -> Result<()> {
        match format {
            OutputFormat::Csv => Self::write_csv(table, writer),
            OutputFormat::Json => {
                serde_json::to_writer(&mut writer, &Self::json_rows(table))?;
                writeln!(writer)?;
                Ok(())
            }
            OutputFormat::JsonPretty => {
                serde_json::to_writer_pretty(&mut writer, &Self::json_rows(table))?;
                writeln!(writer)?;
                Ok(())
            }
            OutputFormat::Ndjson => {
                for row in Self::json_rows(table) {
                    serde_json::to_writer(&mut writer, &row)?;
                    writeln!(writer)?;
                }
                Ok(())
            }
        }
    }

    /// Encode `table` into a string
    pub fn encode(table: &MasterTable, format: OutputFormat) -> Result<String> {
        let mut buf = Vec::new();
        Self::write(table, format, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write `table` as CSV with a `date` header column
    pub fn write_csv<W: Write>(table: &MasterTable, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);

        let header = std::iter::once(DATE_COLUMN).chain(table.columns().iter().map(String::as_str));
        out.write_record(header)?;
        for (day, cells) in table.rows() {
            let mut record = Vec::with_capacity(cells.len() + 1);
            record.push(day.format(DATE_FORMAT).to_string());
            record.extend(cells.iter().map(|c| format_cell(*c)));
            out.write_record(&record)?;
        }
        out.flush()?;

        Ok(())
    }

    /// One JSON object per day, keys in column order
    pub fn json_rows(table: &MasterTable) -> Vec<Map<String, Value>> {
        table
            .rows()
            .map(|(day, cells)| {
                let mut row = Map::new();
                row.insert(
                    DATE_COLUMN.to_string(),
                    Value::String(day.format(DATE_FORMAT).to_string()),
                );
                for (column, cell) in table.columns().iter().zip(cells) {
                    row.insert(column.clone(), cell_to_json(*cell));
                }
                row
            })
            .collect()
    }
}

/// CSV text for one cell: empty for null, shortest round-trip decimal otherwise
pub fn format_cell(cell: Cell) -> String {
    match cell {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn cell_to_json(cell: Cell) -> Value {
    match cell {
        Some(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT_INT => Value::from(v as i64),
        Some(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}
