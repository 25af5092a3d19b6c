//! Fixed-schema aggregator
//!
//! One parameterized aggregator serves every source whose columns are known in
//! advance. The source is described entirely by its [`SourceSpec`].

use tracing::{debug, info};

use crate::error::{MergeError, Result};
use crate::reducer::SourceSpec;
use crate::types::{Cell, DailyTable, RawTable, SourceKind};

use super::{group_by_day, InvalidDayPolicy, SourceAggregator};

/// Aggregator driven by a declared field→reducer spec
#[derive(Debug, Clone, Copy)]
pub struct FixedSchemaAggregator {
    spec: SourceSpec,
}

impl FixedSchemaAggregator {
    pub const fn new(spec: SourceSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    /// Fail with a schema error on the first declared column the table lacks
    pub fn check_schema(&self, table: &RawTable) -> Result<()> {
        match self.spec.required_columns().find(|c| !table.has_column(c)) {
            Some(missing) => Err(MergeError::Schema {
                source_kind: self.spec.kind,
                field: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl SourceAggregator for FixedSchemaAggregator {
    fn kind(&self) -> SourceKind {
        self.spec.kind
    }

    fn timestamp_column(&self) -> &str {
        self.spec.timestamp_column
    }

    fn aggregate(&self, table: &RawTable, policy: InvalidDayPolicy) -> Result<DailyTable> {
        self.check_schema(table)?;

        let grouped = group_by_day(self.spec.kind, table, self.spec.timestamp_column, policy)?;
        let mut daily = DailyTable::new(self.spec.output_columns());
        let mut unparsed = 0usize;

        for (day, records) in grouped.groups {
            let cells: Vec<Cell> = self
                .spec
                .fields
                .iter()
                .map(|field| {
                    let values: Vec<f64> = records
                        .iter()
                        .filter_map(|r| {
                            let n = r.number(field.field);
                            if n.is_none() && r.value(field.field).is_some() {
                                unparsed += 1;
                            }
                            n
                        })
                        .collect();
                    field.reducer.apply(records.len(), &values)
                })
                .collect();
            daily.insert_row(day, cells);
        }

        if unparsed > 0 {
            debug!(source = %self.spec.kind, unparsed, "non-numeric cells treated as missing");
        }
        info!(
            source = %self.spec.kind,
            rows = table.len(),
            days = daily.len(),
            dropped = grouped.dropped,
            "aggregated source"
        );

        Ok(daily)
    }
}
