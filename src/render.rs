use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::cli::OutputFormat;
use crate::data::aggregate::Aggregation;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Render the (filtered) rows.
pub fn render_rows(dataset: &Dataset, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => rows_table(dataset),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&JsonRows(dataset)).context("serialising rows")
        }
    }
}

fn rows_table(dataset: &Dataset) -> Result<String> {
    if dataset.columns.is_empty() {
        return Ok(String::new());
    }

    let schema = Arc::new(Schema::new(
        dataset
            .columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = (0..dataset.columns.len())
        .map(|idx| {
            let column: StringArray = dataset
                .rows
                .iter()
                .map(|row| row.values.get(idx).map(String::as_str))
                .collect();
            Arc::new(column) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema, arrays).context("building output table")?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

/// Rows as a JSON array of objects, keys in header order.
struct JsonRows<'a>(&'a Dataset);

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for record in self.0.records() {
            seq.serialize_element(&JsonRecord(&record))?;
        }
        seq.end()
    }
}

struct JsonRecord<'a>(&'a [(&'a str, &'a str)]);

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in self.0 {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Render a computed aggregation as a one-column, one-row table.
pub fn render_aggregation(aggregation: &Aggregation, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let schema = Arc::new(Schema::new(vec![Field::new(
                aggregation.op.name(),
                DataType::Float64,
                false,
            )]));
            let column: ArrayRef = Arc::new(Float64Array::from(vec![aggregation.value]));
            let batch =
                RecordBatch::try_new(schema, vec![column]).context("building output table")?;
            Ok(pretty_format_batches(&[batch])?.to_string())
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(aggregation).context("serialising aggregation")
        }
    }
}
