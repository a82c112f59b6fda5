use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Row};
use crate::error::CsvToolError;

/// Knobs for the CSV reader.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { delimiter: b',' }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` (and anything unrecognised) – header row, one record per line
/// * `.json`    – `[{ "name": "...", "price": 999, ... }, ...]`
/// * `.parquet` – flat columns, every value read back as text
///
/// A missing file is reported as [`CsvToolError::FileNotFound`].
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let file = open(path)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(file),
        "json" => load_json(file),
        _ => load_csv(file, options),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.columns,
        path.display()
    );
    Ok(dataset)
}

fn open(path: &Path) -> Result<File> {
    match File::open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CsvToolError::FileNotFound(path.to_path_buf()).into())
        }
        Err(e) => Err(e).with_context(|| format!("opening {}", path.display())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row defines the columns; every record must have the same width.
fn load_csv(file: File, options: &LoadOptions) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .from_reader(BufReader::new(file));

    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        rows.push(Row::new(record.iter().map(str::to_string).collect()));
    }

    Ok(Dataset::new(columns, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "name": "iphone 15 pro", "brand": "apple", "price": 999, "rating": 4.9 },
///   ...
/// ]
/// ```
///
/// The first record's keys are the columns. Missing keys and `null` read
/// as empty cells.
fn load_json(file: File) -> Result<Dataset> {
    let root: JsonValue =
        serde_json::from_reader(BufReader::new(file)).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let columns: Vec<String> = match records.first() {
        Some(first) => first
            .as_object()
            .context("Row 1 is not a JSON object")?
            .keys()
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {} is not a JSON object", i + 1))?;

        if obj.keys().any(|k| !columns.contains(k)) {
            log::warn!("Row {}: ignoring keys not present in the first record", i + 1);
        }

        let values = columns
            .iter()
            .map(|col| obj.get(col).map(json_to_cell).unwrap_or_default())
            .collect();
        rows.push(Row::new(values));
    }

    Ok(Dataset::new(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Column order follows the file schema.
fn load_parquet(file: File) -> Result<Dataset> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .enumerate()
                .map(|(col_idx, col)| {
                    extract_cell(col, row).with_context(|| {
                        format!("Row {row}: failed to read '{}'", columns[col_idx])
                    })
                })
                .collect::<Result<Vec<String>>>()?;
            rows.push(Row::new(values));
        }
    }

    Ok(Dataset::new(columns, rows))
}

/// Extract a single value from an Arrow column as text.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Boolean => col.as_boolean().value(row).to_string(),
        DataType::List(_) | DataType::LargeList(_) | DataType::Struct(_) | DataType::Map(..) => {
            bail!("nested column type {:?} is not supported", col.data_type())
        }
        _ => array_value_to_string(col.as_ref(), row)?,
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    /// A throwaway path under the system temp dir, unique per test.
    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("csv-tool-{}-{name}", std::process::id()))
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_csv_with_header() {
        let path = write_temp(
            "phones.csv",
            "name,brand,price,rating\niphone 15 pro,apple,999,4.9\npoco x5 pro,xiaomi,299,4.4\n",
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns, vec!["name", "brand", "price", "rating"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[1].values, vec!["poco x5 pro", "xiaomi", "299", "4.4"]);
    }

    #[test]
    fn honours_custom_delimiter() {
        let path = write_temp("semi.csv", "a;b\n1;2\n");
        let ds = load_file(&path, &LoadOptions { delimiter: b';' }).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns, vec!["a", "b"]);
        assert_eq!(ds.rows[0].values, vec!["1", "2"]);
    }

    #[test]
    fn header_only_csv_is_empty_dataset() {
        let path = write_temp("header.csv", "price,rating\n");
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns, vec!["price", "rating"]);
        assert!(ds.is_empty());
    }

    #[test]
    fn ragged_csv_row_is_an_error() {
        let path = write_temp("ragged.csv", "a,b\n1,2\n3\n");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(format!("{err:#}").contains("CSV row 2"));
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let path = temp_path("does-not-exist.csv");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CsvToolError>(),
            Some(CsvToolError::FileNotFound(p)) if *p == path
        ));
    }

    #[test]
    fn loads_json_records_in_key_order() {
        let path = write_temp(
            "phones.json",
            r#"[{"name": "poco", "price": 299, "promo": true, "note": null},
                {"price": 199, "name": "redmi"}]"#,
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns, vec!["name", "price", "promo", "note"]);
        assert_eq!(ds.rows[0].values, vec!["poco", "299", "true", ""]);
        assert_eq!(ds.rows[1].values, vec!["redmi", "199", "", ""]);
    }

    #[test]
    fn json_must_be_an_array() {
        let path = write_temp("object.json", r#"{"name": "poco"}"#);
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(format!("{err:#}").contains("Expected top-level JSON array"));
    }

    #[test]
    fn loads_flat_parquet_as_text() {
        let path = temp_path("phones.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("price", DataType::Int64, true),
            Field::new("rating", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["iphone 15 pro", "poco x5 pro"])),
                Arc::new(Int64Array::from(vec![Some(999), None])),
                Arc::new(Float64Array::from(vec![4.9, 4.4])),
            ],
        )
        .unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns, vec!["name", "price", "rating"]);
        assert_eq!(ds.rows[0].values, vec!["iphone 15 pro", "999", "4.9"]);
        assert_eq!(ds.rows[1].values, vec!["poco x5 pro", "", "4.4"]);
    }
}
