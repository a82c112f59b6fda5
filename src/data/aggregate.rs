use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::model::{parse_number, Dataset};
use crate::error::{CsvToolError, Result};

// ---------------------------------------------------------------------------
// Aggregation expression: <column>=<operation>
// ---------------------------------------------------------------------------

/// Supported reductions over a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Avg,
    Min,
    Max,
}

impl AggregateOp {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }

    fn apply(&self, values: &[f64]) -> f64 {
        match self {
            AggregateOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
            AggregateOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            AggregateOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl FromStr for AggregateOp {
    type Err = CsvToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avg" => Ok(AggregateOp::Avg),
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            other => Err(CsvToolError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed `column=operation`. The operation stays a string until values
/// have been converted, so an unsupported name is only reported once there
/// is something to reduce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSpec {
    pub column: String,
    pub operation: String,
}

/// Split `expression` on its single `=`; both sides are trimmed and the
/// operation lower-cased.
pub fn parse_aggregation(expression: &str) -> Result<AggregationSpec> {
    let mut parts = expression.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(column), Some(operation), None) => Ok(AggregationSpec {
            column: column.trim().to_string(),
            operation: operation.trim().to_lowercase(),
        }),
        _ => Err(CsvToolError::InvalidAggregationFormat(expression.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A computed reduction: one operation, one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregation {
    pub op: AggregateOp,
    pub value: f64,
}

impl Serialize for Aggregation {
    /// Serialised as `{"<op>": [value]}`, i.e. one column with one row.
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.op.name(), &[self.value])?;
        map.end()
    }
}

/// Status reported instead of a value when the column holds no numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoData {
    pub column: String,
}

impl fmt::Display for NoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No data to aggregate for column {}", self.column)
    }
}

/// Outcome of a requested aggregation. `NoData` is a success, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOutcome {
    Value(Aggregation),
    NoData(NoData),
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Reduce one column of `dataset` as described by `expression`.
///
/// `None` means no aggregation was requested. Like filtering, aggregating
/// a dataset without rows is an error. Every value in the column must parse
/// as a float; one bad cell fails the whole aggregation.
pub fn aggregate(
    dataset: &Dataset,
    expression: Option<&str>,
) -> Result<Option<AggregateOutcome>> {
    let Some(expression) = expression else {
        return Ok(None);
    };
    let spec = parse_aggregation(expression)?;

    if dataset.is_empty() {
        return Err(CsvToolError::EmptyDataset);
    }

    let column_idx = dataset
        .column_index(&spec.column)
        .ok_or_else(|| CsvToolError::UnknownColumn(spec.column.clone()))?;

    let values = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(row_no, row)| {
            let raw = row.values.get(column_idx).map(String::as_str).unwrap_or("");
            parse_number(raw).ok_or_else(|| CsvToolError::NumericConversionError {
                column: spec.column.clone(),
                row: row_no + 1,
                value: raw.to_string(),
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.is_empty() {
        log::info!("Nothing to aggregate in column '{}'", spec.column);
        return Ok(Some(AggregateOutcome::NoData(NoData {
            column: spec.column,
        })));
    }

    let op: AggregateOp = spec.operation.parse()?;
    let value = op.apply(&values);
    log::debug!("{op}({}) over {} values = {value}", spec.column, values.len());

    Ok(Some(AggregateOutcome::Value(Aggregation { op, value })))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn phones() -> Dataset {
        Dataset::from_records(
            &["name", "brand", "price", "rating"],
            &[
                &["iphone 15 pro", "apple", "999", "4.9"],
                &["galaxy s23 ultra", "samsung", "1199", "4.8"],
                &["redmi note 12", "xiaomi", "199", "4.6"],
                &["poco x5 pro", "xiaomi", "299", "4.4"],
            ],
        )
    }

    fn value_of(outcome: Option<AggregateOutcome>) -> Aggregation {
        match outcome {
            Some(AggregateOutcome::Value(agg)) => agg,
            other => panic!("expected a value, got {other:?}"),
        }
    }

    #[test]
    fn avg_of_prices() {
        let agg = value_of(aggregate(&phones(), Some("price=avg")).unwrap());
        assert_eq!(agg.op, AggregateOp::Avg);
        assert!((agg.value - 674.0).abs() < EPS);
    }

    #[test]
    fn min_and_max_of_ratings() {
        let min = value_of(aggregate(&phones(), Some("rating=min")).unwrap());
        assert!((min.value - 4.4).abs() < EPS);
        let max = value_of(aggregate(&phones(), Some("rating=max")).unwrap());
        assert!((max.value - 4.9).abs() < EPS);
    }

    #[test]
    fn expression_is_trimmed_and_case_folded() {
        let agg = value_of(aggregate(&phones(), Some(" rating = MAX ")).unwrap());
        assert_eq!(agg.op, AggregateOp::Max);
    }

    #[test]
    fn absent_expression_means_no_aggregation() {
        assert_eq!(aggregate(&phones(), None).unwrap(), None);
    }

    #[test]
    fn expression_needs_exactly_one_separator() {
        for bad in ["price", "price=avg=min"] {
            let err = aggregate(&phones(), Some(bad)).unwrap_err();
            assert!(matches!(err, CsvToolError::InvalidAggregationFormat(_)), "{bad}");
        }
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = aggregate(&phones(), Some("weight=avg")).unwrap_err();
        assert!(matches!(err, CsvToolError::UnknownColumn(c) if c == "weight"));
    }

    #[test]
    fn unsupported_operation_is_rejected() {
        let err = aggregate(&phones(), Some("price=sum")).unwrap_err();
        assert!(matches!(err, CsvToolError::UnsupportedOperation(op) if op == "sum"));
    }

    #[test]
    fn non_numeric_column_fails_whole_aggregation() {
        let err = aggregate(&phones(), Some("brand=max")).unwrap_err();
        match err {
            CsvToolError::NumericConversionError { column, row, value } => {
                assert_eq!(column, "brand");
                assert_eq!(row, 1);
                assert_eq!(value, "apple");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_dataset_fails() {
        let ds = Dataset::from_records(&["price"], &[]);
        let err = aggregate(&ds, Some("price=avg")).unwrap_err();
        assert!(matches!(err, CsvToolError::EmptyDataset));
    }

    #[test]
    fn malformed_expression_reported_before_empty_dataset() {
        let ds = Dataset::from_records(&["price"], &[]);
        let err = aggregate(&ds, Some("price")).unwrap_err();
        assert!(matches!(err, CsvToolError::InvalidAggregationFormat(_)));
    }

    #[test]
    fn no_data_status_names_the_column() {
        let status = NoData {
            column: "price".into(),
        };
        assert_eq!(status.to_string(), "No data to aggregate for column price");
    }

    #[test]
    fn nan_cells_are_skipped_by_min_and_max() {
        let ds = Dataset::from_records(&["v"], &[&["nan"], &["3"], &["1"]]);
        let min = value_of(aggregate(&ds, Some("v=min")).unwrap());
        assert_eq!(min.value, 1.0);
        let max = value_of(aggregate(&ds, Some("v=max")).unwrap());
        assert_eq!(max.value, 3.0);
        let avg = value_of(aggregate(&ds, Some("v=avg")).unwrap());
        assert!(avg.value.is_nan());
    }

    #[test]
    fn underscore_separated_numbers_aggregate() {
        let ds = Dataset::from_records(&["price"], &[&["1_000"], &["2_000"]]);
        let agg = value_of(aggregate(&ds, Some("price=avg")).unwrap());
        assert!((agg.value - 1500.0).abs() < EPS);
    }

    #[test]
    fn aggregation_serialises_as_single_column() {
        let agg = Aggregation {
            op: AggregateOp::Avg,
            value: 674.0,
        };
        assert_eq!(serde_json::to_string(&agg).unwrap(), r#"{"avg":[674.0]}"#);
    }
}
