use std::path::PathBuf;

use thiserror::Error;

/// Every failure the filter / aggregate pipeline can report.
#[derive(Debug, Error)]
pub enum CsvToolError {
    #[error("File '{}' not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid filter condition '{0}': expected <column><op><value> with op one of > < =")]
    InvalidConditionFormat(String),

    #[error("Column '{0}' not found in file")]
    UnknownColumn(String),

    #[error("Invalid aggregation '{0}': expected column=operation")]
    InvalidAggregationFormat(String),

    #[error("Column '{column}', row {row}: '{value}' is not a number")]
    NumericConversionError {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Aggregation '{0}' is not supported")]
    UnsupportedOperation(String),

    #[error("Dataset has no rows to check the column against")]
    EmptyDataset,
}

pub type Result<T> = std::result::Result<T, CsvToolError>;
