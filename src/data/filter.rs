use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::model::{Cell, Dataset, Row};
use crate::error::{CsvToolError, Result};

// ---------------------------------------------------------------------------
// Condition: <column><op><value>
// ---------------------------------------------------------------------------

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Greater,
    Less,
    Equal,
}

impl CompareOp {
    /// Map an operator character; anything but `>`, `<`, `=` is `None`.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '>' => Some(CompareOp::Greater),
            '<' => Some(CompareOp::Less),
            '=' => Some(CompareOp::Equal),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            CompareOp::Greater => '>',
            CompareOp::Less => '<',
            CompareOp::Equal => '=',
        }
    }

    /// Whether an ordering of `cell` against the threshold satisfies this
    /// operator. Incomparable pairs never match.
    fn accepts(&self, ordering: Option<Ordering>) -> bool {
        matches!(
            (self, ordering),
            (CompareOp::Greater, Some(Ordering::Greater))
                | (CompareOp::Less, Some(Ordering::Less))
                | (CompareOp::Equal, Some(Ordering::Equal))
        )
    }
}

/// A single parsed filter condition.
///
/// `column` is kept exactly as written (no trimming), `value` is the raw
/// right-hand side; it is trimmed only when the condition is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.column, self.op.symbol(), self.value)
    }
}

fn condition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Shortest non-empty column, first operator after it, non-empty rest.
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)([<>=])(.+)").expect("condition pattern is valid"))
}

/// Parse `text` (surrounding whitespace ignored) into a [`Condition`].
///
/// The column is everything before the first operator character that has at
/// least one character on each side; e.g. `a>=5` reads as column `a`,
/// operator `>`, value `=5`.
pub fn parse_condition(text: &str) -> Result<Condition> {
    let trimmed = text.trim();
    let invalid = || CsvToolError::InvalidConditionFormat(trimmed.to_string());

    let caps = condition_pattern().captures(trimmed).ok_or_else(invalid)?;
    let op = caps[2]
        .chars()
        .next()
        .and_then(CompareOp::from_symbol)
        .ok_or_else(invalid)?;

    Ok(Condition {
        column: caps[1].to_string(),
        op,
        value: caps[3].to_string(),
    })
}

// ---------------------------------------------------------------------------
// Row filter
// ---------------------------------------------------------------------------

/// Compiled form of a [`Condition`]: the threshold is trimmed and its
/// numeric reading computed once.
struct Predicate<'c> {
    column_idx: usize,
    op: CompareOp,
    threshold: &'c str,
    threshold_number: Option<f64>,
}

impl Predicate<'_> {
    /// Numbers compare numerically only when both the cell and the
    /// threshold read as floats; otherwise the raw strings are compared.
    fn matches(&self, row: &Row) -> bool {
        let Some(raw) = row.values.get(self.column_idx) else {
            return false;
        };
        let ordering = match (Cell::resolve(raw), self.threshold_number) {
            (Cell::Number(cell), Some(threshold)) => cell.partial_cmp(&threshold),
            _ => Cell::Text(raw).partial_cmp_same_kind(&Cell::Text(self.threshold)),
        };
        self.op.accepts(ordering)
    }
}

/// Keep the rows satisfying `condition`, in their original order.
///
/// With no condition the dataset is returned untouched (even when empty).
/// With a condition, an empty dataset is an error: there is no row to check
/// the column against.
pub fn filter_rows(dataset: Dataset, condition: Option<&Condition>) -> Result<Dataset> {
    let Some(condition) = condition else {
        return Ok(dataset);
    };

    if dataset.is_empty() {
        return Err(CsvToolError::EmptyDataset);
    }
    let column_idx = dataset
        .column_index(&condition.column)
        .ok_or_else(|| CsvToolError::UnknownColumn(condition.column.clone()))?;

    let threshold = condition.value.trim();
    let predicate = Predicate {
        column_idx,
        op: condition.op,
        threshold,
        threshold_number: Cell::resolve(threshold).as_f64(),
    };

    let before = dataset.len();
    let Dataset { columns, rows } = dataset;
    let kept: Vec<Row> = rows.into_iter().filter(|row| predicate.matches(row)).collect();
    log::debug!("Condition '{condition}' kept {} of {before} rows", kept.len());

    Ok(Dataset::new(columns, kept))
}
