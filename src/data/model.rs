use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// Cell – a single CSV value, typed lazily at the point of use
// ---------------------------------------------------------------------------

/// A cell value resolved on demand from its raw text.
///
/// Cells are stored as strings; each comparison or aggregation decides for
/// itself whether the text reads as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> Cell<'a> {
    /// Read `raw` as a float (surrounding whitespace ignored), falling back
    /// to the untouched text.
    pub fn resolve(raw: &'a str) -> Self {
        match parse_number(raw) {
            Some(v) => Cell::Number(v),
            None => Cell::Text(raw),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    /// Ordering between two cells of the same kind. Mixed kinds, and NaN,
    /// have no ordering.
    pub fn partial_cmp_same_kind(&self, other: &Cell<'_>) -> Option<Ordering> {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.partial_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Parse text as `f64`, tolerating surrounding whitespace and `_` digit
/// grouping (`1_000`). An underscore must sit between two ASCII digits.
pub fn parse_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if !text.contains('_') {
        return text.parse::<f64>().ok();
    }

    let bytes = text.as_bytes();
    let grouped = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit())
    });
    if !grouped {
        return None;
    }
    text.replace('_', "").parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Row – one record of the source file
// ---------------------------------------------------------------------------

/// A single record. Cells are kept in header order; resolve a column name to
/// its position with [`Dataset::column_index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<String>,
}

impl Row {
    pub fn new(values: Vec<String>) -> Self {
        Row { values }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded file
// ---------------------------------------------------------------------------

/// The in-memory table: header plus rows, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    /// Column names in source (header) order.
    pub columns: Vec<String>,
    /// All rows; each has exactly `columns.len()` values.
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Dataset { columns, rows }
    }

    /// Build a dataset from string literals. Handy for fixtures.
    #[cfg(test)]
    pub fn from_records(columns: &[&str], records: &[&[&str]]) -> Self {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: records
                .iter()
                .map(|r| Row::new(r.iter().map(|v| v.to_string()).collect()))
                .collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterate rows as `(column, value)` pairs in header order.
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &str)>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.values.iter().map(String::as_str))
                .collect()
        })
    }
}
