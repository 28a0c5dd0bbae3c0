//! The typed cell value and the column-oriented table built from it.
//!
//! Every cell in this system — whether a freshly-read CSV string or a fully
//! coerced numeric column — is represented by the same tagged variant, per
//! the "dynamic, per-dataset shape" design note: schemas are discovered at
//! runtime, so the table format avoids any reliance on static, per-dataset
//! Rust types.

use serde::{Deserialize, Serialize};

/// A single coerced (or not-yet-coerced) cell.
///
/// Raw ingest (`Storage::read_delimited`, `Storage::read_spreadsheet`) only
/// ever produces `Str` and `Null`. The normalizer promotes individual
/// columns, wholesale, to `Int64`/`Float64`/`Bool`/`Timestamp` once the
/// column's role is decided — a column is always homogeneous in its typed
/// variant (aside from `Null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum CellValue {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    /// Unix seconds, UTC.
    Timestamp(i64),
    Str(String),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int64(i) => Some(*i as f64),
            CellValue::Float64(f) => Some(*f),
            CellValue::Timestamp(t) => Some(*t as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Lexicographic string form used for tie-breaking and group keys, so
    /// numeric entity keys compare the same way string keys do.
    pub fn lexical_form(&self) -> String {
        match self {
            CellValue::Int64(i) => i.to_string(),
            CellValue::Float64(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Timestamp(t) => t.to_string(),
            CellValue::Str(s) => s.clone(),
            CellValue::Null => String::new(),
        }
    }
}

/// A single named, homogeneously-typed column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Distinct non-null values, compared by lexical form.
    pub fn cardinality(&self) -> usize {
        let mut seen: Vec<String> = self
            .values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.lexical_form())
            .collect();
        seen.sort();
        seen.dedup();
        seen.len()
    }
}

/// A column-oriented table. All columns share the same row count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self { columns: Vec::new() }
    }

    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Value at `(row, column)`, or `None` if either index is out of range.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.column(column).and_then(|c| c.values.get(row))
    }

    /// Build a new table containing only the given row indices, in order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = rows
                    .iter()
                    .map(|&r| c.values.get(r).cloned().unwrap_or(CellValue::Null))
                    .collect();
                Column::with_values(c.name.clone(), values)
            })
            .collect();
        Table { columns }
    }
}
