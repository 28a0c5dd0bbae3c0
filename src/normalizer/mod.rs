//! Normalizer and schema detector: turns a raw, string-typed table into a
//! typed table plus a schema document, deterministically and one column at
//! a time.

mod boolean;
mod coerce;
mod datetime;
mod header;
mod schema_detect;
mod temporal;

use crate::core::schema::{PeriodGrain, SchemaDocument};
use crate::core::value::{CellValue, Column, Table};

pub use header::normalize_headers;
pub use schema_detect::detect_and_coerce;
pub use temporal::analyze_temporal;

pub struct NormalizeResult {
    pub table: Table,
    pub schema: SchemaDocument,
}

/// Runs the full per-column pipeline (header cleanup, coercion, role
/// assignment) followed by whole-table temporal detection, and appends the
/// derived `period_key` column when a grain is computable.
pub fn normalize(raw: &Table, original_headers: &[String]) -> NormalizeResult {
    let name_pairs = normalize_headers(original_headers);

    let mut table = Table::new();
    let mut columns_schema = Vec::with_capacity(raw.columns.len());
    let mut warnings = Vec::new();

    for (i, raw_col) in raw.columns.iter().enumerate() {
        let (original_header, normalized_name) = name_pairs
            .get(i)
            .cloned()
            .unwrap_or_else(|| (raw_col.name.clone(), raw_col.name.clone()));

        let result = detect_and_coerce(&original_header, &normalized_name, raw_col);
        warnings.extend(result.warnings);
        table.push_column(result.column);
        columns_schema.push(result.schema);
    }

    let temporal = analyze_temporal(&table, &columns_schema);

    if let Some(keys) = &temporal.period_key {
        let values = keys.iter().map(|k| k.clone().map(CellValue::Str).unwrap_or(CellValue::Null)).collect();
        table.push_column(Column::with_values("period_key", values));
    }

    let schema = SchemaDocument {
        columns: columns_schema,
        period_grain: temporal.period_grain,
        period_grain_candidates: temporal.period_grain_candidates,
        time_candidates: temporal.time_candidates,
        warnings,
        notes: Vec::new(),
    };

    NormalizeResult { table, schema }
}
