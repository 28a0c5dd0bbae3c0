//! Delimited text (`.csv`) read/write.

use std::path::Path;

use crate::core::error::CoreError;
use crate::core::value::{CellValue, Column, Table};
use crate::storage::atomic_write;

#[derive(Debug, Clone, Copy)]
pub struct DelimitedOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Reads a delimited text file into a table of raw string cells.
///
/// An empty field is represented as `CellValue::Null` (the common
/// convention for "missing" in tabular financial exports); any other text,
/// including values with leading zeros, is preserved verbatim as
/// `CellValue::Str`.
pub fn read_delimited(path: &Path, options: DelimitedOptions) -> Result<Table, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CoreError::Internal(format!("failed to open delimited file: {e}")))?;

    let headers: Vec<String> = if options.has_headers {
        reader
            .headers()
            .map_err(|e| CoreError::Internal(format!("failed to read headers: {e}")))?
            .iter()
            .map(|h| h.to_string())
            .collect()
    } else {
        Vec::new()
    };

    let mut columns: Vec<Column> = headers.iter().map(Column::new).collect();

    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Internal(format!("failed to read record: {e}")))?;
        while columns.len() < record.len() {
            let idx = columns.len();
            columns.push(Column::new(format!("column_{}", idx + 1)));
            // Backfill shorter preceding rows with Null for the new column.
            let existing_rows = columns[0].values.len();
            columns[idx].values = vec![CellValue::Null; existing_rows];
        }
        for (idx, column) in columns.iter_mut().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            let value = if raw.is_empty() {
                CellValue::Null
            } else {
                CellValue::Str(raw.to_string())
            };
            column.values.push(value);
        }
    }

    Ok(Table::from_columns(columns))
}

/// Writes a generic table as delimited text. Cells render as their lexical
/// form; `Null` renders as an empty field. Built in memory and written
/// through `atomic_write` so a reader never observes a half-written file.
pub fn write_delimited(table: &Table, path: &Path, options: DelimitedOptions) -> Result<(), CoreError> {
    let mut writer = csv::WriterBuilder::new().delimiter(options.delimiter).from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(|e| CoreError::Internal(format!("failed to write header: {e}")))?;

    for row in 0..table.row_count() {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|c| match &c.values[row] {
                CellValue::Null => String::new(),
                CellValue::Float64(f) => format!("{f}"),
                other => other.lexical_form(),
            })
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| CoreError::Internal(format!("failed to write record: {e}")))?;
    }
    let bytes = writer.into_inner().map_err(|e| CoreError::Internal(format!("failed to flush csv: {e}")))?;
    atomic_write(path, &bytes)
}
