//! Spreadsheet (`.xlsx`, `.xls`) read/write: `calamine` reads workbooks,
//! `umya-spreadsheet` writes them.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::core::error::CoreError;
use crate::core::value::{CellValue, Column, Table};

/// Reads a single worksheet into a table of raw string/null cells.
///
/// `Data::Empty` becomes `CellValue::Null`; everything else (including an
/// explicit empty-string cell) is rendered to its textual form so the
/// normalizer can run the same string-coercion pipeline regardless of
/// whether the source was a spreadsheet or delimited text.
pub fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Table, CoreError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CoreError::Internal(format!("failed to open workbook: {e}")))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| CoreError::Validation("workbook has no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| CoreError::Validation(format!("sheet '{sheet_name}' not found: {e}")))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| CoreError::Validation("sheet has no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(cell_to_header).collect();
    let mut columns: Vec<Column> = headers.into_iter().map(Column::new).collect();

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if idx >= columns.len() {
                continue;
            }
            columns[idx].values.push(cell_to_value(cell));
        }
        for (idx, column) in columns.iter_mut().enumerate() {
            if idx >= row.len() {
                column.values.push(CellValue::Null);
            }
        }
    }

    Ok(Table::from_columns(columns))
}

fn cell_to_header(cell: &Data) -> String {
    match cell_to_value(cell) {
        CellValue::Str(s) => s,
        other => other.lexical_form(),
    }
}

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::Str(s.clone()),
        Data::Float(f) => CellValue::Str(format_number(*f)),
        Data::Int(i) => CellValue::Str(i.to_string()),
        Data::Bool(b) => CellValue::Str(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| CellValue::Str(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) => CellValue::Str(s.clone()),
        Data::DurationIso(s) => CellValue::Str(s.clone()),
        Data::Error(_) => CellValue::Null,
    }
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Writes an ordered set of named sheets to a single workbook, through a
/// temp sibling path and rename so a reader never observes a torn file.
pub fn write_spreadsheet(sheets: &[(String, Table)], path: &Path) -> Result<(), CoreError> {
    let parent = path.parent().ok_or_else(|| CoreError::Internal("path has no parent directory".into()))?;
    std::fs::create_dir_all(parent)?;

    let mut book = umya_spreadsheet::new_file();
    for (idx, (name, table)) in sheets.iter().enumerate() {
        if idx == 0 {
            // `new_file` ships with a single default "Sheet1"; rename it
            // instead of leaving a stray empty sheet ahead of ours.
            book.set_sheet_name("Sheet1", name)
                .map_err(|e| CoreError::Internal(format!("failed to rename default sheet: {e}")))?;
        } else {
            book.new_sheet(name)
                .map_err(|e| CoreError::Internal(format!("failed to create sheet '{name}': {e}")))?;
        }
        let sheet = book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| CoreError::Internal(format!("sheet '{name}' missing after creation")))?;

        for (col_idx, column) in table.columns.iter().enumerate() {
            let col = (col_idx as u32) + 1;
            sheet.get_cell_by_column_and_row_mut(&col, &1).set_value(column.name.clone());
            for (row_idx, value) in column.values.iter().enumerate() {
                let row = (row_idx as u32) + 2;
                let cell = sheet.get_cell_by_column_and_row_mut(&col, &row);
                match value {
                    CellValue::Null => {}
                    CellValue::Str(s) => {
                        cell.set_value(s.clone());
                    }
                    CellValue::Int64(i) => {
                        cell.set_value_number(*i as f64);
                    }
                    CellValue::Float64(f) => {
                        cell.set_value_number(*f);
                    }
                    CellValue::Bool(b) => {
                        cell.set_value(b.to_string());
                    }
                    CellValue::Timestamp(ts) => {
                        cell.set_value(ts.to_string());
                    }
                }
            }
        }
    }

    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|f| f.to_str()).unwrap_or("artifact"),
        std::process::id()
    ));
    umya_spreadsheet::writer::xlsx::write(&book, &tmp)
        .map_err(|e| CoreError::Internal(format!("failed to write workbook: {e}")))?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_drops_trailing_zero_for_integral_floats() {
        assert_eq!(format_number(1234.0), "1234");
        assert_eq!(format_number(1234.5), "1234.5");
    }
}
