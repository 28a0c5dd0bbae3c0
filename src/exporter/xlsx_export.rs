//! Workbook export (`concentration.xlsx`): `Summary`, `Top_Entities`, and
//! `Parameters` sheets, written via the same `umya-spreadsheet` path as
//! `storage::spreadsheet`.

use std::path::Path;

use crate::concentration::ConcentrationResult;
use crate::core::error::CoreError;

pub struct ExportParams<'a> {
    pub group_by: &'a str,
    pub value_column: &'a str,
    pub time_column: Option<&'a str>,
}

/// Writes the workbook to a temp sibling path, then renames it into place, so
/// a reader never observes a torn or half-written `.xlsx` file.
pub fn write_concentration_xlsx(result: &ConcentrationResult, params: &ExportParams, path: &Path) -> Result<(), CoreError> {
    let parent = path.parent().ok_or_else(|| CoreError::Internal("path has no parent directory".into()))?;
    std::fs::create_dir_all(parent)?;

    let mut book = umya_spreadsheet::new_file();
    book.set_sheet_name("Sheet1", "Summary")
        .map_err(|e| CoreError::Internal(format!("failed to rename default sheet: {e}")))?;
    book.new_sheet("Top_Entities")
        .map_err(|e| CoreError::Internal(format!("failed to create sheet: {e}")))?;
    book.new_sheet("Parameters")
        .map_err(|e| CoreError::Internal(format!("failed to create sheet: {e}")))?;

    write_summary(&mut book, result)?;
    write_top_entities(&mut book, result)?;
    write_parameters(&mut book, result, params)?;

    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|f| f.to_str()).unwrap_or("artifact"),
        std::process::id()
    ));
    umya_spreadsheet::writer::xlsx::write(&book, &tmp).map_err(|e| CoreError::Internal(format!("failed to write workbook: {e}")))?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn write_summary(book: &mut umya_spreadsheet::Spreadsheet, result: &ConcentrationResult) -> Result<(), CoreError> {
    let sheet = book
        .get_sheet_by_name_mut("Summary")
        .ok_or_else(|| CoreError::Internal("Summary sheet missing".into()))?;

    let mut col = 1u32;
    sheet.get_cell_by_column_and_row_mut(&col, &1).set_value("period");
    col += 1;
    sheet.get_cell_by_column_and_row_mut(&col, &1).set_value("total");
    col += 1;
    for threshold in &result.thresholds {
        sheet.get_cell_by_column_and_row_mut(&col, &1).set_value(format!("top_{threshold}_count"));
        col += 1;
        sheet.get_cell_by_column_and_row_mut(&col, &1).set_value(format!("top_{threshold}_value"));
        col += 1;
        sheet.get_cell_by_column_and_row_mut(&col, &1).set_value(format!("top_{threshold}_pct"));
        col += 1;
    }

    let periods = result.by_period.iter().chain(std::iter::once(&result.totals));
    for (row_idx, period) in periods.enumerate() {
        let row = (row_idx as u32) + 2;
        let mut col = 1u32;
        sheet.get_cell_by_column_and_row_mut(&col, &row).set_value(period.period.clone());
        col += 1;
        if let Some(total) = period.total {
            sheet.get_cell_by_column_and_row_mut(&col, &row).set_value_number(total);
        }
        col += 1;
        for threshold in &result.thresholds {
            match period.concentration.iter().find(|(t, _)| t == threshold) {
                Some((_, bucket)) => {
                    sheet.get_cell_by_column_and_row_mut(&col, &row).set_value_number(bucket.count as f64);
                    col += 1;
                    sheet.get_cell_by_column_and_row_mut(&col, &row).set_value_number(bucket.value);
                    col += 1;
                    sheet
                        .get_cell_by_column_and_row_mut(&col, &row)
                        .set_value_number((bucket.pct_of_total * 10.0).round() / 10.0);
                    col += 1;
                }
                // Missing threshold in a period: empty cells, not zero.
                None => col += 3,
            }
        }
    }
    Ok(())
}

fn write_top_entities(book: &mut umya_spreadsheet::Spreadsheet, result: &ConcentrationResult) -> Result<(), CoreError> {
    let sheet = book
        .get_sheet_by_name_mut("Top_Entities")
        .ok_or_else(|| CoreError::Internal("Top_Entities sheet missing".into()))?;

    for (col, header) in ["period", "entity", "value", "cumsum", "cumulative_pct"].iter().enumerate() {
        sheet.get_cell_by_column_and_row_mut(&((col as u32) + 1), &1).set_value(*header);
    }

    let mut row = 2u32;
    for period in result.by_period.iter().chain(std::iter::once(&result.totals)) {
        for head_row in &period.head {
            sheet.get_cell_by_column_and_row_mut(&1, &row).set_value(period.period.clone());
            sheet.get_cell_by_column_and_row_mut(&2, &row).set_value(head_row.entity.clone());
            sheet.get_cell_by_column_and_row_mut(&3, &row).set_value_number(head_row.value);
            sheet.get_cell_by_column_and_row_mut(&4, &row).set_value_number(head_row.cumsum);
            sheet.get_cell_by_column_and_row_mut(&5, &row).set_value_number(head_row.cumulative_pct);
            row += 1;
        }
    }
    Ok(())
}

fn write_parameters(book: &mut umya_spreadsheet::Spreadsheet, result: &ConcentrationResult, params: &ExportParams) -> Result<(), CoreError> {
    let sheet = book
        .get_sheet_by_name_mut("Parameters")
        .ok_or_else(|| CoreError::Internal("Parameters sheet missing".into()))?;

    sheet.get_cell_by_column_and_row_mut(&1, &1).set_value("Parameter");
    sheet.get_cell_by_column_and_row_mut(&2, &1).set_value("Value");

    let rows = [
        ("Group By", params.group_by.to_string()),
        ("Value Column", params.value_column.to_string()),
        ("Time Column", params.time_column.unwrap_or("").to_string()),
        ("Thresholds", result.thresholds.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",")),
    ];
    for (idx, (label, value)) in rows.iter().enumerate() {
        let row = (idx as u32) + 2;
        sheet.get_cell_by_column_and_row_mut(&1, &row).set_value(*label);
        sheet.get_cell_by_column_and_row_mut(&2, &row).set_value(value.clone());
    }
    Ok(())
}
