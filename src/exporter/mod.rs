//! Exporter: renders a concentration result document as a flat tabular
//! artifact and a multi-sheet workbook.

mod csv_export;
mod xlsx_export;

pub use csv_export::write_concentration_csv;
pub use xlsx_export::{write_concentration_xlsx, ExportParams};
