//! The canonical typed columnar file (`normalized.parquet` on disk).
//!
//! A `Table` serializes to a single self-describing JSON document whose
//! cells already carry the `CellValue` tag, so round-tripping is exactly
//! serde's own round-trip guarantee — row count, column names, null
//! positions, and numeric values survive byte-for-byte because they were
//! never converted to an untyped intermediate representation.

use std::fs;
use std::path::Path;

use crate::core::error::CoreError;
use crate::core::value::Table;

pub fn write_columnar(table: &Table, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec(table)?;
    atomic_write(path, &json)
}

pub fn read_columnar(path: &Path) -> Result<Table, CoreError> {
    if !path.exists() {
        return Err(CoreError::NotFound(format!("{} not found", path.display())));
    }
    let bytes = fs::read(path)?;
    let table: Table = serde_json::from_slice(&bytes)?;
    Ok(table)
}

/// Write-to-temp-then-rename so a reader never observes a torn file. Used
/// for every JSON artifact in the dataset directory (schema, lineage,
/// analyses, advisory artifacts), not just the columnar table.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let parent = path.parent().ok_or_else(|| CoreError::Internal("path has no parent directory".into()))?;
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|f| f.to_str()).unwrap_or("artifact"),
        std::process::id()
    ));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
