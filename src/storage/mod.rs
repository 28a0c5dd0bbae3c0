//! Typed table I/O and content digests: real files on disk, a byte-size
//! guard on ingest, and a digest function for audit.

mod columnar;
mod delimited;
mod digest;
mod spreadsheet;

pub use columnar::{atomic_write, read_columnar, write_columnar};
pub use delimited::{read_delimited, write_delimited, DelimitedOptions};
pub use digest::sha256;
pub use spreadsheet::{read_spreadsheet, write_spreadsheet};

use std::path::Path;

use crate::core::error::CoreError;

/// Refuses to touch a file larger than `max_bytes`. Call before any read.
pub fn enforce_size_limit(path: &Path, max_bytes: u64) -> Result<(), CoreError> {
    let len = std::fs::metadata(path)?.len();
    if len > max_bytes {
        return Err(CoreError::PayloadTooLarge);
    }
    Ok(())
}
