//! Dataset identifier: an opaque `ds_<12 lowercase hex>` string.
//!
//! Canonicalization depends on rejecting any malformed id *before* it
//! touches the filesystem, so parsing is strict and happens at the
//! boundary, not inside path construction.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CoreError;

const PREFIX: &str = "ds_";
const HEX_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetId(String);

impl DatasetId {
    /// Generate a fresh, randomly-keyed id. Callers that need collision
    /// checking against an existing registry should retry on conflict
    /// (bounded — see `Registry::create_dataset`).
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        let simple = uuid.simple().to_string();
        DatasetId(format!("{PREFIX}{}", &simple[..HEX_LEN]))
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let is_valid = raw.strip_prefix(PREFIX).map_or(false, |hex| {
            hex.len() == HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        });
        if is_valid {
            Ok(DatasetId(raw.to_string()))
        } else {
            Err(CoreError::invalid_dataset_id(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DatasetId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DatasetId::parse(&value)
    }
}

impl From<DatasetId> for String {
    fn from(id: DatasetId) -> Self {
        id.0
    }
}
