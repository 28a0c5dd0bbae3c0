//! The dataset registry: directory ownership, schema/lineage persistence,
//! and the per-dataset concurrency contract — an
//! `Arc<RwLock<HashMap<DatasetId, Arc<Mutex<()>>>>>` of per-dataset locks,
//! cloned and locked on demand so concurrent writes to one dataset directory
//! serialize without blocking unrelated datasets.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};

use crate::core::dataset_id::DatasetId;
use crate::core::error::CoreError;
use crate::core::lineage::{LineageDocument, LineageStep};
use crate::core::schema::SchemaDocument;
use crate::storage;

const MAX_ID_ALLOCATION_ATTEMPTS: u32 = 8;

#[derive(Clone)]
pub struct Registry {
    base_path: PathBuf,
    locks: Arc<RwLock<HashMap<DatasetId, Arc<Mutex<()>>>>>,
}

impl Registry {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn dataset_dir(&self, dataset_id: &DatasetId) -> PathBuf {
        self.base_path.join(dataset_id.as_str())
    }

    fn lock_for(&self, dataset_id: &DatasetId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().get(dataset_id) {
            return lock.clone();
        }
        let mut locks = self.locks.write();
        locks.entry(dataset_id.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Allocates a fresh dataset id, creates its directory tree, and writes
    /// the initial `create` lineage step.
    #[instrument(skip(self))]
    pub fn create_dataset(&self, original_filename: &str) -> Result<DatasetId, CoreError> {
        let mut attempts = 0;
        let dataset_id = loop {
            let candidate = DatasetId::generate();
            if !self.dataset_dir(&candidate).exists() {
                break candidate;
            }
            attempts += 1;
            if attempts >= MAX_ID_ALLOCATION_ATTEMPTS {
                return Err(CoreError::Internal("failed to allocate a unique dataset id".into()));
            }
        };

        let dir = self.dataset_dir(&dataset_id);
        std::fs::create_dir_all(dir.join("raw"))?;
        std::fs::create_dir_all(dir.join("analyses"))?;
        std::fs::create_dir_all(dir.join("llm"))?;

        let mut lineage = LineageDocument::new(dataset_id.clone(), Utc::now());
        lineage.append(LineageStep {
            operation: "create".to_string(),
            timestamp: Utc::now(),
            parameters: serde_json::json!({ "filename": original_filename }),
            outputs: JsonValue::Null,
            warnings: None,
        });
        self.write_lineage(&dataset_id, &lineage)?;

        info!(dataset_id = %dataset_id, filename = original_filename, "dataset created");
        Ok(dataset_id)
    }

    /// Resolves `filename` inside `<dataset>/raw/`, rejecting any path that
    /// would escape the dataset directory.
    pub fn raw_path(&self, dataset_id: &DatasetId, filename: &str) -> Result<PathBuf, CoreError> {
        let raw_dir = self.dataset_dir(dataset_id).join("raw");
        let candidate = raw_dir.join(filename);
        let normalized = normalize_path(&candidate);
        let normalized_raw_dir = normalize_path(&raw_dir);
        if !normalized.starts_with(&normalized_raw_dir) {
            return Err(CoreError::Validation(format!("'{filename}' escapes the dataset directory")));
        }
        Ok(normalized)
    }

    #[instrument(skip(self, parameters, outputs, warnings))]
    pub fn record_step(
        &self,
        dataset_id: &DatasetId,
        operation: &str,
        parameters: JsonValue,
        outputs: JsonValue,
        warnings: Option<Vec<String>>,
    ) -> Result<(), CoreError> {
        let lock = self.lock_for(dataset_id);
        let _guard = lock.lock();

        let mut lineage = self.read_lineage_unlocked(dataset_id)?;
        lineage.append(LineageStep {
            operation: operation.to_string(),
            timestamp: Utc::now(),
            parameters,
            outputs,
            warnings,
        });
        self.write_lineage(dataset_id, &lineage)
    }

    pub fn save_schema(&self, dataset_id: &DatasetId, schema: &SchemaDocument) -> Result<(), CoreError> {
        let lock = self.lock_for(dataset_id);
        let _guard = lock.lock();
        let path = self.dataset_dir(dataset_id).join("schema.json");
        let bytes = serde_json::to_vec_pretty(schema)?;
        storage::atomic_write(&path, &bytes)
    }

    pub fn get_schema(&self, dataset_id: &DatasetId) -> Result<SchemaDocument, CoreError> {
        let path = self.dataset_dir(dataset_id).join("schema.json");
        self.read_json(&path)
    }

    pub fn get_lineage(&self, dataset_id: &DatasetId) -> Result<LineageDocument, CoreError> {
        self.read_lineage_unlocked(dataset_id)
    }

    pub fn save_analysis<T: Serialize>(&self, dataset_id: &DatasetId, name: &str, payload: &T) -> Result<(), CoreError> {
        let lock = self.lock_for(dataset_id);
        let _guard = lock.lock();
        let path = self.dataset_dir(dataset_id).join("analyses").join(format!("{name}.json"));
        let bytes = serde_json::to_vec_pretty(payload)?;
        storage::atomic_write(&path, &bytes)
    }

    pub fn save_llm_artifact<T: Serialize>(&self, dataset_id: &DatasetId, function_name: &str, payload: &T) -> Result<(), CoreError> {
        let lock = self.lock_for(dataset_id);
        let _guard = lock.lock();
        let unix_seconds = Utc::now().timestamp();
        let path = self
            .dataset_dir(dataset_id)
            .join("llm")
            .join(format!("{function_name}_{unix_seconds}.json"));
        let bytes = serde_json::to_vec_pretty(payload)?;
        storage::atomic_write(&path, &bytes)
    }

    fn read_lineage_unlocked(&self, dataset_id: &DatasetId) -> Result<LineageDocument, CoreError> {
        let path = self.dataset_dir(dataset_id).join("lineage.json");
        self.read_json(&path)
    }

    fn write_lineage(&self, dataset_id: &DatasetId, lineage: &LineageDocument) -> Result<(), CoreError> {
        let path = self.dataset_dir(dataset_id).join("lineage.json");
        let bytes = serde_json::to_vec_pretty(lineage)?;
        storage::atomic_write(&path, &bytes)
    }

    fn read_json<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<T, CoreError> {
        if !path.exists() {
            warn!(path = %path.display(), "artifact not found");
            return Err(CoreError::NotFound(format!("{} not found", path.display())));
        }
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Collapses `.`/`..` components without requiring the path to exist (the
/// file at `raw_path` usually doesn't yet, since this runs before the
/// upload is written). `..` is dropped relative to the already-sanitized
/// dataset-rooted prefix, which is what makes traversal detection below a
/// prefix check rather than a filesystem round-trip.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_dataset_writes_initial_lineage() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        let id = registry.create_dataset("upload.csv").unwrap();

        let lineage = registry.get_lineage(&id).unwrap();
        assert_eq!(lineage.steps.len(), 1);
        assert_eq!(lineage.steps[0].operation, "create");
    }

    #[test]
    fn raw_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        let id = registry.create_dataset("upload.csv").unwrap();

        assert!(registry.raw_path(&id, "../../etc/passwd").is_err());
        assert!(registry.raw_path(&id, "upload.csv").is_ok());
    }

    #[test]
    fn record_step_is_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        let id = registry.create_dataset("upload.csv").unwrap();

        registry
            .record_step(&id, "normalize", serde_json::json!({}), serde_json::json!({}), None)
            .unwrap();
        registry
            .record_step(&id, "analyze", serde_json::json!({}), serde_json::json!({}), None)
            .unwrap();

        let lineage = registry.get_lineage(&id).unwrap();
        assert_eq!(lineage.steps.len(), 3);
        assert_eq!(lineage.steps[0].operation, "create");
        assert_eq!(lineage.steps[1].operation, "normalize");
        assert_eq!(lineage.steps[2].operation, "analyze");
    }

    #[test]
    fn missing_dataset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        let bogus = DatasetId::generate();
        assert!(registry.get_schema(&bogus).is_err());
    }
}
