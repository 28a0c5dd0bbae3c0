//! Pipeline controller: sequences ingest → normalize → analyze → export,
//! records lineage steps, enforces limits, and triggers the optional
//! advisory background task.

pub mod advisory;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use self::advisory::{AdvisoryOutcome, AdvisoryProvider, DisabledAdvisoryProvider, PlaceholderReason};
use crate::concentration::{self, AnalyzeParams};
use crate::core::config::EngineConfig;
use crate::core::dataset_id::DatasetId;
use crate::core::error::{CoreError, CoreResult};
use crate::core::value::Table;
use crate::exporter::{self, ExportParams};
use crate::normalizer;
use crate::registry::Registry;
use crate::storage::{self, DelimitedOptions};

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub dataset_id: String,
    pub status: String,
    pub message: String,
    pub rows_processed: usize,
    pub columns_processed: usize,
}

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub group_by: String,
    pub value: String,
    pub thresholds: Option<Vec<i64>>,
    pub run_llm: bool,
}

pub struct PipelineController {
    registry: Registry,
    config: EngineConfig,
    advisory: Arc<dyn AdvisoryProvider>,
    advisory_calls: Arc<Mutex<HashMap<DatasetId, u32>>>,
}

impl PipelineController {
    pub fn new(config: EngineConfig) -> Self {
        let registry = Registry::new(config.datasets_path.clone());
        Self {
            registry,
            config,
            advisory: Arc::new(DisabledAdvisoryProvider),
            advisory_calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_advisory_provider(mut self, provider: Arc<dyn AdvisoryProvider>) -> Self {
        self.advisory = provider;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Ingests an uploaded file: raw copy, byte-size guard, read, normalize,
    /// persist schema + typed table, record lineage.
    #[instrument(skip(self, bytes))]
    pub fn ingest(&self, original_filename: &str, bytes: &[u8]) -> CoreResult<IngestResponse> {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !matches!(extension.as_str(), "csv" | "xlsx" | "xls") {
            return Err(CoreError::Validation(format!("unsupported file extension '.{extension}'")));
        }

        if bytes.len() as u64 > self.config.max_file_size_bytes {
            return Err(CoreError::PayloadTooLarge);
        }

        let dataset_id = self.registry.create_dataset(original_filename)?;
        let raw_path = self.registry.raw_path(&dataset_id, original_filename)?;
        storage::atomic_write(&raw_path, bytes)?;

        let raw_table = if extension == "csv" {
            storage::read_delimited(&raw_path, DelimitedOptions::default())?
        } else {
            storage::read_spreadsheet(&raw_path, None)?
        };
        let original_headers: Vec<String> = raw_table.column_names().iter().map(|s| s.to_string()).collect();

        let normalized = normalizer::normalize(&raw_table, &original_headers);
        self.registry.save_schema(&dataset_id, &normalized.schema)?;

        let columnar_path = self.registry.dataset_dir(&dataset_id).join("normalized.parquet");
        storage::write_columnar(&normalized.table, &columnar_path)?;

        self.registry.record_step(
            &dataset_id,
            "ingest",
            json!({ "filename": original_filename }),
            json!({
                "rows_processed": normalized.table.row_count(),
                "columns_processed": normalized.table.columns.len(),
            }),
            if normalized.schema.warnings.is_empty() { None } else { Some(normalized.schema.warnings.clone()) },
        )?;

        info!(
            dataset_id = %dataset_id,
            rows = normalized.table.row_count(),
            columns = normalized.table.columns.len(),
            "ingest complete"
        );

        Ok(IngestResponse {
            dataset_id: dataset_id.to_string(),
            status: "ingested".to_string(),
            message: format!("ingested '{original_filename}'"),
            rows_processed: normalized.table.row_count(),
            columns_processed: normalized.table.columns.len(),
        })
    }

    /// Runs concentration analysis, writes export artifacts, persists the
    /// result document, and fires the advisory task if requested.
    #[instrument(skip(self))]
    pub fn analyze(&self, dataset_id: &DatasetId, request: AnalyzeRequest) -> CoreResult<serde_json::Value> {
        let schema = self.registry.get_schema(dataset_id)?;
        let table = self.load_table(dataset_id)?;

        let thresholds = match request.thresholds {
            Some(raw) => concentration::validate_thresholds(&raw)?,
            None => self.config.default_thresholds.clone(),
        };

        let params = AnalyzeParams {
            dataset_id: dataset_id.as_str(),
            group_by: &request.group_by,
            value_column: &request.value,
            time_column: None,
            thresholds: &thresholds,
            large_dataset_threshold: self.config.large_dataset_threshold,
        };
        let result = concentration::analyze(&table, &schema, &params)?;

        self.registry.save_analysis(dataset_id, "concentration", &result_as_storable(&result))?;

        let mut export_links = HashMap::new();
        let mut export_warnings = Vec::new();
        let csv_path = self.registry.dataset_dir(dataset_id).join("analyses").join("concentration.csv");
        match exporter::write_concentration_csv(&result, &csv_path) {
            Ok(()) => {
                export_links.insert("csv".to_string(), "analyses/concentration.csv".to_string());
            }
            Err(e) => {
                warn!(dataset_id = %dataset_id, error = %e, "CSV export failed");
                export_warnings.push(format!("CSV export failed: {e}"));
            }
        }

        let xlsx_path = self.registry.dataset_dir(dataset_id).join("analyses").join("concentration.xlsx");
        let xlsx_params = ExportParams {
            group_by: &request.group_by,
            value_column: &request.value,
            time_column: None,
        };
        match exporter::write_concentration_xlsx(&result, &xlsx_params, &xlsx_path) {
            Ok(()) => {
                export_links.insert("xlsx".to_string(), "analyses/concentration.xlsx".to_string());
            }
            Err(e) => {
                warn!(dataset_id = %dataset_id, error = %e, "XLSX export failed");
                export_warnings.push(format!("XLSX export failed: {e}"));
            }
        }

        let links = if export_links.is_empty() { None } else { Some(&export_links) };
        let mut document = result.to_json(links);
        if !export_warnings.is_empty() {
            if let Some(warnings) = document.get_mut("warnings").and_then(|w| w.as_array_mut()) {
                for w in export_warnings {
                    warnings.push(serde_json::Value::String(w));
                }
            }
        }

        self.registry.record_step(
            dataset_id,
            "analyze",
            json!({ "group_by": request.group_by, "value": request.value, "thresholds": thresholds }),
            json!({ "export_links": export_links }),
            None,
        )?;

        info!(dataset_id = %dataset_id, group_by = %request.group_by, "analysis complete");

        if request.run_llm {
            self.spawn_advisory(dataset_id.clone(), document.clone());
        }

        Ok(document)
    }

    fn load_table(&self, dataset_id: &DatasetId) -> CoreResult<Table> {
        let path = self.registry.dataset_dir(dataset_id).join("normalized.parquet");
        storage::read_columnar(&path)
    }

    /// Dispatches the advisory call as a background task, ordered after the
    /// analysis artifact's durable write. The originating request does not
    /// await this.
    fn spawn_advisory(&self, dataset_id: DatasetId, analysis: serde_json::Value) {
        let provider = self.advisory.clone();
        let registry = self.registry.clone();
        let calls = self.advisory_calls.clone();
        let budget = self.config.advisory_budget_per_dataset;
        let timeout = Duration::from_secs(self.config.advisory_timeout_secs);

        tokio::spawn(async move {
            let mut count = calls.lock();
            let used = count.entry(dataset_id.clone()).or_insert(0);
            if *used >= budget {
                record_placeholder(&registry, &dataset_id, PlaceholderReason::UsageLimit);
                return;
            }
            *used += 1;
            drop(count);

            let outcome = tokio::time::timeout(timeout, provider.generate(dataset_id.as_str(), &analysis)).await;
            match outcome {
                Ok(AdvisoryOutcome::Generated(value)) => {
                    info!(dataset_id = %dataset_id, "advisory commentary generated");
                    let _ = registry.save_llm_artifact(&dataset_id, "commentary", &value);
                    let _ = registry.record_step(&dataset_id, "advisory", json!({}), json!({ "status": "generated" }), None);
                }
                Ok(AdvisoryOutcome::Placeholder(reason)) => {
                    warn!(dataset_id = %dataset_id, reason = reason.as_str(), "advisory placeholder");
                    record_placeholder(&registry, &dataset_id, reason);
                }
                Err(_) => {
                    warn!(dataset_id = %dataset_id, "advisory call timed out");
                    record_placeholder(&registry, &dataset_id, PlaceholderReason::Timeout);
                }
            }
        });
    }
}

fn record_placeholder(registry: &Registry, dataset_id: &DatasetId, reason: PlaceholderReason) {
    let placeholder = json!({ "status": reason.as_str() });
    let _ = registry.save_llm_artifact(dataset_id, "commentary", &placeholder);
    let _ = registry.record_step(dataset_id, "advisory", json!({}), json!({ "status": reason.as_str() }), None);
}

fn result_as_storable(result: &concentration::ConcentrationResult) -> serde_json::Value {
    result.to_json(None)
}
