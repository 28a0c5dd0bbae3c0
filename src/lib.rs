//! Concentration Analysis Engine — core implementation.
//!
//! Ingests tabular financial data, normalizes it into a canonical typed
//! column store, detects schema and temporal structure, computes
//! concentration analysis with deterministic semantics, and persists
//! results with full lineage. HTTP framing, advisory provider adapters, and
//! configuration loading live outside this crate; it exposes the narrow
//! interfaces they consume.

pub mod concentration;
pub mod core;
pub mod exporter;
pub mod normalizer;
pub mod pipeline;
pub mod rate_limiter;
pub mod registry;
pub mod storage;

pub use core::{CellValue, CoreError, CoreResult, DatasetId, EngineConfig};
pub use pipeline::{AnalyzeRequest, IngestResponse, PipelineController};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
