//! Core data model shared by every other module: the typed table, the
//! dataset identifier, the schema/lineage documents, configuration, and the
//! crate-wide error type.

pub mod config;
pub mod dataset_id;
pub mod error;
pub mod lineage;
pub mod schema;
pub mod value;

pub use config::EngineConfig;
pub use dataset_id::DatasetId;
pub use error::{CoreError, CoreResult};
pub use lineage::{LineageDocument, LineageStep};
pub use schema::{ColumnSchema, CoercionCounters, PeriodGrain, PhysicalType, SchemaDocument, SemanticRole};
pub use value::{CellValue, Column, Table};
