//! The schema document: per-column detected shape plus top-level temporal
//! metadata, persisted verbatim as `schema.json`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalType {
    Integer,
    Float,
    Boolean,
    Datetime,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGrain {
    YearMonth,
    YearQuarter,
    Year,
    None,
}

impl PeriodGrain {
    /// Precedence order used to pick `period_grain` from the candidate set:
    /// `date > year+month > year+quarter > year > none`.
    pub fn precedence(self) -> u8 {
        match self {
            PeriodGrain::YearMonth => 3,
            PeriodGrain::YearQuarter => 2,
            PeriodGrain::Year => 1,
            PeriodGrain::None => 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoercionCounters {
    #[serde(flatten)]
    pub counts: HashMap<String, u64>,
}

impl CoercionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub original_header: String,
    pub normalized_name: String,
    pub physical_type: PhysicalType,
    pub semantic_role: SemanticRole,
    pub cardinality: usize,
    pub null_rate: f64,
    pub coercions: CoercionCounters,
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub columns: Vec<ColumnSchema>,
    pub period_grain: PeriodGrain,
    pub period_grain_candidates: Vec<PeriodGrain>,
    pub time_candidates: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl SchemaDocument {
    pub fn column(&self, normalized_name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.normalized_name == normalized_name)
    }
}
