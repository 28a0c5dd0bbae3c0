//! The append-only lineage document (`lineage.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::dataset_id::DatasetId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageStep {
    pub operation: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub parameters: JsonValue,
    #[serde(default)]
    pub outputs: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageDocument {
    pub dataset_id: DatasetId,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<LineageStep>,
}

impl LineageDocument {
    pub fn new(dataset_id: DatasetId, created_at: DateTime<Utc>) -> Self {
        Self {
            dataset_id,
            created_at,
            steps: Vec::new(),
        }
    }

    /// Append a step, preserving the non-decreasing-timestamp invariant: a
    /// step timestamped before the last recorded step is clamped forward
    /// rather than silently accepted, since lineage is meant to reconstruct
    /// a real sequence of events.
    pub fn append(&mut self, mut step: LineageStep) {
        if let Some(last) = self.steps.last() {
            if step.timestamp < last.timestamp {
                step.timestamp = last.timestamp;
            }
        }
        self.steps.push(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn append_clamps_non_monotonic_timestamps() {
        let id = DatasetId::generate();
        let t0 = Utc::now();
        let mut doc = LineageDocument::new(id, t0);
        doc.append(LineageStep {
            operation: "create".into(),
            timestamp: t0,
            parameters: JsonValue::Null,
            outputs: JsonValue::Null,
            warnings: None,
        });
        let earlier = t0 - Duration::seconds(10);
        doc.append(LineageStep {
            operation: "normalize".into(),
            timestamp: earlier,
            parameters: JsonValue::Null,
            outputs: JsonValue::Null,
            warnings: None,
        });
        assert!(doc.steps[1].timestamp >= doc.steps[0].timestamp);
    }

    #[test]
    fn prior_entries_survive_append() {
        let id = DatasetId::generate();
        let t0 = Utc::now();
        let mut doc = LineageDocument::new(id, t0);
        for i in 0..5 {
            doc.append(LineageStep {
                operation: format!("step_{i}"),
                timestamp: t0 + Duration::seconds(i),
                parameters: JsonValue::Null,
                outputs: JsonValue::Null,
                warnings: None,
            });
        }
        let before: Vec<_> = doc.steps.iter().map(|s| s.operation.clone()).collect();
        doc.append(LineageStep {
            operation: "step_5".into(),
            timestamp: t0 + Duration::seconds(5),
            parameters: JsonValue::Null,
            outputs: JsonValue::Null,
            warnings: None,
        });
        for (i, op) in before.iter().enumerate() {
            assert_eq!(&doc.steps[i].operation, op);
        }
    }
}
