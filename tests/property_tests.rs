//! Property-based tests for core correctness invariants: columnar
//! round-trip fidelity, threshold-count monotonicity, lineage append-only
//! ordering, dataset id canonicalization, and normalized header uniqueness.

use proptest::prelude::*;

use concentration_engine::concentration::{analyze, AnalyzeParams};
use concentration_engine::core::dataset_id::DatasetId;
use concentration_engine::core::lineage::{LineageDocument, LineageStep};
use concentration_engine::core::schema::{ColumnSchema, CoercionCounters, PeriodGrain, PhysicalType, SchemaDocument, SemanticRole};
use concentration_engine::core::value::{CellValue, Column, Table};
use concentration_engine::normalizer::normalize_headers;
use concentration_engine::storage::{read_columnar, write_columnar};

fn schema_for(group_by: &str, value_col: &str) -> SchemaDocument {
    let column = |name: &str| ColumnSchema {
        original_header: name.to_string(),
        normalized_name: name.to_string(),
        physical_type: if name == value_col { PhysicalType::Float } else { PhysicalType::String },
        semantic_role: if name == value_col { SemanticRole::Numeric } else { SemanticRole::Categorical },
        cardinality: 0,
        null_rate: 0.0,
        coercions: CoercionCounters::new(),
        metadata: Default::default(),
    };
    SchemaDocument {
        columns: vec![column(group_by), column(value_col)],
        period_grain: PeriodGrain::None,
        period_grain_candidates: Vec::new(),
        time_candidates: Vec::new(),
        warnings: Vec::new(),
        notes: Vec::new(),
    }
}

fn table_from(entities: &[&str], values: &[f64]) -> Table {
    let mut table = Table::new();
    table.push_column(Column::with_values("entity", entities.iter().map(|e| CellValue::Str(e.to_string())).collect()));
    table.push_column(Column::with_values("revenue", values.iter().map(|v| CellValue::Float64(*v)).collect()));
    table
}

proptest! {
    /// Invariant 1: a columnar write/read round trip reproduces row count,
    /// column names, and values exactly.
    #[test]
    fn columnar_round_trip_preserves_shape(
        names in prop::collection::vec("[a-z][a-z0-9_]{0,8}", 1..5),
        values in prop::collection::vec(-1_000_000.0f64..1_000_000.0, 1..20),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalized.parquet");

        let mut table = Table::new();
        for (i, name) in names.iter().enumerate() {
            let col_values: Vec<CellValue> = values.iter().map(|v| if (*v as i64 + i as i64) % 7 == 0 { CellValue::Null } else { CellValue::Float64(*v) }).collect();
            table.push_column(Column::with_values(name.clone(), col_values));
        }

        write_columnar(&table, &path).unwrap();
        let restored = read_columnar(&path).unwrap();

        prop_assert_eq!(restored.row_count(), table.row_count());
        prop_assert_eq!(restored.column_names(), table.column_names());
        for col in &table.columns {
            prop_assert_eq!(&restored.column(&col.name).unwrap().values, &col.values);
        }
    }

    /// Invariant 2/4: reported threshold counts are monotone non-decreasing,
    /// and every positive-total period has `count_X >= 1`.
    #[test]
    fn threshold_counts_are_monotone_and_at_least_one(
        values in prop::collection::vec(1.0f64..10_000.0, 1..50),
    ) {
        let entities: Vec<String> = (0..values.len()).map(|i| format!("E{i}")).collect();
        let entity_refs: Vec<&str> = entities.iter().map(|s| s.as_str()).collect();
        let table = table_from(&entity_refs, &values);
        let schema = schema_for("entity", "revenue");
        let thresholds = vec![5, 10, 20, 50, 100];
        let params = AnalyzeParams {
            dataset_id: "ds_000000000000",
            group_by: "entity",
            value_column: "revenue",
            time_column: None,
            thresholds: &thresholds,
            large_dataset_threshold: 10_000,
        };
        let result = analyze(&table, &schema, &params).unwrap();
        prop_assert!(result.totals.error.is_none());
        let counts: Vec<usize> = result.totals.concentration.iter().map(|(_, b)| b.count).collect();
        for &count in &counts {
            prop_assert!(count >= 1);
        }
        for w in counts.windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
    }

    /// Invariant 3: total equals the sum of per-entity aggregates.
    #[test]
    fn totals_equal_sum_of_aggregates(
        values in prop::collection::vec(1.0f64..10_000.0, 1..50),
    ) {
        let entities: Vec<String> = (0..values.len()).map(|i| format!("E{i}")).collect();
        let entity_refs: Vec<&str> = entities.iter().map(|s| s.as_str()).collect();
        let table = table_from(&entity_refs, &values);
        let schema = schema_for("entity", "revenue");
        let thresholds = vec![50];
        let params = AnalyzeParams {
            dataset_id: "ds_000000000000",
            group_by: "entity",
            value_column: "revenue",
            time_column: None,
            thresholds: &thresholds,
            large_dataset_threshold: 10_000,
        };
        let result = analyze(&table, &schema, &params).unwrap();
        let expected: f64 = values.iter().sum();
        prop_assert!((result.totals.total.unwrap() - expected).abs() < 1e-6 * values.len() as f64);
    }

    /// Invariant 5: lineage is append-only — the first k entries survive any
    /// later append, for all k up to the prior length.
    #[test]
    fn lineage_append_preserves_prior_entries(ops in prop::collection::vec("[a-z_]{1,10}", 1..20)) {
        let id = DatasetId::generate();
        let mut doc = LineageDocument::new(id, chrono::Utc::now());
        let mut snapshots: Vec<Vec<String>> = Vec::new();
        for op in &ops {
            snapshots.push(doc.steps.iter().map(|s| s.operation.clone()).collect());
            doc.append(LineageStep {
                operation: op.clone(),
                timestamp: chrono::Utc::now(),
                parameters: serde_json::Value::Null,
                outputs: serde_json::Value::Null,
                warnings: None,
            });
        }
        for snapshot in &snapshots {
            let k = snapshot.len();
            let current: Vec<String> = doc.steps[..k].iter().map(|s| s.operation.clone()).collect();
            prop_assert_eq!(&current, snapshot);
        }
    }

    /// Invariant 6: normalized column names are unique and match
    /// `^[a-z][a-z0-9_]*$`.
    #[test]
    fn normalized_names_are_unique_and_well_formed(
        headers in prop::collection::vec("[ -~]{1,15}", 1..10),
    ) {
        let pairs = normalize_headers(&headers);
        let mut names: Vec<String> = pairs.iter().map(|(_, n)| n.clone()).collect();
        let unique_count = { names.sort(); names.dedup(); names.len() };
        prop_assert_eq!(unique_count, pairs.len());
        for (_, name) in &pairs {
            prop_assert!(name.chars().next().unwrap().is_ascii_lowercase());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }
    }

    /// Invariant 8: any id not matching `^ds_[0-9a-f]{12}$` is rejected
    /// before any filesystem access (parsing alone must reject it).
    #[test]
    fn malformed_dataset_ids_are_rejected(candidate in "[ -~]{0,30}") {
        let is_canonical = candidate.starts_with("ds_")
            && candidate.len() == 15
            && candidate[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        let result = DatasetId::parse(&candidate);
        prop_assert_eq!(result.is_ok(), is_canonical);
    }
}
