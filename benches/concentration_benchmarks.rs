//! Criterion benchmarks for the concentration engine and normalizer.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use concentration_engine::concentration::{analyze, AnalyzeParams};
use concentration_engine::core::schema::{ColumnSchema, CoercionCounters, PeriodGrain, PhysicalType, SchemaDocument, SemanticRole};
use concentration_engine::core::value::{CellValue, Column, Table};
use concentration_engine::normalizer::normalize;

fn synthetic_table(n: usize) -> Table {
    let mut table = Table::new();
    let entities: Vec<CellValue> = (0..n).map(|i| CellValue::Str(format!("ENTITY_{}", i % 500))).collect();
    let values: Vec<CellValue> = (0..n).map(|i| CellValue::Float64((i % 10_000) as f64)).collect();
    table.push_column(Column::with_values("entity", entities));
    table.push_column(Column::with_values("revenue", values));
    table
}

fn synthetic_raw_table(n: usize) -> (Table, Vec<String>) {
    let mut table = Table::new();
    let entities: Vec<CellValue> = (0..n).map(|i| CellValue::Str(format!("Entity {}", i % 500))).collect();
    let values: Vec<CellValue> = (0..n).map(|i| CellValue::Str(format!("${}.00", i % 10_000))).collect();
    table.push_column(Column::with_values("Entity Name", entities));
    table.push_column(Column::with_values("Revenue (USD)", values));
    (table, vec!["Entity Name".to_string(), "Revenue (USD)".to_string()])
}

fn schema_for(group_by: &str, value_col: &str) -> SchemaDocument {
    let column = |name: &str, physical_type, role| ColumnSchema {
        original_header: name.to_string(),
        normalized_name: name.to_string(),
        physical_type,
        semantic_role: role,
        cardinality: 500,
        null_rate: 0.0,
        coercions: CoercionCounters::new(),
        metadata: Default::default(),
    };
    SchemaDocument {
        columns: vec![
            column(group_by, PhysicalType::String, SemanticRole::Categorical),
            column(value_col, PhysicalType::Float, SemanticRole::Numeric),
        ],
        period_grain: PeriodGrain::None,
        period_grain_candidates: Vec::new(),
        time_candidates: Vec::new(),
        warnings: Vec::new(),
        notes: Vec::new(),
    }
}

fn bench_concentration_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("concentration_analyze");

    for count in [1_000, 10_000, 100_000] {
        let table = synthetic_table(count);
        let schema = schema_for("entity", "revenue");
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let params = AnalyzeParams {
                    dataset_id: "ds_000000000000",
                    group_by: "entity",
                    value_column: "revenue",
                    time_column: None,
                    thresholds: &[10, 20, 50],
                    large_dataset_threshold: 10_000,
                };
                black_box(analyze(&table, &schema, &params).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for count in [1_000, 10_000, 50_000] {
        let (raw, headers) = synthetic_raw_table(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(normalize(&raw, &headers).table.row_count()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_concentration_analyze, bench_normalize);
criterion_main!(benches);
