//! Concentration engine: groups a numeric metric by a categorical entity,
//! ranks it, and buckets the ranked distribution by threshold, once per
//! period and once overall.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::core::error::{CoreError, CoreResult};
use crate::core::schema::{PeriodGrain, PhysicalType, SchemaDocument};
use crate::core::value::Table;

const MAX_THRESHOLDS: usize = 10;
const HEAD_ROWS: usize = 10;

#[derive(Debug, Clone)]
pub struct ThresholdBucket {
    pub count: usize,
    pub value: f64,
    pub pct_of_total: f64,
}

#[derive(Debug, Clone)]
pub struct HeadRow {
    pub entity: String,
    pub value: f64,
    pub cumsum: f64,
    pub cumulative_pct: f64,
}

#[derive(Debug, Clone)]
pub struct PeriodResult {
    pub period: String,
    pub total: Option<f64>,
    /// Ascending threshold order.
    pub concentration: Vec<(u32, ThresholdBucket)>,
    pub head: Vec<HeadRow>,
    pub error: Option<String>,
    pub total_entities: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ConcentrationResult {
    pub dataset_id: String,
    pub group_by: String,
    pub value_column: String,
    pub time_column: Option<String>,
    pub period_grain: PeriodGrain,
    pub thresholds: Vec<u32>,
    pub warnings: Vec<String>,
    pub by_period: Vec<PeriodResult>,
    pub totals: PeriodResult,
}

impl ConcentrationResult {
    /// Renders the concentration result document, with `top_<X>` keys and
    /// `<group_by>`/`<value>` keyed head rows built at the serialization edge
    /// since the threshold set is only known at analysis time.
    pub fn to_json(&self, export_links: Option<&HashMap<String, String>>) -> Value {
        let mut root = Map::new();
        root.insert("dataset_id".into(), Value::String(self.dataset_id.clone()));
        root.insert("period_grain".into(), Value::String(period_grain_str(self.period_grain).into()));
        root.insert("thresholds".into(), Value::Array(self.thresholds.iter().map(|t| Value::from(*t)).collect()));
        root.insert("warnings".into(), Value::Array(self.warnings.iter().map(|w| Value::String(w.clone())).collect()));
        root.insert(
            "by_period".into(),
            Value::Array(self.by_period.iter().map(|p| self.period_json(p)).collect()),
        );
        root.insert("totals".into(), self.period_json(&self.totals));
        root.insert(
            "export_links".into(),
            match export_links {
                Some(links) => Value::Object(links.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()),
                None => Value::Null,
            },
        );
        Value::Object(root)
    }

    fn period_json(&self, period: &PeriodResult) -> Value {
        let mut obj = Map::new();
        obj.insert("period".into(), Value::String(period.period.clone()));
        if let Some(err) = &period.error {
            obj.insert("error".into(), Value::String(err.clone()));
            return Value::Object(obj);
        }
        obj.insert("total".into(), Value::from(period.total.unwrap_or(0.0)));
        if let Some(n) = period.total_entities {
            obj.insert("total_entities".into(), Value::from(n));
        }
        let mut concentration = Map::new();
        for (threshold, bucket) in &period.concentration {
            let mut b = Map::new();
            b.insert("count".into(), Value::from(bucket.count));
            b.insert("value".into(), Value::from(bucket.value));
            b.insert("pct_of_total".into(), Value::from(round1(bucket.pct_of_total)));
            concentration.insert(format!("top_{threshold}"), Value::Object(b));
        }
        obj.insert("concentration".into(), Value::Object(concentration));
        obj.insert(
            "head".into(),
            Value::Array(
                period
                    .head
                    .iter()
                    .map(|row| {
                        let mut h = Map::new();
                        h.insert(self.group_by.clone(), Value::String(row.entity.clone()));
                        h.insert(self.value_column.clone(), Value::from(row.value));
                        h.insert("cumsum".into(), Value::from(row.cumsum));
                        h.insert("cumulative_pct".into(), Value::from(row.cumulative_pct));
                        Value::Object(h)
                    })
                    .collect(),
            ),
        );
        Value::Object(obj)
    }
}

fn period_grain_str(grain: PeriodGrain) -> &'static str {
    match grain {
        PeriodGrain::YearMonth => "year_month",
        PeriodGrain::YearQuarter => "year_quarter",
        PeriodGrain::Year => "year",
        PeriodGrain::None => "none",
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Sorts, dedupes, and range-checks thresholds. Validation runs before
/// dedup-count so `[50,10,10,120]` rejects on the out-of-range `120` rather
/// than silently dropping it.
pub fn validate_thresholds(raw: &[i64]) -> CoreResult<Vec<u32>> {
    if raw.is_empty() {
        return Err(CoreError::Validation("thresholds must not be empty".into()));
    }
    for t in raw {
        if *t < 1 || *t > 100 {
            return Err(CoreError::Validation(format!("threshold {t} out of range [1,100]")));
        }
    }
    let mut sorted: Vec<u32> = raw.iter().map(|t| *t as u32).collect();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() > MAX_THRESHOLDS {
        return Err(CoreError::Validation(format!("at most {MAX_THRESHOLDS} thresholds allowed")));
    }
    Ok(sorted)
}

pub struct AnalyzeParams<'a> {
    pub dataset_id: &'a str,
    pub group_by: &'a str,
    pub value_column: &'a str,
    pub time_column: Option<&'a str>,
    pub thresholds: &'a [u32],
    pub large_dataset_threshold: usize,
}

pub fn analyze(table: &Table, schema: &SchemaDocument, params: &AnalyzeParams) -> CoreResult<ConcentrationResult> {
    schema.column(params.group_by).ok_or_else(|| CoreError::column_not_found(params.group_by))?;
    let value_schema = schema.column(params.value_column).ok_or_else(|| CoreError::column_not_found(params.value_column))?;
    if !matches!(value_schema.physical_type, PhysicalType::Float | PhysicalType::Integer) {
        return Err(CoreError::Validation(format!("Column '{}' is not numeric", params.value_column)));
    }

    let mut warnings = Vec::new();
    let period_column_name = params.time_column.or_else(|| table.has_column("period_key").then_some("period_key"));

    let by_period = match period_column_name {
        Some(period_col) if schema.period_grain != PeriodGrain::None || params.time_column.is_some() => {
            let mut periods: Vec<String> = table
                .column(period_col)
                .map(|c| c.values.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect())
                .unwrap_or_default();
            periods.sort();
            periods.dedup();

            periods
                .into_iter()
                .map(|period| {
                    let row_indices: Vec<usize> = table
                        .column(period_col)
                        .map(|c| {
                            c.values
                                .iter()
                                .enumerate()
                                .filter(|(_, v)| v.as_str() == Some(period.as_str()))
                                .map(|(i, _)| i)
                                .collect()
                        })
                        .unwrap_or_default();
                    compute_period(table, params, &row_indices, period.clone(), &mut warnings, false)
                })
                .collect()
        }
        _ => Vec::new(),
    };

    let all_rows: Vec<usize> = (0..table.row_count()).collect();
    let mut totals = compute_period(table, params, &all_rows, "TOTAL".to_string(), &mut warnings, true);
    if totals.error.is_none() {
        totals.total_entities = Some(distinct_entity_count(table, params.group_by, &all_rows));
    }

    Ok(ConcentrationResult {
        dataset_id: params.dataset_id.to_string(),
        group_by: params.group_by.to_string(),
        value_column: params.value_column.to_string(),
        time_column: params.time_column.map(|s| s.to_string()),
        period_grain: schema.period_grain,
        thresholds: params.thresholds.to_vec(),
        warnings,
        by_period,
        totals,
    })
}

fn distinct_entity_count(table: &Table, group_by: &str, rows: &[usize]) -> usize {
    let mut keys: Vec<String> = rows
        .iter()
        .filter_map(|&r| table.get(r, group_by))
        .map(|v| v.lexical_form())
        .collect();
    keys.sort();
    keys.dedup();
    keys.len()
}

fn compute_period(
    table: &Table,
    params: &AnalyzeParams,
    row_indices: &[usize],
    period: String,
    warnings: &mut Vec<String>,
    is_total: bool,
) -> PeriodResult {
    let mut aggregates: HashMap<String, f64> = HashMap::new();
    for &row in row_indices {
        let Some(value) = table.get(row, params.value_column).and_then(|v| v.as_f64()) else {
            continue;
        };
        let key = table.get(row, params.group_by).map(|v| v.lexical_form()).unwrap_or_default();
        *aggregates.entry(key).or_insert(0.0) += value;
    }

    let mut ranked: Vec<(String, f64)> = aggregates.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));

    if ranked.len() > params.large_dataset_threshold {
        warn!(period = %period, entities = ranked.len(), threshold = params.large_dataset_threshold, "large dataset");
        warnings.push(format!("Large dataset: {} entities exceed configured threshold", ranked.len()));
    }

    let total: f64 = ranked.iter().map(|(_, v)| *v).sum();
    let marker = format!("concentration_calculation_{period}: completed");

    if total <= 0.0 {
        warnings.push(marker);
        return PeriodResult {
            period,
            total: None,
            concentration: Vec::new(),
            head: Vec::new(),
            error: Some("Total value is non-positive; cannot compute concentration".to_string()),
            total_entities: None,
        };
    }

    let mut cumsum = 0.0;
    let mut cumulative_pcts = Vec::with_capacity(ranked.len());
    for (_, value) in &ranked {
        cumsum += value;
        cumulative_pcts.push(cumsum / total * 100.0);
    }

    let mut concentration = Vec::with_capacity(params.thresholds.len());
    for &threshold in params.thresholds {
        let count = cumulative_pcts.iter().take_while(|&&pct| pct <= threshold as f64).count().max(1);
        let value: f64 = ranked.iter().take(count).map(|(_, v)| *v).sum();
        let pct_of_total = value / total * 100.0;
        concentration.push((threshold, ThresholdBucket { count, value, pct_of_total }));
    }

    let mut running = 0.0;
    let head = ranked
        .iter()
        .zip(cumulative_pcts.iter())
        .take(HEAD_ROWS)
        .map(|((entity, value), cumulative_pct)| {
            running += value;
            HeadRow {
                entity: entity.clone(),
                value: *value,
                cumsum: running,
                cumulative_pct: *cumulative_pct,
            }
        })
        .collect();

    warnings.push(marker);
    let _ = is_total;
    PeriodResult {
        period,
        total: Some(total),
        concentration,
        head,
        error: None,
        total_entities: None,
    }
}
