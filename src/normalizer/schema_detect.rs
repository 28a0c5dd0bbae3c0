//! Per-column role assignment and the negative-value policy, tying together
//! the coercion attempts in `coerce`, `datetime`, and `boolean` into a single
//! decision per column.

use regex::Regex;

use crate::core::schema::{ColumnSchema, CoercionCounters, PhysicalType, SemanticRole};
use crate::core::value::{CellValue, Column};

use super::boolean::coerce_boolean_column;
use super::coerce::coerce_numeric_column;
use super::datetime::coerce_datetime_column;

/// Below this parse coverage, a column is not treated as a datetime column
/// at all (falls through to numeric/boolean/string). The spec leaves the
/// exact threshold unspecified for datetimes (unlike boolean's documented
/// 95%); 80% mirrors boolean's intent of "this is overwhelmingly one type"
/// while tolerating a handful of genuinely-blank or malformed cells.
const DATETIME_COVERAGE_THRESHOLD: f64 = 0.8;
const BOOLEAN_COVERAGE_THRESHOLD: f64 = 0.95;
const NUMERIC_FAILURE_THRESHOLD: f64 = 0.5;

pub struct ColumnResult {
    pub column: Column,
    pub schema: ColumnSchema,
    pub warnings: Vec<String>,
}

fn revenue_like(name: &str) -> bool {
    Regex::new(r"\b(revenue|sales|turnover)\b").unwrap().is_match(name)
}

fn cost_like(name: &str) -> bool {
    Regex::new(r"\b(cost|expense|profit|margin|adjustment|net_income)\b").unwrap().is_match(name)
}

fn is_percent_header(name: &str) -> bool {
    Regex::new(r"\b(percent|pct|percentage)\b").unwrap().is_match(name)
}

pub fn detect_and_coerce(original_header: &str, normalized_name: &str, raw: &Column) -> ColumnResult {
    let row_count = raw.len();
    let null_count = raw.null_count();
    let cardinality = raw.cardinality();
    let null_rate = if row_count == 0 { 0.0 } else { null_count as f64 / row_count as f64 };

    let strs: Vec<Option<&str>> = raw.values.iter().map(|v| v.as_str()).collect();
    let mut warnings = Vec::new();

    // 1. Datetime.
    let dt_result = coerce_datetime_column(&strs);
    if dt_result.attempted_count > 0 && dt_result.coverage() >= DATETIME_COVERAGE_THRESHOLD {
        if dt_result.ambiguous {
            warnings.push("Ambiguous date formats; defaulted to dayfirst=False".to_string());
        }
        let mut coercions = CoercionCounters::new();
        for _ in 0..dt_result.parsed_count {
            coercions.increment("datetime_parsed");
        }
        let values = dt_result.values.into_iter().map(|v| v.map(CellValue::Timestamp).unwrap_or(CellValue::Null)).collect();
        let column = Column::with_values(normalized_name, values);
        let schema = ColumnSchema {
            original_header: original_header.to_string(),
            normalized_name: normalized_name.to_string(),
            physical_type: PhysicalType::Datetime,
            semantic_role: SemanticRole::Datetime,
            cardinality,
            null_rate,
            coercions,
            metadata: Default::default(),
        };
        return ColumnResult { column, schema, warnings };
    }

    // 2. Boolean.
    let bool_result = coerce_boolean_column(&strs);
    if bool_result.coverage >= BOOLEAN_COVERAGE_THRESHOLD {
        let values = bool_result.values.into_iter().map(|v| v.map(CellValue::Bool).unwrap_or(CellValue::Null)).collect();
        let column = Column::with_values(normalized_name, values);
        let schema = ColumnSchema {
            original_header: original_header.to_string(),
            normalized_name: normalized_name.to_string(),
            physical_type: PhysicalType::Boolean,
            semantic_role: SemanticRole::Boolean,
            cardinality,
            null_rate,
            coercions: CoercionCounters::new(),
            metadata: Default::default(),
        };
        return ColumnResult { column, schema, warnings };
    }

    // 3. Numeric.
    let numeric = coerce_numeric_column(&strs, is_percent_header(normalized_name));
    if numeric.failure_rate <= NUMERIC_FAILURE_THRESHOLD {
        let mut metadata = std::collections::HashMap::new();
        if numeric.currency_symbols_seen.len() > 1 {
            metadata.insert("multi_currency".to_string(), serde_json::Value::Bool(true));
            warnings.push("Multi-currency data detected".to_string());
        }
        if numeric.mixed_decimal_conventions {
            warnings.push(format!("Mixed decimal conventions within column '{normalized_name}'"));
        }
        if revenue_like(normalized_name) && numeric.values.iter().flatten().any(|v| *v < 0.0) {
            warnings.push(format!("Unexpected negative values in column '{normalized_name}'"));
        }
        let _ = cost_like(normalized_name); // negatives silently allowed; no warning branch needed

        let values = numeric.values.into_iter().map(|v| v.map(CellValue::Float64).unwrap_or(CellValue::Null)).collect();
        let column = Column::with_values(normalized_name, values);
        let schema = ColumnSchema {
            original_header: original_header.to_string(),
            normalized_name: normalized_name.to_string(),
            physical_type: PhysicalType::Float,
            semantic_role: SemanticRole::Numeric,
            cardinality,
            null_rate,
            coercions: numeric.counters,
            metadata,
        };
        return ColumnResult { column, schema, warnings };
    }

    // 4. Remains string: identifier if every non-null value is distinct and
    // spans the whole column, else categorical.
    let role = if cardinality == row_count && row_count > 0 {
        SemanticRole::Identifier
    } else {
        SemanticRole::Categorical
    };
    let mut coercions = CoercionCounters::new();
    for _ in 0..numeric.counters.get("failed_numeric") {
        coercions.increment("failed_numeric");
    }
    let schema = ColumnSchema {
        original_header: original_header.to_string(),
        normalized_name: normalized_name.to_string(),
        physical_type: PhysicalType::String,
        semantic_role: role,
        cardinality,
        null_rate,
        coercions,
        metadata: Default::default(),
    };
    ColumnResult {
        column: raw.clone(),
        schema,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_column_coerces_to_float() {
        let raw = Column::with_values("revenue", vec![CellValue::Str("1000".into()), CellValue::Str("500".into())]);
        let result = detect_and_coerce("Revenue", "revenue", &raw);
        assert_eq!(result.schema.physical_type, PhysicalType::Float);
        assert_eq!(result.schema.semantic_role, SemanticRole::Numeric);
    }

    #[test]
    fn revenue_negatives_emit_warning() {
        let raw = Column::with_values("revenue", vec![CellValue::Str("-100".into()), CellValue::Str("500".into())]);
        let result = detect_and_coerce("Revenue", "revenue", &raw);
        assert!(result.warnings.iter().any(|w| w.contains("Unexpected negative values")));
    }

    #[test]
    fn cost_negatives_are_silent() {
        let raw = Column::with_values("cost", vec![CellValue::Str("-100".into()), CellValue::Str("500".into())]);
        let result = detect_and_coerce("Cost", "cost", &raw);
        assert!(!result.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn all_distinct_strings_become_identifier() {
        let raw = Column::with_values("id", vec![CellValue::Str("a".into()), CellValue::Str("b".into()), CellValue::Str("c".into())]);
        let result = detect_and_coerce("Id", "id", &raw);
        assert_eq!(result.schema.semantic_role, SemanticRole::Identifier);
    }

    #[test]
    fn repeated_strings_become_categorical() {
        let raw = Column::with_values("segment", vec![CellValue::Str("East".into()), CellValue::Str("East".into()), CellValue::Str("West".into())]);
        let result = detect_and_coerce("Segment", "segment", &raw);
        assert_eq!(result.schema.semantic_role, SemanticRole::Categorical);
    }

    #[test]
    fn boolean_column_detected_above_coverage() {
        let raw = Column::with_values("active", vec![CellValue::Str("yes".into()), CellValue::Str("no".into()), CellValue::Str("y".into())]);
        let result = detect_and_coerce("Active", "active", &raw);
        assert_eq!(result.schema.physical_type, PhysicalType::Boolean);
    }
}
