//! Temporal column detection, period grain precedence, and `period_key`
//! derivation.

use chrono::{Datelike, TimeZone, Utc};
use regex::Regex;

use crate::core::schema::{ColumnSchema, PeriodGrain, PhysicalType};
use crate::core::value::{CellValue, Table};

const NAME_TOKENS: [&str; 5] = ["date", "dt", "year", "month", "quarter"];
const MULTI_WORD_TOKENS: [&str; 4] = ["as_of", "posting_date", "transaction_date", "fiscal_period"];

pub struct TemporalAnalysis {
    pub time_candidates: Vec<String>,
    pub period_grain: PeriodGrain,
    pub period_grain_candidates: Vec<PeriodGrain>,
    /// `None` when `period_grain == PeriodGrain::None`.
    pub period_key: Option<Vec<Option<String>>>,
}

fn matches_name_boundary(normalized_name: &str) -> bool {
    if MULTI_WORD_TOKENS.iter().any(|t| normalized_name.contains(t)) {
        return true;
    }
    normalized_name.split('_').any(|part| NAME_TOKENS.contains(&part))
}

fn string_values<'a>(table: &'a Table, name: &str) -> Option<Vec<Option<&'a str>>> {
    table.column(name).map(|c| c.values.iter().map(|v| v.as_str()).collect())
}

/// Share of non-null strings matching `pattern`.
fn match_rate(values: &[Option<&str>], pattern: &Regex) -> f64 {
    let non_null: Vec<&&str> = values.iter().filter_map(|v| v.as_ref()).collect();
    if non_null.is_empty() {
        return 0.0;
    }
    let matched = non_null.iter().filter(|v| pattern.is_match(v.trim())).count();
    matched as f64 / non_null.len() as f64
}

fn as_year_component(table: &Table, name: &str) -> Vec<Option<i32>> {
    match table.column(name) {
        Some(col) => col
            .values
            .iter()
            .map(|v| match v {
                CellValue::Float64(f) => Some(*f as i32),
                CellValue::Int64(i) => Some(*i as i32),
                CellValue::Str(s) => s.trim().parse::<i32>().ok(),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    }
}

fn as_month_component(table: &Table, name: &str) -> Vec<Option<u32>> {
    match table.column(name) {
        Some(col) => col
            .values
            .iter()
            .map(|v| match v {
                CellValue::Float64(f) => Some(*f as u32),
                CellValue::Int64(i) => Some(*i as u32),
                CellValue::Str(s) => s.trim().parse::<u32>().ok(),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    }
}

fn as_quarter_component(table: &Table, name: &str) -> Vec<Option<u32>> {
    let quarter_label = Regex::new(r"(?i)^q([1-4])$").unwrap();
    match table.column(name) {
        Some(col) => col
            .values
            .iter()
            .map(|v| match v {
                CellValue::Float64(f) => Some(*f as u32).filter(|q| (1..=4).contains(q)),
                CellValue::Int64(i) => Some(*i as u32).filter(|q| (1..=4).contains(q)),
                CellValue::Str(s) => quarter_label
                    .captures(s.trim())
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok()),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    }
}

pub fn analyze_temporal(table: &Table, columns: &[ColumnSchema]) -> TemporalAnalysis {
    let row_count = table.row_count();

    let date_col = columns.iter().find(|c| c.physical_type == PhysicalType::Datetime).map(|c| c.normalized_name.clone());

    let four_digit_year = Regex::new(r"^(19|20)\d{2}$").unwrap();
    let quarter_label = Regex::new(r"(?i)^q[1-4]$").unwrap();

    let mut time_candidates: Vec<String> = Vec::new();
    let mut year_col: Option<String> = None;
    let mut month_col: Option<String> = None;
    let mut quarter_col: Option<String> = None;

    for col in columns {
        let name_hit = matches_name_boundary(&col.normalized_name);
        let value_hit = string_values(table, &col.normalized_name)
            .map(|vals| match_rate(&vals, &four_digit_year) > 0.8 || match_rate(&vals, &quarter_label) > 0.8)
            .unwrap_or(false);

        if Some(&col.normalized_name) == date_col.as_ref() || name_hit || value_hit {
            time_candidates.push(col.normalized_name.clone());
        }

        if col.normalized_name.split('_').any(|p| p == "year") && year_col.is_none() {
            year_col = Some(col.normalized_name.clone());
        }
        if col.normalized_name.split('_').any(|p| p == "month") && month_col.is_none() {
            month_col = Some(col.normalized_name.clone());
        }
        if col.normalized_name.split('_').any(|p| p == "quarter") && quarter_col.is_none() {
            quarter_col = Some(col.normalized_name.clone());
        }
    }

    let year_month_computable = date_col.is_some() || (year_col.is_some() && month_col.is_some());
    let year_quarter_computable = year_col.is_some() && quarter_col.is_some();
    let year_computable = year_col.is_some();

    let mut period_grain_candidates = Vec::new();
    if year_month_computable {
        period_grain_candidates.push(PeriodGrain::YearMonth);
    }
    if year_quarter_computable {
        period_grain_candidates.push(PeriodGrain::YearQuarter);
    }
    if year_computable {
        period_grain_candidates.push(PeriodGrain::Year);
    }

    let period_grain = period_grain_candidates.first().copied().unwrap_or(PeriodGrain::None);

    let period_key = match period_grain {
        PeriodGrain::None => None,
        PeriodGrain::YearMonth => {
            if let Some(date_name) = &date_col {
                let col = table.column(date_name).unwrap();
                Some(
                    col.values
                        .iter()
                        .map(|v| match v {
                            CellValue::Timestamp(secs) => {
                                let dt = Utc.timestamp_opt(*secs, 0).single()?;
                                Some(format!("{}-M{:02}", dt.year(), dt.month()))
                            }
                            _ => None,
                        })
                        .collect(),
                )
            } else {
                let years = as_year_component(table, year_col.as_deref().unwrap_or(""));
                let months = as_month_component(table, month_col.as_deref().unwrap_or(""));
                Some(
                    (0..row_count)
                        .map(|i| match (years.get(i).copied().flatten(), months.get(i).copied().flatten()) {
                            (Some(y), Some(m)) => Some(format!("{y}-M{m:02}")),
                            _ => None,
                        })
                        .collect(),
                )
            }
        }
        PeriodGrain::YearQuarter => {
            let years = as_year_component(table, year_col.as_deref().unwrap_or(""));
            let quarters = as_quarter_component(table, quarter_col.as_deref().unwrap_or(""));
            Some(
                (0..row_count)
                    .map(|i| match (years.get(i).copied().flatten(), quarters.get(i).copied().flatten()) {
                        (Some(y), Some(q)) => Some(format!("{y}-Q{q}")),
                        _ => None,
                    })
                    .collect(),
            )
        }
        PeriodGrain::Year => {
            let years = as_year_component(table, year_col.as_deref().unwrap_or(""));
            Some((0..row_count).map(|i| years.get(i).copied().flatten().map(|y| y.to_string())).collect())
        }
    };

    TemporalAnalysis {
        time_candidates,
        period_grain,
        period_grain_candidates,
        period_key,
    }
}
