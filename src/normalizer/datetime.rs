//! Datetime coercion.

use chrono::NaiveDate;

const CANDIDATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

pub struct DatetimeColumnResult {
    /// One entry per input cell; `None` for null cells or cells that failed
    /// to parse (`dayfirst = false`, strict error-to-null).
    pub values: Vec<Option<i64>>,
    pub parsed_count: usize,
    pub attempted_count: usize,
    /// More than one distinct format was needed across the column's cells.
    pub ambiguous: bool,
}

impl DatetimeColumnResult {
    pub fn coverage(&self) -> f64 {
        if self.attempted_count == 0 {
            0.0
        } else {
            self.parsed_count as f64 / self.attempted_count as f64
        }
    }
}

/// Parses a single cell against the candidate format list, `dayfirst = false`
/// (month-before-day is tried ahead of day-before-month is never tried at
/// all — ambiguous `DD/MM` input is left unparsed rather than guessed).
fn parse_one(raw: &str) -> Option<(i64, &'static str)> {
    let trimmed = raw.trim();
    for fmt in CANDIDATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            let seconds = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
            return Some((seconds, fmt));
        }
    }
    None
}

/// Attempts to parse every non-null cell in a column as a calendar date.
/// Callers decide, from `coverage()`, whether the column as a whole should
/// be typed as `datetime`.
pub fn coerce_datetime_column(raw: &[Option<&str>]) -> DatetimeColumnResult {
    let mut values = Vec::with_capacity(raw.len());
    let mut parsed_count = 0;
    let mut attempted_count = 0;
    let mut formats_used: Vec<&'static str> = Vec::new();

    for cell in raw {
        let Some(text) = cell else {
            values.push(None);
            continue;
        };
        attempted_count += 1;
        match parse_one(text) {
            Some((seconds, fmt)) => {
                parsed_count += 1;
                if !formats_used.contains(&fmt) {
                    formats_used.push(fmt);
                }
                values.push(Some(seconds));
            }
            None => values.push(None),
        }
    }

    DatetimeColumnResult {
        values,
        parsed_count,
        attempted_count,
        ambiguous: formats_used.len() > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let raw = [Some("2024-01-15"), Some("2024-02-20")];
        let result = coerce_datetime_column(&raw);
        assert_eq!(result.parsed_count, 2);
        assert!(!result.ambiguous);
    }

    #[test]
    fn mixed_formats_flagged_ambiguous() {
        let raw = [Some("2024-01-15"), Some("01/20/2024")];
        let result = coerce_datetime_column(&raw);
        assert_eq!(result.parsed_count, 2);
        assert!(result.ambiguous);
    }

    #[test]
    fn unparseable_cells_become_null_not_errors() {
        let raw = [Some("not a date"), Some("2024-01-15")];
        let result = coerce_datetime_column(&raw);
        assert_eq!(result.values[0], None);
        assert_eq!(result.parsed_count, 1);
        assert!(result.coverage() < 1.0);
    }
}
