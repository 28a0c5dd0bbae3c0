//! Value preprocessing and numeric coercion.

use crate::core::schema::CoercionCounters;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];
const UNICODE_MINUS: char = '\u{2212}';
const NBSP: char = '\u{00A0}';
const NNBSP: char = '\u{202F}';

pub struct NumericColumnResult {
    /// One entry per input cell; `None` means the cell is null or failed to
    /// parse as a number.
    pub values: Vec<Option<f64>>,
    pub counters: CoercionCounters,
    pub currency_symbols_seen: Vec<char>,
    pub mixed_decimal_conventions: bool,
    pub failure_rate: f64,
}

/// Runs the full numeric coercion pipeline (currency stripping, scale
/// suffixes, decimal-convention disambiguation, percent normalization,
/// final float parse) over a column of raw strings (nulls pass through).
///
/// `is_percent_header` marks columns whose *header* matched
/// `percent|pct|percentage`: such columns additionally divide values
/// already in `[1, 100]` by 100, leaving `[0, 1]` as-is.
pub fn coerce_numeric_column(raw: &[Option<&str>], is_percent_header: bool) -> NumericColumnResult {
    let mut counters = CoercionCounters::new();
    let mut currency_symbols_seen = Vec::new();
    let mut mixed_decimal_conventions = false;
    let mut saw_comma_decimal = false;
    let mut saw_dot_decimal = false;
    let mut non_null = 0usize;
    let mut failed = 0usize;

    let mut values = Vec::with_capacity(raw.len());
    for cell in raw {
        let Some(text) = cell else {
            values.push(None);
            continue;
        };
        non_null += 1;
        match parse_one(
            text,
            &mut counters,
            &mut currency_symbols_seen,
            &mut saw_comma_decimal,
            &mut saw_dot_decimal,
        ) {
            Some(mut value) => {
                if text.trim_end().ends_with('%') {
                    value /= 100.0;
                    counters.increment("percent_normalized");
                } else if is_percent_header {
                    if (1.0..=100.0).contains(&value) {
                        value /= 100.0;
                    }
                }
                values.push(Some(value));
            }
            None => {
                failed += 1;
                counters.increment("failed_numeric");
                values.push(None);
            }
        }
    }

    if saw_comma_decimal && saw_dot_decimal {
        mixed_decimal_conventions = true;
    }

    let failure_rate = if non_null == 0 { 0.0 } else { failed as f64 / non_null as f64 };

    if currency_symbols_seen.len() > 1 {
        // dedup while preserving first-seen order
        let mut seen = Vec::new();
        for c in &currency_symbols_seen {
            if !seen.contains(c) {
                seen.push(*c);
            }
        }
        currency_symbols_seen = seen;
    }

    NumericColumnResult {
        values,
        counters,
        currency_symbols_seen,
        mixed_decimal_conventions,
        failure_rate,
    }
}

fn parse_one(
    raw: &str,
    counters: &mut CoercionCounters,
    currency_symbols_seen: &mut Vec<char>,
    saw_comma_decimal: &mut bool,
    saw_dot_decimal: &mut bool,
) -> Option<f64> {
    let mut s = raw.trim().to_string();

    // Whitespace / thousands-separator normalization (NBSP, NNBSP, and
    // ordinary spaces used as grouping characters between digits).
    s = s.replace(NBSP, "").replace(NNBSP, "").replace(' ', "");

    // Sign detection: parentheses, or a leading/trailing ASCII/Unicode
    // minus.
    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
        counters.increment("parentheses_to_negative");
    }
    if let Some(stripped) = s.strip_prefix(UNICODE_MINUS) {
        negative = true;
        s = stripped.to_string();
        counters.increment("unicode_minus_normalized");
    } else if let Some(stripped) = s.strip_suffix(UNICODE_MINUS) {
        negative = true;
        s = stripped.to_string();
        counters.increment("unicode_minus_normalized");
    }
    if let Some(stripped) = s.strip_prefix('-') {
        negative = true;
        s = stripped.to_string();
    } else if let Some(stripped) = s.strip_suffix('-') {
        negative = true;
        s = stripped.to_string();
    }

    // Currency symbol: at most one leading or trailing symbol stripped.
    if let Some(first) = s.chars().next() {
        if CURRENCY_SYMBOLS.contains(&first) {
            currency_symbols_seen.push(first);
            s = s[first.len_utf8()..].to_string();
            counters.increment("currency_removed");
        }
    }
    if let Some(last) = s.chars().last() {
        if CURRENCY_SYMBOLS.contains(&last) {
            currency_symbols_seen.push(last);
            s.pop();
            s = s.trim().to_string();
            counters.increment("currency_removed");
        }
    }
    s = s.trim().to_string();

    // Percent sign stays for the caller to inspect; strip for numeric parse.
    let had_percent = s.ends_with('%');
    if had_percent {
        s.pop();
    }

    // Scale suffix.
    let mut scale = 1.0f64;
    for (suffix, multiplier) in [("mm", 1e6), ("bn", 1e9), ("k", 1e3), ("K", 1e3), ("m", 1e6), ("M", 1e6), ("b", 1e9), ("B", 1e9)] {
        if s.len() > suffix.len() && s.ends_with(suffix) {
            scale = multiplier;
            s.truncate(s.len() - suffix.len());
            counters.increment("scaling_applied");
            break;
        }
    }

    // Decimal convention.
    let has_dot = s.contains('.');
    let has_comma = s.contains(',');
    if has_dot && has_comma {
        let last_dot = s.rfind('.').unwrap();
        let last_comma = s.rfind(',').unwrap();
        if last_dot > last_comma {
            *saw_dot_decimal = true;
            s = s.replace(',', "");
        } else {
            *saw_comma_decimal = true;
            s = s.replace('.', "").replace(',', ".");
        }
    } else if has_comma {
        let after = s.rsplit(',').next().unwrap_or("").len();
        if after == 3 && s.matches(',').count() >= 1 {
            s = s.replace(',', "");
        } else {
            *saw_comma_decimal = true;
            s = s.replace(',', ".");
        }
    } else if has_dot {
        let after = s.rsplit('.').next().unwrap_or("").len();
        if after == 3 && s.matches('.').count() >= 1 {
            s = s.replace('.', "");
        } else {
            *saw_dot_decimal = true;
        }
    }

    let parsed: f64 = s.parse().ok()?;
    let signed = if negative { -parsed } else { parsed };
    Some(signed * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eu_currency_with_parentheses_negative() {
        let raw = [Some("(1.234,50) €")];
        let result = coerce_numeric_column(&raw, false);
        assert_eq!(result.values[0], Some(-1234.50));
        assert_eq!(result.counters.get("currency_removed"), 1);
        assert_eq!(result.counters.get("parentheses_to_negative"), 1);
    }

    #[test]
    fn trailing_percent_divides_by_100() {
        let raw = [Some("42%")];
        let result = coerce_numeric_column(&raw, false);
        assert_eq!(result.values[0], Some(0.42));
        assert_eq!(result.counters.get("percent_normalized"), 1);
    }

    #[test]
    fn percent_header_rescales_1_to_100_range_only() {
        let raw = [Some("42"), Some("0.5")];
        let result = coerce_numeric_column(&raw, true);
        assert_eq!(result.values[0], Some(0.42));
        assert_eq!(result.values[1], Some(0.5));
    }

    #[test]
    fn scale_suffix_multiplies() {
        let raw = [Some("1.5M"), Some("2bn"), Some("3k")];
        let result = coerce_numeric_column(&raw, false);
        assert_eq!(result.values[0], Some(1_500_000.0));
        assert_eq!(result.values[1], Some(2_000_000_000.0));
        assert_eq!(result.values[2], Some(3_000.0));
    }

    #[test]
    fn majority_unparseable_reports_high_failure_rate() {
        let raw = [Some("abc"), Some("def"), Some("100")];
        let result = coerce_numeric_column(&raw, false);
        assert!(result.failure_rate > 0.5);
    }

    #[test]
    fn unicode_minus_is_normalized() {
        let raw = [Some("\u{2212}42")];
        let result = coerce_numeric_column(&raw, false);
        assert_eq!(result.values[0], Some(-42.0));
        assert_eq!(result.counters.get("unicode_minus_normalized"), 1);
    }

    #[test]
    fn single_dot_thousands_group_mirrors_single_comma_group() {
        let raw = [Some("1,234"), Some("1.234")];
        let result = coerce_numeric_column(&raw, false);
        assert_eq!(result.values[0], Some(1234.0));
        assert_eq!(result.values[1], Some(1234.0));
    }
}
