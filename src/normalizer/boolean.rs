//! Boolean coercion.

const TRUE_TOKENS: [&str; 4] = ["true", "yes", "y", "1"];
const FALSE_TOKENS: [&str; 4] = ["false", "no", "n", "0"];

pub struct BooleanColumnResult {
    pub values: Vec<Option<bool>>,
    pub coverage: f64,
}

/// Coerces a column to boolean only if at least 95% of non-null cells match
/// one of `{true, false, yes, no, y, n, 1, 0}` (case-insensitive). Callers
/// must check `coverage` against the 0.95 threshold before trusting `values`.
pub fn coerce_boolean_column(raw: &[Option<&str>]) -> BooleanColumnResult {
    let mut values = Vec::with_capacity(raw.len());
    let mut non_null = 0usize;
    let mut matched = 0usize;

    for cell in raw {
        let Some(text) = cell else {
            values.push(None);
            continue;
        };
        non_null += 1;
        let lower = text.trim().to_lowercase();
        if TRUE_TOKENS.contains(&lower.as_str()) {
            matched += 1;
            values.push(Some(true));
        } else if FALSE_TOKENS.contains(&lower.as_str()) {
            matched += 1;
            values.push(Some(false));
        } else {
            values.push(None);
        }
    }

    let coverage = if non_null == 0 { 0.0 } else { matched as f64 / non_null as f64 };
    BooleanColumnResult { values, coverage }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_coverage_of_canonical_tokens() {
        let raw = [Some("Yes"), Some("No"), Some("Y"), Some("n"), Some("TRUE"), Some("0")];
        let result = coerce_boolean_column(&raw);
        assert_eq!(result.coverage, 1.0);
        assert_eq!(result.values[0], Some(true));
        assert_eq!(result.values[1], Some(false));
    }

    #[test]
    fn low_coverage_below_threshold() {
        let raw = [Some("maybe"), Some("yes"), Some("definitely not")];
        let result = coerce_boolean_column(&raw);
        assert!(result.coverage < 0.95);
    }
}
