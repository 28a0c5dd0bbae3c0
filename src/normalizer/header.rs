//! Header cleanup.

use std::collections::HashSet;

/// Cleans a single header: trim, lowercase, collapse runs of
/// non-alphanumerics to `_`, strip leading/trailing `_`. Deduplication
/// across a whole header row happens in [`normalize_headers`].
fn clean_one(original: &str) -> String {
    let lower = original.trim().to_lowercase();
    let mut collapsed = String::with_capacity(lower.len());
    let mut last_was_sep = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            collapsed.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            collapsed.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = collapsed.trim_matches('_').to_string();
    if trimmed.is_empty() {
        "column".to_string()
    } else if trimmed.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        format!("col_{trimmed}")
    } else {
        trimmed
    }
}

/// Cleans a full header row, deduplicating collisions with `_2`, `_3`, ...
/// suffixes, and returns `(original, normalized)` pairs in column order.
///
/// Candidate suffixed names are checked against every name already emitted,
/// not just a per-base counter, so a literal header that happens to match an
/// already-assigned suffixed form (e.g. `"Value_2"` following two `"Value"`
/// headers) doesn't collide with it.
pub fn normalize_headers(originals: &[String]) -> Vec<(String, String)> {
    let mut emitted: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(originals.len());
    for original in originals {
        let base = clean_one(original);
        let mut name = base.clone();
        let mut suffix = 1u32;
        while emitted.contains(&name) {
            suffix += 1;
            name = format!("{base}_{suffix}");
        }
        emitted.insert(name.clone());
        out.push((original.clone(), name));
    }
    out
}
