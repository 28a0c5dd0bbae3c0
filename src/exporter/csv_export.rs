//! Flat tabular export (`concentration.csv`).

use std::path::Path;

use crate::concentration::ConcentrationResult;
use crate::core::error::CoreError;
use crate::storage::atomic_write;

/// Writes `period, threshold, count, value, pct_of_total` rows: one row per
/// threshold for each `by_period` entry (already period-ordered by the
/// engine), then the same for `totals` (`period = "TOTAL"`), followed by the
/// transitional `GroupBy,<value>` compatibility line (intentionally not
/// valid CSV; consumers ignore extra columns). Built in memory and written
/// through `atomic_write` so a reader never observes a half-written file.
pub fn write_concentration_csv(result: &ConcentrationResult, path: &Path) -> Result<(), CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["period", "threshold", "count", "value", "pct_of_total"])
        .map_err(|e| CoreError::Internal(format!("failed to write header: {e}")))?;

    for period in result.by_period.iter().chain(std::iter::once(&result.totals)) {
        for (threshold, bucket) in &period.concentration {
            writer
                .write_record([
                    period.period.clone(),
                    threshold.to_string(),
                    bucket.count.to_string(),
                    bucket.value.to_string(),
                    format!("{:.1}", bucket.pct_of_total),
                ])
                .map_err(|e| CoreError::Internal(format!("failed to write row: {e}")))?;
        }
    }
    let mut bytes = writer.into_inner().map_err(|e| CoreError::Internal(format!("failed to flush csv: {e}")))?;
    bytes.extend_from_slice(format!("GroupBy,{}\n", result.value_column).as_bytes());

    atomic_write(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concentration::{PeriodResult, ThresholdBucket};
    use crate::core::schema::PeriodGrain;

    fn sample_result() -> ConcentrationResult {
        ConcentrationResult {
            dataset_id: "ds_000000000000".into(),
            group_by: "entity".into(),
            value_column: "revenue".into(),
            time_column: None,
            period_grain: PeriodGrain::None,
            thresholds: vec![10, 50],
            warnings: Vec::new(),
            by_period: Vec::new(),
            totals: PeriodResult {
                period: "TOTAL".into(),
                total: Some(2500.0),
                concentration: vec![
                    (10, ThresholdBucket { count: 1, value: 1000.0, pct_of_total: 40.0 }),
                    (50, ThresholdBucket { count: 1, value: 1000.0, pct_of_total: 40.0 }),
                ],
                head: Vec::new(),
                error: None,
                total_entities: Some(4),
            },
        }
    }

    #[test]
    fn emits_one_row_per_threshold_plus_trailing_groupby_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concentration.csv");
        write_concentration_csv(&sample_result(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "period,threshold,count,value,pct_of_total");
        assert_eq!(lines[1], "TOTAL,10,1,1000,40.0");
        assert_eq!(lines[2], "TOTAL,50,1,1000,40.0");
        assert_eq!(lines[3], "GroupBy,revenue");
    }
}
