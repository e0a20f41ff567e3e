//! Duplicate-well averaging.

use tracing::warn;

use crate::domain::{AveragedRow, Measurement};

/// Replicate CV above which a row is flagged as imprecise.
pub const MAX_REPLICATE_CV_PERCENT: f64 = 15.0;

/// A row whose duplicates disagree by more than `MAX_REPLICATE_CV_PERCENT`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpreciseReplicate {
    /// Zero-based row index in the input plate.
    pub row: usize,
    pub label: String,
    pub cv_percent: f64,
}

/// Annotate each row with the arithmetic mean of its two replicates.
///
/// Row order and count are preserved; no rounding is applied.
pub fn average_replicates(rows: &[Measurement]) -> Vec<AveragedRow> {
    rows.iter()
        .map(|m| AveragedRow {
            measurement: m.clone(),
            average_od: (m.od1 + m.od2) / 2.0,
        })
        .collect()
}

/// Flag rows with a replicate CV above the precision limit.
///
/// Rows whose CV is undefined (zero average) are not flagged.
pub fn find_imprecise_replicates(rows: &[AveragedRow]) -> Vec<ImpreciseReplicate> {
    rows.iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let cv_percent = r.replicate_cv_percent();
            (cv_percent > MAX_REPLICATE_CV_PERCENT).then(|| {
                warn!(
                    sample = %r.measurement.label,
                    cv = %format!("{cv_percent:.1}"),
                    "replicate CV above {MAX_REPLICATE_CV_PERCENT}%"
                );
                ImpreciseReplicate {
                    row,
                    label: r.measurement.label.clone(),
                    cv_percent,
                }
            })
        })
        .collect()
}
