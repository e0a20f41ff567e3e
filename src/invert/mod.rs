//! Concentration estimates from the inverse 4PL curve.
//!
//! Solving `od = d + (a − d) / (1 + (x / c)^b)` for `x`:
//!
//! ```text
//! (d − a) / (od − a) − 1 = (x / c)^(−b)
//! x = c · ((d − a) / (od − a) − 1)^(−1 / b)
//! ```
//!
//! The closed form is only meaningful strictly between the asymptotes. The
//! range checks are ordered (`od ≥ d` first, then `od ≤ a`) and applied as-is
//! even when a fit returns `a > d`.

use tracing::warn;

use crate::domain::{Concentration, ConcentrationRow, CorrectedRow, CurveParams};

/// Invert the fitted curve at a single corrected OD.
pub fn invert_od(od: f64, p: &CurveParams) -> Concentration {
    if od >= p.d {
        return Concentration::Saturated;
    }
    if od <= p.a {
        return Concentration::BelowDetection;
    }

    let base = (p.d - p.a) / (od - p.a) - 1.0;
    let x = p.c * base.powf(-1.0 / p.b);
    if x.is_finite() {
        Concentration::Value(x)
    } else {
        Concentration::NumericError
    }
}

/// Derive a concentration for every row, in input order.
///
/// Blank rows are assigned `0` without evaluating the inverse.
pub fn calculate_concentrations(rows: &[CorrectedRow], params: &CurveParams) -> Vec<ConcentrationRow> {
    rows.iter()
        .map(|row| {
            let concentration = if row.is_blank {
                Concentration::Value(0.0)
            } else {
                invert_od(row.corrected_od, params)
            };
            if !concentration.is_defined() {
                warn!(
                    sample = %row.measurement.label,
                    corrected_od = row.corrected_od,
                    reason = concentration.reason(),
                    "concentration out of range"
                );
            }
            ConcentrationRow {
                row: row.clone(),
                concentration,
            }
        })
        .collect()
}
