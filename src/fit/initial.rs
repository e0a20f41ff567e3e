//! Starting point for the 4PL fit.
//!
//! The solver is sensitive to where it starts, so the policy is fixed:
//!
//! - `A₀ = min(od)`
//! - `B₀ = 1`
//! - `C₀ = median(concentration)`
//! - `D₀ = max(od)`
//!
//! This assumes the response increases with concentration. Decreasing
//! standards usually converge to the mirrored form with `A > D`, which the
//! fitter reorders before returning.

use crate::domain::{CurveParams, StandardPoint};
use crate::math::median;

pub const INITIAL_HILL_SLOPE: f64 = 1.0;

/// Initial parameter guess, or `None` for an empty/non-finite set.
pub fn initial_guess(points: &[StandardPoint]) -> Option<CurveParams> {
    let od_min = points.iter().map(|p| p.od).fold(f64::INFINITY, f64::min);
    let od_max = points.iter().map(|p| p.od).fold(f64::NEG_INFINITY, f64::max);
    let concentrations: Vec<f64> = points.iter().map(|p| p.concentration).collect();
    let c0 = median(&concentrations)?;

    if !(od_min.is_finite() && od_max.is_finite()) {
        return None;
    }

    Some(CurveParams::new(od_min, INITIAL_HILL_SLOPE, c0, od_max))
}
