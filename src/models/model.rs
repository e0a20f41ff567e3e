//! Four-parameter logistic evaluation.
//!
//! The fitter relies on two primitive operations:
//! - predict `f(x)` given parameters (for residuals, plots, R²)
//! - fill a Jacobian row `∂f/∂(a, b, c, d)` at a given concentration
//!
//! With `u = (x / c)^b` and `f = d + (a - d) / (1 + u)`:
//!
//! ```text
//! ∂f/∂a = 1 / (1 + u)
//! ∂f/∂b = -(a - d) · u · ln(x / c) / (1 + u)²
//! ∂f/∂c =  (a - d) · u · (b / c) / (1 + u)²
//! ∂f/∂d = u / (1 + u)
//! ```

use crate::domain::CurveParams;

/// Predict the response at concentration `x`.
pub fn predict(x: f64, p: &CurveParams) -> f64 {
    p.d + (p.a - p.d) / (1.0 + (x / p.c).powf(p.b))
}

/// Fill the Jacobian row for concentration `x`, ordered `[a, b, c, d]`.
///
/// # Panics
/// Panics if `out` is shorter than `CurveParams::LEN`.
pub fn fill_jacobian_row(x: f64, p: &CurveParams, out: &mut [f64]) {
    let ratio = x / p.c;
    let u = ratio.powf(p.b);
    let denom = 1.0 + u;
    let denom_sq = denom * denom;
    let span = p.a - p.d;

    out[0] = 1.0 / denom;
    out[1] = -span * u * ratio.ln() / denom_sq;
    out[2] = span * u * (p.b / p.c) / denom_sq;
    out[3] = u / denom;
}

/// Sample the curve on `n` log-spaced concentrations in `[x_min, x_max]`.
///
/// Returns an empty vector when the range is not strictly positive.
pub fn sample_curve_log(p: &CurveParams, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    if !(x_min > 0.0 && x_max > 0.0 && x_min.is_finite() && x_max.is_finite()) {
        return Vec::new();
    }
    let n = n.max(2);
    let (lo, hi) = (x_min.log10(), x_max.log10());
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = 10f64.powf(lo + u * (hi - lo));
            (x, predict(x, p))
        })
        .collect()
}
