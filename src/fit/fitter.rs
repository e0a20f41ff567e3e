//! 4PL standard-curve fitting.
//!
//! Given standards `(x_i, y_i)` (concentration, corrected OD) we minimize
//!
//! ```text
//! Σ (y_i − f(x_i; a, b, c, d))²
//! ```
//!
//! with Levenberg–Marquardt from the fixed initial guess, then report R² on
//! the same data. Any failure yields a `FitError` and no parameters.

use nalgebra::{DMatrix, DVector};
use tracing::{info, warn};

use crate::domain::{CorrectedRow, CurveParams, FitQuality, FitResult, StandardPoint};
use crate::fit::initial_guess;
use crate::math::{LeastSquaresProblem, LmError, LmOptions, minimize, r_squared};
use crate::models::{fill_jacobian_row, predict};

/// R² below this is logged as a poor calibration (never rejected).
pub const LOW_R_SQUARED: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("need at least {required} standards to fit 4 parameters, got {n}")]
    TooFewPoints { n: usize, required: usize },
    #[error("standard #{index} has an invalid concentration ({value}); concentrations must be finite and > 0")]
    InvalidConcentration { index: usize, value: f64 },
    #[error("standard #{index} has a non-finite corrected OD ({value})")]
    InvalidOd { index: usize, value: f64 },
    #[error(transparent)]
    Solver(#[from] LmError),
    #[error("solver returned non-finite parameters")]
    NonFiniteParams,
}

struct FourPlProblem<'a> {
    points: &'a [StandardPoint],
}

impl LeastSquaresProblem for FourPlProblem<'_> {
    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        let params = to_params(p);
        DVector::from_iterator(
            self.points.len(),
            self.points.iter().map(|s| s.od - predict(s.concentration, &params)),
        )
    }

    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
        let params = to_params(p);
        let mut j = DMatrix::<f64>::zeros(self.points.len(), CurveParams::LEN);
        let mut row = [0.0; CurveParams::LEN];
        for (i, s) in self.points.iter().enumerate() {
            fill_jacobian_row(s.concentration, &params, &mut row);
            for (k, v) in row.iter().enumerate() {
                j[(i, k)] = *v;
            }
        }
        j
    }
}

fn to_params(p: &DVector<f64>) -> CurveParams {
    CurveParams::new(p[0], p[1], p[2], p[3])
}

/// Collect `(concentration, corrected OD)` pairs from corrected standard rows.
///
/// Rows without a reference concentration are skipped.
pub fn standard_points(rows: &[CorrectedRow]) -> Vec<StandardPoint> {
    rows.iter()
        .filter_map(|r| {
            r.measurement.concentration.map(|concentration| StandardPoint {
                concentration,
                od: r.corrected_od,
            })
        })
        .collect()
}

/// Fit a 4PL curve to the standards.
///
/// The returned parameters always satisfy `a <= d`; decreasing standards come
/// back with a negative slope `b`.
pub fn fit_four_pl(points: &[StandardPoint], opts: &LmOptions) -> Result<FitResult, FitError> {
    validate_points(points)?;

    let guess = initial_guess(points).ok_or(FitError::TooFewPoints {
        n: points.len(),
        required: CurveParams::LEN,
    })?;

    let problem = FourPlProblem { points };
    let start = DVector::from_row_slice(&guess.to_array());
    let report = minimize(&problem, start, opts)?;

    let params = to_params(&report.params);
    if !params.is_finite() {
        return Err(FitError::NonFiniteParams);
    }
    let params = canonical_order(params);

    let observed: Vec<f64> = points.iter().map(|p| p.od).collect();
    let predicted: Vec<f64> = points.iter().map(|p| predict(p.concentration, &params)).collect();
    let r2 = r_squared(&observed, &predicted);
    let n = points.len();

    let quality = FitQuality {
        r_squared: r2,
        sse: report.sse,
        rmse: (report.sse / n as f64).sqrt(),
        n,
        evaluations: report.evaluations,
        iterations: report.iterations,
    };

    info!(
        r_squared = %format!("{r2:.4}"),
        a = %format!("{:.4}", params.a),
        b = %format!("{:.4}", params.b),
        c = %format!("{:.4}", params.c),
        d = %format!("{:.4}", params.d),
        evaluations = report.evaluations,
        "standard curve fitted"
    );
    if r2.is_nan() || r2 < LOW_R_SQUARED {
        warn!(
            r_squared = r2,
            "poor standard curve fit; check standards for non-monotonic or duplicate points"
        );
    }

    Ok(FitResult { params, quality })
}

/// `(a, b, c, d)` and `(d, -b, c, a)` describe the same curve. Keep the
/// lower asymptote in `a` so inversion and the report read it correctly.
fn canonical_order(params: CurveParams) -> CurveParams {
    if params.a > params.d {
        CurveParams::new(params.d, -params.b, params.c, params.a)
    } else {
        params
    }
}

fn validate_points(points: &[StandardPoint]) -> Result<(), FitError> {
    if points.len() < CurveParams::LEN {
        return Err(FitError::TooFewPoints {
            n: points.len(),
            required: CurveParams::LEN,
        });
    }
    for (i, p) in points.iter().enumerate() {
        if !p.concentration.is_finite() || p.concentration <= 0.0 {
            return Err(FitError::InvalidConcentration {
                index: i + 1,
                value: p.concentration,
            });
        }
        if !p.od.is_finite() {
            return Err(FitError::InvalidOd {
                index: i + 1,
                value: p.od,
            });
        }
    }
    Ok(())
}
