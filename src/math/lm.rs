//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ r_i(p)²` with `r = y − f(p)` given the model Jacobian
//! `J = ∂f/∂p`. Each iteration solves the damped step
//! `(JᵀJ + λ S) δ = Jᵀ r` (see `lsq::solve_damped_step`), where `S` holds the
//! squared column norms of `J` (Marquardt scaling). Successful steps shrink
//! `λ` towards Gauss–Newton; rejected steps grow it towards gradient descent.
//!
//! Termination mirrors the classic MINPACK tests:
//! - `ftol`: relative SSE reduction of an undamped-retry step is tiny
//! - `xtol`: the proposed step is tiny relative to the parameter norm
//! - `gtol`: the gradient `Jᵀr` vanishes
//!
//! The residual-evaluation budget is a hard cap; exceeding it is an error.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::math::solve_damped_step;

/// SSE at or below this is treated as an exact fit.
const ZERO_SSE: f64 = 1e-30;
/// Floor for the Marquardt scale of a parameter with an all-zero Jacobian column.
const MIN_SCALE: f64 = 1e-12;
const MIN_LAMBDA: f64 = 1e-15;
const MAX_LAMBDA: f64 = 1e32;

/// A nonlinear least-squares problem.
pub trait LeastSquaresProblem {
    /// Residuals `y − f(p)` for each observation.
    fn residuals(&self, p: &DVector<f64>) -> DVector<f64>;

    /// Model Jacobian `∂f/∂p` (rows = observations, columns = parameters).
    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64>;
}

/// Solver options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    /// Maximum number of residual evaluations.
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl LmOptions {
    pub const DEFAULT_MAX_EVALUATIONS: usize = 10_000;
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: Self::DEFAULT_MAX_EVALUATIONS,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 1e-14,
            initial_lambda: 1e-3,
        }
    }
}

/// Why the solver stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ZeroResidual,
    Ftol,
    Xtol,
    Gradient,
}

/// Converged solution.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    pub sse: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LmError {
    #[error("residuals are not finite at the starting point")]
    NonFiniteStart,
    #[error("Jacobian is not finite after {iterations} iteration(s)")]
    NonFiniteJacobian { iterations: usize },
    #[error("no convergence within {evaluations} function evaluations")]
    NotConverged { evaluations: usize },
    #[error("damping reached {lambda:e} without an acceptable step")]
    Stalled { lambda: f64 },
}

/// Minimize the problem's SSE starting from `start`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    start: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, LmError> {
    let mut p = start;
    let mut r = problem.residuals(&p);
    let mut evaluations = 1usize;
    if !all_finite(r.iter()) {
        return Err(LmError::NonFiniteStart);
    }

    let mut sse = r.norm_squared();
    let mut lambda = opts.initial_lambda.max(MIN_LAMBDA);
    let mut iterations = 0usize;

    let finish = |params: DVector<f64>, sse: f64, evaluations, iterations, termination| {
        debug!(?termination, evaluations, iterations, sse, "levenberg-marquardt finished");
        Ok(LmReport {
            params,
            sse,
            evaluations,
            iterations,
            termination,
        })
    };

    loop {
        if sse <= ZERO_SSE {
            return finish(p, sse, evaluations, iterations, Termination::ZeroResidual);
        }

        let j = problem.jacobian(&p);
        if !all_finite(j.iter()) {
            return Err(LmError::NonFiniteJacobian { iterations });
        }

        let gradient = j.transpose() * &r;
        if gradient.amax() <= opts.gtol {
            return finish(p, sse, evaluations, iterations, Termination::Gradient);
        }

        let scale = DVector::from_iterator(
            j.ncols(),
            j.column_iter().map(|c| c.norm_squared().max(MIN_SCALE)),
        );
        iterations += 1;

        let mut rejected = 0usize;
        loop {
            if evaluations >= opts.max_evaluations {
                return Err(LmError::NotConverged { evaluations });
            }

            let Some(step) = solve_damped_step(&j, &r, &scale, lambda) else {
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    return Err(LmError::Stalled { lambda });
                }
                rejected += 1;
                continue;
            };

            let step_is_small = step.norm() <= opts.xtol * (p.norm() + opts.xtol);
            let candidate = &p + &step;
            let r_new = problem.residuals(&candidate);
            evaluations += 1;

            let sse_new = if all_finite(r_new.iter()) {
                r_new.norm_squared()
            } else {
                f64::INFINITY
            };

            if sse_new < sse {
                let reduction = (sse - sse_new) / sse;
                p = candidate;
                r = r_new;
                sse = sse_new;
                lambda = (lambda / 10.0).max(MIN_LAMBDA);

                // A tiny gain after damping escalation only says the step was
                // throttled, not that the minimum was reached.
                if rejected == 0 && reduction <= opts.ftol {
                    return finish(p, sse, evaluations, iterations, Termination::Ftol);
                }
                if step_is_small {
                    return finish(p, sse, evaluations, iterations, Termination::Xtol);
                }
                break;
            }

            if step_is_small {
                return finish(p, sse, evaluations, iterations, Termination::Xtol);
            }

            lambda *= 10.0;
            rejected += 1;
            if lambda > MAX_LAMBDA {
                return Err(LmError::Stalled { lambda });
            }
        }
    }
}

fn all_finite<'a>(mut values: impl Iterator<Item = &'a f64>) -> bool {
    values.all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = a · exp(b · x)
    struct Exponential {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Exponential {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(&self.y)
                    .map(|(&x, &y)| y - p[0] * (p[1] * x).exp()),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = p[0] * x * e;
            }
            j
        }
    }

    fn exponential(a: f64, b: f64) -> Exponential {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.3).collect();
        let y = x.iter().map(|&x| a * (b * x).exp()).collect();
        Exponential { x, y }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let problem = exponential(2.5, -0.7);
        let start = DVector::from_row_slice(&[1.0, 0.0]);
        let report = minimize(&problem, start, &LmOptions::default()).unwrap();

        assert!((report.params[0] - 2.5).abs() < 1e-6, "a = {}", report.params[0]);
        assert!((report.params[1] + 0.7).abs() < 1e-6, "b = {}", report.params[1]);
        assert!(report.sse < 1e-12);
        assert!(report.evaluations <= LmOptions::DEFAULT_MAX_EVALUATIONS);
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let problem = exponential(2.5, -0.7);
        let start = DVector::from_row_slice(&[1.0, 0.0]);
        let opts = LmOptions {
            max_evaluations: 2,
            ..LmOptions::default()
        };
        let err = minimize(&problem, start, &opts).unwrap_err();
        assert_eq!(err, LmError::NotConverged { evaluations: 2 });
    }

    #[test]
    fn non_finite_start_is_reported() {
        let problem = Exponential {
            x: vec![0.0, 1.0],
            y: vec![1.0, f64::NAN],
        };
        let start = DVector::from_row_slice(&[1.0, 0.0]);
        let err = minimize(&problem, start, &LmOptions::default()).unwrap_err();
        assert_eq!(err, LmError::NonFiniteStart);
    }

    #[test]
    fn exact_start_stops_immediately() {
        let problem = exponential(1.0, 0.5);
        let start = DVector::from_row_slice(&[1.0, 0.5]);
        let report = minimize(&problem, start, &LmOptions::default()).unwrap();
        assert_eq!(report.termination, Termination::ZeroResidual);
        assert_eq!(report.evaluations, 1);
        assert_eq!(report.iterations, 0);
    }
}
