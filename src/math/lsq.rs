//! Linear least-squares kernels used by the nonlinear solver.
//!
//! Each Levenberg–Marquardt iteration solves a damped linear problem:
//!
//! ```text
//! minimize ‖J δ − r‖² + λ Σ s_k δ_k²
//! ```
//!
//! Rather than forming the normal equations `(JᵀJ + λS) δ = Jᵀr` (which
//! squares the condition number), we stack the damping rows under `J` and
//! solve the tall system
//!
//! ```text
//! [ J       ]       [ r ]
//! [ √(λ S)  ] δ  ≈  [ 0 ]
//! ```
//!
//! with SVD. The parameter dimension is tiny (4), so SVD cost is irrelevant.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser singular-value cutoffs; 4PL Jacobians become
    // nearly rank-deficient when the slope collapses towards zero.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the damped Gauss–Newton step for Jacobian `j`, residuals `r`,
/// per-parameter scale `scale` and damping `lambda`.
pub fn solve_damped_step(
    j: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, n) = j.shape();
    if r.len() != m || scale.len() != n || !lambda.is_finite() || lambda < 0.0 {
        return None;
    }

    let mut a = DMatrix::<f64>::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(j);
    for k in 0..n {
        a[(m + k, k)] = (lambda * scale[k]).sqrt();
    }

    let mut b = DVector::<f64>::zeros(m + n);
    b.rows_mut(0, m).copy_from(r);

    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn zero_damping_is_gauss_newton() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let scale = DVector::from_element(2, 1.0);

        let step = solve_damped_step(&j, &r, &scale, 0.0).unwrap();
        assert!((step[0] - 2.0).abs() < 1e-10);
        assert!((step[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_the_step() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let scale = DVector::from_element(2, 1.0);

        let free = solve_damped_step(&j, &r, &scale, 0.0).unwrap();
        let damped = solve_damped_step(&j, &r, &scale, 100.0).unwrap();
        assert!(damped.norm() < free.norm());
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let j = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let r = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let scale = DVector::from_element(2, 1.0);
        assert!(solve_damped_step(&j, &r, &scale, 1.0).is_none());
    }
}
