//! # Continuous algebraic Riccati equation solver
//!
//! Solves `A'P + PA - P B R^-1 B' P + Q = 0` for the stabilising solution P
//! using the Hamiltonian (Arimoto-Potter) method: build the 2n x 2n
//! Hamiltonian matrix from (A, B, Q, R), take its full complex
//! eigen-decomposition, select the n eigenpairs with the most negative real
//! parts (the stable invariant subspace), and recover P from the stacked
//! eigenvector blocks as `P = Z * Y^-1`.
//!
//! The solution is complex-valued as computed; for real, well-posed inputs
//! its imaginary part is negligible and callers take [`Solution::real`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use nalgebra::{Complex, DMatrix, Normed};
use serde::Deserialize;
use std::cmp::Ordering;

// Internal
use crate::linalg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Numerical tolerances for the solver.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SolverParams {
    /// Margin by which the selected eigenvalues' real parts must be below
    /// zero for the subspace to count as stable.
    pub stability_margin: f64,

    /// Threshold on `|det Y|` below which Y is treated as singular and the
    /// pseudo-inverse fallback is taken.
    pub y_singularity_threshold: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            stability_margin: 1e-9,
            y_singularity_threshold: 1e-12,
        }
    }
}

/// The stabilising solution of a Riccati equation.
#[derive(Debug, Clone)]
pub struct Solution {
    /// The solution matrix P as computed, including any imaginary residue
    /// left over from the complex eigenvector arithmetic.
    pub p: DMatrix<Complex<f64>>,

    /// True if the pseudo-inverse fallback was taken because Y was near
    /// singular. The solution is not guaranteed accurate in this case.
    pub degenerate: bool,
}

impl Solution {
    /// The real part of P, which is the usable solution for real inputs.
    pub fn real(&self) -> DMatrix<f64> {
        self.p.map(|c| c.re)
    }

    /// Largest absolute imaginary component anywhere in P.
    pub fn max_imag_abs(&self) -> f64 {
        self.p.iter().map(|c| c.im.abs()).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised by the solver.
#[derive(Debug, thiserror::Error)]
pub enum RiccatiError {
    #[error("State-space matrices have inconsistent dimensions")]
    DimensionMismatch,

    #[error("The control effort weight R is singular")]
    SingularEffortWeight,

    #[error("No stable invariant subspace exists: the (A, B) pair is not stabilisable")]
    NotStabilisable,

    #[error("Eigen-decomposition failed: {0}")]
    Eigen(#[from] linalg::LinalgError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the continuous algebraic Riccati equation for (A, B, Q, R).
///
/// Valid only when (A, B) is stabilisable, Q is positive semi-definite and
/// R is positive definite. A non-stabilisable pair is detected through the
/// eigenvalue spectrum and rejected rather than producing a meaningless
/// gain. A near-singular eigenvector block Y is recovered with the
/// pseudo-inverse and flagged on the returned [`Solution`].
pub fn solve(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
    params: &SolverParams,
) -> Result<Solution, RiccatiError> {
    let n = a.nrows();
    let m = b.ncols();

    if a.ncols() != n
        || b.nrows() != n
        || q.nrows() != n
        || q.ncols() != n
        || r.nrows() != m
        || r.ncols() != m
    {
        return Err(RiccatiError::DimensionMismatch);
    }

    let r_inv = r
        .clone()
        .try_inverse()
        .ok_or(RiccatiError::SingularEffortWeight)?;

    let h = hamiltonian(a, b, q, &r_inv);
    let eig = linalg::eigen(&h)?;

    // Real parts of a defective matrix's eigenvalues are only computed to
    // within ~(eps * |H|)^(1/2n); anything inside that band cannot be
    // trusted to be stable. The configured margin acts as a floor.
    let auto_margin =
        4.0 * (f64::EPSILON * h.norm().max(1.0)).powf(1.0 / (2.0 * n as f64));
    let margin = params.stability_margin.max(auto_margin);

    // Order eigenvalues by ascending real part, ties broken by ascending
    // imaginary part so the selection is deterministic
    let mut order: Vec<usize> = (0..2 * n).collect();
    order.sort_by(|&i, &j| {
        let (li, lj) = (eig.values[i], eig.values[j]);
        li.re
            .partial_cmp(&lj.re)
            .unwrap_or(Ordering::Equal)
            .then(li.im.partial_cmp(&lj.im).unwrap_or(Ordering::Equal))
    });

    // The n selected eigenvalues span the stable subspace only if all of
    // them sit strictly in the left half plane
    if eig.values[order[n - 1]].re >= -margin {
        return Err(RiccatiError::NotStabilisable);
    }

    // Stack the selected eigenvectors' top halves into Y and bottom halves
    // into Z
    let mut y = DMatrix::<Complex<f64>>::zeros(n, n);
    let mut z = DMatrix::<Complex<f64>>::zeros(n, n);
    for (col, &i) in order.iter().take(n).enumerate() {
        for row in 0..n {
            y[(row, col)] = eig.vectors[(row, i)];
            z[(row, col)] = eig.vectors[(row + n, i)];
        }
    }

    // P = Z * Y^-1, falling back to the pseudo-inverse when Y is near
    // singular
    let det = y.determinant().norm();
    if det > params.y_singularity_threshold {
        if let Some(y_inv) = y.clone().try_inverse() {
            return Ok(Solution {
                p: &z * y_inv,
                degenerate: false,
            });
        }
    }

    warn!(
        "Eigenvector block Y is near singular (|det Y| = {:.3e}), \
         falling back to the pseudo-inverse; result may be inaccurate",
        det
    );

    let y_pinv = linalg::pseudo_inverse(&y, f64::EPSILON)?;

    Ok(Solution {
        p: &z * y_pinv,
        degenerate: true,
    })
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Assemble the Hamiltonian matrix `[[A, -B R^-1 B'], [-Q, -A']]`.
fn hamiltonian(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r_inv: &DMatrix<f64>,
) -> DMatrix<f64> {
    let n = a.nrows();

    let mut h = DMatrix::zeros(2 * n, 2 * n);
    h.slice_mut((0, 0), (n, n)).copy_from(a);
    h.slice_mut((0, n), (n, n))
        .copy_from(&(-(b * r_inv * b.transpose())));
    h.slice_mut((n, 0), (n, n)).copy_from(&(-q));
    h.slice_mut((n, n), (n, n)).copy_from(&(-a.transpose()));

    h
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Norm of the Riccati equation residual for a candidate solution.
    fn residual(
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
        p: &DMatrix<f64>,
    ) -> f64 {
        let r_inv = r.clone().try_inverse().unwrap();
        (a.transpose() * p + p * a - p * b * r_inv * b.transpose() * p + q).norm()
    }

    #[test]
    fn test_scalar_closed_form() {
        // For scalar a, b, q, r the stabilising solution has the closed form
        // p = (a + sqrt(a^2 + q b^2 / r)) * r / b^2
        let a = DMatrix::from_element(1, 1, 1.0);
        let b = DMatrix::from_element(1, 1, 1.0);
        let q = DMatrix::from_element(1, 1, 1.0);
        let r = DMatrix::from_element(1, 1, 1.0);

        let sol = solve(&a, &b, &q, &r, &SolverParams::default()).unwrap();
        let p = sol.real();

        assert!(!sol.degenerate);
        assert!((p[(0, 0)] - (1.0 + 2.0f64.sqrt())).abs() < 1e-9);
        assert!(residual(&a, &b, &q, &r, &p) < 1e-9);
    }

    #[test]
    fn test_double_integrator_residual() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::from_element(1, 1, 1.0);

        let sol = solve(&a, &b, &q, &r, &SolverParams::default()).unwrap();
        let p = sol.real();

        assert!(!sol.degenerate);
        assert!(residual(&a, &b, &q, &r, &p) < 1e-8);

        // P must be symmetric positive definite for this system
        assert!((p[(0, 1)] - p[(1, 0)]).abs() < 1e-8);
        assert!(p[(0, 0)] > 0.0 && p[(1, 1)] > 0.0);
    }

    #[test]
    fn test_velocity_dependent_lateral_model() {
        // The controller's model at a few different speeds; the residual
        // must stay small across all of them
        for &v in &[0.5, 2.0, 10.0] {
            let wheelbase = 2.5;
            let a = DMatrix::from_row_slice(2, 2, &[0.0, v, 0.0, 0.0]);
            let b = DMatrix::from_row_slice(2, 1, &[0.0, v / wheelbase]);
            let q = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![20.0, 30.0]));
            let r = DMatrix::from_element(1, 1, 15.0);

            let sol = solve(&a, &b, &q, &r, &SolverParams::default()).unwrap();
            let p = sol.real();

            // Relative residual: P grows as the speed drops
            assert!(residual(&a, &b, &q, &r, &p) < 1e-6 * (1.0 + p.norm()));
        }
    }

    #[test]
    fn test_imaginary_part_negligible() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 2.0, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 0.8]);
        let q = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![20.0, 30.0]));
        let r = DMatrix::from_element(1, 1, 15.0);

        let sol = solve(&a, &b, &q, &r, &SolverParams::default()).unwrap();

        assert!(sol.max_imag_abs() < 1e-9);
    }

    #[test]
    fn test_uncontrollable_pair_rejected() {
        // B = 0 cannot stabilise anything; the solver must refuse rather
        // than hand back a finite but meaningless gain
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 2.0, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 0.0]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::from_element(1, 1, 1.0);

        assert!(matches!(
            solve(&a, &b, &q, &r, &SolverParams::default()),
            Err(RiccatiError::NotStabilisable)
        ));
    }

    #[test]
    fn test_singular_effort_weight_rejected() {
        let a = DMatrix::from_row_slice(1, 1, &[1.0]);
        let b = DMatrix::from_row_slice(1, 1, &[1.0]);
        let q = DMatrix::from_row_slice(1, 1, &[1.0]);
        let r = DMatrix::from_row_slice(1, 1, &[0.0]);

        assert!(matches!(
            solve(&a, &b, &q, &r, &SolverParams::default()),
            Err(RiccatiError::SingularEffortWeight)
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(1, 1, &[1.0]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::from_element(1, 1, 1.0);

        assert!(matches!(
            solve(&a, &b, &q, &r, &SolverParams::default()),
            Err(RiccatiError::DimensionMismatch)
        ));
    }
}
