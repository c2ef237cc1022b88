//! # Dense linear algebra kernel
//!
//! The Riccati solver needs the full eigen-decomposition of a real square
//! matrix whose eigenpairs are in general complex. nalgebra computes the
//! complex eigenvalues of a real matrix (via its Schur decomposition) but
//! does not expose the matching eigenvectors, so this module recovers each
//! eigenvector with shifted inverse iteration: a complex LU solve against
//! `M - (lambda + delta)*I`, renormalising until the eigen-residual is
//! small. The small shift `delta` keeps the factorised matrix nonsingular.
//!
//! Matrix inverse and Moore-Penrose pseudo-inverse come straight from
//! nalgebra (LU and SVD over complex matrices); only the pseudo-inverse is
//! re-exported here so callers get a proper error type instead of a string.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use nalgebra::{Complex, DMatrix, DVector};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of inverse iteration steps per eigenvector.
const MAX_INVERSE_ITERATIONS: usize = 30;

/// Relative eigen-residual below which an eigenvector is accepted.
const RESIDUAL_TOLERANCE: f64 = 1e-9;

/// Relative size of the shift applied to keep `M - lambda*I` nonsingular.
const SHIFT_MAGNITUDE: f64 = 1e-10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A full eigen-decomposition of a real square matrix.
#[derive(Debug, Clone)]
pub struct Eigen {
    /// The eigenvalues, in the order produced by the decomposition.
    pub values: DVector<Complex<f64>>,

    /// Unit-norm eigenvectors, one column per eigenvalue, in matching order.
    pub vectors: DMatrix<Complex<f64>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised by the kernel.
#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Inverse iteration broke down for eigenvalue {0}")]
    InverseIterationBreakdown(Complex<f64>),

    #[error("Could not compute the pseudo-inverse: {0}")]
    PseudoInverseFailed(&'static str),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the full eigen-decomposition of a real square matrix.
///
/// Eigenvalues and eigenvectors are complex in general, the eigenvectors of
/// conjugate eigenvalue pairs being conjugate pairs themselves. Eigenvectors
/// of a defective matrix are not independent; it is the caller's job to
/// detect that where it matters.
pub fn eigen(m: &DMatrix<f64>) -> Result<Eigen, LinalgError> {
    if m.nrows() != m.ncols() {
        return Err(LinalgError::NotSquare {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }

    let n = m.nrows();
    let values = m.complex_eigenvalues();

    // Complex copy of the matrix for the per-eigenvalue solves
    let mc = m.map(|x| Complex::new(x, 0.0));
    let scale = m.norm().max(1.0);

    let mut vectors = DMatrix::<Complex<f64>>::zeros(n, n);
    for (i, lambda) in values.iter().enumerate() {
        let v = inverse_iteration(&mc, *lambda, scale)?;
        vectors.set_column(i, &v);
    }

    Ok(Eigen { values, vectors })
}

/// Moore-Penrose pseudo-inverse of a complex matrix.
///
/// Singular values below `eps` are treated as zero.
pub fn pseudo_inverse(
    m: &DMatrix<Complex<f64>>,
    eps: f64,
) -> Result<DMatrix<Complex<f64>>, LinalgError> {
    m.clone()
        .pseudo_inverse(eps)
        .map_err(LinalgError::PseudoInverseFailed)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Recover the eigenvector for a single eigenvalue by inverse iteration.
fn inverse_iteration(
    mc: &DMatrix<Complex<f64>>,
    lambda: Complex<f64>,
    scale: f64,
) -> Result<DVector<Complex<f64>>, LinalgError> {
    let n = mc.nrows();

    // Shift slightly off the eigenvalue so the factorised matrix is
    // nonsingular
    let shift = lambda + Complex::new(SHIFT_MAGNITUDE * scale, SHIFT_MAGNITUDE * scale);
    let shifted = mc - DMatrix::<Complex<f64>>::identity(n, n) * shift;
    let lu = shifted.lu();

    // Start vector with a small index-dependent perturbation so it is never
    // orthogonal to the target eigenvector
    let mut v = DVector::<Complex<f64>>::from_fn(n, |i, _| {
        Complex::new(1.0, 0.1 * (i as f64 + 1.0))
    });
    v = v.unscale(v.norm());

    let mut residual = f64::MAX;

    for _ in 0..MAX_INVERSE_ITERATIONS {
        let w = match lu.solve(&v) {
            Some(w) => w,
            None => return Err(LinalgError::InverseIterationBreakdown(lambda)),
        };

        let norm = w.norm();
        if !norm.is_finite() || norm == 0.0 {
            return Err(LinalgError::InverseIterationBreakdown(lambda));
        }

        v = w.unscale(norm);

        residual = (mc * &v - &v * lambda).norm();
        if residual <= RESIDUAL_TOLERANCE * scale {
            return Ok(v);
        }
    }

    // Accept the best vector found. A large residual here means the matrix
    // is defective near this eigenvalue; downstream singularity checks catch
    // vectors that turned out linearly dependent.
    warn!(
        "Inverse iteration did not fully converge for eigenvalue {} (residual {:.3e})",
        lambda, residual
    );

    Ok(v)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
