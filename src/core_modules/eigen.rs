// THEORY:
// The `eigen` module decomposes the symmetric covariance matrices produced by
// the channel engine. Because a covariance matrix is symmetric positive
// semi-definite, its singular value decomposition and its eigendecomposition
// coincide — the engine exploits that equivalence by using a single symmetric
// eigensolver instead of a general SVD, and by trusting that the eigenvalues
// it returns are the variances explained by each principal component.
//
// The solver is the cyclic Jacobi algorithm: sweep over every off-diagonal
// element and rotate it to zero, repeating until the matrix is numerically
// diagonal. It is simple, numerically stable for symmetric input, and needs
// no external dependency. The result is a plain immutable value — ordered
// eigenvalues plus the matrix whose columns are the matching eigenvectors —
// returned by a pure function, so callers never poke at solver internals.

use crate::core_modules::matrix::Matrix;
use crate::error::{PcaError, Result};

/// Each sweep rotates all n(n-1)/2 off-diagonal elements once; well
/// conditioned covariance matrices converge in 5-10 sweeps.
const MAX_JACOBI_SWEEPS: usize = 50;

/// Convergence threshold for off-diagonal elements, relative to the
/// Frobenius norm of the input.
const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Eigendecomposition of a symmetric matrix.
///
/// Eigenvalues are sorted descending (the PCA convention: the first
/// component explains the most variance) and `eigenvectors` holds the
/// matching unit-length eigenvectors as columns.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues in descending order.
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors as columns; column `i` pairs with `eigenvalues[i]`.
    pub eigenvectors: Matrix,
}

/// Decomposes a symmetric matrix into eigenvalues and eigenvectors.
///
/// Fails with `Decomposition` if the matrix is not square, is empty, or the
/// Jacobi iteration does not converge within its sweep budget. The input is
/// assumed symmetric; only its upper triangle drives the rotations.
pub fn decompose_symmetric(matrix: &Matrix) -> Result<SymmetricEigen> {
    if matrix.rows() != matrix.cols() {
        return Err(PcaError::Decomposition(format!(
            "matrix must be square, got {}x{}",
            matrix.rows(),
            matrix.cols()
        )));
    }
    if matrix.rows() == 0 {
        return Err(PcaError::Decomposition("matrix is empty".to_string()));
    }

    let n = matrix.rows();
    let mut a = matrix.as_slice().to_vec();

    let frobenius_sq: f64 = a.iter().map(|x| x * x).sum();
    let tolerance = CONVERGENCE_THRESHOLD * frobenius_sq.sqrt().max(1.0);

    // Accumulate rotations into what becomes the eigenvector matrix.
    let mut v = Matrix::identity(n).as_slice().to_vec();

    for _sweep in 0..MAX_JACOBI_SWEEPS {
        let mut converged = true;

        for i in 0..n {
            for j in (i + 1)..n {
                if a[i * n + j].abs() < tolerance {
                    continue;
                }
                converged = false;
                jacobi_rotate(&mut a, &mut v, n, i, j);
            }
        }

        if converged {
            return Ok(sort_descending(a, v, n));
        }
    }

    Err(PcaError::Decomposition(format!(
        "Jacobi iteration failed to converge after {MAX_JACOBI_SWEEPS} sweeps"
    )))
}

/// Extracts the diagonal as eigenvalues and reorders both eigenvalues and
/// eigenvector columns into descending eigenvalue order.
fn sort_descending(a: Vec<f64>, v: Vec<f64>, n: usize) -> SymmetricEigen {
    let raw_eigenvalues: Vec<f64> = (0..n).map(|i| a[i * n + i]).collect();

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| {
        raw_eigenvalues[j]
            .partial_cmp(&raw_eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues: Vec<f64> = indices.iter().map(|&i| raw_eigenvalues[i]).collect();

    let mut eigenvector_data = vec![0.0; n * n];
    for (new_col, &old_col) in indices.iter().enumerate() {
        for row in 0..n {
            eigenvector_data[row * n + new_col] = v[row * n + old_col];
        }
    }

    SymmetricEigen {
        eigenvalues,
        // Length is n*n by construction.
        eigenvectors: Matrix::from_vec(n, n, eigenvector_data)
            .unwrap_or_else(|_| Matrix::identity(n)),
    }
}

/// Applies one Jacobi rotation zeroing a[p][q] and a[q][p].
///
/// Rotation parameters use the numerically stable formulation from
/// Golub & Van Loan, "Matrix Computations", 4th edition.
#[inline]
fn jacobi_rotate(a: &mut [f64], v: &mut [f64], n: usize, p: usize, q: usize) {
    let app = a[p * n + p];
    let aqq = a[q * n + q];
    let apq = a[p * n + q];

    if apq.abs() < 1e-300 {
        return;
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;

    a[p * n + p] = app - t * apq;
    a[q * n + q] = aqq + t * apq;
    a[p * n + q] = 0.0;
    a[q * n + p] = 0.0;

    for k in 0..n {
        if k != p && k != q {
            let akp = a[k * n + p];
            let akq = a[k * n + q];
            a[k * n + p] = c * akp - s * akq;
            a[p * n + k] = a[k * n + p];
            a[k * n + q] = s * akp + c * akq;
            a[q * n + k] = a[k * n + q];
        }
    }

    for k in 0..n {
        let vkp = v[k * n + p];
        let vkq = v[k * n + q];
        v[k * n + p] = c * vkp - s * vkq;
        v[k * n + q] = s * vkp + c * vkq;
    }
}
