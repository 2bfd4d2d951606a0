//! Symmetric eigendecomposition.
//!
//! Correlation matrices of a few dozen assets are small and dense, so a
//! cyclic Jacobi sweep is accurate and fast enough to rerun at every
//! walk-forward step. Eigenvectors come out exactly orthonormal up to
//! rounding, which the factor loadings rely on.

use faro_traits::{FaroError, Result};
use ndarray::{Array1, Array2};

/// Maximum number of full Jacobi sweeps before giving up.
const MAX_SWEEPS: usize = 100;

/// Relative off-diagonal tolerance for convergence.
const TOLERANCE: f64 = 1e-14;

/// Eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues in descending order.
    pub eigenvalues: Array1<f64>,
    /// Unit eigenvectors as columns, matching `eigenvalues`.
    pub eigenvectors: Array2<f64>,
}

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Eigenpairs are sorted by descending eigenvalue. Each eigenvector is
/// flipped so that its largest-magnitude entry is positive, which makes the
/// output deterministic for a given input.
///
/// # Errors
///
/// Returns [`FaroError::InvalidData`] if the matrix is not square, not
/// symmetric, holds non-finite values, or the sweep fails to converge.
///
/// # Example
///
/// ```
/// use faro_pca::jacobi_eigendecomp;
/// use ndarray::array;
///
/// let eig = jacobi_eigendecomp(&array![[2.0, 1.0], [1.0, 2.0]]).unwrap();
/// assert!((eig.eigenvalues[0] - 3.0).abs() < 1e-12);
/// assert!((eig.eigenvalues[1] - 1.0).abs() < 1e-12);
/// ```
pub fn jacobi_eigendecomp(matrix: &Array2<f64>) -> Result<EigenDecomposition> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(FaroError::InvalidData(format!(
            "eigendecomposition needs a square matrix, got {}x{}",
            n,
            matrix.ncols()
        )));
    }
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(FaroError::InvalidData(
            "eigendecomposition input has non-finite entries".to_string(),
        ));
    }

    let scale = matrix.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[[i, j]] - matrix[[j, i]]).abs() > 1e-10 * scale {
                return Err(FaroError::InvalidData(format!(
                    "eigendecomposition input is not symmetric at ({i}, {j})"
                )));
            }
        }
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let mut converged = n < 2;

    for _ in 0..MAX_SWEEPS {
        if off_diagonal_norm(&a) <= TOLERANCE * scale {
            converged = true;
            break;
        }

        for p in 0..n - 1 {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    if !converged && off_diagonal_norm(&a) > TOLERANCE * scale {
        return Err(FaroError::InvalidData(format!(
            "Jacobi eigendecomposition did not converge in {MAX_SWEEPS} sweeps"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut eigenvectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        let mut column = v.column(src).to_owned();
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
        if pivot < 0.0 {
            column.mapv_inplace(|x| -x);
        }
        eigenvectors.column_mut(dst).assign(&column);
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += 2.0 * a[[i, j]] * a[[i, j]];
        }
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_diagonal_matrix_sorted() {
        let eig = jacobi_eigendecomp(&array![[1.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]])
            .unwrap();

        assert_abs_diff_eq!(eig.eigenvalues[0], 3.0);
        assert_abs_diff_eq!(eig.eigenvalues[1], 2.0);
        assert_abs_diff_eq!(eig.eigenvalues[2], 1.0);
        assert_abs_diff_eq!(eig.eigenvectors[[1, 0]], 1.0);
    }

    #[test]
    fn test_reconstructs_input() {
        let m = array![
            [4.0, 1.0, 0.5, 0.2],
            [1.0, 3.0, 0.3, 0.1],
            [0.5, 0.3, 2.0, 0.4],
            [0.2, 0.1, 0.4, 1.0]
        ];
        let eig = jacobi_eigendecomp(&m).unwrap();

        let lambda = Array2::from_diag(&eig.eigenvalues);
        let rebuilt = eig.eigenvectors.dot(&lambda).dot(&eig.eigenvectors.t());
        for (x, y) in rebuilt.iter().zip(m.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_eigenvectors_orthonormal() {
        let m = array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let eig = jacobi_eigendecomp(&m).unwrap();

        let gram = eig.eigenvectors.t().dot(&eig.eigenvectors);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_sign_convention() {
        let eig = jacobi_eigendecomp(&array![[2.0, 1.0], [1.0, 2.0]]).unwrap();
        for column in eig.eigenvectors.columns() {
            let pivot = column
                .iter()
                .copied()
                .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn test_rejects_non_symmetric() {
        let result = jacobi_eigendecomp(&array![[1.0, 2.0], [0.0, 1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_square() {
        let result = jacobi_eigendecomp(&Array2::zeros((2, 3)));
        assert!(result.is_err());
    }
}
