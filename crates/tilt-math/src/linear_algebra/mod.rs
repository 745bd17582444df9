//! Linear algebra utilities.
//!
//! This module provides the matrix operations needed for risk calculations:
//! sample covariance of return columns, quadratic forms, and positive
//! semi-definiteness checks.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Computes the sample covariance matrix of equal-length columns.
///
/// Uses the `n - 1` denominator. Entry `(i, j)` is the covariance between
/// `columns[i]` and `columns[j]`.
///
/// # Errors
///
/// - `InsufficientData` when there are fewer than 2 observations
/// - `DimensionMismatch` when the columns differ in length
/// - `InvalidInput` when any value is not finite
pub fn sample_covariance(columns: &[&[f64]]) -> MathResult<DMatrix<f64>> {
    let k = columns.len();
    let n = columns.first().map_or(0, |c| c.len());

    if let Some(bad) = columns.iter().find(|c| c.len() != n) {
        return Err(MathError::DimensionMismatch {
            rows1: n,
            cols1: k,
            rows2: bad.len(),
            cols2: k,
        });
    }
    if n < 2 {
        return Err(MathError::insufficient_data(2, n));
    }
    if columns.iter().any(|c| c.iter().any(|v| !v.is_finite())) {
        return Err(MathError::invalid_input("covariance input contains non-finite values"));
    }

    let means: Vec<f64> = columns
        .iter()
        .map(|c| c.iter().sum::<f64>() / n as f64)
        .collect();
    let denom = (n - 1) as f64;

    let mut cov = DMatrix::zeros(k, k);
    for i in 0..k {
        for j in i..k {
            let s: f64 = columns[i]
                .iter()
                .zip(columns[j].iter())
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            let v = s / denom;
            cov[(i, j)] = v;
            cov[(j, i)] = v;
        }
    }

    Ok(cov)
}

/// Evaluates `xᵀ M x`.
///
/// # Errors
///
/// `DimensionMismatch` when `x` does not match the matrix dimensions.
pub fn quadratic_form(x: &[f64], matrix: &DMatrix<f64>) -> MathResult<f64> {
    if matrix.nrows() != x.len() || matrix.ncols() != x.len() {
        return Err(MathError::DimensionMismatch {
            rows1: matrix.nrows(),
            cols1: matrix.ncols(),
            rows2: x.len(),
            cols2: 1,
        });
    }
    let v = DVector::from_column_slice(x);
    Ok(v.dot(&(matrix * &v)))
}

/// Returns the smallest eigenvalue of a symmetric matrix.
///
/// # Errors
///
/// `InvalidInput` when the matrix is not square or contains non-finite values.
pub fn min_eigenvalue(matrix: &DMatrix<f64>) -> MathResult<f64> {
    if matrix.nrows() != matrix.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("Matrix contains non-finite values"));
    }
    if matrix.is_empty() {
        return Ok(0.0);
    }
    let eigen = SymmetricEigen::new(matrix.clone());
    Ok(eigen.eigenvalues.min())
}

/// Checks that a symmetric matrix is positive semi-definite.
///
/// Eigenvalues down to `-tolerance * max(1, max |diag|)` are accepted, so
/// sample covariances that are singular up to rounding still pass.
///
/// # Errors
///
/// Propagates errors from [`min_eigenvalue`].
pub fn is_positive_semidefinite(matrix: &DMatrix<f64>, tolerance: f64) -> MathResult<bool> {
    let min = min_eigenvalue(matrix)?;
    let scale = matrix
        .diagonal()
        .iter()
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    Ok(min >= -tolerance * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_covariance() {
        let a = [0.01, -0.02, 0.03];
        let b = [0.02, 0.00, 0.01];
        let cov = sample_covariance(&[&a, &b]).unwrap();

        // var(a): mean 0.006667, deviations .003333 -.026667 .023333
        assert_relative_eq!(cov[(0, 0)], 0.000633_333_333, epsilon = 1e-9);
        assert_relative_eq!(cov[(1, 1)], 0.0001, epsilon = 1e-12);
        assert_relative_eq!(cov[(0, 1)], cov[(1, 0)], epsilon = 1e-15);
        assert_relative_eq!(cov[(0, 1)], 0.00015, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_covariance_constant_column() {
        let a = [0.0, 0.0, 0.0];
        let b = [0.01, 0.02, 0.03];
        let cov = sample_covariance(&[&a, &b]).unwrap();
        assert_relative_eq!(cov[(0, 0)], 0.0);
        assert_relative_eq!(cov[(0, 1)], 0.0);
    }

    #[test]
    fn test_sample_covariance_errors() {
        assert!(matches!(
            sample_covariance(&[&[0.01]]),
            Err(MathError::InsufficientData { required: 2, actual: 1 })
        ));
        assert!(matches!(
            sample_covariance(&[&[0.01, 0.02], &[0.01]]),
            Err(MathError::DimensionMismatch { .. })
        ));
        assert!(sample_covariance(&[&[0.01, f64::NAN]]).is_err());
    }

    #[test]
    fn test_quadratic_form() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        // [1, 2] M [1, 2]' = 2 + 2*2 + 3*4 = 18
        assert_relative_eq!(quadratic_form(&[1.0, 2.0], &m).unwrap(), 18.0);
        assert!(quadratic_form(&[1.0], &m).is_err());
    }

    #[test]
    fn test_psd_check() {
        let psd = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(is_positive_semidefinite(&psd, 1e-10).unwrap());

        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(!is_positive_semidefinite(&indefinite, 1e-10).unwrap());
        assert_relative_eq!(min_eigenvalue(&indefinite).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_of_few_rows_is_psd() {
        // Three observations of four series: rank deficient but PSD.
        let cols: [&[f64]; 4] = [
            &[0.010, -0.004, 0.002],
            &[0.003, 0.001, -0.006],
            &[-0.002, 0.008, 0.001],
            &[0.0, 0.0, 0.0],
        ];
        let cov = sample_covariance(&cols).unwrap();
        assert!(is_positive_semidefinite(&cov, 1e-10).unwrap());
    }
}
