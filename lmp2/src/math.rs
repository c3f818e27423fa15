//! Functions of real symmetric matrices

use crate::error::CorrelationError;
use nalgebra::DMatrix;

/// Apply `f` to the eigenvalues of a symmetric matrix: V f(λ) Vᵀ.
pub fn mfunc_sym<F>(matrix: &DMatrix<f64>, f: F) -> Result<DMatrix<f64>, CorrelationError>
where
    F: Fn(f64) -> Result<f64, CorrelationError>,
{
    if matrix.nrows() != matrix.ncols() {
        return Err(CorrelationError::Numerical(format!(
            "matrix function requested for a non-square {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    let eigen = matrix.clone().symmetric_eigen();
    let mut values = eigen.eigenvalues.clone();
    for value in values.iter_mut() {
        *value = f(*value)?;
    }
    let vectors = &eigen.eigenvectors;
    Ok(vectors * DMatrix::from_diagonal(&values) * vectors.transpose())
}

/// Square root of the pseudo inverse, V^(-1/2).
///
/// Eigenvalues below `threshold` are dropped from the inverse. Small negative
/// eigenvalues from round-off are tolerated, anything below -1 is an error.
pub fn pseudo_inverse_sqrt_sym(
    matrix: &DMatrix<f64>,
    threshold: f64,
) -> Result<DMatrix<f64>, CorrelationError> {
    mfunc_sym(matrix, |e| {
        if e < -1.0 {
            return Err(CorrelationError::Numerical(format!(
                "tolerance of negative eigenvalues in the pseudo inverse exceeded ({e:.3e})"
            )));
        }
        Ok(if e >= threshold { 1.0 / e.sqrt() } else { 0.0 })
    })
}

pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    (matrix + matrix.transpose()) * 0.5
}
