//! Approximate-equality predicates for scalars and matrices.
//!
//! Shared by the unit tests across the crate; exposed publicly so
//! downstream scenario drivers can assert against the same definitions.

use crate::matrix::{Matrix, ops};

/// |x - y| <= tol.
pub fn approx_eq(x: f64, y: f64, tol: f64) -> bool {
    (x - y).abs() <= tol
}

/// |x - y| <= tol * |y|.
pub fn relative_eq(x: f64, y: f64, tol: f64) -> bool {
    (x - y).abs() <= tol * y.abs()
}

/// True when the shapes match and the largest element-wise difference is
/// within `tol`. Two empty matrices of the same shape compare equal.
pub fn matrix_approx_eq(a: &Matrix, b: &Matrix, tol: f64) -> bool {
    if a.rows() != b.rows() || a.cols() != b.cols() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    match ops::sub(a, b) {
        Ok(diff) => ops::max_abs(&diff).map(|m| m <= tol).unwrap_or(false),
        Err(_) => false,
    }
}
