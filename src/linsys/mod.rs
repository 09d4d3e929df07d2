//! Direct solvers for small symmetric systems.
//!
//! Everything here is built on one factorization:
//!
//! - `cholesky` produces the lower factor L of an SPD matrix, failing with
//!   `SingularSystem` on the first non-positive pivot
//! - `spd_inverse` inverts through that factor (invert L by forward
//!   substitution, then form L⁻ᵀ·L⁻¹)
//! - `least_squares_solve` goes through the normal equations (AᵀA)⁻¹(AᵀB)
//!
//! Normal equations square the condition number, but the systems solved
//! here are 6 x 6 with well-scaled rows, where the method is exact to
//! working precision and much cheaper to audit than QR or SVD.

use log::debug;

use crate::error::{Error, Result};
use crate::matrix::{Matrix, ops, sum_product, sum_squares};

/// Lower-triangular L with L * L' = S.
///
/// `S` must be square and symmetric positive definite. A non-positive
/// quantity under the square root means S is not PD (or is numerically
/// rank deficient) and fails the call.
pub fn cholesky(s: &Matrix) -> Result<Matrix> {
    if s.is_empty() || s.rows() != s.cols() {
        return Err(Error::ShapeMismatch(format!(
            "cholesky: matrix is {}x{}, not square and non-empty",
            s.rows(),
            s.cols()
        )));
    }

    let n = s.rows();
    let mut l = Matrix::zeros(n, n);

    for j in 0..n {
        let diag = s[(j, j)] - sum_squares(j, &l.as_slice()[j * n..], 1);
        // The comparison is written so that a NaN pivot also fails.
        if !(diag > 0.0) {
            return Err(Error::SingularSystem);
        }
        let ljj = diag.sqrt();
        l[(j, j)] = ljj;

        for i in (j + 1)..n {
            let off = sum_product(j, &l.as_slice()[i * n..], 1, &l.as_slice()[j * n..], 1);
            l[(i, j)] = (s[(i, j)] - off) / ljj;
        }
    }

    Ok(l)
}

/// Inverse of a lower-triangular matrix with a strictly positive diagonal
/// (the Cholesky factor), by forward substitution one column at a time.
fn lower_triangular_inverse(l: &Matrix) -> Matrix {
    let n = l.rows();
    let mut inv = Matrix::zeros(n, n);

    for j in 0..n {
        inv[(j, j)] = 1.0 / l[(j, j)];
        for i in (j + 1)..n {
            let mut sum = 0.0;
            for k in j..i {
                sum += l[(i, k)] * inv[(k, j)];
            }
            inv[(i, j)] = -sum / l[(i, i)];
        }
    }

    inv
}

/// Inverse of a real symmetric positive-definite matrix, through its
/// Cholesky factor: S⁻¹ = L⁻ᵀ * L⁻¹. Fails whenever [`cholesky`] fails.
pub fn spd_inverse(s: &Matrix) -> Result<Matrix> {
    let l = cholesky(s)?;
    let l_inv = lower_triangular_inverse(&l);
    ops::mul_tn(&l_inv, &l_inv)
}

/// X minimising ‖A*X - B‖_F for A (m x n, m >= n) and B (m x p), via the
/// normal equations: X = (AᵀA)⁻¹ * (AᵀB).
///
/// AᵀA is PD exactly when A has full column rank; a rank-deficient design
/// surfaces as `SingularSystem`.
pub fn least_squares_solve(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::ShapeMismatch(
            "least_squares_solve: empty operand".to_string(),
        ));
    }
    if a.rows() < a.cols() {
        return Err(Error::ShapeMismatch(format!(
            "least_squares_solve: underdetermined system ({}x{})",
            a.rows(),
            a.cols()
        )));
    }
    if a.rows() != b.rows() {
        return Err(Error::ShapeMismatch(format!(
            "least_squares_solve: {} design rows vs {} observation rows",
            a.rows(),
            b.rows()
        )));
    }

    let ata = ops::mul_tn(a, a)?;
    let inv = spd_inverse(&ata).inspect_err(|_| {
        debug!(
            "normal equations singular for {}x{} design",
            a.rows(),
            a.cols()
        );
    })?;
    let atb = ops::mul_tn(a, b)?;
    ops::mul(&inv, &atb)
}

/// Y = X * U + 1 * mu, for X (m x n), U (n x n) and a row vector mu
/// (1 x n).
///
/// `U` is applied as given; a caller mapping white noise onto a
/// covariance's Cholesky factor L passes U = Lᵀ.
pub fn affine_transform(x: &Matrix, u: &Matrix, mu: &Matrix) -> Result<Matrix> {
    if x.is_empty() {
        return Err(Error::ShapeMismatch(
            "affine_transform: empty operand".to_string(),
        ));
    }
    let n = x.cols();
    if u.rows() != n || u.cols() != n {
        return Err(Error::ShapeMismatch(format!(
            "affine_transform: transform is {}x{}, expected {n}x{n}",
            u.rows(),
            u.cols()
        )));
    }
    if mu.rows() != 1 || mu.cols() != n {
        return Err(Error::ShapeMismatch(format!(
            "affine_transform: offset is {}x{}, expected 1x{n}",
            mu.rows(),
            mu.cols()
        )));
    }

    let mut y = ops::mul(x, u)?;
    for i in 0..y.rows() {
        for j in 0..n {
            y[(i, j)] += mu[(0, j)];
        }
    }
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::matrix_approx_eq;

    const TOLERANCE: f64 = 1e-9;

    fn spd_fixture() -> Matrix {
        Matrix::from("4,6,4,4; 6,10,9,7; 4,9,17,11; 4,7,11,18")
    }

    #[test]
    fn cholesky_known_factor() {
        let l = cholesky(&spd_fixture()).unwrap();
        let expected = Matrix::from("2,0,0,0; 3,1,0,0; 2,3,2,0; 2,1,2,3");
        assert!(matrix_approx_eq(&l, &expected, TOLERANCE));
    }

    #[test]
    fn cholesky_reconstructs_input() {
        let s = spd_fixture();
        let l = cholesky(&s).unwrap();
        let llt = ops::mul_nt(&l, &l).unwrap();
        assert!(matrix_approx_eq(&llt, &s, TOLERANCE));
    }

    #[test]
    fn cholesky_rejects_non_square() {
        let s = Matrix::from("1,0,0;0,1,0");
        assert!(matches!(cholesky(&s), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn cholesky_fails_on_indefinite_matrix() {
        // Eigenvalues 3 and -1.
        let s = Matrix::from("1,2;2,1");
        assert_eq!(cholesky(&s), Err(Error::SingularSystem));
    }

    #[test]
    fn cholesky_fails_on_rank_deficient_matrix() {
        let s = Matrix::from("1,1;1,1");
        assert_eq!(cholesky(&s), Err(Error::SingularSystem));
    }

    #[test]
    fn cholesky_matches_nalgebra() {
        let s = Matrix::from("4,1,-1; 1,3,0; -1,0,2");
        let ours = cholesky(&s).unwrap();

        let oracle = nalgebra::DMatrix::from_row_slice(3, 3, s.as_slice())
            .cholesky()
            .expect("fixture is SPD");
        let l = oracle.l();
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (ours[(i, j)] - l[(i, j)]).abs() < 1e-12,
                    "L({i},{j}) disagrees with oracle: {} vs {}",
                    ours[(i, j)],
                    l[(i, j)]
                );
            }
        }
    }

    #[test]
    fn spd_inverse_known_value() {
        let expected = ops::scale(
            1.0 / 144.0,
            &Matrix::from("945,-690,174,-48; -690,532,-140,32; 174,-140,52,-16; -48,32,-16,16"),
        )
        .unwrap();
        let inv = spd_inverse(&spd_fixture()).unwrap();
        assert!(matrix_approx_eq(&inv, &expected, TOLERANCE));
    }

    #[test]
    fn spd_inverse_times_input_is_identity() {
        let s = spd_fixture();
        let inv = spd_inverse(&s).unwrap();
        let prod = ops::mul(&s, &inv).unwrap();
        assert!(matrix_approx_eq(&prod, &ops::identity(4), 1e-12));
    }

    #[test]
    fn spd_inverse_propagates_singularity() {
        let s = Matrix::from("1,1;1,1");
        assert_eq!(spd_inverse(&s), Err(Error::SingularSystem));
    }

    fn least_squares_fixture() -> (Matrix, Matrix) {
        let a = Matrix::from(
            "5,2,8,1; 4,6,5,5; 7,1,1,3; 2,6,1,1; 4,6,7,4; 8,6,4,2; 5,8,7,1; 7,8,2,2; 6,7,5,2; 5,5,6,2",
        );
        let b = Matrix::from(
            "1,7,1; 6,7,2; 3,3,2; 5,2,5; 6,5,5; 4,6,1; 5,4,8; 4,2,6; 1,8,6; 4,1,1",
        );
        (a, b)
    }

    #[test]
    fn least_squares_known_solution() {
        let (a, b) = least_squares_fixture();
        let x = least_squares_solve(&a, &b).unwrap();
        let expected = Matrix::from(
            "-0.122286918422277,0.266063484829536,-0.0575443373772838; \
             0.464217553042304,-0.0279214573318259,0.846505417553293; \
             -0.00883317831785533,0.470311201138176,-0.027798955351842; \
             0.836316520297104,0.470195843209534,-0.259472798611811",
        );
        assert!(matrix_approx_eq(&x, &expected, TOLERANCE));
    }

    #[test]
    fn least_squares_satisfies_normal_equations() {
        let (a, b) = least_squares_fixture();
        let x = least_squares_solve(&a, &b).unwrap();
        let lhs = ops::mul(&ops::mul_tn(&a, &a).unwrap(), &x).unwrap();
        let rhs = ops::mul_tn(&a, &b).unwrap();
        assert!(matrix_approx_eq(&lhs, &rhs, TOLERANCE));
    }

    #[test]
    fn least_squares_matches_nalgebra_svd() {
        let (a, b) = least_squares_fixture();
        let x = least_squares_solve(&a, &b).unwrap();

        let na = nalgebra::DMatrix::from_row_slice(10, 4, a.as_slice());
        let nb = nalgebra::DMatrix::from_row_slice(10, 3, b.as_slice());
        let svd = na.svd(true, true);
        let oracle = svd.solve(&nb, 1e-12).expect("fixture has full column rank");

        for i in 0..4 {
            for j in 0..3 {
                assert!(
                    (x[(i, j)] - oracle[(i, j)]).abs() < 1e-8,
                    "X({i},{j}) disagrees with SVD oracle"
                );
            }
        }
    }

    #[test]
    fn least_squares_rejects_underdetermined_system() {
        let a = Matrix::from("1,2,3;4,5,6");
        let b = Matrix::from("1;2");
        assert!(matches!(
            least_squares_solve(&a, &b),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn least_squares_fails_on_rank_deficient_design() {
        // Second column is twice the first.
        let a = Matrix::from("1,2;2,4;3,6");
        let b = Matrix::from("1;2;3");
        assert_eq!(least_squares_solve(&a, &b), Err(Error::SingularSystem));
    }

    #[test]
    fn affine_transform_known_value() {
        let x = Matrix::from("7,8,6; 6,3,7; 6,1,6; 2,1,4; 1,8,8; 8,2,6; 5,5,6; 6,6,2");
        let u = Matrix::from("7,2,4; 5,1,2; 5,7,7");
        let mu = Matrix::from("6,2,8");
        let y = affine_transform(&x, &u, &mu).unwrap();
        let expected = Matrix::from(
            "125,66,94; 98,66,87; 83,57,76; 45,35,46; 93,68,84; 102,62,86; 96,59,80; 88,34,58",
        );
        assert!(matrix_approx_eq(&y, &expected, TOLERANCE));
    }

    #[test]
    fn affine_transform_shape_checks() {
        let x = Matrix::from("1,2;3,4");
        let u = Matrix::from("1,0;0,1");
        let mu_bad = Matrix::from("1;2");
        assert!(matches!(
            affine_transform(&x, &u, &mu_bad),
            Err(Error::ShapeMismatch(_))
        ));

        let u_bad = Matrix::from("1,0,0;0,1,0;0,0,1");
        let mu = Matrix::from("1,2");
        assert!(matches!(
            affine_transform(&x, &u_bad, &mu),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
