//! Free-function matrix algebra.
//!
//! Every routine here:
//!
//! - rejects operands with a zero dimension (`ShapeMismatch`), since an
//!   empty operand almost always means an upstream assembly bug
//! - shape-checks before touching any element
//! - allocates a fresh result, so output can never alias input
//!
//! The four transpose-combination multiplies all reduce to the strided
//! [`sum_product`] kernel: a row view has unit stride, a column view
//! strides by the operand's column count.

use crate::error::{Error, Result};
use crate::matrix::{Matrix, sum_product, sum_squares};

fn require_nonempty(a: &Matrix, op: &str) -> Result<()> {
    if a.is_empty() {
        return Err(Error::ShapeMismatch(format!(
            "{op}: operand has a zero dimension ({}x{})",
            a.rows(),
            a.cols()
        )));
    }
    Ok(())
}

fn require_same_shape(a: &Matrix, b: &Matrix, op: &str) -> Result<()> {
    if a.rows() != b.rows() || a.cols() != b.cols() {
        return Err(Error::ShapeMismatch(format!(
            "{op}: {}x{} vs {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    Ok(())
}

/// C = A'.
pub fn transpose(a: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "transpose")?;

    let mut c = Matrix::zeros(a.cols(), a.rows());
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            c[(j, i)] = a[(i, j)];
        }
    }
    Ok(c)
}

/// C = -A.
pub fn negate(a: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "negate")?;

    let mut c = a.clone();
    for v in c.as_mut_slice() {
        *v = -*v;
    }
    Ok(c)
}

/// The n x n identity matrix.
pub fn identity(n: usize) -> Matrix {
    let mut a = Matrix::zeros(n, n);
    for i in 0..n {
        a[(i, i)] = 1.0;
    }
    a
}

/// C = a + A, term by term.
pub fn add_scalar(a: f64, m: &Matrix) -> Result<Matrix> {
    require_nonempty(m, "add_scalar")?;

    let mut c = m.clone();
    for v in c.as_mut_slice() {
        *v = a + *v;
    }
    Ok(c)
}

/// C = a * A, term by term.
pub fn scale(a: f64, m: &Matrix) -> Result<Matrix> {
    require_nonempty(m, "scale")?;

    let mut c = m.clone();
    for v in c.as_mut_slice() {
        *v = a * *v;
    }
    Ok(c)
}

/// C = A + B.
pub fn add(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "add")?;
    require_nonempty(b, "add")?;
    require_same_shape(a, b, "add")?;

    let mut c = a.clone();
    for (v, w) in c.as_mut_slice().iter_mut().zip(b.as_slice()) {
        *v += w;
    }
    Ok(c)
}

/// C = A - B.
pub fn sub(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "sub")?;
    require_nonempty(b, "sub")?;
    require_same_shape(a, b, "sub")?;

    let mut c = a.clone();
    for (v, w) in c.as_mut_slice().iter_mut().zip(b.as_slice()) {
        *v -= w;
    }
    Ok(c)
}

/// C = A * B.
pub fn mul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "mul")?;
    require_nonempty(b, "mul")?;
    if a.cols() != b.rows() {
        return Err(Error::ShapeMismatch(format!(
            "mul: inner dimensions {} vs {}",
            a.cols(),
            b.rows()
        )));
    }

    let mut c = Matrix::zeros(a.rows(), b.cols());
    for i in 0..a.rows() {
        for j in 0..b.cols() {
            c[(i, j)] = sum_product(
                a.cols(),
                &a.as_slice()[i * a.cols()..],
                1,
                &b.as_slice()[j..],
                b.cols(),
            );
        }
    }
    Ok(c)
}

/// C = A' * B.
pub fn mul_tn(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "mul_tn")?;
    require_nonempty(b, "mul_tn")?;
    if a.rows() != b.rows() {
        return Err(Error::ShapeMismatch(format!(
            "mul_tn: inner dimensions {} vs {}",
            a.rows(),
            b.rows()
        )));
    }

    let mut c = Matrix::zeros(a.cols(), b.cols());
    for i in 0..a.cols() {
        for j in 0..b.cols() {
            c[(i, j)] = sum_product(
                a.rows(),
                &a.as_slice()[i..],
                a.cols(),
                &b.as_slice()[j..],
                b.cols(),
            );
        }
    }
    Ok(c)
}

/// C = A * B'.
pub fn mul_nt(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "mul_nt")?;
    require_nonempty(b, "mul_nt")?;
    if a.cols() != b.cols() {
        return Err(Error::ShapeMismatch(format!(
            "mul_nt: inner dimensions {} vs {}",
            a.cols(),
            b.cols()
        )));
    }

    let mut c = Matrix::zeros(a.rows(), b.rows());
    for i in 0..a.rows() {
        for j in 0..b.rows() {
            c[(i, j)] = sum_product(
                a.cols(),
                &a.as_slice()[i * a.cols()..],
                1,
                &b.as_slice()[j * b.cols()..],
                1,
            );
        }
    }
    Ok(c)
}

/// C = A' * B'.
pub fn mul_tt(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "mul_tt")?;
    require_nonempty(b, "mul_tt")?;
    if a.rows() != b.cols() {
        return Err(Error::ShapeMismatch(format!(
            "mul_tt: inner dimensions {} vs {}",
            a.rows(),
            b.cols()
        )));
    }

    let mut c = Matrix::zeros(a.cols(), b.rows());
    for i in 0..a.cols() {
        for j in 0..b.rows() {
            c[(i, j)] = sum_product(
                a.rows(),
                &a.as_slice()[i..],
                a.cols(),
                &b.as_slice()[j * b.cols()..],
                1,
            );
        }
    }
    Ok(c)
}

/// Row vector (1 x cols) of column totals.
pub fn column_sum(a: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "column_sum")?;

    let mut x = Matrix::zeros(1, a.cols());
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            x[(0, j)] += a[(i, j)];
        }
    }
    Ok(x)
}

/// Column vector (rows x 1) of row totals.
pub fn row_sum(a: &Matrix) -> Result<Matrix> {
    require_nonempty(a, "row_sum")?;

    let mut x = Matrix::zeros(a.rows(), 1);
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            x[(i, 0)] += a[(i, j)];
        }
    }
    Ok(x)
}

/// Sum of the diagonal elements. Defined only for square matrices.
pub fn trace(a: &Matrix) -> Result<f64> {
    require_nonempty(a, "trace")?;
    if a.rows() != a.cols() {
        return Err(Error::ShapeMismatch(format!(
            "trace: matrix is {}x{}, not square",
            a.rows(),
            a.cols()
        )));
    }

    Ok((0..a.rows()).map(|i| a[(i, i)]).sum())
}

/// Maximum absolute value over all elements.
pub fn max_abs(a: &Matrix) -> Result<f64> {
    require_nonempty(a, "max_abs")?;

    Ok(a.as_slice().iter().fold(0.0, |m, &v| f64::max(m, v.abs())))
}

/// Maximum column sum of absolute values.
pub fn l1_norm(a: &Matrix) -> Result<f64> {
    require_nonempty(a, "l1_norm")?;

    let mut max_col = 0.0_f64;
    for j in 0..a.cols() {
        let sum: f64 = (0..a.rows()).map(|i| a[(i, j)].abs()).sum();
        max_col = max_col.max(sum);
    }
    Ok(max_col)
}

/// Maximum row sum of absolute values.
pub fn linf_norm(a: &Matrix) -> Result<f64> {
    require_nonempty(a, "linf_norm")?;

    let mut max_row = 0.0_f64;
    for i in 0..a.rows() {
        let sum: f64 = (0..a.cols()).map(|j| a[(i, j)].abs()).sum();
        max_row = max_row.max(sum);
    }
    Ok(max_row)
}

/// Square root of the sum of squared elements.
pub fn frobenius_norm(a: &Matrix) -> Result<f64> {
    require_nonempty(a, "frobenius_norm")?;

    Ok(sum_squares(a.as_slice().len(), a.as_slice(), 1).sqrt())
}

/// Scalar a' * B * c for column vectors `a` (n x 1) and `c` (m x 1).
pub fn quad_form_t(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<f64> {
    require_nonempty(a, "quad_form_t")?;
    require_nonempty(b, "quad_form_t")?;
    require_nonempty(c, "quad_form_t")?;
    if a.cols() != 1 || c.cols() != 1 || a.rows() != b.rows() || b.cols() != c.rows() {
        return Err(Error::ShapeMismatch(format!(
            "quad_form_t: {}x{} ' * {}x{} * {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
            c.rows(),
            c.cols()
        )));
    }

    let mut sum = 0.0;
    for i in 0..b.rows() {
        let row_dot = sum_product(
            b.cols(),
            &b.as_slice()[i * b.cols()..],
            1,
            c.as_slice(),
            1,
        );
        sum += a[(i, 0)] * row_dot;
    }
    Ok(sum)
}

/// Scalar a * B * c for a row vector `a` (1 x n) and a column vector `c`
/// (m x 1).
pub fn quad_form(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<f64> {
    require_nonempty(a, "quad_form")?;
    require_nonempty(b, "quad_form")?;
    require_nonempty(c, "quad_form")?;
    if a.rows() != 1 || c.cols() != 1 || a.cols() != b.rows() || b.cols() != c.rows() {
        return Err(Error::ShapeMismatch(format!(
            "quad_form: {}x{} * {}x{} * {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
            c.rows(),
            c.cols()
        )));
    }

    let mut sum = 0.0;
    for i in 0..b.rows() {
        let row_dot = sum_product(
            b.cols(),
            &b.as_slice()[i * b.cols()..],
            1,
            c.as_slice(),
            1,
        );
        sum += a[(0, i)] * row_dot;
    }
    Ok(sum)
}
