//! Dense matrix storage.
//!
//! `Matrix` is a mutable, dynamically sized block of `f64` in row-major
//! order with value semantics: `Clone` is a deep copy, and nothing aliases
//! the interior storage. Element (i, j) lives at offset `i * cols + j`.
//!
//! Design notes:
//!
//! - All arithmetic lives in free functions (see [`ops`]) that allocate
//!   fresh output, so an operation can never observe its own result
//!   mid-computation. The type itself only knows how to hold, resize,
//!   fill, parse, and print values.
//! - A matrix with a zero dimension is constructible and holds no storage,
//!   but is rejected as an operand by every routine in [`ops`].

mod sum_product;
pub mod ops;

pub(crate) use sum_product::{sum_product, sum_squares};

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Row-major dense matrix of `f64`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// An empty 0 x 0 matrix holding no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// A `rows` x `cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// A `rows` x `cols` matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// A `rows` x `cols` matrix initialized from `values` in row-major
    /// order.
    ///
    /// # Panics
    /// Panics if `values.len() != rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Self {
        assert_eq!(
            values.len(),
            rows * cols,
            "from_row_slice: {} values cannot fill a {rows}x{cols} matrix",
            values.len()
        );
        Self {
            rows,
            cols,
            data: values.to_vec(),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Destructive resize. Storage is reallocated only when the dimensions
    /// actually change; in every case the matrix is left zero-filled.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if self.rows != rows || self.cols != cols {
            self.rows = rows;
            self.cols = cols;
            self.data = vec![0.0; rows * cols];
        } else {
            self.data.fill(0.0);
        }
    }

    /// Broadcast `value` to every element.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Read-only view of the row-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    /// # Panics
    /// Panics if `row >= rows` or `col >= cols`.
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    /// # Panics
    /// Panics if `row >= rows` or `col >= cols`.
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}

/// Textual matrix literal.
///
/// Rows are separated by semicolons, columns within a row by commas.
/// Surrounding ASCII spaces and tabs are ignored. Any empty token, or any
/// token that fails to parse as a float, becomes 0.0. The column count is
/// the maximum token count over all rows; shorter rows are zero-padded on
/// the right, and a trailing semicolon introduces an additional all-zero
/// row:
///
/// ```
/// use oneka::matrix::Matrix;
///
/// let a = Matrix::from("1,2,3;4,5,6");     // [1 2 3; 4 5 6]
/// let b = Matrix::from("1,,;,,6");         // [1 0 0; 0 0 6]
/// let c = Matrix::from("1,2,3;4,5,6;");    // [1 2 3; 4 5 6; 0 0 0]
/// assert_eq!(a.rows(), 2);
/// assert_eq!(b[(1, 2)], 6.0);
/// assert_eq!(c.rows(), 3);
/// ```
impl From<&str> for Matrix {
    fn from(text: &str) -> Self {
        if text.trim_matches([' ', '\t']).is_empty() {
            return Matrix::new();
        }

        let parsed: Vec<Vec<f64>> = text
            .split(';')
            .map(|line| {
                line.split(',')
                    .map(|token| {
                        token
                            .trim_matches([' ', '\t'])
                            .parse::<f64>()
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        let cols = parsed.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = Matrix::zeros(parsed.len(), cols);
        for (i, row) in parsed.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                out.data[i * cols + j] = value;
            }
        }
        out
    }
}

/// Rows separated by line terminators; elements right-aligned to the
/// formatter's field width (and precision, when given), space-separated.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(0);
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    f.write_str(" ")?;
                }
                match f.precision() {
                    Some(p) => write!(f, "{:>width$.p$}", self.data[i * self.cols + j])?,
                    None => write!(f, "{:>width$}", self.data[i * self.cols + j])?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
