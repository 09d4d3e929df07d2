//! Crate-wide error surface.
//!
//! Numerical failure is a value, never a panic:
//!
//! - `SingularSystem` is the single recoverable signal for "this system has
//!   no usable solution": a non-positive Cholesky pivot, a rank-deficient
//!   normal system, a covariance that is not positive definite.
//! - `ShapeMismatch` reports incompatible or zero-sized operands to the
//!   matrix and linear-system routines.
//! - `InvalidArgument` reports out-of-range physical inputs to the engine.
//!
//! The only panicking surface is element access through `Index`/`IndexMut`,
//! which behaves like any Rust slice index and is documented as such.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The system is singular or not positive definite. No retry is
    /// attempted; the failing call is abandoned.
    #[error("singular system: matrix is not symmetric positive definite")]
    SingularSystem,

    /// Operand shapes are incompatible, or an operand has a zero dimension.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A physical input violates its documented range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
