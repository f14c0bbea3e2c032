//! Error types for batched linear-algebra operations.

use crate::Shape;

/// Errors surfaced by the batched factorization and solve operations.
///
/// Numerical failures are not transient: no operation retries, and a failing
/// slice aborts the whole batch call rather than substituting a placeholder.
#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    /// Two batch shapes are not broadcast-compatible, or a trailing
    /// matrix/vector axis does not match the linear-algebra contract.
    #[error("shape mismatch: {0} vs {1}")]
    ShapeMismatch(Shape, Shape),

    /// A factorization slice is not symmetric positive definite.
    ///
    /// `index` is the batch index of the offending slice.
    #[error("matrix at batch index {index:?} is not positive definite")]
    NotPositiveDefinite {
        /// Batch index of the slice that failed to factorize.
        index: Vec<usize>,
    },

    /// A triangular solve encountered a zero on the diagonal.
    #[error("triangular matrix is singular (zero on the diagonal)")]
    SingularMatrix,

    /// An operation received an operand it does not support.
    #[error("unsupported operand: {0}")]
    UnsupportedOperand(&'static str),
}

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, LinalgError>;
