//! Interface to an external sparse Cholesky collaborator.
//!
//! The sparse path is deliberately thin: this crate never factors a sparse
//! matrix itself and never inspects a sparse factor's representation. A
//! caller who holds a sparse precision matrix factors it with their sparse
//! library of choice, wraps the resulting factor object in this trait, and
//! hands it to [`Factor::sparse`](crate::Factor::sparse).

use crate::Array;

/// An opaque, caller-owned sparse Cholesky factorization.
///
/// The factor is assumed to come from an LDLᵀ-style decomposition (as
/// produced by CHOLMOD): [`diagonal`](SparseFactor::diagonal) returns the
/// entries of D itself, not their square roots. The log-determinant of the
/// factored matrix is therefore `Σ ln dᵢ`, with no factor of two, unlike the
/// dense LLᵀ path.
pub trait SparseFactor {
    /// Solve `M · x = rhs` for the original matrix `M` behind this factor.
    ///
    /// `rhs` is always dense; sparse right-hand sides are densified by the
    /// caller before reaching this crate.
    fn solve(&self, rhs: &Array) -> Array;

    /// The diagonal D of the decomposition, one entry per matrix row.
    fn diagonal(&self) -> Vec<f64>;
}
