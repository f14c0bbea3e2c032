//! # batch-linalg: broadcasting-aware batched linear algebra
//!
//! Dense linear-algebra primitives over "stacks" of small matrices: one
//! matrix per combination of leading batch-axis values, as produced by a
//! statistical-inference engine iterating over data points or mixture
//! components. The batch axes of matrices and right-hand sides broadcast
//! against each other under NumPy rules, and every right-hand side sharing a
//! factor slice is solved in a single grouped kernel call.
//!
//! ## Operations
//!
//! - [`factorize`]: batched Cholesky factorization
//! - [`solve`]: Cholesky-based linear solve with broadcasting
//! - [`triangular_solve`]: direct triangular solve with broadcasting
//! - [`invert`]: matrix inversion from a Cholesky factor
//! - [`log_determinant`]: log-determinants from a Cholesky factor
//! - [`outer`], [`matvec`]: elementwise batched algebra
//!
//! ## Quick Start
//!
//! ```rust
//! use batch_linalg::{factorize, solve, Array, Shape};
//!
//! // A stack of three 2x2 SPD matrices sharing one right-hand side.
//! let c = Array::from_vec(
//!     vec![4.0, 2.0, 2.0, 3.0, 5.0, 1.0, 1.0, 2.0, 9.0, 0.0, 0.0, 1.0],
//!     Shape::new(vec![3, 2, 2]),
//! );
//! let b = Array::from_vec(vec![1.0, 2.0], Shape::new(vec![1, 2]));
//!
//! let u = factorize(&c).unwrap();
//! let x = solve(&u, &b).unwrap();
//! assert_eq!(x.shape().as_slice(), &[3, 2]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod array;
mod chol;
mod elementwise;
mod error;
mod shape;
mod sparse;

// Public exports
pub use array::Array;
pub use chol::{
    factorize, invert, log_determinant, solve, triangular_solve, Factor, TriangularOptions,
};
pub use elementwise::{matvec, outer};
pub use error::{LinalgError, Result};
pub use shape::{BatchIndices, Shape};
pub use sparse::SparseFactor;
