//! Batched Cholesky factorization, solves, inversion and log-determinants.
//!
//! All operations accept stacks of matrices and right-hand sides with
//! arbitrary, possibly-empty batch shapes. A solve groups every right-hand
//! side that broadcasts against the same factor slice into a single kernel
//! call, so the number of underlying dense solves equals the number of
//! distinct factor slices, not the number of (factor, rhs) pairs.

use crate::{
    Array, BatchIndices, LinalgError, Result, Shape, SparseFactor,
};
use std::fmt;

/// A Cholesky factorization, either a dense batch of triangular factors or
/// an opaque handle to an external sparse factorization.
///
/// The dense variant holds an array with the same shape as the factored
/// batch; each `(n, n)` slice is the lower-triangular `L` with `L·Lᵀ = M`
/// and zeros above the diagonal. The sparse variant borrows a caller-owned
/// [`SparseFactor`] for the duration of a call; its batch shape is always
/// degenerate (one matrix).
pub enum Factor<'a> {
    /// Batched dense lower-triangular factors.
    Dense(Array),
    /// Borrowed handle to an external sparse Cholesky factorization.
    Sparse(&'a dyn SparseFactor),
}

impl<'a> Factor<'a> {
    /// Wrap a caller-owned sparse factorization.
    pub fn sparse(handle: &'a dyn SparseFactor) -> Self {
        Factor::Sparse(handle)
    }

    /// The dense factor batch, if this is the dense variant.
    pub fn as_dense(&self) -> Option<&Array> {
        match self {
            Factor::Dense(u) => Some(u),
            Factor::Sparse(_) => None,
        }
    }
}

impl fmt::Debug for Factor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Dense(u) => f.debug_tuple("Dense").field(u.shape()).finish(),
            Factor::Sparse(_) => f.write_str("Sparse(..)"),
        }
    }
}

/// Variant selection for [`triangular_solve`].
///
/// The default matches the common convention for Cholesky-style factors
/// stored upper-triangular: `lower = false`, `transpose = false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangularOptions {
    /// Treat the matrix as lower triangular instead of upper triangular.
    pub lower: bool,
    /// Solve `Tᵀ·x = b` instead of `T·x = b`.
    pub transpose: bool,
}

// ---------------------------------------------------------------------------
// Single-matrix kernels
// ---------------------------------------------------------------------------

/// Cholesky-factorize one `n`×`n` slice into a lower-triangular factor.
///
/// Returns `None` if the slice is not positive definite; the caller attaches
/// the batch index to the error.
fn cholesky_slice(m: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;

            if j == i {
                // Diagonal element
                for k in 0..j {
                    sum += l[j * n + k] * l[j * n + k];
                }
                let val = m[j * n + j] - sum;
                if !(val > 0.0 && val.is_finite()) {
                    return None;
                }
                l[j * n + j] = val.sqrt();
            } else {
                // Off-diagonal element
                for k in 0..j {
                    sum += l[i * n + k] * l[j * n + k];
                }
                l[i * n + j] = (m[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    Some(l)
}

/// Solve one triangular system `T·x = b` (or a transposed variant) in place
/// for every length-`n` row of `rhs`.
fn triangular_solve_slice(
    t: &[f64],
    n: usize,
    rhs: &mut [f64],
    opts: TriangularOptions,
) -> Result<()> {
    // Transposing swaps the triangle and the element access pattern.
    let at = |i: usize, j: usize| {
        if opts.transpose {
            t[j * n + i]
        } else {
            t[i * n + j]
        }
    };
    let forward = opts.lower != opts.transpose;

    for i in 0..n {
        if t[i * n + i] == 0.0 {
            return Err(LinalgError::SingularMatrix);
        }
    }

    for x in rhs.chunks_mut(n) {
        if forward {
            for i in 0..n {
                let mut sum = x[i];
                for j in 0..i {
                    sum -= at(i, j) * x[j];
                }
                x[i] = sum / at(i, i);
            }
        } else {
            for i in (0..n).rev() {
                let mut sum = x[i];
                for j in (i + 1)..n {
                    sum -= at(i, j) * x[j];
                }
                x[i] = sum / at(i, i);
            }
        }
    }

    Ok(())
}

/// Solve `M·x = b` for every row of `rhs` using the precomputed lower factor
/// of one slice: a forward substitution with `L` followed by a back
/// substitution with `Lᵀ`.
fn cho_solve_slice(l: &[f64], n: usize, rhs: &mut [f64]) -> Result<()> {
    triangular_solve_slice(l, n, rhs, TriangularOptions { lower: true, transpose: false })?;
    triangular_solve_slice(l, n, rhs, TriangularOptions { lower: true, transpose: true })
}

// ---------------------------------------------------------------------------
// Batched engine
// ---------------------------------------------------------------------------

/// Cholesky-factorize a batch of symmetric positive-definite matrices.
///
/// The last two axes of `c` are the matrix; every leading axis enumerates an
/// independent slice. Each slice is factored into the lower-triangular `L`
/// with `L·Lᵀ = M` and zeros above the diagonal. A single non-positive-
/// definite slice aborts the whole call with its batch index; no partial
/// factor batch is ever returned.
///
/// Sparse matrices are factored by the external collaborator and wrapped via
/// [`Factor::sparse`] instead.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{factorize, Array, Shape};
/// let c = Array::from_vec(vec![4.0, 2.0, 2.0, 3.0], Shape::new(vec![2, 2]));
/// let u = factorize(&c).unwrap();
/// let l = u.as_dense().unwrap();
/// assert_eq!(l.data()[0], 2.0); // sqrt(4)
/// assert_eq!(l.data()[1], 0.0); // zero above the diagonal
/// ```
pub fn factorize(c: &Array) -> Result<Factor<'static>> {
    let n = square_dim(c)?;
    let batch = c.batch_shape(2);
    let strides = c.shape().default_strides();

    let mut out = Array::zeros(c.shape().clone());
    for index in BatchIndices::new(&batch) {
        let off = batch_offset(&index, &strides);
        let slice = &c.data()[off..off + n * n];
        match cholesky_slice(slice, n) {
            Some(l) => out.data_mut()[off..off + n * n].copy_from_slice(&l),
            None => return Err(LinalgError::NotPositiveDefinite { index }),
        }
    }

    Ok(Factor::Dense(out))
}

/// Solve `M·x = b` for every combination of factor slice and right-hand side
/// implied by broadcasting.
///
/// `u` is the factorization of the batched matrix `M` and `b` a batched
/// right-hand side whose last axis is the vector dimension. The batch shapes
/// broadcast against each other under NumPy rules; axes of `b` that match a
/// factor axis in size are iterated in lock-step, all other axes of `b` are
/// grouped into a single multi-rhs kernel call per factor slice.
///
/// A sparse factor bypasses batching entirely and delegates to the
/// collaborator's own solve.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{factorize, solve, Array, Shape};
/// let c = Array::from_vec(vec![4.0, 2.0, 2.0, 3.0], Shape::new(vec![2, 2]));
/// let u = factorize(&c).unwrap();
/// let b = Array::from_vec(vec![2.0, 1.0], Shape::new(vec![2]));
/// let x = solve(&u, &b).unwrap();
/// // M·x == b
/// let r0 = 4.0 * x.data()[0] + 2.0 * x.data()[1];
/// assert!((r0 - 2.0).abs() < 1e-12);
/// ```
pub fn solve(u: &Factor<'_>, b: &Array) -> Result<Array> {
    match u {
        Factor::Dense(u) => grouped_solve(u, b, cho_solve_slice),
        Factor::Sparse(f) => Ok(f.solve(b)),
    }
}

/// Solve `T·x = b` for a batch of triangular matrices, with the same
/// broadcasting and grouping behavior as [`solve`].
pub fn triangular_solve(t: &Array, b: &Array, opts: TriangularOptions) -> Result<Array> {
    grouped_solve(t, b, |slice, n, rhs| triangular_solve_slice(slice, n, rhs, opts))
}

/// Invert every matrix of a factored batch.
///
/// Each slice of the result is `M⁻¹`, obtained by solving the factor against
/// the identity. The output has the same shape as the dense factor batch.
/// Sparse factors are not invertible through this crate and fail with
/// [`LinalgError::UnsupportedOperand`].
pub fn invert(u: &Factor<'_>) -> Result<Array> {
    let u = match u {
        Factor::Dense(u) => u,
        Factor::Sparse(_) => {
            return Err(LinalgError::UnsupportedOperand(
                "matrix inversion of a sparse factor",
            ))
        }
    };

    let n = square_dim(u)?;
    let batch = u.batch_shape(2);
    let strides = u.shape().default_strides();
    let eye = Array::identity(n);

    let mut out = Array::zeros(u.shape().clone());
    for index in BatchIndices::new(&batch) {
        let off = batch_offset(&index, &strides);
        let slice = &u.data()[off..off + n * n];
        let mut inv = eye.data().to_vec();
        cho_solve_slice(slice, n, &mut inv)?;
        // The solved rows are the columns of M⁻¹, which is symmetric.
        out.data_mut()[off..off + n * n].copy_from_slice(&inv);
    }

    Ok(out)
}

/// Log-determinant of every matrix of a factored batch.
///
/// Dense: `ln det M = 2 Σ ln Lᵢᵢ` per slice, returned as a batch of scalars
/// with the factor's batch shape (a scalar array for a single matrix).
/// Sparse: `Σ ln dᵢ` over the collaborator's diagonal, which is the D of an
/// LDLᵀ decomposition rather than the square root of it.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{factorize, log_determinant, Array, Shape};
/// let c = Array::from_vec(vec![4.0, 2.0, 2.0, 3.0], Shape::new(vec![2, 2]));
/// let u = factorize(&c).unwrap();
/// let ld = log_determinant(&u).unwrap();
/// // det = 4*3 - 2*2 = 8
/// assert!((ld.data()[0] - 8.0_f64.ln()).abs() < 1e-12);
/// ```
pub fn log_determinant(u: &Factor<'_>) -> Result<Array> {
    match u {
        Factor::Dense(u) => {
            let n = square_dim(u)?;
            let batch = u.batch_shape(2);
            let strides = u.shape().default_strides();

            let mut out = Array::zeros(batch.clone());
            for (pos, index) in BatchIndices::new(&batch).enumerate() {
                let off = batch_offset(&index, &strides);
                let slice = &u.data()[off..off + n * n];
                let logdet: f64 = (0..n).map(|i| slice[i * n + i].ln()).sum();
                out.data_mut()[pos] = 2.0 * logdet;
            }
            Ok(out)
        }
        Factor::Sparse(f) => {
            let logdet: f64 = f.diagonal().iter().map(|d| d.ln()).sum();
            Ok(Array::scalar(logdet))
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping machinery
// ---------------------------------------------------------------------------

/// Where an output batch axis takes its coordinate from during scatter.
enum AxisSource {
    /// Pinned to the current factor index at this position.
    Factor(usize),
    /// Taken from the group's free multi-index at this position.
    Free(usize),
}

/// The shared engine behind [`solve`] and [`triangular_solve`].
///
/// For each factor slice, the right-hand-side axes aligned with the factor's
/// batch axes are pinned to the current batch index; everything else forms a
/// sub-array of right-hand sides that is flattened into one stack of rows and
/// handed to `kernel` in a single call, then scattered back into the
/// broadcasted output.
fn grouped_solve<K>(u: &Array, b: &Array, kernel: K) -> Result<Array>
where
    K: Fn(&[f64], usize, &mut [f64]) -> Result<()>,
{
    let n = square_dim(u)?;
    if b.ndim() < 1 || b.shape().as_slice()[b.ndim() - 1] != n {
        return Err(LinalgError::ShapeMismatch(
            u.shape().clone(),
            b.shape().clone(),
        ));
    }

    let sh_u = u.batch_shape(2);
    let sh_b = b.batch_shape(1);
    let l_u = sh_u.ndim();
    let l_b = sh_b.ndim();

    let out_batch = sh_u
        .broadcast_with(&sh_b)
        .ok_or_else(|| LinalgError::ShapeMismatch(sh_u.clone(), sh_b.clone()))?;
    let l_out = out_batch.ndim();

    // Classify b's batch axes: aligned axes are pinned per factor index, the
    // rest stay free and form the multi-rhs group.
    let aligned = sh_u.aligned_axes(&sh_b);
    let mut free_pos = vec![None; l_b];
    let mut free_dims = Vec::new();
    for (p, &dim) in sh_b.as_slice().iter().enumerate() {
        if !aligned.contains(&(l_b - p)) {
            free_pos[p] = Some(free_dims.len());
            free_dims.push(dim);
        }
    }
    let free_shape = Shape::new(free_dims);
    let free_indices: Vec<Vec<usize>> = BatchIndices::new(&free_shape).collect();
    let group_len = free_indices.len();

    // Decide, once, which operand drives each output batch axis.
    let mut out_shape_dims = out_batch.as_slice().to_vec();
    out_shape_dims.push(n);
    let out_shape = Shape::new(out_shape_dims);
    let out_strides = out_shape.default_strides();
    let sources: Vec<AxisSource> = (0..l_out)
        .map(|q| {
            let j = l_out - q;
            let u_dim = (j <= l_u).then(|| sh_u.as_slice()[l_u - j]);
            let b_dim = (j <= l_b).then(|| sh_b.as_slice()[l_b - j]);
            match (u_dim, b_dim) {
                (Some(_), None) => AxisSource::Factor(l_u - j),
                (Some(ud), Some(bd)) if bd == ud || bd == 1 => AxisSource::Factor(l_u - j),
                _ => match free_pos[l_b - j] {
                    Some(f) => AxisSource::Free(f),
                    None => unreachable!("non-aligned rhs axis must be free"),
                },
            }
        })
        .collect();

    let u_strides = u.shape().default_strides();
    let b_strides = b.shape().default_strides();
    let mut out = Array::zeros(out_shape);
    let mut group = vec![0.0; group_len * n];

    for index in BatchIndices::new(&sh_u) {
        if group_len == 0 {
            continue;
        }
        let u_off = batch_offset(&index, &u_strides);
        let slice = &u.data()[u_off..u_off + n * n];

        // Gather the group: pinned axes follow the factor index, free axes
        // sweep their full range.
        for (row, fi) in free_indices.iter().enumerate() {
            let mut b_off = 0;
            for p in 0..l_b {
                let coord = match free_pos[p] {
                    Some(f) => fi[f],
                    None => index[l_u - (l_b - p)],
                };
                b_off += coord * b_strides[p];
            }
            group[row * n..(row + 1) * n].copy_from_slice(&b.data()[b_off..b_off + n]);
        }

        // One kernel invocation per distinct factor slice.
        kernel(slice, n, &mut group)?;

        for (row, fi) in free_indices.iter().enumerate() {
            let mut out_off = 0;
            for (q, src) in sources.iter().enumerate() {
                let coord = match src {
                    AxisSource::Factor(a) => index[*a],
                    AxisSource::Free(f) => fi[*f],
                };
                out_off += coord * out_strides[q];
            }
            out.data_mut()[out_off..out_off + n].copy_from_slice(&group[row * n..(row + 1) * n]);
        }
    }

    Ok(out)
}

/// The matrix dimension of a batched square matrix, or `ShapeMismatch`.
fn square_dim(a: &Array) -> Result<usize> {
    let dims = a.shape().as_slice();
    if dims.len() < 2 || dims[dims.len() - 1] != dims[dims.len() - 2] {
        let n = dims.last().copied().unwrap_or(0);
        return Err(LinalgError::ShapeMismatch(
            a.shape().clone(),
            Shape::new(vec![n, n]),
        ));
    }
    Ok(dims[dims.len() - 1])
}

/// Element offset of the slice at `index` in an array with `strides`.
fn batch_offset(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides.iter()).map(|(&i, &s)| i * s).sum()
}
