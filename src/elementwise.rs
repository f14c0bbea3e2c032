//! Elementwise batched algebra: outer and matrix-vector products.
//!
//! These are purely elementwise over the broadcasted batch axes, so they are
//! implemented directly without the solve engine's grouping machinery.

use crate::{Array, LinalgError, Result, Shape};

/// Outer product over the last axes of `a` and `b`, broadcasting the rest.
///
/// If `a` has shape `(..., N)` and `b` has shape `(..., M)`, the result has
/// shape `(..., N, M)` with `out[..., i, j] = a[..., i] * b[..., j]`.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{outer, Array, Shape};
/// let a = Array::from_vec(vec![1.0, 2.0, 3.0], Shape::new(vec![3]));
/// let b = Array::from_vec(vec![4.0, 5.0], Shape::new(vec![2]));
/// let c = outer(&a, &b).unwrap();
/// assert_eq!(c.shape().as_slice(), &[3, 2]);
/// assert_eq!(c.data(), &[4.0, 5.0, 8.0, 10.0, 12.0, 15.0]);
/// ```
pub fn outer(a: &Array, b: &Array) -> Result<Array> {
    if a.ndim() < 1 || b.ndim() < 1 {
        return Err(LinalgError::ShapeMismatch(
            a.shape().clone(),
            b.shape().clone(),
        ));
    }
    let n = a.shape().as_slice()[a.ndim() - 1];
    let m = b.shape().as_slice()[b.ndim() - 1];

    let batch_a = a.batch_shape(1);
    let batch_b = b.batch_shape(1);
    let batch = batch_a
        .broadcast_with(&batch_b)
        .ok_or_else(|| LinalgError::ShapeMismatch(batch_a.clone(), batch_b.clone()))?;

    let mut out_dims = batch.as_slice().to_vec();
    out_dims.push(n);
    out_dims.push(m);
    let out_shape = Shape::new(out_dims);

    let mut out = vec![0.0; out_shape.size()];
    let batch_size = batch.size();
    for k in 0..batch_size {
        let a_off = broadcast_offset(k, &batch, &batch_a) * n;
        let b_off = broadcast_offset(k, &batch, &batch_b) * m;
        let out_off = k * n * m;
        for i in 0..n {
            let av = a.data()[a_off + i];
            for j in 0..m {
                out[out_off + i * m + j] = av * b.data()[b_off + j];
            }
        }
    }

    Ok(Array::from_vec(out, out_shape))
}

/// Matrix-vector product over the last two axes of `a` and the last axis of
/// `b`, broadcasting the rest.
///
/// If `a` has shape `(..., M, N)` and `b` has shape `(..., N)`, the result
/// has shape `(..., M)` with `out[..., i] = Σₖ a[..., i, k] * b[..., k]`.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{matvec, Array, Shape};
/// let a = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0], Shape::new(vec![2, 2]));
/// let b = Array::from_vec(vec![1.0, 1.0], Shape::new(vec![2]));
/// let c = matvec(&a, &b).unwrap();
/// assert_eq!(c.data(), &[3.0, 7.0]);
/// ```
pub fn matvec(a: &Array, b: &Array) -> Result<Array> {
    if a.ndim() < 2 || b.ndim() < 1 {
        return Err(LinalgError::ShapeMismatch(
            a.shape().clone(),
            b.shape().clone(),
        ));
    }
    let dims = a.shape().as_slice();
    let (m, n) = (dims[dims.len() - 2], dims[dims.len() - 1]);
    if b.shape().as_slice()[b.ndim() - 1] != n {
        return Err(LinalgError::ShapeMismatch(
            a.shape().clone(),
            b.shape().clone(),
        ));
    }

    let batch_a = a.batch_shape(2);
    let batch_b = b.batch_shape(1);
    let batch = batch_a
        .broadcast_with(&batch_b)
        .ok_or_else(|| LinalgError::ShapeMismatch(batch_a.clone(), batch_b.clone()))?;

    let mut out_dims = batch.as_slice().to_vec();
    out_dims.push(m);
    let out_shape = Shape::new(out_dims);

    let mut out = vec![0.0; out_shape.size()];
    let batch_size = batch.size();
    for k in 0..batch_size {
        let a_off = broadcast_offset(k, &batch, &batch_a) * m * n;
        let b_off = broadcast_offset(k, &batch, &batch_b) * n;
        let out_off = k * m;
        for i in 0..m {
            let mut sum = 0.0;
            for j in 0..n {
                sum += a.data()[a_off + i * n + j] * b.data()[b_off + j];
            }
            out[out_off + i] = sum;
        }
    }

    Ok(Array::from_vec(out, out_shape))
}

/// Convert a flat batch index in the broadcasted shape to a flat batch index
/// in a source shape, collapsing broadcast (singleton or missing) axes.
fn broadcast_offset(flat_idx: usize, result_shape: &Shape, src_shape: &Shape) -> usize {
    let result_dims = result_shape.as_slice();
    let src_dims = src_shape.as_slice();

    // Convert flat index to a multi-dimensional index.
    let mut multi_idx = Vec::with_capacity(result_dims.len());
    let mut idx = flat_idx;
    for &dim in result_dims.iter().rev() {
        multi_idx.push(idx % dim);
        idx /= dim;
    }
    multi_idx.reverse();

    // Map to the source index with broadcasting.
    let offset = result_dims.len() - src_dims.len();
    let mut src_idx = 0;
    let mut stride = 1;

    for i in (0..src_dims.len()).rev() {
        let dim_idx = if src_dims[i] == 1 {
            0 // Broadcast dimension
        } else {
            multi_idx[offset + i]
        };
        src_idx += dim_idx * stride;
        stride *= src_dims[i];
    }

    src_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_batched() {
        // A (4, 3), B (4, 2) -> (4, 3, 2) with out[k, i, j] = A[k, i] * B[k, j].
        let a_data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let b_data: Vec<f64> = (0..8).map(|v| v as f64 + 1.0).collect();
        let a = Array::from_vec(a_data.clone(), Shape::new(vec![4, 3]));
        let b = Array::from_vec(b_data.clone(), Shape::new(vec![4, 2]));

        let c = outer(&a, &b).unwrap();
        assert_eq!(c.shape().as_slice(), &[4, 3, 2]);
        for k in 0..4 {
            for i in 0..3 {
                for j in 0..2 {
                    let expected = a_data[k * 3 + i] * b_data[k * 2 + j];
                    assert_eq!(c.data()[k * 6 + i * 2 + j], expected);
                }
            }
        }
    }

    #[test]
    fn test_outer_broadcast_singleton() {
        // A (2, 1, 3) against B (4, 2) -> batch (2, 4), result (2, 4, 3, 2).
        let a = Array::from_vec((0..6).map(|v| v as f64).collect(), Shape::new(vec![2, 1, 3]));
        let b = Array::from_vec((0..8).map(|v| v as f64).collect(), Shape::new(vec![4, 2]));
        let c = outer(&a, &b).unwrap();
        assert_eq!(c.shape().as_slice(), &[2, 4, 3, 2]);

        // Spot-check: batch index (1, 2) uses a[1, 0, :] and b[2, :].
        let off = (1 * 4 + 2) * 6;
        assert_eq!(c.data()[off], 3.0 * 4.0); // a[1,0,0] * b[2,0]
        assert_eq!(c.data()[off + 1], 3.0 * 5.0); // a[1,0,0] * b[2,1]
    }

    #[test]
    fn test_outer_incompatible() {
        let a = Array::zeros(Shape::new(vec![3, 2]));
        let b = Array::zeros(Shape::new(vec![4, 2]));
        assert!(matches!(
            outer(&a, &b),
            Err(LinalgError::ShapeMismatch(_, _))
        ));
    }

    #[test]
    fn test_matvec_single() {
        let a = Array::from_vec(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            Shape::new(vec![2, 3]),
        );
        let b = Array::from_vec(vec![1.0, 0.0, -1.0], Shape::new(vec![3]));
        let c = matvec(&a, &b).unwrap();
        assert_eq!(c.shape().as_slice(), &[2]);
        assert_eq!(c.data(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_matvec_broadcast_vector() {
        // A (2, 3, 3), b (3,): b is shared across the batch axis.
        let a_data: Vec<f64> = (0..18).map(|v| v as f64).collect();
        let a = Array::from_vec(a_data.clone(), Shape::new(vec![2, 3, 3]));
        let b = Array::from_vec(vec![1.0, 2.0, 3.0], Shape::new(vec![3]));

        let c = matvec(&a, &b).unwrap();
        assert_eq!(c.shape().as_slice(), &[2, 3]);
        for k in 0..2 {
            for i in 0..3 {
                let expected: f64 = (0..3)
                    .map(|j| a_data[k * 9 + i * 3 + j] * b.data()[j])
                    .sum();
                assert_eq!(c.data()[k * 3 + i], expected);
            }
        }
    }

    #[test]
    fn test_matvec_broadcast_matrix() {
        // A (3, 3), b (2, 3): the matrix is shared across b's batch axis.
        let a = Array::identity(3);
        let b = Array::from_vec((0..6).map(|v| v as f64).collect(), Shape::new(vec![2, 3]));
        let c = matvec(&a, &b).unwrap();
        assert_eq!(c.shape().as_slice(), &[2, 3]);
        assert_eq!(c.data(), b.data());
    }

    #[test]
    fn test_matvec_length_mismatch() {
        let a = Array::zeros(Shape::new(vec![2, 3]));
        let b = Array::zeros(Shape::new(vec![2]));
        assert!(matches!(
            matvec(&a, &b),
            Err(LinalgError::ShapeMismatch(_, _))
        ));
    }
}
