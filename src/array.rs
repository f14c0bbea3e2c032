//! Core Array type for n-dimensional numeric arrays.

use crate::Shape;
use std::fmt;

/// A multidimensional array of `f64` values in contiguous row-major order.
///
/// The last two axes of a batched matrix are the `(rows, cols)` of each
/// individual matrix; the last axis of a batched vector is its length. All
/// leading axes form the *batch shape* enumerating independent instances.
///
/// Arrays are plain owned values; every operation in this crate allocates a
/// fresh output and never mutates its inputs.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{Array, Shape};
/// let a = Array::zeros(Shape::new(vec![2, 3]));
/// assert_eq!(a.shape().as_slice(), &[2, 3]);
/// assert_eq!(a.size(), 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: Vec<f64>,
    shape: Shape,
}

impl Array {
    /// Create a new array filled with zeros.
    pub fn zeros(shape: Shape) -> Self {
        let data = vec![0.0; shape.size()];
        Self { data, shape }
    }

    /// Create an array from a flat `Vec<f64>` and shape.
    ///
    /// # Panics
    ///
    /// Panics if the shape size doesn't match the data length.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_linalg::{Array, Shape};
    /// let a = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0], Shape::new(vec![2, 2]));
    /// assert_eq!(a.shape().as_slice(), &[2, 2]);
    /// ```
    pub fn from_vec(data: Vec<f64>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.size(),
            "Data length must match shape size"
        );
        Self { data, shape }
    }

    /// Create a scalar (0-dimensional) array holding one value.
    pub fn scalar(value: f64) -> Self {
        Self { data: vec![value], shape: Shape::scalar() }
    }

    /// Create an `n`×`n` identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_linalg::Array;
    /// let eye = Array::identity(2);
    /// assert_eq!(eye.data(), &[1.0, 0.0, 0.0, 1.0]);
    /// ```
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self { data, shape: Shape::new(vec![n, n]) }
    }

    /// Get the shape of the array.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Get the number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Get the total number of elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// View the underlying data in row-major order.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable view of the underlying data (internal use).
    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// The batch shape: all axes except the trailing `matrix_ndim` ones.
    ///
    /// `matrix_ndim` is 2 for batched matrices and 1 for batched vectors.
    pub fn batch_shape(&self, matrix_ndim: usize) -> Shape {
        let dims = self.shape.as_slice();
        Shape::new(dims[..dims.len() - matrix_ndim].to_vec())
    }

    /// Reshape the array to a new shape of the same total size.
    ///
    /// # Panics
    ///
    /// Panics if the total size doesn't match.
    pub fn reshape(&self, new_shape: Shape) -> Self {
        assert_eq!(
            self.shape.size(),
            new_shape.size(),
            "Cannot reshape array of size {} into shape of size {}",
            self.shape.size(),
            new_shape.size()
        );
        Self { data: self.data.clone(), shape: new_shape }
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array:f64{}", self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_zeros() {
        let a = Array::zeros(Shape::new(vec![2, 3]));
        assert_eq!(a.shape().as_slice(), &[2, 3]);
        assert_eq!(a.size(), 6);
        assert_eq!(a.ndim(), 2);
        assert!(a.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_array_from_vec() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = Array::from_vec(data.clone(), Shape::new(vec![2, 3]));
        assert_eq!(a.shape().as_slice(), &[2, 3]);
        assert_eq!(a.data(), data.as_slice());
    }

    #[test]
    fn test_array_scalar() {
        let a = Array::scalar(3.5);
        assert!(a.shape().is_scalar());
        assert_eq!(a.data(), &[3.5]);
    }

    #[test]
    fn test_array_identity() {
        let eye = Array::identity(3);
        assert_eq!(eye.shape().as_slice(), &[3, 3]);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(eye.data()[i * 3 + j], expected);
            }
        }
    }

    #[test]
    fn test_batch_shape() {
        let a = Array::zeros(Shape::new(vec![4, 2, 3, 3]));
        assert_eq!(a.batch_shape(2), Shape::new(vec![4, 2]));
        assert_eq!(a.batch_shape(1), Shape::new(vec![4, 2, 3]));

        let m = Array::zeros(Shape::new(vec![3, 3]));
        assert!(m.batch_shape(2).is_scalar());
    }

    #[test]
    fn test_array_reshape() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = Array::from_vec(data.clone(), Shape::new(vec![2, 3]));
        let b = a.reshape(Shape::new(vec![3, 2]));
        assert_eq!(b.shape().as_slice(), &[3, 2]);
        assert_eq!(b.data(), data.as_slice());
    }

    #[test]
    #[should_panic(expected = "Data length must match shape size")]
    fn test_array_from_vec_size_mismatch() {
        let _a = Array::from_vec(vec![1.0, 2.0], Shape::new(vec![3]));
    }

    #[test]
    #[should_panic(expected = "Cannot reshape")]
    fn test_array_reshape_size_mismatch() {
        let a = Array::zeros(Shape::new(vec![2, 3]));
        let _b = a.reshape(Shape::new(vec![2, 2]));
    }

    #[test]
    fn test_array_display() {
        let a = Array::zeros(Shape::new(vec![2, 3]));
        assert_eq!(a.to_string(), "Array:f64(2, 3)");
    }
}
