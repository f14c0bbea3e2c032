//! Shape, broadcasting and batch-index iteration for n-dimensional arrays.
//!
//! A *batch shape* is the leading part of an array shape with the trailing
//! matrix `(rows, cols)` or vector `(len,)` axes already stripped. Two batch
//! shapes combine under NumPy broadcasting rules: axes are compared from the
//! trailing end, and a pair is compatible if the sizes are equal or one of
//! them is 1.

use std::fmt;

/// Shape of an n-dimensional array.
///
/// Represented as a vector of dimensions. An empty vector represents a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_linalg::Shape;
    /// let shape = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(shape.ndim(), 3);
    /// assert_eq!(shape.size(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Create a scalar shape (empty dimensions).
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    pub fn size(&self) -> usize {
        if self.dims.is_empty() {
            1
        } else {
            self.dims.iter().product()
        }
    }

    /// Returns a slice of the dimensions.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.dims
    }

    /// Returns true if this is a scalar shape.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Compute default row-major (C-order) strides for this shape.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_linalg::Shape;
    /// let shape = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(shape.default_strides(), vec![12, 4, 1]);
    /// ```
    pub fn default_strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.ndim()];
        for i in (0..self.ndim().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Check if two shapes are broadcast-compatible and return the result shape.
    ///
    /// Following NumPy broadcasting rules: dimensions are right-aligned and a
    /// pair is compatible if the sizes are equal or one of them is 1. Leading
    /// axes of the longer shape pass through unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_linalg::Shape;
    /// let a = Shape::new(vec![3, 1]);
    /// let b = Shape::new(vec![4]);
    /// assert_eq!(a.broadcast_with(&b), Some(Shape::new(vec![3, 4])));
    /// ```
    pub fn broadcast_with(&self, other: &Shape) -> Option<Shape> {
        let ndim = self.ndim().max(other.ndim());
        let mut result = Vec::with_capacity(ndim);

        for i in 0..ndim {
            let dim1 = if i < self.ndim() {
                self.dims[self.ndim() - 1 - i]
            } else {
                1
            };
            let dim2 = if i < other.ndim() {
                other.dims[other.ndim() - 1 - i]
            } else {
                1
            };

            if dim1 == dim2 {
                result.push(dim1);
            } else if dim1 == 1 {
                // The singleton stretches to the other size, including zero.
                result.push(dim2);
            } else if dim2 == 1 {
                result.push(dim1);
            } else {
                return None; // Incompatible shapes
            }
        }

        result.reverse();
        Some(Shape::new(result))
    }

    /// Trailing-axis offsets on which `other` is iterated in lock-step with
    /// `self`, rather than broadcast.
    ///
    /// Offsets count from the end, 1-based: offset 1 is the last axis. An
    /// offset is aligned when the axis exists in both shapes with equal size;
    /// every other axis of `other` is absorbed by broadcasting (singleton or
    /// leading) and never indexed per-element of `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_linalg::Shape;
    /// let u = Shape::new(vec![2, 3]);
    /// let b = Shape::new(vec![5, 1, 3]);
    /// // Last axis matches (3 == 3); the second-to-last does not (2 vs 1).
    /// assert_eq!(u.aligned_axes(&b), vec![1]);
    /// ```
    pub fn aligned_axes(&self, other: &Shape) -> Vec<usize> {
        let l = self.ndim().min(other.ndim());
        (1..=l)
            .filter(|&j| self.dims[self.ndim() - j] == other.dims[other.ndim() - j])
            .collect()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// Iterator over every multi-index of a batch shape, in row-major order
/// (first axis slowest).
///
/// The sequence is finite and a fresh iterator restarts from the beginning.
/// An empty shape yields exactly one empty index, matching the scalar case
/// where a degenerate batch still holds a single matrix. A shape with a
/// zero-sized axis yields nothing.
///
/// # Examples
///
/// ```
/// # use batch_linalg::{BatchIndices, Shape};
/// let idx: Vec<Vec<usize>> = BatchIndices::new(&Shape::new(vec![2, 2])).collect();
/// assert_eq!(idx, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
///
/// let scalar: Vec<Vec<usize>> = BatchIndices::new(&Shape::scalar()).collect();
/// assert_eq!(scalar, vec![Vec::<usize>::new()]);
/// ```
#[derive(Debug, Clone)]
pub struct BatchIndices {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl BatchIndices {
    /// Create an iterator over all multi-indices of `shape`.
    pub fn new(shape: &Shape) -> Self {
        let dims = shape.as_slice().to_vec();
        let next = if dims.contains(&0) {
            None
        } else {
            Some(vec![0; dims.len()])
        };
        Self { dims, next }
    }
}

impl Iterator for BatchIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;

        // Odometer increment, last axis fastest.
        let mut succ = current.clone();
        for d in (0..self.dims.len()).rev() {
            succ[d] += 1;
            if succ[d] < self.dims[d] {
                self.next = Some(succ);
                return Some(current);
            }
            succ[d] = 0;
        }

        Some(current)
    }
}
