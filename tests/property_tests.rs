//! Property-based tests for batch-linalg using proptest.
//!
//! These tests generate random inputs and validate that the broadcast
//! calculator and the batched solves satisfy their mathematical invariants.

use batch_linalg::{factorize, solve, Array, Shape};
use proptest::prelude::*;

// =============================================================================
// GENERATORS
// =============================================================================

/// Generate a batch shape (0-3 dimensions, each dimension 1-4 elements).
fn arb_batch_shape() -> impl Strategy<Value = Shape> {
    prop::collection::vec(1usize..=4, 0..=3).prop_map(Shape::new)
}

/// Generate a pair of broadcast-compatible batch shapes by starting from one
/// shape and degrading axes of a right-aligned copy to singletons or
/// dropping leading axes.
fn arb_compatible_shapes() -> impl Strategy<Value = (Shape, Shape)> {
    (arb_batch_shape(), prop::collection::vec(any::<bool>(), 3), 0usize..=3).prop_map(
        |(full, squeeze, drop)| {
            let dims = full.as_slice();
            let keep = dims.len().saturating_sub(drop);
            let other: Vec<usize> = dims[dims.len() - keep..]
                .iter()
                .enumerate()
                .map(|(i, &d)| if squeeze[i % squeeze.len()] { 1 } else { d })
                .collect();
            (full, Shape::new(other))
        },
    )
}

/// Generate one n×n SPD matrix as L·Lᵀ from a random lower-triangular L
/// with a strictly positive diagonal.
fn arb_spd_matrix(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0f64..1.0, n * n).prop_map(move |raw| {
        let mut l = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..i {
                l[i * n + j] = raw[i * n + j];
            }
            l[i * n + i] = 1.0 + raw[i * n + i].abs();
        }
        // M = L·Lᵀ
        let mut m = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += l[i * n + k] * l[j * n + k];
                }
                m[i * n + j] = sum;
            }
        }
        m
    })
}

// =============================================================================
// BROADCAST CALCULATOR
// =============================================================================

proptest! {
    #[test]
    fn broadcast_is_symmetric(shapes in (arb_batch_shape(), arb_batch_shape())) {
        let (a, b) = shapes;
        prop_assert_eq!(a.broadcast_with(&b), b.broadcast_with(&a));
    }

    #[test]
    fn broadcast_with_self_is_identity(a in arb_batch_shape()) {
        prop_assert_eq!(a.broadcast_with(&a), Some(a.clone()));
    }

    #[test]
    fn broadcast_with_scalar_is_identity(a in arb_batch_shape()) {
        prop_assert_eq!(a.broadcast_with(&Shape::scalar()), Some(a.clone()));
    }

    #[test]
    fn compatible_shapes_broadcast_to_the_fuller_one(pair in arb_compatible_shapes()) {
        let (full, degraded) = pair;
        prop_assert_eq!(full.broadcast_with(&degraded), Some(full.clone()));
    }

    #[test]
    fn aligned_axes_are_within_common_rank(
        a in arb_batch_shape(),
        b in arb_batch_shape(),
    ) {
        let common = a.ndim().min(b.ndim());
        for j in a.aligned_axes(&b) {
            prop_assert!(j >= 1 && j <= common);
            prop_assert_eq!(
                a.as_slice()[a.ndim() - j],
                b.as_slice()[b.ndim() - j]
            );
        }
    }

    #[test]
    fn aligned_axes_are_symmetric(a in arb_batch_shape(), b in arb_batch_shape()) {
        prop_assert_eq!(a.aligned_axes(&b), b.aligned_axes(&a));
    }
}

// =============================================================================
// BATCHED SOLVES
// =============================================================================

proptest! {
    #[test]
    fn solve_residual_is_small(
        m in arb_spd_matrix(3),
        b in prop::collection::vec(-5.0f64..5.0, 3),
    ) {
        let c = Array::from_vec(m.clone(), Shape::new(vec![3, 3]));
        let rhs = Array::from_vec(b.clone(), Shape::new(vec![3]));

        let u = factorize(&c).unwrap();
        let x = solve(&u, &rhs).unwrap();

        for i in 0..3 {
            let r: f64 = (0..3).map(|k| m[i * 3 + k] * x.data()[k]).sum();
            prop_assert!((r - b[i]).abs() < 1e-8, "residual {} at row {}", r - b[i], i);
        }
    }

    #[test]
    fn batched_solve_matches_looped_solves(
        ms in prop::collection::vec(arb_spd_matrix(2), 1..=4),
        b in prop::collection::vec(-5.0f64..5.0, 2),
    ) {
        let k = ms.len();
        let data: Vec<f64> = ms.iter().flatten().copied().collect();
        let c = Array::from_vec(data, Shape::new(vec![k, 2, 2]));
        let shared = Array::from_vec(b.clone(), Shape::new(vec![1, 2]));

        let u = factorize(&c).unwrap();
        let batched = solve(&u, &shared).unwrap();
        prop_assert_eq!(batched.shape().as_slice(), &[k, 2]);

        for (s, m) in ms.iter().enumerate() {
            let us = factorize(&Array::from_vec(m.clone(), Shape::new(vec![2, 2]))).unwrap();
            let bs = Array::from_vec(b.clone(), Shape::new(vec![2]));
            let xs = solve(&us, &bs).unwrap();
            for i in 0..2 {
                prop_assert!((batched.data()[s * 2 + i] - xs.data()[i]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn log_determinant_is_finite_for_spd(m in arb_spd_matrix(3)) {
        let c = Array::from_vec(m, Shape::new(vec![3, 3]));
        let u = factorize(&c).unwrap();
        let ld = batch_linalg::log_determinant(&u).unwrap();
        prop_assert!(ld.data()[0].is_finite());
    }
}
