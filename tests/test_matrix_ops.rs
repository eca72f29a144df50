// Algebraic properties of the dense matrix engine.

use approx::assert_relative_eq;
use digit_nn::{Matrix, MatrixError};
use proptest::prelude::*;

fn matrix(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
    prop::collection::vec(-10.0f64..10.0, rows * cols)
        .prop_map(move |v| Matrix::from_flat(v, rows, cols).unwrap())
}

fn any_matrix() -> impl Strategy<Value = Matrix> {
    (1usize..6, 1usize..6).prop_flat_map(|(r, c)| matrix(r, c))
}

fn assert_matrix_eq(a: &Matrix, b: &Matrix) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_relative_eq!(x, y, epsilon = 1e-9, max_relative = 1e-9);
    }
}

proptest! {
    #[test]
    fn add_then_sub_scalar_is_identity(a in any_matrix(), k in -100.0f64..100.0) {
        assert_matrix_eq(&a.add_scalar(k).sub_scalar(k), &a);
    }

    #[test]
    fn double_transpose_is_identity(a in any_matrix()) {
        prop_assert_eq!(a.transpose().transpose(), a);
    }

    #[test]
    fn product_shape_and_transpose_rule(
        (a, b) in (1usize..5, 1usize..5, 1usize..5)
            .prop_flat_map(|(m, n, p)| (matrix(m, n), matrix(n, p)))
    ) {
        let ab = a.mul(&b).unwrap();
        prop_assert_eq!(ab.rows(), a.rows());
        prop_assert_eq!(ab.cols(), b.cols());

        let lhs = ab.transpose();
        let rhs = b.transpose().mul(&a.transpose()).unwrap();
        assert_matrix_eq(&lhs, &rhs);
    }

    #[test]
    fn hadamard_commutes(
        (a, b) in (1usize..6, 1usize..6).prop_flat_map(|(r, c)| (matrix(r, c), matrix(r, c)))
    ) {
        assert_matrix_eq(&a.hadamard(&b).unwrap(), &b.hadamard(&a).unwrap());
    }

    #[test]
    fn elementwise_ops_reject_unequal_shapes(
        r1 in 1usize..5, c1 in 1usize..5, r2 in 1usize..5, c2 in 1usize..5
    ) {
        prop_assume!((r1, c1) != (r2, c2));
        let a = Matrix::zeros(r1, c1);
        let b = Matrix::zeros(r2, c2);
        let is_mismatch = |r: Result<Matrix, MatrixError>| {
            matches!(r, Err(MatrixError::DimensionMismatch { .. }))
        };
        prop_assert!(is_mismatch(a.add(&b)));
        prop_assert!(is_mismatch(a.sub(&b)));
        prop_assert!(is_mismatch(a.hadamard(&b)));
    }

    #[test]
    fn product_rejects_inner_dimension_mismatch(
        m in 1usize..5, n in 1usize..5, k in 1usize..5, p in 1usize..5
    ) {
        prop_assume!(n != k);
        let err = Matrix::zeros(m, n).mul(&Matrix::zeros(k, p)).unwrap_err();
        prop_assert!(matches!(err, MatrixError::DimensionMismatch { op: "mul", .. }), "unexpected error: {:?}", err);
    }
}

#[test]
fn filling_reads_back_generator_values() {
    assert_eq!(Matrix::filling(|i, j| (i + j) as f64, 2, 2).get(1, 1), 2.0);
}

#[test]
fn scalar_mul_scales_every_element() {
    let a = Matrix::from_flat([1.0, -2.0, 3.0, 0.5], 2, 2).unwrap();
    assert_eq!(a.mul_scalar(2.0).as_slice(), &[2.0, -4.0, 6.0, 1.0]);
}

#[test]
fn mismatch_reports_operation_and_shapes() {
    let a = Matrix::zeros(2, 3);
    let b = Matrix::zeros(3, 2);
    let err = a.add(&b).unwrap_err();
    assert_eq!(
        err.to_string(),
        "matrix dimensions do not match for add (this: 2x3, that: 3x2)"
    );
}

#[test]
fn any_nan_is_only_reported_on_request() {
    let a = Matrix::from_flat([f64::NAN, 1.0], 2, 1).unwrap();
    // Arithmetic carries NaN through without complaint.
    let b = a.add_scalar(1.0);
    assert!(b.any_nan());
    assert!(!Matrix::zeros(2, 1).any_nan());
}
