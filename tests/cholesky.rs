use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use proptest::prelude::*;

use subspace_eig::{cholesky::*, triangular::*, EigError};

mod common;

fn run_cholesky_test(orig: Array2<f64>) {
    let chol = orig.cholesky().unwrap();
    assert!(chol.is_triangular(UPLO::Lower));
    assert_abs_diff_eq!(chol.dot(&chol.t()), orig, epsilon = 1e-9);

    let dirty = orig.cholesky_dirty().unwrap();
    assert_abs_diff_eq!(
        chol,
        dirty.into_triangular(UPLO::Lower).unwrap(),
        epsilon = 1e-12
    );

    let mut a = orig.clone();
    a.cholesky_inplace().unwrap();
    assert_abs_diff_eq!(a, chol, epsilon = 1e-12);
    assert_abs_diff_eq!(orig.cholesky_into().unwrap(), chol, epsilon = 1e-12);
}

fn run_solve_test(mut a: Array2<f64>, x: Array2<f64>) {
    let mut b = a.dot(&x);

    let l = a.cholesky().unwrap();
    assert_abs_diff_eq!(l.solve_factored_into(b.clone()).unwrap(), x, epsilon = 1e-7);
    assert_abs_diff_eq!(a.clone().solvec(&b).unwrap(), x, epsilon = 1e-7);
    assert_abs_diff_eq!(*a.solvec_inplace(&mut b).unwrap(), x, epsilon = 1e-7);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]
    #[test]
    fn cholesky_test(arr in common::spd_arr()) {
        run_cholesky_test(arr)
    }

    #[test]
    fn solve_test((a, x) in common::system_of_arr(common::spd_arr())) {
        run_solve_test(a, x)
    }

    #[test]
    fn indefinite_rejected(arr in common::spd_arr()) {
        let shifted = -arr;
        prop_assert!(matches!(shifted.cholesky(), Err(EigError::NotPositiveDefinite)));
    }
}

#[test]
fn cholesky_f32() {
    let arr = array![[25f32, 15., -5.], [15., 18., 0.], [-5., 0., 11.]];
    let lower = array![[5.0, 0.0, 0.0], [3.0, 3.0, 0.0], [-1., 1., 3.]];

    let chol = arr.cholesky().unwrap();
    assert_abs_diff_eq!(chol, lower, epsilon = 1e-6);
    assert_abs_diff_eq!(chol.dot(&chol.t()), arr, epsilon = 1e-4);
}
