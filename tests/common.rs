#![allow(unused)]

use std::ops::RangeInclusive;

use ndarray::prelude::*;
use proptest::prelude::*;
use proptest_derive::Arbitrary;

const FLOAT_RANGE: RangeInclusive<f64> = -10.0..=10.0;
const DIM_RANGE: RangeInclusive<usize> = 1..=10;

/// Memory layout applied to generated matrices, so kernels see non-standard strides
#[derive(Debug, Arbitrary)]
struct Layout {
    invert_rows: bool,
    invert_cols: bool,
    transpose: bool,
}

impl Layout {
    fn apply(&self, mut arr: Array2<f64>) -> Array2<f64> {
        if self.invert_rows {
            arr.invert_axis(Axis(0));
        }
        if self.invert_cols {
            arr.invert_axis(Axis(1));
        }
        if self.transpose {
            arr.reversed_axes()
        } else {
            arr
        }
    }
}

prop_compose! {
    pub fn square_arr()(dim in DIM_RANGE)
        (data in prop::collection::vec(FLOAT_RANGE, dim*dim), dim in Just(dim), layout in any::<Layout>()) -> Array2<f64> {
        layout.apply(Array2::from_shape_vec((dim, dim), data).unwrap())
    }
}

prop_compose! {
    pub fn symm_arr()(arr in square_arr()) -> Array2<f64> {
        (&arr + &arr.t()) * 0.5
    }
}

prop_compose! {
    /// `A.t A + n I`, comfortably positive definite
    pub fn spd_arr()(arr in square_arr()) -> Array2<f64> {
        let n = arr.nrows();
        arr.t().dot(&arr) + Array2::<f64>::eye(n) * n as f64
    }
}

prop_compose! {
    /// A matrix from `arr` together with a right-hand side block `x` of matching row count
    pub fn system_of_arr(arr: impl Strategy<Value = Array2<f64>>)
        (arr in arr)
        (x in prop::collection::vec(FLOAT_RANGE, arr.nrows() * 3), arr in Just(arr)) -> (Array2<f64>, Array2<f64>) {
        let n = arr.nrows();
        (arr, Array2::from_shape_vec((n, 3), x).unwrap())
    }
}

/// `diag(values)` as a dense matrix
pub fn diag(values: &[f64]) -> Array2<f64> {
    Array2::from_diag(&Array1::from(values.to_vec()))
}

/// Random symmetric positive definite matrix with eigenvalues spread over `[1, 1 + n]`
pub fn random_spd<R: ndarray_rand::rand::Rng>(n: usize, rng: &mut R) -> Array2<f64> {
    use ndarray_rand::{rand_distr::Uniform, RandomExt};

    let a = Array2::random_using((n, n), Uniform::new(-1.0, 1.0), rng);
    let a = (&a + &a.t()) * 0.5;
    a.t().dot(&a) + Array2::<f64>::eye(n)
}
