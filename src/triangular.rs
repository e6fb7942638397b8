//! Triangular matrices: masking, checks and forward/back substitution

use crate::{check_square, EigError, Result};

use ndarray::{Array2, ArrayBase, Data, DataMut, Ix2, NdFloat};
use num_traits::Zero;

/// Which triangle of a square matrix holds the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UPLO {
    Upper,
    Lower,
}

/// Transform square matrix into triangular matrix
pub trait IntoTriangular {
    /// Zero out everything outside of the `uplo` triangle in place.
    fn triangular_inplace(&mut self, uplo: UPLO) -> Result<&mut Self>;

    /// Zero out everything outside of the `uplo` triangle, passing by value.
    fn into_triangular(mut self, uplo: UPLO) -> Result<Self>
    where
        Self: Sized,
    {
        self.triangular_inplace(uplo)?;
        Ok(self)
    }

    /// Check whether all entries outside of the `uplo` triangle are zero. Non-square matrices are
    /// never triangular.
    fn is_triangular(&self, uplo: UPLO) -> bool;
}

impl<A, S> IntoTriangular for ArrayBase<S, Ix2>
where
    A: Zero + Clone,
    S: DataMut<Elem = A>,
{
    fn triangular_inplace(&mut self, uplo: UPLO) -> Result<&mut Self> {
        let n = check_square(self)?;
        for i in 0..n {
            let range = match uplo {
                UPLO::Upper => 0..i,
                UPLO::Lower => i + 1..n,
            };
            for j in range {
                self[(i, j)] = A::zero();
            }
        }
        Ok(self)
    }

    fn is_triangular(&self, uplo: UPLO) -> bool {
        let n = match check_square(self) {
            Ok(n) => n,
            Err(_) => return false,
        };
        (0..n).all(|i| match uplo {
            UPLO::Upper => (0..i).all(|j| self[(i, j)].is_zero()),
            UPLO::Lower => (i + 1..n).all(|j| self[(i, j)].is_zero()),
        })
    }
}

/// Solve `A X = B` where `A` is triangular and `B` may hold several right-hand sides
///
/// Only the `uplo` triangle of `A` is read, so a factor with garbage in the other triangle can be
/// used directly.
pub trait SolveTriangular<A> {
    fn solve_triangular_inplace<'a, Sb: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<Sb, Ix2>,
        uplo: UPLO,
    ) -> Result<&'a mut ArrayBase<Sb, Ix2>>;

    fn solve_triangular_into<Sb: DataMut<Elem = A>>(
        &self,
        mut b: ArrayBase<Sb, Ix2>,
        uplo: UPLO,
    ) -> Result<ArrayBase<Sb, Ix2>> {
        self.solve_triangular_inplace(&mut b, uplo)?;
        Ok(b)
    }

    fn solve_triangular<Sb: Data<Elem = A>>(
        &self,
        b: &ArrayBase<Sb, Ix2>,
        uplo: UPLO,
    ) -> Result<Array2<A>>;
}

impl<A, S> SolveTriangular<A> for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: Data<Elem = A>,
{
    fn solve_triangular_inplace<'a, Sb: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<Sb, Ix2>,
        uplo: UPLO,
    ) -> Result<&'a mut ArrayBase<Sb, Ix2>> {
        let n = check_square(self)?;
        if b.nrows() != n {
            return Err(EigError::DimensionMismatch {
                expected: n,
                actual: b.nrows(),
            });
        }
        if self.diag().iter().any(|d| d.is_zero()) {
            return Err(EigError::NonInvertible);
        }

        for mut col in b.columns_mut() {
            match uplo {
                UPLO::Lower => {
                    for i in 0..n {
                        let mut s = col[i];
                        for j in 0..i {
                            s -= self[(i, j)] * col[j];
                        }
                        col[i] = s / self[(i, i)];
                    }
                }
                UPLO::Upper => {
                    for i in (0..n).rev() {
                        let mut s = col[i];
                        for j in i + 1..n {
                            s -= self[(i, j)] * col[j];
                        }
                        col[i] = s / self[(i, i)];
                    }
                }
            }
        }
        Ok(b)
    }

    fn solve_triangular<Sb: Data<Elem = A>>(
        &self,
        b: &ArrayBase<Sb, Ix2>,
        uplo: UPLO,
    ) -> Result<Array2<A>> {
        self.solve_triangular_into(b.to_owned(), uplo)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    use super::*;

    #[test]
    fn corner_cases() {
        let empty = Array2::<f64>::zeros((0, 0));
        assert!(empty.is_triangular(UPLO::Lower));
        assert!(empty.is_triangular(UPLO::Upper));
        assert_eq!(empty.clone().into_triangular(UPLO::Lower).unwrap(), empty);

        let one = array![[1]];
        assert!(one.is_triangular(UPLO::Lower));
        assert!(one.is_triangular(UPLO::Upper));
        assert_eq!(one.clone().into_triangular(UPLO::Upper).unwrap(), one);
    }

    #[test]
    fn non_square() {
        let row = array![[1, 2, 3], [3, 4, 5]];
        assert!(!row.is_triangular(UPLO::Lower));
        assert!(matches!(
            row.into_triangular(UPLO::Lower),
            Err(EigError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn mask() {
        let square = array![[1, 2, 3], [4, 5, 6], [7, 8, 9]];
        let upper = square.clone().into_triangular(UPLO::Upper).unwrap();
        assert_eq!(upper, array![[1, 2, 3], [0, 5, 6], [0, 0, 9]]);
        assert!(upper.is_triangular(UPLO::Upper));
        assert!(!upper.is_triangular(UPLO::Lower));

        let lower = square.into_triangular(UPLO::Lower).unwrap();
        assert_eq!(lower, array![[1, 0, 0], [4, 5, 0], [7, 8, 9]]);
    }

    #[test]
    fn substitution() {
        let lower = array![[2.0, 0.0], [1.0, 4.0]];
        let b = array![[2.0, 4.0], [9.0, 6.0]];
        let x = lower.solve_triangular(&b, UPLO::Lower).unwrap();
        assert_abs_diff_eq!(x, array![[1.0, 2.0], [2.0, 1.0]], epsilon = 1e-12);

        // transposed view reuses the lower factor as an upper one
        let y = lower.t().solve_triangular(&b, UPLO::Upper).unwrap();
        assert_abs_diff_eq!(lower.t().dot(&y), b, epsilon = 1e-12);
    }

    #[test]
    fn singular() {
        let a = array![[1.0, 0.0], [3.0, 0.0]];
        let b = array![[1.0], [1.0]];
        assert!(matches!(
            a.solve_triangular(&b, UPLO::Lower),
            Err(EigError::NonInvertible)
        ));
        let c = array![[1.0], [1.0], [1.0]];
        let a = array![[1.0, 0.0], [3.0, 1.0]];
        assert!(matches!(
            a.solve_triangular(&c, UPLO::Lower),
            Err(EigError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}
