//! Cholesky factorization and solves with symmetric positive definite matrices

use crate::{
    check_square,
    triangular::{IntoTriangular, SolveTriangular, UPLO},
    EigError, Result,
};

use ndarray::{Array2, ArrayBase, Data, DataMut, Ix2, NdFloat};

/// In-place Cholesky factorization `A = L L.t` of a symmetric positive definite matrix
///
/// Only the lower triangle of `A` is read. The `_dirty` variants leave the strict upper triangle
/// as it was, which is enough for solves that only read the lower factor.
pub trait CholeskyInplace {
    fn cholesky_inplace_dirty(&mut self) -> Result<&mut Self>;

    fn cholesky_into_dirty(mut self) -> Result<Self>
    where
        Self: Sized,
    {
        self.cholesky_inplace_dirty()?;
        Ok(self)
    }

    /// Overwrites `A` with `L`, zeroing the strict upper triangle
    fn cholesky_inplace(&mut self) -> Result<&mut Self>;

    fn cholesky_into(mut self) -> Result<Self>
    where
        Self: Sized,
    {
        self.cholesky_inplace()?;
        Ok(self)
    }
}

impl<A, S> CholeskyInplace for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: DataMut<Elem = A>,
{
    fn cholesky_inplace_dirty(&mut self) -> Result<&mut Self> {
        let dim = check_square(self)?;

        for col in 0..dim {
            let mut sq = A::zero();
            for k in 0..col {
                let mut dot = A::zero();
                for i in 0..k {
                    dot += self[(k, i)] * self[(col, i)];
                }
                let l = (self[(col, k)] - dot) / self[(k, k)];
                self[(col, k)] = l;
                sq += l * l;
            }
            let pivot = self[(col, col)] - sq;

            // a zero pivot would poison every later column with infinities
            if pivot <= A::zero() || !pivot.is_finite() {
                return Err(EigError::NotPositiveDefinite);
            }

            self[(col, col)] = pivot.sqrt();
        }
        Ok(self)
    }

    fn cholesky_inplace(&mut self) -> Result<&mut Self> {
        self.cholesky_inplace_dirty()?;
        self.triangular_inplace(UPLO::Lower)?;
        Ok(self)
    }
}

/// Cholesky factorization into a new matrix, leaving the input untouched
pub trait Cholesky {
    type Output;

    /// Lower factor with the input's strict upper triangle copied along
    fn cholesky_dirty(&self) -> Result<Self::Output>;

    /// Lower factor with zeros above the diagonal
    fn cholesky(&self) -> Result<Self::Output>;
}

impl<A, S> Cholesky for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: Data<Elem = A>,
{
    type Output = Array2<A>;

    fn cholesky_dirty(&self) -> Result<Self::Output> {
        self.to_owned().cholesky_into_dirty()
    }

    fn cholesky(&self) -> Result<Self::Output> {
        self.to_owned().cholesky_into()
    }
}

/// Solves `L L.t X = B` given the lower factor `L` held in `self`
pub trait SolveFactored<A> {
    fn solve_factored_inplace<'a, Sb: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<Sb, Ix2>,
    ) -> Result<&'a mut ArrayBase<Sb, Ix2>>;

    fn solve_factored_into<Sb: DataMut<Elem = A>>(
        &self,
        mut b: ArrayBase<Sb, Ix2>,
    ) -> Result<ArrayBase<Sb, Ix2>> {
        self.solve_factored_inplace(&mut b)?;
        Ok(b)
    }
}

impl<A, S> SolveFactored<A> for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: Data<Elem = A>,
{
    fn solve_factored_inplace<'a, Sb: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<Sb, Ix2>,
    ) -> Result<&'a mut ArrayBase<Sb, Ix2>> {
        self.solve_triangular_inplace(b, UPLO::Lower)?;
        self.t().solve_triangular_inplace(b, UPLO::Upper)?;
        Ok(b)
    }
}

/// Solve a positive definite linear system by factorizing the coefficient matrix
pub trait SolveC<A> {
    /// Solves `A X = B` in place, overwriting `A` with its factor and `B` with the solution.
    fn solvec_inplace<'a, Sb: DataMut<Elem = A>>(
        &mut self,
        b: &'a mut ArrayBase<Sb, Ix2>,
    ) -> Result<&'a mut ArrayBase<Sb, Ix2>>;

    fn solvec_into<Sb: DataMut<Elem = A>>(
        &mut self,
        mut b: ArrayBase<Sb, Ix2>,
    ) -> Result<ArrayBase<Sb, Ix2>> {
        self.solvec_inplace(&mut b)?;
        Ok(b)
    }

    fn solvec<Sb: Data<Elem = A>>(&mut self, b: &ArrayBase<Sb, Ix2>) -> Result<Array2<A>>;
}

impl<A, S> SolveC<A> for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: DataMut<Elem = A>,
{
    fn solvec_inplace<'a, Sb: DataMut<Elem = A>>(
        &mut self,
        b: &'a mut ArrayBase<Sb, Ix2>,
    ) -> Result<&'a mut ArrayBase<Sb, Ix2>> {
        let factor = self.cholesky_inplace_dirty()?;
        factor.solve_factored_inplace(b)
    }

    fn solvec<Sb: Data<Elem = A>>(&mut self, b: &ArrayBase<Sb, Ix2>) -> Result<Array2<A>> {
        self.solvec_into(b.to_owned())
    }
}
