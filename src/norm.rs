//! Norms of vectors and blocks, plain and in the `M` inner product

use ndarray::{prelude::*, Data};

/// Define norm as a metric linear space, treating the whole array as one big vector.
pub trait Norm {
    type Output;

    /// L-2 norm
    fn norm_l2(&self) -> Self::Output;
    /// Maximum norm (L-infinite)
    fn norm_max(&self) -> Self::Output;
}

impl<A, S, D> Norm for ArrayBase<S, D>
where
    A: NdFloat,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = A;

    fn norm_l2(&self) -> Self::Output {
        self.fold(A::zero(), |acc, &x| acc + x * x).sqrt()
    }

    fn norm_max(&self) -> Self::Output {
        self.fold(A::zero(), |f, &val| val.abs().max(f))
    }
}

/// `x.t M x` for a single vector
pub fn m_inner<A, Sx, Sm>(x: &ArrayBase<Sx, Ix1>, m: &ArrayBase<Sm, Ix2>) -> A
where
    A: NdFloat,
    Sx: Data<Elem = A>,
    Sm: Data<Elem = A>,
{
    x.dot(&m.dot(x))
}

/// Largest absolute deviation of `X.t M X` from the identity
///
/// This is the loss of `M`-orthonormality of a block of column vectors.
pub fn m_orthogonality_defect<A, Sx, Sm>(x: &ArrayBase<Sx, Ix2>, m: &ArrayBase<Sm, Ix2>) -> A
where
    A: NdFloat,
    Sx: Data<Elem = A>,
    Sm: Data<Elem = A>,
{
    let gram = x.t().dot(&m.dot(x));
    let eye = Array2::<A>::eye(gram.nrows());
    (&gram - &eye).norm_max()
}
