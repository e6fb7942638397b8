//! Eigendecomposition of small symmetric matrices
//!
//! The reduced problems produced by Rayleigh-Ritz projection are only a handful of rows wide, so
//! the decomposition uses cyclic Jacobi rotations: every sweep annihilates each off-diagonal entry
//! once, and the accumulated rotations form the eigenvectors. Accuracy is on the order of machine
//! precision relative to the matrix norm, including for clustered eigenvalues.

use crate::{
    check_square,
    cholesky::Cholesky,
    triangular::{SolveTriangular, UPLO},
    Order, Result,
};

use ndarray::{Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix2, NdFloat};

const MAX_SWEEPS: usize = 64;

/// Jacobi eigenvalue iteration on a symmetric matrix, destroying its content
///
/// Only the values converge on the diagonal of `matrix`, the eigenvectors are accumulated in the
/// returned matrix if requested.
fn symmetric_eig<A: NdFloat, S: DataMut<Elem = A>>(
    matrix: &mut ArrayBase<S, Ix2>,
    eigenvectors: bool,
) -> Result<(Array1<A>, Option<Array2<A>>)> {
    let dim = check_square(matrix)?;
    let mut vecs = if eigenvectors {
        Some(Array2::eye(dim))
    } else {
        None
    };

    let two = A::one() + A::one();
    let eps = A::epsilon();

    for _ in 0..MAX_SWEEPS {
        let (off, total) = off_diagonal_weight(matrix);
        if off <= eps * eps * total {
            break;
        }

        for p in 0..dim {
            for q in p + 1..dim {
                let apq = matrix[(p, q)];
                if apq.is_zero() {
                    continue;
                }
                let theta = (matrix[(q, q)] - matrix[(p, p)]) / (two * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + A::one()).sqrt());
                let c = (t * t + A::one()).sqrt().recip();
                let s = t * c;

                rotate(matrix.view_mut().reversed_axes(), p, q, c, s);
                rotate(matrix.view_mut(), p, q, c, s);
                if let Some(vecs) = vecs.as_mut() {
                    rotate(vecs.view_mut(), p, q, c, s);
                }
            }
        }
    }

    Ok((matrix.diag().to_owned(), vecs))
}

/// Applies the plane rotation `(c, s)` to columns `p` and `q`
fn rotate<A: NdFloat>(mut mat: ndarray::ArrayViewMut2<A>, p: usize, q: usize, c: A, s: A) {
    for k in 0..mat.nrows() {
        let kp = mat[(k, p)];
        let kq = mat[(k, q)];
        mat[(k, p)] = c * kp - s * kq;
        mat[(k, q)] = s * kp + c * kq;
    }
}

/// Squared Frobenius weight of the off-diagonal part and of the whole matrix
fn off_diagonal_weight<A: NdFloat, S: Data<Elem = A>>(matrix: &ArrayBase<S, Ix2>) -> (A, A) {
    matrix
        .indexed_iter()
        .fold((A::zero(), A::zero()), |(off, total), ((i, j), &x)| {
            if i == j {
                (off, total + x * x)
            } else {
                (off + x * x, total + x * x)
            }
        })
}

/// Eigendecomposition of symmetric matrices
pub trait EighInto: Sized {
    type EigVal;
    type EigVec;

    /// Calculate eigenvalues and eigenvectors of symmetric matrices, consuming the original
    fn eigh_into(self) -> Result<(Self::EigVal, Self::EigVec)>;
}

impl<A: NdFloat, S: DataMut<Elem = A>> EighInto for ArrayBase<S, Ix2> {
    type EigVal = Array1<A>;
    type EigVec = Array2<A>;

    fn eigh_into(mut self) -> Result<(Self::EigVal, Self::EigVec)> {
        let (val, vecs) = symmetric_eig(&mut self, true)?;
        // eigenvectors were requested
        Ok((val, vecs.unwrap_or_else(|| Array2::zeros((0, 0)))))
    }
}

/// Eigendecomposition of symmetric matrices
pub trait Eigh {
    type EigVal;
    type EigVec;

    /// Calculate eigenvalues and eigenvectors of symmetric matrices
    fn eigh(&self) -> Result<(Self::EigVal, Self::EigVec)>;
}

impl<A: NdFloat, S: Data<Elem = A>> Eigh for ArrayBase<S, Ix2> {
    type EigVal = Array1<A>;
    type EigVec = Array2<A>;

    fn eigh(&self) -> Result<(Self::EigVal, Self::EigVec)> {
        self.to_owned().eigh_into()
    }
}

/// Eigenvalues of symmetric matrices
pub trait EigValsh {
    type EigVal;

    /// Calculate eigenvalues of symmetric matrices without eigenvectors
    fn eigvalsh(&self) -> Result<Self::EigVal>;
}

impl<A: NdFloat, S: Data<Elem = A>> EigValsh for ArrayBase<S, Ix2> {
    type EigVal = Array1<A>;

    fn eigvalsh(&self) -> Result<Self::EigVal> {
        let mut arr = self.to_owned();
        symmetric_eig(&mut arr, false).map(|(vals, _)| vals)
    }
}

/// Sorting of eigendecomposition by the eigenvalues
pub trait EigSort: Sized {
    /// Sort eigenvalues, and the eigenvector columns with them, in the given order.
    ///
    /// The sort is stable: equal eigenvalues keep their original column order.
    fn sort_eig(self, order: Order) -> Self;

    /// Sort the eigendecomposition so the eigenvalues are in ascending order
    fn sort_eig_asc(self) -> Self {
        self.sort_eig(Order::Smallest)
    }

    /// Sort the eigendecomposition so the eigenvalues are in descending order
    fn sort_eig_desc(self) -> Self {
        self.sort_eig(Order::Largest)
    }
}

impl<A: NdFloat> EigSort for (Array1<A>, Array2<A>) {
    fn sort_eig(self, order: Order) -> Self {
        let (vals, vecs) = self;
        let mut indices: Vec<usize> = (0..vals.len()).collect();
        indices.sort_by(|&a, &b| {
            let cmp = vals[a]
                .partial_cmp(&vals[b])
                .unwrap_or(std::cmp::Ordering::Equal);
            match order {
                Order::Smallest => cmp,
                Order::Largest => cmp.reverse(),
            }
        });

        (vals.select(Axis(0), &indices), vecs.select(Axis(1), &indices))
    }
}

/// Solve the symmetric-definite generalized eigenproblem `A Z = B Z Lambda`
///
/// `B` is reduced with its Cholesky factor `B = L L.t`, the standard problem
/// `L^-1 A L^-t W = W Lambda` is solved, and `Z = L^-t W` is returned. The eigenvectors come out
/// `B`-orthonormal (`Z.t B Z = I`) and the pairs are sorted ascending.
pub fn generalized_eigh<A, Sa, Sb>(
    a: &ArrayBase<Sa, Ix2>,
    b: &ArrayBase<Sb, Ix2>,
) -> Result<(Array1<A>, Array2<A>)>
where
    A: NdFloat,
    Sa: Data<Elem = A>,
    Sb: Data<Elem = A>,
{
    let n = check_square(a)?;
    if check_square(b)? != n {
        return Err(crate::EigError::DimensionMismatch {
            expected: n,
            actual: b.nrows(),
        });
    }

    let l = b.cholesky()?;
    // (L^-1 A).t = A L^-t for symmetric A
    let la = l.solve_triangular(a, UPLO::Lower)?;
    let c = l.solve_triangular_into(la.reversed_axes(), UPLO::Lower)?;
    let half = A::one() / (A::one() + A::one());
    let c = (&c + &c.t()) * half;

    let (vals, w) = c.eigh_into()?;
    let z = l.t().solve_triangular_into(w, UPLO::Upper)?;

    Ok((vals, z).sort_eig_asc())
}
