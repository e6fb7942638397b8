//! Dense linear algebra primitives used by the solvers
//!
//! The subspace solvers never touch a factorization kernel directly. They go through
//! [`LinalgBackend`], which bundles the four primitives the iteration needs: Cholesky
//! factorization of a symmetric positive definite matrix, triangular solves against such a factor,
//! the small symmetric-definite generalized eigenproblem, and matrix-matrix products. Backends are
//! selected statically through the solvers' type parameter.

use std::fmt::Debug;

use ndarray::{linalg::general_mat_mul, Array1, Array2, ArrayView2, NdFloat};

use crate::{
    cholesky::{Cholesky, SolveFactored},
    eigh::generalized_eigh,
    triangular::{SolveTriangular, UPLO},
    Result,
};

/// Dense primitives required by subspace iteration
pub trait LinalgBackend: Debug {
    /// Short name used in logs and benchmark reports
    fn name(&self) -> &'static str;

    /// Lower Cholesky factor `L` of a symmetric positive definite `a = L L.t`
    fn factorize_spd<A: NdFloat>(&self, a: ArrayView2<A>) -> Result<Array2<A>>;

    /// Solve `T X = B` where `T` is triangular, overwriting `B`
    fn solve_triangular<A: NdFloat>(
        &self,
        t: ArrayView2<A>,
        b: Array2<A>,
        uplo: UPLO,
    ) -> Result<Array2<A>>;

    /// Solve `L L.t X = B` with the factor returned by [`LinalgBackend::factorize_spd`]
    fn solve_factored<A: NdFloat>(&self, l: ArrayView2<A>, b: Array2<A>) -> Result<Array2<A>> {
        let y = self.solve_triangular(l, b, UPLO::Lower)?;
        self.solve_triangular(l.reversed_axes(), y, UPLO::Upper)
    }

    /// Eigenpairs of `a Z = b Z Lambda` for symmetric `a` and symmetric positive definite `b`,
    /// ascending, with `b`-orthonormal eigenvectors
    fn eigh_generalized<A: NdFloat>(
        &self,
        a: ArrayView2<A>,
        b: ArrayView2<A>,
    ) -> Result<(Array1<A>, Array2<A>)>;

    /// `alpha * a * b`
    fn gemm<A: NdFloat>(&self, alpha: A, a: ArrayView2<A>, b: ArrayView2<A>) -> Array2<A>;
}

/// Pure Rust backend built on this crate's kernels and `ndarray`'s matrix product
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl LinalgBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn factorize_spd<A: NdFloat>(&self, a: ArrayView2<A>) -> Result<Array2<A>> {
        a.cholesky()
    }

    fn solve_triangular<A: NdFloat>(
        &self,
        t: ArrayView2<A>,
        b: Array2<A>,
        uplo: UPLO,
    ) -> Result<Array2<A>> {
        t.solve_triangular_into(b, uplo)
    }

    fn solve_factored<A: NdFloat>(&self, l: ArrayView2<A>, b: Array2<A>) -> Result<Array2<A>> {
        l.solve_factored_into(b)
    }

    fn eigh_generalized<A: NdFloat>(
        &self,
        a: ArrayView2<A>,
        b: ArrayView2<A>,
    ) -> Result<(Array1<A>, Array2<A>)> {
        generalized_eigh(&a, &b)
    }

    fn gemm<A: NdFloat>(&self, alpha: A, a: ArrayView2<A>, b: ArrayView2<A>) -> Array2<A> {
        let mut c = Array2::zeros((a.nrows(), b.ncols()));
        general_mat_mul(alpha, &a, &b, A::zero(), &mut c);
        c
    }
}

/// Backend linked into this build
pub type DefaultBackend = NativeBackend;
