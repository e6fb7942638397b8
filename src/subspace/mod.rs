//!
//! Subspace iteration computes a few eigenpairs at one end of the spectrum of the symmetric
//! generalized eigenproblem
//! ```text
//! K x = lambda M x
//! ```
//! where `K` is symmetric and `M` symmetric positive definite. A block of trial vectors is
//! repeatedly multiplied with `K^-1 M` (smallest eigenvalues) or `M^-1 K` (largest eigenvalues),
//! kept `M`-orthonormal, and rotated towards the Ritz vectors of the projected problem.
//!
//! * [`block_subspace`] iterates `p` vectors and returns the `k <= p` extreme eigenpairs.
//! * [`single_vector`] is the block size one variant without Rayleigh-Ritz projection.
//!
//! See also K.-J. Bathe, "Finite Element Procedures", chapter 11.6.
//!
mod block;
mod single;

use ndarray::prelude::*;

use crate::{
    backend::LinalgBackend, check_square, norm::Norm, triangular::UPLO, ConfigError, EigError,
    Operator, Order, Result, SubspaceConfig,
};

pub use block::block_subspace;
pub use single::single_vector;

/// The result of the eigensolver
///
/// In the best case the eigensolver has converged to within the configured tolerance and `Ok`
/// carries the eigenpairs. Otherwise the error is returned in `Err` together with the latest
/// eigenpairs, if at least one iteration completed. Non-convergence always comes with pairs,
/// while configuration, factorization and input errors never do.
pub type SubspaceResult<A> =
    std::result::Result<Eigenpairs<A>, (EigError, Option<Eigenpairs<A>>)>;

/// Eigenpairs found by subspace iteration, with diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenpairs<A> {
    /// Ritz values, ascending for [`Order::Smallest`] and descending for [`Order::Largest`]
    pub eigvals: Array1<A>,
    /// `M`-orthonormal Ritz vectors as columns
    pub eigvecs: Array2<A>,
    /// Relative residuals `|K x - lambda M x| / |lambda M x|`
    pub rnorm: Vec<A>,
    /// Per-eigenpair convergence flags
    pub converged: Vec<bool>,
    /// Number of completed iterations
    pub iterations: usize,
    /// All Ritz values of the block, one entry per iteration
    pub history: Vec<Array1<A>>,
}

impl<A> Eigenpairs<A> {
    /// Number of eigenpairs
    pub fn len(&self) -> usize {
        self.eigvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigvals.is_empty()
    }

    pub fn all_converged(&self) -> bool {
        self.converged.iter().all(|c| *c)
    }
}

/// Validates the configuration against the pencil
fn check_problem<A: NdFloat>(
    stiffness: ArrayView2<A>,
    mass: ArrayView2<A>,
    config: &SubspaceConfig,
) -> Result<()> {
    config.validate()?;
    for n in [check_square(&stiffness)?, check_square(&mass)?] {
        if n != config.dim {
            return Err(EigError::DimensionMismatch {
                expected: config.dim,
                actual: n,
            });
        }
    }
    Ok(())
}

/// The configured tolerance in the working precision
fn tolerance<A: NdFloat>(config: &SubspaceConfig) -> Result<A> {
    A::from(config.tol).ok_or_else(|| ConfigError::NonPositiveTolerance.into())
}

/// Factorizes the operator that is inverted in every step
///
/// `M` is always factorized first, as every solve relies on it being a valid inner product. For
/// the smallest eigenvalues the iteration solves with `K`, for the largest with `M`. The second
/// element of the pair is the operator applied to the block before the solve.
fn factorize_pencil<'a, A: NdFloat, B: LinalgBackend>(
    backend: &B,
    stiffness: ArrayView2<'a, A>,
    mass: ArrayView2<'a, A>,
    order: Order,
) -> Result<(Array2<A>, ArrayView2<'a, A>)> {
    let mass_factor = backend
        .factorize_spd(mass)
        .map_err(|err| factorization_error(err, Operator::Mass))?;

    match order {
        Order::Smallest => {
            let stiffness_factor = backend
                .factorize_spd(stiffness)
                .map_err(|err| factorization_error(err, Operator::Stiffness))?;
            Ok((stiffness_factor, mass))
        }
        Order::Largest => Ok((mass_factor, stiffness)),
    }
}

fn factorization_error(err: EigError, operator: Operator) -> EigError {
    match err {
        EigError::NotPositiveDefinite => EigError::Factorization { operator },
        err => err,
    }
}

/// Orthonormalize the columns of `y` in the `M` inner product
///
/// The Gram matrix `Y.t M Y = L L.t` is factorized and `X = Y L^-t` returned, so `X.t M X = I`.
fn m_orthonormalize<A: NdFloat, B: LinalgBackend>(
    backend: &B,
    mass: ArrayView2<A>,
    y: Array2<A>,
) -> Result<Array2<A>> {
    let my = backend.gemm(A::one(), mass, y.view());
    let gram = symmetrize(backend.gemm(A::one(), y.t(), my.view()));
    let l = backend
        .factorize_spd(gram.view())
        .map_err(|err| match err {
            EigError::NotPositiveDefinite => EigError::RankDeficient,
            err => err,
        })?;

    let x_t = backend.solve_triangular(l.view(), y.reversed_axes(), UPLO::Lower)?;
    Ok(x_t.reversed_axes())
}

fn symmetrize<A: NdFloat>(a: Array2<A>) -> Array2<A> {
    let half = A::one() / (A::one() + A::one());
    (&a + &a.t()) * half
}

/// Signs that make the largest-magnitude entry of every column positive
fn column_signs<A: NdFloat>(x: ArrayView2<A>) -> Array1<A> {
    x.columns()
        .into_iter()
        .map(|col| {
            let pivot = col
                .iter()
                .fold(A::zero(), |p, &v| if v.abs() > p.abs() { v } else { p });
            if pivot < A::zero() {
                -A::one()
            } else {
                A::one()
            }
        })
        .collect()
}

/// Relative residual `|K x - lambda M x| / |lambda M x|` per column, given `K X` and `M X`
fn relative_residuals<A: NdFloat>(
    kx: ArrayView2<A>,
    mx: ArrayView2<A>,
    lambda: ArrayView1<A>,
) -> Vec<A> {
    kx.columns()
        .into_iter()
        .zip(mx.columns())
        .zip(lambda.iter())
        .map(|((kx, mx), &lambda)| {
            let scaled = mx.mapv(|v| v * lambda);
            let residual = (&kx - &scaled).norm_l2();
            let denom = scaled.norm_l2();
            if denom > A::zero() {
                residual / denom
            } else {
                residual
            }
        })
        .collect()
}

/// Relative change of an eigenvalue estimate between two iterations
fn relative_change<A: NdFloat>(current: A, previous: A) -> A {
    let diff = (current - previous).abs();
    if current.is_zero() {
        diff
    } else {
        diff / current.abs()
    }
}
