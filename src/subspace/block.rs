use log::{debug, info, warn};
use ndarray::prelude::*;

use crate::{
    backend::LinalgBackend,
    eigh::EigSort,
    seeder::ParkMiller,
    EigError, Order, SubspaceConfig,
};

use super::{
    check_problem, column_signs, factorize_pencil, m_orthonormalize, relative_change,
    relative_residuals, symmetrize, tolerance, Eigenpairs, SubspaceResult,
};

/// Number of consecutive iterations an eigenvalue has to stay within tolerance
const STABLE_ITERATIONS: usize = 2;

/// Block subspace iteration for the symmetric generalized eigenproblem `K x = lambda M x`
///
/// # Arguments
/// * `backend` - Dense linear algebra primitives, see [`LinalgBackend`]
/// * `stiffness` - Symmetric matrix `K`, positive definite when computing the smallest eigenpairs
/// * `mass` - Symmetric positive definite matrix `M`
/// * `config` - Dimension, block size `p`, number of eigenpairs `k`, tolerance, iteration limit,
/// seed and which end of the spectrum to compute
///
/// The initial block of `p` vectors is filled with normal variates from the seeded
/// [`ParkMiller`] generator, so the result is reproducible for a given seed. Every iteration
/// 1. solves `K Y = M X` (or `M Y = K X` for the largest eigenvalues) against a factorization
///    computed once before the loop,
/// 2. `M`-orthonormalizes `Y`,
/// 3. projects the pencil onto the block,
/// 4. solves the projected `p x p` problem and sorts its eigenvalues with a stable sort,
/// 5. rotates the block onto the Ritz vectors.
///
/// An eigenvalue counts as converged once its relative change stayed below `tol` for two
/// consecutive iterations and its relative residual `|K x - lambda M x| / |lambda M x|` is below
/// `tol`. The solve stops when the first `k` eigenvalues have converged.
///
/// For [`Order::Smallest`] the iteration solves against a Cholesky factor of `K`, so `K` has to be
/// positive definite as well. A semidefinite `K`, such as the stiffness of an unsupported
/// structure with rigid-body modes, fails with `Factorization { operator: Stiffness }`; shift it
/// (`K + sigma M`) or ask for [`Order::Largest`], which only factorizes `M`.
///
/// If the iteration limit is hit first, `Err` carries [`EigError::NotConverged`] together with the
/// latest eigenpairs. Configuration errors and failed factorizations of `K` or `M` are reported
/// before iterating, without eigenpairs.
pub fn block_subspace<'k, 'm, A, B>(
    backend: &B,
    stiffness: ArrayView2<'k, A>,
    mass: ArrayView2<'m, A>,
    config: &SubspaceConfig,
) -> SubspaceResult<A>
where
    A: NdFloat,
    B: LinalgBackend,
{
    if let Err(err) = check_problem(stiffness, mass, config) {
        return Err((err, None));
    }
    let (n, size_x, nev) = (config.dim, config.block_size, config.nev);
    let tol = tolerance(config).map_err(|err| (err, None))?;

    let (factor, apply) =
        factorize_pencil(backend, stiffness.reborrow(), mass.reborrow(), config.order)
            .map_err(|err| (err, None))?;

    // random initial block, drawn column by column
    let mut rng = ParkMiller::new(config.seed).map_err(|err| (EigError::from(err), None))?;
    let mut draws = vec![0.0f64; n * size_x];
    rng.fill_normal(&mut draws);
    let x = Array2::from_shape_vec((n, size_x).f(), draws)
        .map_err(|_| {
            (
                EigError::DimensionMismatch {
                    expected: n * size_x,
                    actual: 0,
                },
                None,
            )
        })?
        .mapv(|v| A::from(v).unwrap_or_else(A::zero));

    let mut x = m_orthonormalize(backend, mass, x).map_err(|err| (err, None))?;

    let one = A::one();
    let mut previous: Option<Array1<A>> = None;
    let mut stable = vec![0usize; nev];
    let mut converged = vec![false; nev];
    let mut history = Vec::new();
    let mut latest: Option<(Array1<A>, Vec<A>)> = None;
    let mut iter = 0;

    let outcome = loop {
        // inverse (or direct) iteration step on the whole block
        let rhs = backend.gemm(one, apply, x.view());
        let y = match backend.solve_factored(factor.view(), rhs) {
            Ok(y) => y,
            Err(err) => break Err(err),
        };
        let xo = match m_orthonormalize(backend, mass, y) {
            Ok(xo) => xo,
            Err(err) => break Err(err),
        };

        // Rayleigh-Ritz on span(X)
        let kx = backend.gemm(one, stiffness, xo.view());
        let mx = backend.gemm(one, mass, xo.view());
        let k_r = symmetrize(backend.gemm(one, xo.t(), kx.view()));
        let m_r = symmetrize(backend.gemm(one, xo.t(), mx.view()));

        let (lambda, z) = match backend.eigh_generalized(k_r.view(), m_r.view()) {
            Ok(eig) => eig.sort_eig(config.order),
            Err(err) => break Err(err),
        };

        let mut ritz = backend.gemm(one, xo.view(), z.view());
        let mut kz = backend.gemm(one, kx.view(), z.view());
        let mut mz = backend.gemm(one, mx.view(), z.view());
        let signs = column_signs(ritz.view());
        ritz *= &signs;
        kz *= &signs;
        mz *= &signs;
        x = ritz;
        iter += 1;

        let rnorm = relative_residuals(kz.view(), mz.view(), lambda.view());

        for i in 0..nev {
            let within = previous
                .as_ref()
                .map(|prev| relative_change(lambda[i], prev[i]) < tol)
                .unwrap_or(false);
            stable[i] = if within { stable[i] + 1 } else { 0 };
            converged[i] = stable[i] >= STABLE_ITERATIONS && rnorm[i] < tol;
        }
        let num_converged = converged.iter().filter(|c| **c).count();

        debug!(
            "iteration {}: ritz values {}, {}/{} converged",
            iter, lambda, num_converged, nev
        );

        history.push(lambda.clone());
        previous = Some(lambda.clone());
        latest = Some((lambda, rnorm));

        if num_converged == nev {
            info!("subspace iteration converged after {} iterations", iter);
            break Ok(());
        }
        if iter >= config.maxiter {
            warn!(
                "subspace iteration stopped after {} iterations with {}/{} eigenpairs converged",
                iter, num_converged, nev
            );
            break Err(EigError::NotConverged {
                iterations: iter,
                converged: num_converged,
                requested: nev,
            });
        }
    };

    let result = latest.map(|(lambda, rnorm)| Eigenpairs {
        eigvals: lambda.slice_move(s![..nev]),
        eigvecs: x.slice_move(s![.., ..nev]),
        rnorm: rnorm[..nev].to_vec(),
        converged,
        iterations: iter,
        history,
    });

    match (outcome, result) {
        (Ok(()), Some(result)) => Ok(result),
        (Ok(()), None) => Err((
            EigError::NotConverged {
                iterations: iter,
                converged: 0,
                requested: nev,
            },
            None,
        )),
        (Err(err), result) => Err((err, result)),
    }
}
