use log::{debug, warn};
use ndarray::prelude::*;

use crate::{backend::LinalgBackend, EigError, SubspaceConfig};

use super::{
    check_problem, column_signs, factorize_pencil, m_orthonormalize, relative_change,
    relative_residuals, tolerance, Eigenpairs, SubspaceResult,
};

/// Subspace iteration with a single trial vector
///
/// Starting from `x0`, each step solves `K y = M x` (smallest eigenvalue) or `M y = K x` (largest
/// eigenvalue, see [`SubspaceConfig::order`]), scales `y` to `y.t M y = 1` and takes the Rayleigh
/// quotient `lambda = y.t K y`. The iteration stops once `|lambda - lambda_old| / |lambda|` drops
/// below the tolerance; `lambda_old` starts as the Rayleigh quotient of `x0`.
///
/// Only `dim`, `tol`, `maxiter` and `order` of the configuration are used. The result holds one
/// eigenpair; after `maxiter` steps it is returned with [`EigError::NotConverged`]. A zero start
/// vector fails with [`EigError::RankDeficient`].
pub fn single_vector<'k, 'm, A, B>(
    backend: &B,
    stiffness: ArrayView2<'k, A>,
    mass: ArrayView2<'m, A>,
    x0: ArrayView1<A>,
    config: &SubspaceConfig,
) -> SubspaceResult<A>
where
    A: NdFloat,
    B: LinalgBackend,
{
    if let Err(err) = check_problem(stiffness, mass, config) {
        return Err((err, None));
    }
    if x0.len() != config.dim {
        return Err((
            EigError::DimensionMismatch {
                expected: config.dim,
                actual: x0.len(),
            },
            None,
        ));
    }
    let tol = tolerance(config).map_err(|err| (err, None))?;

    let (factor, apply) =
        factorize_pencil(backend, stiffness.reborrow(), mass.reborrow(), config.order)
            .map_err(|err| (err, None))?;

    let mut x = m_orthonormalize(backend, mass, x0.insert_axis(Axis(1)).to_owned())
        .map_err(|err| (err, None))?;
    let mut lambda = rayleigh_quotient(stiffness, x.view());

    let mut history = Vec::new();
    let mut iter = 0;

    let outcome = loop {
        let rhs = backend.gemm(A::one(), apply, x.view());
        let y = match backend.solve_factored(factor.view(), rhs) {
            Ok(y) => y,
            Err(err) => break Err(err),
        };
        let y = match m_orthonormalize(backend, mass, y) {
            Ok(y) => y,
            Err(err) => break Err(err),
        };

        let previous = lambda;
        lambda = rayleigh_quotient(stiffness, y.view());
        x = y;
        iter += 1;
        history.push(arr1(&[lambda]));

        let change = relative_change(lambda, previous);
        debug!("iteration {}: rayleigh quotient {}, change {:e}", iter, lambda, change);

        if change < tol {
            break Ok(());
        }
        if iter >= config.maxiter {
            warn!("single vector iteration stopped after {} iterations", iter);
            break Err(EigError::NotConverged {
                iterations: iter,
                converged: 0,
                requested: 1,
            });
        }
    };

    let signs = column_signs(x.view());
    x *= &signs;
    let kx = backend.gemm(A::one(), stiffness, x.view());
    let mx = backend.gemm(A::one(), mass, x.view());
    let eigvals = arr1(&[lambda]);
    let rnorm = relative_residuals(kx.view(), mx.view(), eigvals.view());

    let result = Eigenpairs {
        eigvals,
        eigvecs: x,
        rnorm,
        converged: vec![outcome.is_ok()],
        iterations: iter,
        history,
    };

    match outcome {
        Ok(()) => Ok(result),
        // a failed first step leaves nothing but the start vector
        Err(err) if iter == 0 => Err((err, None)),
        Err(err) => Err((err, Some(result))),
    }
}

/// `x.t K x` for an `M`-normalized column `x`
fn rayleigh_quotient<A: NdFloat>(stiffness: ArrayView2<A>, x: ArrayView2<A>) -> A {
    let x = x.column(0);
    x.dot(&stiffness.dot(&x))
}
