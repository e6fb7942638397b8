//! Matrix pencils `(K, M)` and generators for test and benchmark problems

use std::f64::consts::PI;

use ndarray::prelude::*;
use rand::distributions::Standard;
use rand::prelude::*;

use crate::{check_square, io::InputError, EigError, Operator, Result};

/// Relative tolerance for accepting a matrix as symmetric
const SYMMETRY_TOL: f64 = 1e-10;

/// Generate random array
pub(crate) fn random<A, Sh, D, R: Rng>(sh: Sh, mut rng: R) -> Array<A, D>
where
    A: NdFloat,
    D: Dimension,
    Sh: ShapeBuilder<Dim = D>,
    Standard: Distribution<A>,
{
    ArrayBase::from_shape_fn(sh, |_| rng.gen::<A>())
}

/// The stiffness and mass matrices of a generalized eigenproblem
#[derive(Debug, Clone, PartialEq)]
pub struct Pencil {
    pub stiffness: Array2<f64>,
    pub mass: Array2<f64>,
}

impl Pencil {
    /// Pair two matrices, checking that both are square, of equal size and symmetric
    pub fn new(stiffness: Array2<f64>, mass: Array2<f64>) -> Result<Self> {
        let n = check_square(&stiffness)?;
        let nm = check_square(&mass)?;
        if n != nm {
            return Err(EigError::DimensionMismatch {
                expected: n,
                actual: nm,
            });
        }
        check_symmetric(&stiffness, Operator::Stiffness)?;
        check_symmetric(&mass, Operator::Mass)?;

        Ok(Pencil { stiffness, mass })
    }

    pub fn dim(&self) -> usize {
        self.stiffness.nrows()
    }

    /// Fixed-fixed elastic bar of unit length discretized with `n` interior nodes of linear
    /// elements, with consistent mass
    ///
    /// `K = (1/h) tridiag(-1, 2, -1)` and `M = (h/6) tridiag(1, 4, 1)` with `h = 1/(n+1)`.
    /// See [`Pencil::bar_eigenvalue`] for the exact spectrum.
    pub fn bar(n: usize) -> Self {
        let h = 1.0 / (n as f64 + 1.0);
        let mut stiffness = Array2::zeros((n, n));
        let mut mass = Array2::zeros((n, n));
        for i in 0..n {
            stiffness[(i, i)] = 2.0 / h;
            mass[(i, i)] = 4.0 * h / 6.0;
            if i + 1 < n {
                stiffness[(i, i + 1)] = -1.0 / h;
                stiffness[(i + 1, i)] = -1.0 / h;
                mass[(i, i + 1)] = h / 6.0;
                mass[(i + 1, i)] = h / 6.0;
            }
        }
        Pencil { stiffness, mass }
    }

    /// The `j`-th (1-based, ascending) eigenvalue of [`Pencil::bar`] with `n` nodes
    pub fn bar_eigenvalue(n: usize, j: usize) -> f64 {
        let h = 1.0 / (n as f64 + 1.0);
        let theta = j as f64 * PI / (n as f64 + 1.0);
        6.0 / (h * h) * (1.0 - theta.cos()) / (2.0 + theta.cos())
    }

    /// Random positive definite pencil, `K = A.t A + diag(1, 2, .., n)` and `M = B.t B / n + I`
    ///
    /// The diagonal shift spreads the spectrum over roughly `[1, n]`, so subspace iteration sees
    /// gaps comparable to a discretized structure instead of a cluster around `n`.
    pub fn random<R: Rng>(n: usize, mut rng: R) -> Self {
        let a: Array2<f64> = random((n, n), &mut rng) - 0.5;
        let b: Array2<f64> = random((n, n), &mut rng) - 0.5;
        let eye = Array2::<f64>::eye(n);
        let ramp = Array1::from_shape_fn(n, |i| (i + 1) as f64);

        let stiffness = a.t().dot(&a) + Array2::from_diag(&ramp);
        let mass = b.t().dot(&b) / n.max(1) as f64 + &eye;
        Pencil {
            stiffness: symmetrize(stiffness),
            mass: symmetrize(mass),
        }
    }
}

fn symmetrize(a: Array2<f64>) -> Array2<f64> {
    (&a + &a.t()) * 0.5
}

fn check_symmetric(a: &Array2<f64>, operator: Operator) -> Result<()> {
    let scale = a.iter().fold(0.0f64, |m, x| m.max(x.abs())).max(f64::MIN_POSITIVE);
    let n = a.nrows();
    for i in 0..n {
        for j in 0..i {
            if (a[(i, j)] - a[(j, i)]).abs() > SYMMETRY_TOL * scale {
                return Err(InputError::NotSymmetric { operator }.into());
            }
        }
    }
    Ok(())
}
