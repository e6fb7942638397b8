//! Block subspace iteration for the symmetric generalized eigenproblem
//!
//! ```text
//! K x = lambda M x
//! ```
//!
//! where `K` (stiffness) and `M` (mass) are dense symmetric matrices and `M` is positive
//! definite. The solvers compute a few eigenpairs at one end of the spectrum by iterating a block
//! of trial vectors against the pencil and projecting with Rayleigh-Ritz every step.
//!
//! The dense kernels (Cholesky, triangular solves, small symmetric eigendecomposition) live in
//! their own modules and are reached by the solvers only through the
//! [`LinalgBackend`](backend::LinalgBackend) trait.

pub mod backend;
pub mod bench;
pub mod cholesky;
pub mod config;
pub mod eigh;
pub mod io;
pub mod norm;
pub mod pencil;
pub mod seeder;
pub mod subspace;
pub mod timer;
pub mod triangular;

use std::fmt;

use ndarray::{ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{ConfigError, SubspaceConfig};
pub use io::InputError;
pub use pencil::Pencil;
pub use subspace::{block_subspace, single_vector, Eigenpairs, SubspaceResult};

/// One of the two operators of the pencil `(K, M)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Stiffness,
    Mass,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Stiffness => write!(f, "stiffness"),
            Operator::Mass => write!(f, "mass"),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EigError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Matrix with {rows} rows and {cols} cols is not square")]
    NotSquare { rows: usize, cols: usize },
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,
    #[error("Factorization failed: the {operator} matrix is not positive definite")]
    Factorization { operator: Operator },
    #[error("Triangular matrix has a zero on its diagonal")]
    NonInvertible,
    #[error("Trial vectors became linearly dependent")]
    RankDeficient,
    #[error(
        "Not converged after {iterations} iterations ({converged} of {requested} eigenpairs converged)"
    )]
    NotConverged {
        iterations: usize,
        converged: usize,
        requested: usize,
    },
    #[error("Malformed matrix input: {0}")]
    Input(#[from] InputError),
}

pub type Result<T> = std::result::Result<T, EigError>;

/// Which end of the spectrum to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    Largest,
    Smallest,
}

impl Default for Order {
    fn default() -> Self {
        Order::Smallest
    }
}

/// Returns the dimension of a square matrix
pub(crate) fn check_square<S: Data>(arr: &ArrayBase<S, Ix2>) -> Result<usize> {
    let (rows, cols) = arr.dim();
    if rows != cols {
        Err(EigError::NotSquare { rows, cols })
    } else {
        Ok(rows)
    }
}
