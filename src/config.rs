//! Parameters of a subspace iteration solve

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{seeder::MODULUS, Order};

/// Rejected solver parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("problem dimension must be positive")]
    ZeroDimension,
    #[error("at least one eigenpair has to be requested")]
    NoEigenpairs,
    #[error("block size {block_size} is smaller than the {nev} requested eigenpairs")]
    BlockTooSmall { block_size: usize, nev: usize },
    #[error("block size {block_size} exceeds the problem dimension {dim}")]
    BlockTooLarge { block_size: usize, dim: usize },
    #[error("tolerance must be positive and finite")]
    NonPositiveTolerance,
    #[error("the iteration limit must be positive")]
    ZeroIterations,
    #[error("seed {seed} is outside of 1..{}", MODULUS)]
    InvalidSeed { seed: u32 },
}

/// Configuration of a subspace iteration solve
///
/// Created once before solving and never changed by the solver. Defaults follow the usual
/// subspace iteration practice of carrying `min(2 nev, nev + 8)` trial vectors.
///
/// # Example
///
/// ```rust
/// use subspace_eig::{Order, SubspaceConfig};
///
/// let config = SubspaceConfig::new(100, 4)
///     .block_size(8)
///     .precision(1e-10)
///     .maxiter(200)
///     .seed(7)
///     .order(Order::Smallest);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubspaceConfig {
    /// Dimension `n` of the pencil
    pub dim: usize,
    /// Number `p` of trial vectors iterated together
    pub block_size: usize,
    /// Number `k` of requested eigenpairs
    pub nev: usize,
    /// Relative tolerance on eigenvalue change and residual
    pub tol: f64,
    /// Iteration limit
    pub maxiter: usize,
    /// Seed of the generator filling the initial block
    pub seed: u32,
    /// End of the spectrum to compute
    pub order: Order,
}

impl SubspaceConfig {
    /// Create a configuration for `nev` eigenpairs of a pencil of dimension `dim`
    pub fn new(dim: usize, nev: usize) -> Self {
        SubspaceConfig {
            dim,
            block_size: default_block_size(dim, nev),
            nev,
            tol: 1e-8,
            maxiter: 100,
            seed: 42,
            order: Order::Smallest,
        }
    }

    /// Set the number of trial vectors
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the convergence tolerance
    pub fn precision(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the iteration limit
    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the seed of the starting block
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Set which end of the spectrum is computed
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Check the parameters for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dim == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.nev == 0 {
            return Err(ConfigError::NoEigenpairs);
        }
        if self.block_size < self.nev {
            return Err(ConfigError::BlockTooSmall {
                block_size: self.block_size,
                nev: self.nev,
            });
        }
        if self.block_size > self.dim {
            return Err(ConfigError::BlockTooLarge {
                block_size: self.block_size,
                dim: self.dim,
            });
        }
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(ConfigError::NonPositiveTolerance);
        }
        if self.maxiter == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.seed == 0 || self.seed >= MODULUS {
            return Err(ConfigError::InvalidSeed { seed: self.seed });
        }
        Ok(())
    }
}

fn default_block_size(dim: usize, nev: usize) -> usize {
    usize::min(dim, usize::min(2 * nev, nev + 8)).max(nev)
}
