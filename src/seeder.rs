//! Portable, reproducible pseudo-random numbers for seeding trial vectors
//!
//! The uniform generator is the Park-Miller "minimal standard" multiplicative congruential
//! generator `x' = 16807 x mod (2^31 - 1)`, evaluated with Schrage's factorization so the product
//! never overflows 32 bit signed arithmetic. Normal variates come from the Box-Muller transform.
//! Sequences are bit-identical on every platform for a given seed.

use std::f64::consts::PI;

use crate::config::ConfigError;

/// Modulus `2^31 - 1` of the generator
pub const MODULUS: u32 = 2_147_483_647;
const MULTIPLIER: i64 = 16_807;
const SCHRAGE_Q: i64 = 127_773; // MODULUS / MULTIPLIER
const SCHRAGE_R: i64 = 2_836; // MODULUS % MULTIPLIER

/// Advances the generator state by one step
///
/// Returns the uniform variate `next / MODULUS` in the open interval (0, 1) together with the next
/// state. The function is pure: the same state always gives the same pair. `state` has to lie in
/// `1..MODULUS`.
pub fn uniform_next(state: u32) -> (f64, u32) {
    let x = i64::from(state);
    let mut next = MULTIPLIER * (x % SCHRAGE_Q) - SCHRAGE_R * (x / SCHRAGE_Q);
    if next <= 0 {
        next += i64::from(MODULUS);
    }
    let next = next as u32;
    (f64::from(next) / f64::from(MODULUS), next)
}

/// Park-Miller generator with an explicit state value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkMiller {
    state: u32,
}

impl ParkMiller {
    /// Create a generator from a seed in `1..=2^31 - 2`
    pub fn new(seed: u32) -> Result<Self, ConfigError> {
        if seed == 0 || seed >= MODULUS {
            return Err(ConfigError::InvalidSeed { seed });
        }
        Ok(ParkMiller { state: seed })
    }

    /// Current state, which can be fed back into [`ParkMiller::new`] to resume the sequence
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Uniform variate in (0, 1)
    pub fn uniform(&mut self) -> f64 {
        let (u, next) = uniform_next(self.state);
        self.state = next;
        u
    }

    /// Normal variate with the given mean and standard deviation
    ///
    /// A negative `std_dev` is not rejected; it mirrors the distribution around the mean.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // the generator never yields exactly zero, so the logarithm is finite
        let u = self.uniform();
        let theta = 2.0 * PI * self.uniform();
        let r = (-2.0 * u.ln()).sqrt();
        r * theta.cos() * std_dev + mean
    }

    /// Fill a buffer with standard normal variates
    pub fn fill_normal(&mut self, buf: &mut [f64]) {
        for x in buf {
            *x = self.normal(0.0, 1.0);
        }
    }
}
