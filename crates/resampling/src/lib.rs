//! # Resampling Engine
//!
//! Monte Carlo resampling of a trade/equity record. Two interchangeable
//! methods build an empirical distribution of performance metrics:
//!
//! - **Trade shuffle**: a pure permutation test. Each run reorders the
//!   trade P&L uniformly at random (without replacement) and rebuilds the
//!   equity path, so the resampled trade *set* (and its total P&L) is
//!   identical to the original; only the ordering differs.
//! - **Block bootstrap**: draws overlapping blocks of returns with
//!   replacement, preserving the local autocorrelation structure that a
//!   plain shuffle destroys.
//!
//! ## Reproducibility
//!
//! Every run derives its own sub-seed from `(seed, run_index)` and seeds a
//! fresh `ChaCha8Rng`, so results are byte-identical no matter how many
//! worker threads execute the runs or in which order they finish.

pub mod distribution;
pub mod engine;
pub mod error;

pub use distribution::{DistributionStats, MonteCarloDistribution, MonteCarloRunResult};
pub use engine::{
    derive_run_seed, shuffled_indices, ResampleConfig, ResampleMethod, ResamplingEngine,
};
pub use error::ResamplingError;
