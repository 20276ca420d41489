use std::sync::atomic::{AtomicBool, Ordering};

use analytics::MetricsEngine;
use core_types::{EquitySeries, ResolvedInput};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distribution::{MonteCarloDistribution, MonteCarloRunResult};
use crate::error::ResamplingError;

/// The two interchangeable resampling strategies.
///
/// Serde renames keep the wire names aligned with the input contract, so an
/// unrecognized method string is rejected at the deserialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    TradeShuffle,
    BlockBootstrap,
}

/// Configuration for a Monte Carlo run set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleConfig {
    /// Number of independent resampled paths.
    pub runs: usize,
    /// Block length for the block bootstrap. 10-20 is a balanced default:
    /// smaller blocks randomize more, larger blocks preserve more structure.
    pub block_size: usize,
    /// Master seed; every run derives its own sub-seed from it.
    pub seed: u64,
    /// Starting capital for synthetic equity paths rebuilt from trade P&L.
    pub initial_capital: f64,
    /// Worker threads for the run loop. `None` or <= 1 means sequential;
    /// correctness never depends on parallelism being available.
    pub workers: Option<usize>,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            runs: 1000,
            block_size: 10,
            seed: 0,
            initial_capital: 10_000.0,
            workers: None,
        }
    }
}

impl ResampleConfig {
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}

/// Derives the sub-seed for one run from the master seed.
///
/// A splitmix64-style finalizer over `seed ^ (run * golden ratio)`. Each
/// run's RNG stream depends only on `(seed, run_index)`, never on which
/// worker picked the run up or how far another run's RNG has advanced.
pub fn derive_run_seed(seed: u64, run_index: u64) -> u64 {
    let mut z = seed ^ run_index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The uniform random permutation of `0..n` used by trade-shuffle run
/// `run_index`.
///
/// Public so the leverageability tester can replay the exact paths this
/// engine generated instead of regenerating different ones.
pub fn shuffled_indices(n: usize, seed: u64, run_index: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(derive_run_seed(seed, run_index));
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);
    indices
}

/// Builds empirical metric distributions by resampling the input record.
#[derive(Debug, Clone)]
pub struct ResamplingEngine {
    config: ResampleConfig,
}

impl ResamplingEngine {
    pub fn new(config: ResampleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// Runs the full Monte Carlo set for one method.
    pub fn resample(
        &self,
        input: &ResolvedInput,
        method: ResampleMethod,
    ) -> Result<MonteCarloDistribution, ResamplingError> {
        let never_cancelled = AtomicBool::new(false);
        self.resample_with_cancel(input, method, &never_cancelled)
    }

    /// Runs the full Monte Carlo set, checking the cancel flag between
    /// runs. On cancellation the whole run set is abandoned: either a
    /// complete distribution is returned or `ResamplingError::Cancelled`.
    pub fn resample_with_cancel(
        &self,
        input: &ResolvedInput,
        method: ResampleMethod,
        cancel: &AtomicBool,
    ) -> Result<MonteCarloDistribution, ResamplingError> {
        debug!(?method, runs = self.config.runs, "starting resampling run set");

        let simulate = |run: usize| -> Result<MonteCarloRunResult, ResamplingError> {
            if cancel.load(Ordering::Relaxed) {
                return Err(ResamplingError::Cancelled);
            }
            self.simulate_run(input, method, run as u64)
        };

        let results: Result<Vec<MonteCarloRunResult>, ResamplingError> =
            match self.config.workers {
                Some(workers) if workers > 1 => {
                    let threads = workers.min(num_cpus::get());
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .map_err(|e| ResamplingError::WorkerPool(e.to_string()))?;
                    pool.install(|| (0..self.config.runs).into_par_iter().map(simulate).collect())
                }
                _ => (0..self.config.runs).map(simulate).collect(),
            };

        let runs = results?;
        debug!(?method, "resampling run set complete");
        Ok(MonteCarloDistribution::from_runs(method, runs))
    }

    /// One independent resampled path: rebuild an equity curve under the
    /// chosen method and score it.
    fn simulate_run(
        &self,
        input: &ResolvedInput,
        method: ResampleMethod,
        run_index: u64,
    ) -> Result<MonteCarloRunResult, ResamplingError> {
        let path = match method {
            ResampleMethod::TradeShuffle => self.shuffle_path(input, run_index)?,
            ResampleMethod::BlockBootstrap => self.bootstrap_path(input, run_index)?,
        };

        let metrics = MetricsEngine::new().calculate(&path, None)?;
        Ok(MonteCarloRunResult {
            sharpe: metrics.sharpe_ratio,
            max_drawdown: metrics.max_drawdown,
            ulcer_index: metrics.ulcer_index,
        })
    }

    /// Trade shuffle: permute the trade P&L order and rebuild the equity
    /// path by cumulative summation. Without a trade list, the return
    /// series is permuted instead and the path rebuilt multiplicatively.
    fn shuffle_path(
        &self,
        input: &ResolvedInput,
        run_index: u64,
    ) -> Result<EquitySeries, ResamplingError> {
        match &input.trades {
            Some(trades) => {
                let order = shuffled_indices(trades.len(), self.config.seed, run_index);
                let mut values = Vec::with_capacity(trades.len() + 1);
                let mut equity = self.config.initial_capital;
                values.push(equity);
                for &i in &order {
                    equity += trades[i].pnl;
                    values.push(equity);
                }
                Ok(EquitySeries::new(values)?)
            }
            None => {
                let returns = input.equity.returns();
                let order = shuffled_indices(returns.len(), self.config.seed, run_index);
                let shuffled: Vec<f64> = order.iter().map(|&i| returns.values()[i]).collect();
                Ok(rebuild_from_returns(input.equity.values()[0], &shuffled)?)
            }
        }
    }

    /// Block bootstrap: draw overlapping blocks of returns with replacement
    /// until the original length is reached, then rebuild the path.
    fn bootstrap_path(
        &self,
        input: &ResolvedInput,
        run_index: u64,
    ) -> Result<EquitySeries, ResamplingError> {
        let returns = input.equity.returns();
        let source = returns.values();
        let n = source.len();
        let block = self.config.block_size.clamp(1, n);

        let mut rng = ChaCha8Rng::seed_from_u64(derive_run_seed(self.config.seed, run_index));
        let mut resampled = Vec::with_capacity(n + block);
        while resampled.len() < n {
            let start = rng.gen_range(0..=n - block);
            resampled.extend_from_slice(&source[start..start + block]);
        }
        resampled.truncate(n);

        rebuild_from_returns(input.equity.values()[0], &resampled).map_err(Into::into)
    }
}

/// Compounds a return sequence back into an equity path anchored at
/// `initial` (the first sample of the original curve).
fn rebuild_from_returns(initial: f64, returns: &[f64]) -> Result<EquitySeries, core_types::CoreError> {
    let mut values = Vec::with_capacity(returns.len() + 1);
    let mut equity = initial;
    values.push(equity);
    for r in returns {
        equity *= 1.0 + r;
        values.push(equity);
    }
    EquitySeries::new(values)
}
