//! # Leverageability Tester
//!
//! Quantifies how much the discovered hour-of-day pattern is worth: across
//! the Monte Carlo trade-shuffle paths, how much does Sharpe improve when
//! trades from the worst hours are excluded?
//!
//! The paths are *replayed*, not regenerated: each path's unfiltered Sharpe
//! is read straight from the trade-shuffle distribution's retained per-run
//! results, and the permutation behind it comes from the same
//! `(seed, run_index)` sub-seed helper the resampling engine uses. Only the
//! filtered variant of each path is rebuilt here.

use analytics::MetricsEngine;
use core_types::{EquitySeries, TradeRecord};
use patterns::HourOfDayEffect;
use resampling::{shuffled_indices, DistributionStats, MonteCarloDistribution};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod error;

pub use error::LeverageError;

/// Configuration for the leverageability test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageConfig {
    /// Master seed shared with the resampling engine; must match the seed
    /// the baseline distribution was built with.
    pub seed: u64,
    /// How many of the worst hours to exclude.
    pub worst_hour_count: usize,
    /// Starting capital for the rebuilt filtered paths.
    pub initial_capital: f64,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self { seed: 0, worst_hour_count: 3, initial_capital: 10_000.0 }
    }
}

/// Sharpe uplift from hour-filtering, aggregated across Monte Carlo paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageabilityResult {
    pub uplift_mean: f64,
    pub uplift_p05: f64,
    pub uplift_p95: f64,
    /// Share of paths where the filtered Sharpe beat the unfiltered one.
    pub fraction_positive: f64,
    pub n_paths: usize,
    /// The hours that were excluded, worst first.
    pub excluded_hours: Vec<u32>,
}

/// Measures the Sharpe uplift of excluding the worst hours, path by path.
///
/// `baseline` is the trade-shuffle distribution whose retained per-run
/// results carry each path's unfiltered Sharpe. For every retained path the
/// permutation is replayed, worst-hour trades are dropped, and the filtered
/// Sharpe minus the stored one is that path's uplift. Paths whose filtered
/// sequence is too short to yield a return contribute an uplift of 0.
pub fn test_leverageability(
    trades: &[TradeRecord],
    hour_effect: &HourOfDayEffect,
    baseline: &MonteCarloDistribution,
    config: &LeverageConfig,
) -> Result<LeverageabilityResult, LeverageError> {
    if trades.is_empty() {
        return Err(LeverageError::NoTrades);
    }
    if baseline.runs.is_empty() {
        return Err(LeverageError::NoBaselinePaths);
    }
    let excluded_hours: Vec<u32> =
        hour_effect.worst_hours.iter().take(config.worst_hour_count).copied().collect();
    if excluded_hours.is_empty() {
        return Err(LeverageError::NoWorstHours);
    }

    debug!(runs = baseline.runs.len(), ?excluded_hours, "replaying trade-shuffle paths");

    let engine = MetricsEngine::new();
    let mut uplifts = Vec::with_capacity(baseline.runs.len());
    let mut positive = 0usize;

    for (run, path) in baseline.runs.iter().enumerate() {
        let order = shuffled_indices(trades.len(), config.seed, run as u64);
        let filtered: Vec<f64> = order
            .iter()
            .filter(|&&i| !excluded_hours.contains(&trades[i].hour_of_day()))
            .map(|&i| trades[i].pnl)
            .collect();

        let uplift = match sharpe_of_pnl(&engine, &filtered, config.initial_capital) {
            Ok(filtered_sharpe) => filtered_sharpe - path.sharpe,
            // Filter removed nearly everything; this path carries no signal.
            Err(_) => 0.0,
        };

        if uplift > 0.0 {
            positive += 1;
        }
        uplifts.push(uplift);
    }

    let stats = DistributionStats::from_values(&uplifts);
    Ok(LeverageabilityResult {
        uplift_mean: stats.mean,
        uplift_p05: stats.p05,
        uplift_p95: stats.p95,
        fraction_positive: positive as f64 / baseline.runs.len() as f64,
        n_paths: baseline.runs.len(),
        excluded_hours,
    })
}

fn sharpe_of_pnl(
    engine: &MetricsEngine,
    pnls: &[f64],
    initial_capital: f64,
) -> Result<f64, LeverageError> {
    let mut values = Vec::with_capacity(pnls.len() + 1);
    let mut equity = initial_capital;
    values.push(equity);
    for pnl in pnls {
        equity += pnl;
        values.push(equity);
    }
    let series = EquitySeries::new(values)?;
    Ok(engine.calculate(&series, None)?.sharpe_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::AnalysisInput;
    use resampling::{MonteCarloRunResult, ResampleConfig, ResampleMethod, ResamplingEngine};

    /// Losing trades concentrated in `bad_hour`, winners in `good_hour`.
    fn polarized_trades(n: usize, bad_hour: u32, good_hour: u32) -> Vec<TradeRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let (hour, pnl) = if i % 2 == 0 {
                    (bad_hour, -60.0 - (i % 3) as f64 * 15.0)
                } else {
                    (good_hour, 90.0 + (i % 5) as f64 * 20.0)
                };
                TradeRecord {
                    timestamp: start + Duration::days(i as i64) + Duration::hours(hour as i64),
                    pnl,
                }
            })
            .collect()
    }

    /// The trade-shuffle distribution the production pipeline would hand in.
    fn baseline_for(trades: &[TradeRecord], runs: usize, seed: u64) -> MonteCarloDistribution {
        let resolved = AnalysisInput::from_trades(trades.to_vec()).resolve(10_000.0).unwrap();
        let engine =
            ResamplingEngine::new(ResampleConfig::default().with_runs(runs).with_seed(seed));
        engine.resample(&resolved, ResampleMethod::TradeShuffle).unwrap()
    }

    fn effect_with_worst(worst: Vec<u32>) -> HourOfDayEffect {
        HourOfDayEffect {
            h_statistic: 30.0,
            p_value: 0.001,
            group_count: 2,
            best_hours: vec![12],
            worst_hours: worst,
            significant: true,
            interpretation: String::new(),
        }
    }

    #[test]
    fn excluding_the_losing_hour_lifts_sharpe() {
        let trades = polarized_trades(80, 0, 12);
        let baseline = baseline_for(&trades, 200, 7);
        let config = LeverageConfig { seed: 7, ..Default::default() };

        let result =
            test_leverageability(&trades, &effect_with_worst(vec![0]), &baseline, &config)
                .unwrap();

        assert!(result.uplift_mean > 0.0, "uplift_mean = {}", result.uplift_mean);
        assert!(result.fraction_positive > 0.9, "fraction = {}", result.fraction_positive);
        assert_eq!(result.n_paths, 200);
        assert_eq!(result.excluded_hours, vec![0]);
    }

    #[test]
    fn excluding_an_absent_hour_yields_exactly_zero_uplift() {
        // No trade falls in hour 23, so every filtered path is the full
        // path. The uplift is exactly 0 on every run only if the stored
        // per-run Sharpe and the replayed permutation describe the same
        // path bit for bit.
        let trades = polarized_trades(40, 2, 14);
        let baseline = baseline_for(&trades, 50, 9);
        let config = LeverageConfig { seed: 9, ..Default::default() };

        let result =
            test_leverageability(&trades, &effect_with_worst(vec![23]), &baseline, &config)
                .unwrap();

        assert_eq!(result.uplift_mean, 0.0);
        assert_eq!(result.uplift_p05, 0.0);
        assert_eq!(result.uplift_p95, 0.0);
        assert_eq!(result.fraction_positive, 0.0);
        assert_eq!(result.n_paths, 50);
    }

    #[test]
    fn uplift_percentiles_bracket_the_mean() {
        let trades = polarized_trades(60, 3, 15);
        let baseline = baseline_for(&trades, 100, 1);
        let config = LeverageConfig { seed: 1, ..Default::default() };
        let result =
            test_leverageability(&trades, &effect_with_worst(vec![3, 4]), &baseline, &config)
                .unwrap();
        assert!(result.uplift_p05 <= result.uplift_mean);
        assert!(result.uplift_mean <= result.uplift_p95);
    }

    #[test]
    fn replay_is_deterministic() {
        let trades = polarized_trades(50, 2, 14);
        let baseline = baseline_for(&trades, 64, 42);
        let config = LeverageConfig { seed: 42, ..Default::default() };
        let effect = effect_with_worst(vec![2]);
        let a = test_leverageability(&trades, &effect, &baseline, &config).unwrap();
        let b = test_leverageability(&trades, &effect, &baseline, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_trade_list_is_an_error() {
        let trades = polarized_trades(10, 0, 12);
        let baseline = baseline_for(&trades, 8, 0);
        let config = LeverageConfig::default();
        assert!(matches!(
            test_leverageability(&[], &effect_with_worst(vec![0]), &baseline, &config),
            Err(LeverageError::NoTrades)
        ));
    }

    #[test]
    fn baseline_without_retained_runs_is_an_error() {
        let trades = polarized_trades(10, 0, 12);
        let empty =
            MonteCarloDistribution::from_runs(ResampleMethod::TradeShuffle, Vec::<MonteCarloRunResult>::new());
        let config = LeverageConfig::default();
        assert!(matches!(
            test_leverageability(&trades, &effect_with_worst(vec![0]), &empty, &config),
            Err(LeverageError::NoBaselinePaths)
        ));
    }
}
