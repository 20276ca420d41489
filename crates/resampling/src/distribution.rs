use serde::{Deserialize, Serialize};

use crate::engine::ResampleMethod;

/// Metrics of one resampled path. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloRunResult {
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub ulcer_index: f64,
}

/// Percentile summary of one metric across all runs.
///
/// Percentiles use linear interpolation over the sorted values, precise
/// enough for the orchestrator's "base vs P5" interpretation contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean: f64,
    pub p05: f64,
    pub p95: f64,
}

impl DistributionStats {
    /// Summarizes a set of per-run values. Sorts internally, so the stats
    /// are independent of the order runs completed in.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, p05: 0.0, p95: 0.0 };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Self {
            mean,
            p05: percentile(&sorted, 0.05),
            p95: percentile(&sorted, 0.95),
        }
    }
}

/// Linear-interpolation percentile over an already-sorted slice.
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// The empirical distribution produced by one resampling method.
///
/// The raw per-run results are retained in memory for the leverageability
/// tester but skipped during serialization; the report carries the
/// percentile summaries and the run count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloDistribution {
    pub method: ResampleMethod,
    pub n_runs: usize,
    pub sharpe: DistributionStats,
    pub max_drawdown: DistributionStats,
    #[serde(skip)]
    pub runs: Vec<MonteCarloRunResult>,
}

impl MonteCarloDistribution {
    pub fn from_runs(method: ResampleMethod, runs: Vec<MonteCarloRunResult>) -> Self {
        let sharpes: Vec<f64> = runs.iter().map(|r| r.sharpe).collect();
        let drawdowns: Vec<f64> = runs.iter().map(|r| r.max_drawdown).collect();
        Self {
            method,
            n_runs: runs.len(),
            sharpe: DistributionStats::from_values(&sharpes),
            max_drawdown: DistributionStats::from_values(&drawdowns),
            runs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
        assert!((percentile(&sorted, 0.5) - 2.0).abs() < 1e-12);
        assert!((percentile(&sorted, 0.25) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stats_are_ordered_p05_mean_p95() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let stats = DistributionStats::from_values(&values);
        assert!(stats.p05 <= stats.mean);
        assert!(stats.mean <= stats.p95);
    }

    #[test]
    fn stats_are_independent_of_input_order() {
        let forward: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            DistributionStats::from_values(&forward),
            DistributionStats::from_values(&reversed)
        );
    }

    #[test]
    fn empty_distribution_is_all_zeros() {
        let stats = DistributionStats::from_values(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.p05, 0.0);
        assert_eq!(stats.p95, 0.0);
    }
}
