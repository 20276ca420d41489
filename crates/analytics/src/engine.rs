use crate::error::AnalyticsError;
use crate::report::PerformanceMetrics;
use core_types::EquitySeries;
use tracing::trace;

/// Annualization for the Sharpe ratio: each equity sample is treated as one
/// daily observation, so the factor is sqrt(252 trading days).
const PERIODS_PER_YEAR: f64 = 252.0;

/// A stateless calculator for deriving performance metrics from an equity
/// curve.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `equity` - The validated equity curve (at least 2 samples).
    /// * `trade_count` - Length of the originating trade list, if known.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceMetrics` or an
    /// `AnalyticsError`. Only a series shorter than 2 samples fails; all
    /// other degenerate cases resolve to defined values.
    pub fn calculate(
        &self,
        equity: &EquitySeries,
        trade_count: Option<usize>,
    ) -> Result<PerformanceMetrics, AnalyticsError> {
        if equity.len() < 2 {
            return Err(AnalyticsError::NotEnoughData(
                format!("equity series has {} samples, need at least 2", equity.len()),
            ));
        }

        let metrics = PerformanceMetrics {
            sharpe_ratio: self.sharpe_ratio(equity),
            max_drawdown: self.max_drawdown(equity),
            ulcer_index: self.ulcer_index(equity),
            trade_count,
        };
        trace!(
            sharpe = metrics.sharpe_ratio,
            max_drawdown = metrics.max_drawdown,
            "metrics computed"
        );
        Ok(metrics)
    }

    /// Annualized Sharpe ratio over simple returns.
    ///
    /// Guarded: a zero standard deviation yields a Sharpe of 0 rather than
    /// NaN/Inf, so a flat path inside a Monte Carlo distribution never
    /// poisons the percentile math.
    fn sharpe_ratio(&self, equity: &EquitySeries) -> f64 {
        let returns = equity.returns();
        let values = returns.values();
        if values.is_empty() {
            return 0.0;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev == 0.0 || !std_dev.is_finite() {
            return 0.0;
        }

        (mean / std_dev) * PERIODS_PER_YEAR.sqrt()
    }

    /// Maximum drawdown as a fraction of the running peak.
    ///
    /// Always >= 0; exactly 0 for a non-decreasing series.
    fn max_drawdown(&self, equity: &EquitySeries) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut max_drawdown: f64 = 0.0;

        for &value in equity.values() {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let drawdown = (peak - value) / peak;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        max_drawdown
    }

    /// Ulcer Index: RMS of the percentage drawdown at every sample.
    ///
    /// Penalizes depth and duration jointly, unlike max drawdown which only
    /// sees the single worst trough.
    fn ulcer_index(&self, equity: &EquitySeries) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut sum_sq = 0.0;

        for &value in equity.values() {
            if value > peak {
                peak = value;
            }
            let drawdown_pct = if peak > 0.0 { (peak - value) / peak * 100.0 } else { 0.0 };
            sum_sq += drawdown_pct * drawdown_pct;
        }

        (sum_sq / equity.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> EquitySeries {
        EquitySeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn non_decreasing_series_has_zero_drawdown() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate(&series(&[100.0, 101.0, 102.0, 103.0]), None).unwrap();
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.ulcer_index, 0.0);
        assert!(metrics.sharpe_ratio > 0.0);
    }

    #[test]
    fn drawdown_is_fraction_of_peak() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate(&series(&[100.0, 120.0, 90.0, 110.0]), None).unwrap();
        assert!((metrics.max_drawdown - 0.25).abs() < 1e-12);
    }

    #[test]
    fn flat_series_resolves_to_zero_sharpe_not_nan() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate(&series(&[100.0, 100.0, 100.0]), None).unwrap();
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert!(metrics.sharpe_ratio.is_finite());
    }

    #[test]
    fn trade_count_is_passed_through() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate(&series(&[100.0, 101.0]), Some(42)).unwrap();
        assert_eq!(metrics.trade_count, Some(42));

        let metrics = engine.calculate(&series(&[100.0, 101.0]), None).unwrap();
        assert_eq!(metrics.trade_count, None);
    }

    #[test]
    fn ulcer_index_penalizes_prolonged_drawdowns() {
        let engine = MetricsEngine::new();
        // Same max depth, but the second curve lingers at the trough.
        let brief = engine.calculate(&series(&[100.0, 90.0, 100.0, 100.0, 100.0]), None).unwrap();
        let prolonged =
            engine.calculate(&series(&[100.0, 90.0, 90.0, 90.0, 100.0]), None).unwrap();
        assert!((brief.max_drawdown - prolonged.max_drawdown).abs() < 1e-12);
        assert!(prolonged.ulcer_index > brief.ulcer_index);
    }

    #[test]
    fn all_metrics_are_finite_for_losing_curves() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate(&series(&[100.0, 80.0, 60.0, 40.0]), None).unwrap();
        assert!(metrics.sharpe_ratio.is_finite());
        assert!(metrics.sharpe_ratio < 0.0);
        assert!(metrics.max_drawdown >= 0.0);
        assert!(metrics.ulcer_index.is_finite());
    }
}
