use serde::{Deserialize, Serialize};

/// The baseline performance metrics of one equity curve.
///
/// This struct is the output of the `MetricsEngine` and the unit that the
/// resampling engine computes per Monte Carlo path, so every field must be
/// a finite number for any valid input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Annualized Sharpe ratio of the simple-return series. Defined as 0
    /// when the returns have zero variance, so downstream percentile math
    /// stays well-formed.
    pub sharpe_ratio: f64,

    /// Largest peak-to-trough decline as a fraction of the peak (0..1).
    pub max_drawdown: f64,

    /// Root-mean-square of percentage drawdowns across the whole series.
    pub ulcer_index: f64,

    /// Number of trades behind the curve, when a trade list was supplied.
    /// `None` for equity-only input; callers must tolerate the absence.
    pub trade_count: Option<usize>,
}
