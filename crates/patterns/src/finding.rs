use serde::{Deserialize, Serialize};

/// The result of one pattern-discovery probe.
///
/// A tagged union so the JSON report carries a `kind` discriminant per
/// finding. `Skipped` is the degrade-not-raise arm: a probe that cannot run
/// meaningfully reports why instead of failing the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternFinding {
    HourOfDayEffect(HourOfDayEffect),
    Autocorrelation(AutocorrelationResult),
    RunsTest(RunsTestResult),
    Motif(MotifResult),
    Discord(DiscordResult),
    DrawdownClusters(DrawdownClusterResult),
    Skipped(SkippedProbe),
}

impl PatternFinding {
    pub fn skipped(probe: &str, reason: impl Into<String>) -> Self {
        Self::Skipped(SkippedProbe { probe: probe.to_string(), reason: reason.into() })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedProbe {
    pub probe: String,
    pub reason: String,
}

/// Kruskal-Wallis H-test across hour-of-day P&L groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourOfDayEffect {
    pub h_statistic: f64,
    pub p_value: f64,
    /// Number of hour groups (>= 5 trades each) that entered the test.
    pub group_count: usize,
    /// Hours ranked by mean P&L, best first; ties broken by ascending hour.
    pub best_hours: Vec<u32>,
    /// Hours ranked by mean P&L, worst first; ties broken by ascending hour.
    pub worst_hours: Vec<u32>,
    pub significant: bool,
    pub interpretation: String,
}

/// One lag of the Ljung-Box statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagStatistic {
    pub lag: usize,
    pub autocorrelation: f64,
    pub q_statistic: f64,
    pub p_value: f64,
}

/// Ljung-Box serial-dependence test over the return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationResult {
    pub lags: Vec<LagStatistic>,
    /// Verdict at the final (deepest) lag, 0.05 level.
    pub serial_dependence: bool,
    pub interpretation: String,
}

/// Wald-Wolfowitz runs test over the win/loss sign sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunsTestResult {
    pub observed_runs: usize,
    pub expected_runs: f64,
    pub z_statistic: f64,
    pub p_value: f64,
    pub wins: usize,
    pub losses: usize,
    pub interpretation: String,
}

/// The closest pair of non-overlapping equity-curve windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifResult {
    pub window: usize,
    pub first_start: usize,
    pub second_start: usize,
    /// Z-normalized Euclidean distance between the two windows.
    pub distance: f64,
    pub interpretation: String,
}

/// The window most dissimilar to every non-overlapping neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordResult {
    pub window: usize,
    pub start: usize,
    pub nearest_neighbor_distance: f64,
    pub interpretation: String,
}

/// Centroid of one drawdown-episode cluster, in original feature units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCentroid {
    pub depth: f64,
    pub duration: f64,
    pub recovery_slope: f64,
    pub episode_count: usize,
}

/// K-means clustering of drawdown episodes by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownClusterResult {
    pub k: usize,
    pub centroids: Vec<ClusterCentroid>,
    /// Episode index -> cluster index, in episode order.
    pub assignments: Vec<usize>,
    pub interpretation: String,
}
