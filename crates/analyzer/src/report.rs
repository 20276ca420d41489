use analytics::PerformanceMetrics;
use chrono::{DateTime, Utc};
use leverage::LeverageabilityResult;
use patterns::{PatternFinding, SkippedProbe};
use resampling::MonteCarloDistribution;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two Monte Carlo distributions, one per resampling method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSection {
    pub trade_shuffle: MonteCarloDistribution,
    pub block_bootstrap: MonteCarloDistribution,
}

/// The orchestrator's reading of the numbers, owed to callers so the
/// report renderer never re-implements threshold logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Base Sharpe exceeds the trade-shuffle distribution mean.
    pub skill_above_random: bool,
    /// Base Sharpe sits below the trade-shuffle P5: overfitting flag.
    pub possible_overfitting: bool,
    /// Hour-filtering cleared the configured uplift thresholds.
    pub recommend_hour_filter: bool,
    pub summary: String,
}

/// The root aggregate returned by one `analyze()` call.
///
/// Every sub-object is value-owned by the report; nothing is shared by
/// reference elsewhere. Serializes to the JSON contract owed to the
/// (external) report renderer, with every float finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub base_metrics: PerformanceMetrics,
    pub monte_carlo: MonteCarloSection,
    pub patterns: Vec<PatternFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverageability: Option<LeverageabilityResult>,
    /// Which sub-analyses were skipped, and why, instead of failing the run.
    pub skipped_analyses: Vec<SkippedProbe>,
    pub interpretation: Interpretation,
}

impl AnalysisReport {
    /// The report minus its per-call metadata (`run_id`, `timestamp`).
    ///
    /// Two runs over identical input and seed produce byte-identical JSON
    /// for this payload, regardless of worker count.
    pub fn analytical_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("run_id");
            map.remove("timestamp");
        }
        Ok(value)
    }
}
