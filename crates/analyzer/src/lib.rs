//! # Analysis Orchestrator
//!
//! The public entry point of the robustness-analysis workspace. `Analyzer`
//! sequences the lower layers — baseline metrics, both Monte Carlo
//! resampling methods, every pattern probe, and the leverageability test —
//! into one value-owned [`AnalysisReport`].
//!
//! ## Failure policy
//!
//! Structural problems (malformed input, fewer than 2 equity points) abort
//! the run with one clear error. Partial-capability situations (fewer than
//! `min_trades` trades for the statistical sub-tests) are recovered
//! locally: the affected probes report a skipped finding, the report's
//! `skipped_analyses` names them, and everything else proceeds. Callers
//! always get either a complete well-formed report or a single error,
//! never an ambiguous partial report.

use std::sync::atomic::AtomicBool;

use analytics::MetricsEngine;
use chrono::Utc;
use core_types::{AnalysisInput, ResolvedInput, TradeRecord};
use leverage::{test_leverageability, LeverageConfig, LeverageabilityResult};
use patterns::{
    autocorrelation, discord_detection, drawdown_clustering, hour_of_day_effect,
    motif_discovery, runs_test, HourOfDayEffect, PatternFinding, SkippedProbe,
};
use resampling::{ResampleConfig, ResampleMethod, ResamplingEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

pub mod error;
pub mod report;

pub use error::AnalyzerError;
pub use report::{AnalysisReport, Interpretation, MonteCarloSection};

/// All tunables of one analysis run. Everything is explicit; there is no
/// hidden configuration and no process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Monte Carlo runs per resampling method.
    pub runs: usize,
    /// Block length for the block bootstrap.
    pub block_size: usize,
    /// Sliding-window length for motif/discord discovery.
    pub window: usize,
    /// Seed for reproducible runs; a fresh time-derived seed when absent.
    pub seed: Option<u64>,
    /// Worker threads for the Monte Carlo loop; sequential when absent.
    pub workers: Option<usize>,
    /// Starting capital for synthetic equity curves.
    pub initial_capital: f64,
    /// Below this many trades the statistical sub-tests are skipped (and
    /// annotated) rather than trusted.
    pub min_trades: usize,
    /// How many worst hours the leverage test excludes.
    pub worst_hour_count: usize,
    /// Mean-uplift threshold for recommending the hour filter.
    pub uplift_threshold: f64,
    /// Fraction-positive threshold for recommending the hour filter.
    pub fraction_positive_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            runs: 1000,
            block_size: 10,
            window: 20,
            seed: None,
            workers: None,
            initial_capital: 10_000.0,
            min_trades: 30,
            worst_hour_count: 3,
            uplift_threshold: 0.2,
            fraction_positive_threshold: 0.7,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// The main analysis engine. Stateless between calls: every entity in the
/// report is created fresh per `analyze()` invocation.
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs the full analysis pipeline over the given input.
    pub fn analyze(&self, input: AnalysisInput) -> Result<AnalysisReport, AnalyzerError> {
        let never_cancelled = AtomicBool::new(false);
        self.analyze_with_cancel(input, &never_cancelled)
    }

    /// Runs the full pipeline, honoring a cooperative cancel flag between
    /// Monte Carlo runs.
    pub fn analyze_with_cancel(
        &self,
        input: AnalysisInput,
        cancel: &AtomicBool,
    ) -> Result<AnalysisReport, AnalyzerError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, runs = self.config.runs, "starting analysis");

        // 1. Resolve the tagged input into the one canonical shape.
        let resolved = input.resolve(self.config.initial_capital)?;
        let seed = self.effective_seed();

        // 2. Baseline metrics.
        let base_metrics =
            MetricsEngine::new().calculate(&resolved.equity, resolved.trade_count())?;
        debug!(sharpe = base_metrics.sharpe_ratio, "baseline metrics computed");

        // 3. Monte Carlo distributions, both methods.
        let resample_config = ResampleConfig {
            runs: self.config.runs,
            block_size: self.config.block_size,
            seed,
            initial_capital: self.config.initial_capital,
            workers: self.config.workers,
        };
        let engine = ResamplingEngine::new(resample_config);
        let trade_shuffle =
            engine.resample_with_cancel(&resolved, ResampleMethod::TradeShuffle, cancel)?;
        let block_bootstrap =
            engine.resample_with_cancel(&resolved, ResampleMethod::BlockBootstrap, cancel)?;

        // 4. Pattern probes. Trade-based probes respect the min-trades bar;
        //    curve-based probes run on the canonical equity series.
        let (hour_finding, runs_finding) = self.trade_probes(&resolved)?;
        let mut findings = vec![
            hour_finding.clone(),
            autocorrelation(&resolved.equity.returns(), patterns::autocorrelation::DEFAULT_MAX_LAG)?,
            runs_finding,
            motif_discovery(&resolved.equity, self.config.window)?,
            discord_detection(&resolved.equity, self.config.window)?,
            drawdown_clustering(&resolved.equity)?,
        ];

        // 5. Leverageability, replaying the retained trade-shuffle paths.
        let (leverageability, leverage_skip) =
            self.leverageability(&resolved, &hour_finding, &trade_shuffle, seed)?;

        // 6. Assemble. Skips are summarized so callers see what was left
        //    out without scanning every finding.
        let mut skipped_analyses: Vec<SkippedProbe> = findings
            .iter()
            .filter_map(|f| match f {
                PatternFinding::Skipped(skip) => Some(skip.clone()),
                _ => None,
            })
            .collect();
        if let Some(skip) = leverage_skip {
            skipped_analyses.push(skip);
        }

        let interpretation =
            self.interpret(&base_metrics, &trade_shuffle, leverageability.as_ref());
        findings.retain(|f| !f.is_skipped());

        info!(%run_id, skipped = skipped_analyses.len(), "analysis complete");
        Ok(AnalysisReport {
            run_id,
            timestamp: Utc::now(),
            base_metrics,
            monte_carlo: MonteCarloSection { trade_shuffle, block_bootstrap },
            patterns: findings,
            leverageability,
            skipped_analyses,
            interpretation,
        })
    }

    fn effective_seed(&self) -> u64 {
        match self.config.seed {
            Some(seed) => seed,
            // No seed requested: derive one from the clock. The run is
            // still internally consistent, just not repeatable.
            None => Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }

    /// Hour-of-day and runs-test findings, or skipped markers when the
    /// trade list is absent or below the statistical bar.
    fn trade_probes(
        &self,
        resolved: &ResolvedInput,
    ) -> Result<(PatternFinding, PatternFinding), AnalyzerError> {
        match &resolved.trades {
            Some(trades) if trades.len() >= self.config.min_trades => {
                Ok((hour_of_day_effect(trades)?, runs_test(trades)?))
            }
            Some(trades) => {
                let reason = format!(
                    "insufficient trades for statistical sub-tests ({} < {})",
                    trades.len(),
                    self.config.min_trades
                );
                Ok((
                    PatternFinding::skipped("hour_of_day_effect", reason.clone()),
                    PatternFinding::skipped("runs_test", reason),
                ))
            }
            None => {
                let reason = "no trade list supplied (equity-only input)";
                Ok((
                    PatternFinding::skipped("hour_of_day_effect", reason),
                    PatternFinding::skipped("runs_test", reason),
                ))
            }
        }
    }

    fn leverageability(
        &self,
        resolved: &ResolvedInput,
        hour_finding: &PatternFinding,
        baseline: &resampling::MonteCarloDistribution,
        seed: u64,
    ) -> Result<(Option<LeverageabilityResult>, Option<SkippedProbe>), AnalyzerError> {
        let skip = |reason: &str| SkippedProbe {
            probe: "leverageability".to_string(),
            reason: reason.to_string(),
        };

        let Some(trades) = resolved.trades.as_deref() else {
            return Ok((None, Some(skip("no trade list supplied (equity-only input)"))));
        };
        let PatternFinding::HourOfDayEffect(effect) = hour_finding else {
            return Ok((None, Some(skip("hour-of-day effect unavailable"))));
        };

        let result = self.run_leverage_test(trades, effect, baseline, seed)?;
        Ok((Some(result), None))
    }

    fn run_leverage_test(
        &self,
        trades: &[TradeRecord],
        effect: &HourOfDayEffect,
        baseline: &resampling::MonteCarloDistribution,
        seed: u64,
    ) -> Result<LeverageabilityResult, AnalyzerError> {
        let config = LeverageConfig {
            seed,
            worst_hour_count: self.config.worst_hour_count,
            initial_capital: self.config.initial_capital,
        };
        Ok(test_leverageability(trades, effect, baseline, &config)?)
    }

    /// The interpretation contract owed to callers: threshold logic lives
    /// here, not in the engines.
    fn interpret(
        &self,
        base: &analytics::PerformanceMetrics,
        trade_shuffle: &resampling::MonteCarloDistribution,
        leverageability: Option<&LeverageabilityResult>,
    ) -> Interpretation {
        let skill_above_random = base.sharpe_ratio > trade_shuffle.sharpe.mean;
        let possible_overfitting = base.sharpe_ratio < trade_shuffle.sharpe.p05;
        let recommend_hour_filter = leverageability.is_some_and(|l| {
            l.uplift_mean > self.config.uplift_threshold
                && l.fraction_positive > self.config.fraction_positive_threshold
        });

        let mut parts = Vec::new();
        if skill_above_random {
            parts.push(format!(
                "base Sharpe {:.2} exceeds the shuffle-distribution mean {:.2} (above-random ordering skill)",
                base.sharpe_ratio, trade_shuffle.sharpe.mean
            ));
        } else {
            parts.push(format!(
                "base Sharpe {:.2} does not beat the shuffle-distribution mean {:.2}",
                base.sharpe_ratio, trade_shuffle.sharpe.mean
            ));
        }
        if possible_overfitting {
            parts.push(format!(
                "base Sharpe sits below the P5 of {:.2}: possible overfitting",
                trade_shuffle.sharpe.p05
            ));
        }
        if recommend_hour_filter {
            if let Some(l) = leverageability {
                parts.push(format!(
                    "hour filtering is worth it: mean uplift {:.2} with {:.0}% of paths positive",
                    l.uplift_mean,
                    l.fraction_positive * 100.0
                ));
            }
        }

        Interpretation {
            skill_above_random,
            possible_overfitting,
            recommend_hour_filter,
            summary: parts.join("; "),
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
