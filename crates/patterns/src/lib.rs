//! # Pattern Discovery
//!
//! Independent statistical probes over a trade/equity record:
//!
//! - hour-of-day P&L effect (Kruskal-Wallis),
//! - serial dependence in returns (Ljung-Box),
//! - win/loss streak randomness (Wald-Wolfowitz runs test),
//! - recurring equity-curve shapes (motifs) and anomalous segments
//!   (discords),
//! - drawdown-episode regimes (deterministic k-means).
//!
//! Every probe is side-effect-free and degrades to an explicit
//! [`PatternFinding::Skipped`] finding on short or degenerate input instead
//! of raising, so one thin probe never aborts a whole analysis.

pub mod autocorrelation;
pub mod clustering;
pub mod error;
pub mod finding;
pub mod hour_effect;
pub mod motifs;
pub mod runs_test;

pub use autocorrelation::autocorrelation;
pub use clustering::drawdown_clustering;
pub use error::PatternError;
pub use finding::{
    AutocorrelationResult, ClusterCentroid, DiscordResult, DrawdownClusterResult,
    HourOfDayEffect, LagStatistic, MotifResult, PatternFinding, RunsTestResult, SkippedProbe,
};
pub use hour_effect::hour_of_day_effect;
pub use motifs::{discord_detection, motif_discovery};
pub use runs_test::runs_test;
