//! # Analytics Engine
//!
//! This crate provides the baseline performance metrics for the robustness
//! analysis pipeline. It acts as the "unbiased judge" of a single equity
//! curve: no resampling, no statistics about distributions, just the scalar
//! metrics everything downstream builds empirical distributions of.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It depends only on
//!   `core-types` (Layer 0).
//! - **Stateless Calculation:** The `MetricsEngine` is a stateless
//!   calculator. It takes an equity series as input and produces a
//!   `PerformanceMetrics` as output. This makes it highly reliable and
//!   easy to test.
//! - **Guarded degeneracy:** degenerate inputs (flat curves, zero-variance
//!   returns) resolve to defined finite values, never NaN/Inf. The only
//!   hard failure is a series too short to yield a single return.
//!
//! ## Public API
//!
//! - `MetricsEngine`: The main struct that contains the calculation logic.
//! - `PerformanceMetrics`: The standardized struct holding the metrics.
//! - `AnalyticsError`: The specific error types that can be returned.

pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use report::PerformanceMetrics;
