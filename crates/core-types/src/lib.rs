//! # Core Types
//!
//! Layer 0 of the analysis workspace. This crate defines the data model that
//! every other crate consumes: trade records, the tagged input variant,
//! equity/return series, and drawdown episodes.
//!
//! ## Architectural Principles
//!
//! - **Validate once:** every invariant (finite values, monotonic
//!   timestamps, minimum length) is enforced at construction. Downstream
//!   crates never re-validate; they consume shapes that are correct by
//!   construction.
//! - **Immutable inputs:** trade lists and equity series are append-only
//!   inputs. Nothing in the analysis pipeline mutates them.

pub mod error;
pub mod input;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use input::{AnalysisInput, ResolvedInput, TradeRecord};
pub use series::{DrawdownEpisode, EquitySeries, ReturnSeries};
