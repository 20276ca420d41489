use crate::error::CoreError;
use crate::series::EquitySeries;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A single closed trade as reported by the backtest engine.
///
/// The record is immutable once created. The hour-of-day is always derived
/// from the timestamp via [`TradeRecord::hour_of_day`]; it is never stored,
/// so it can never drift out of sync with the timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub pnl: f64,
}

impl TradeRecord {
    pub fn new(timestamp: DateTime<Utc>, pnl: f64) -> Result<Self, CoreError> {
        if !pnl.is_finite() {
            return Err(CoreError::InvalidInput(
                "trade".to_string(),
                format!("non-finite pnl at {timestamp}"),
            ));
        }
        Ok(Self { timestamp, pnl })
    }

    /// The UTC hour (0-23) this trade closed in.
    pub fn hour_of_day(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// The input contract owed to us by the (external) backtest engine.
///
/// Mirrors the JSON shapes `{"trades": [...]}` and `{"equity": [...]}`.
/// When both fields are present, trades drive the P&L-based probes while
/// the supplied equity curve drives the curve-based ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trades: Option<Vec<TradeRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<Vec<f64>>,
}

impl AnalysisInput {
    pub fn from_trades(trades: Vec<TradeRecord>) -> Self {
        Self { trades: Some(trades), equity: None }
    }

    pub fn from_equity(equity: Vec<f64>) -> Self {
        Self { trades: None, equity: Some(equity) }
    }

    /// Resolves the tagged input into the one canonical shape every
    /// downstream component consumes.
    ///
    /// A trade-only input is normalized into a synthetic equity curve of
    /// `initial_capital + cumulative pnl` (one leading sample for the
    /// starting capital). Validation happens here, once:
    ///
    /// - trade timestamps must be strictly increasing (ties are an error),
    /// - all pnl and equity values must be finite,
    /// - the resulting equity series must have at least 2 samples.
    pub fn resolve(self, initial_capital: f64) -> Result<ResolvedInput, CoreError> {
        let trades = match self.trades {
            Some(trades) => {
                validate_trades(&trades)?;
                Some(trades)
            }
            None => None,
        };

        let equity = match (self.equity, &trades) {
            (Some(values), _) => EquitySeries::new(values)?,
            (None, Some(trades)) => synthetic_equity(trades, initial_capital)?,
            (None, None) => {
                return Err(CoreError::InvalidInput(
                    "analysis input".to_string(),
                    "neither trades nor equity supplied".to_string(),
                ));
            }
        };

        Ok(ResolvedInput { equity, trades })
    }
}

/// The canonical, validated input shape: one equity curve plus the original
/// trade list when one was supplied.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub equity: EquitySeries,
    pub trades: Option<Vec<TradeRecord>>,
}

impl ResolvedInput {
    pub fn trade_count(&self) -> Option<usize> {
        self.trades.as_ref().map(|t| t.len())
    }
}

fn validate_trades(trades: &[TradeRecord]) -> Result<(), CoreError> {
    for (i, trade) in trades.iter().enumerate() {
        if !trade.pnl.is_finite() {
            return Err(CoreError::InvalidInput(
                "trades".to_string(),
                format!("non-finite pnl at index {i}"),
            ));
        }
    }
    for window in trades.windows(2) {
        if window[1].timestamp <= window[0].timestamp {
            return Err(CoreError::InvalidInput(
                "trades".to_string(),
                format!(
                    "timestamps must be strictly increasing ({} followed by {})",
                    window[0].timestamp, window[1].timestamp
                ),
            ));
        }
    }
    Ok(())
}

fn synthetic_equity(trades: &[TradeRecord], initial_capital: f64) -> Result<EquitySeries, CoreError> {
    let mut values = Vec::with_capacity(trades.len() + 1);
    let mut equity = initial_capital;
    values.push(equity);
    for trade in trades {
        equity += trade.pnl;
        values.push(equity);
    }
    EquitySeries::new(values)
}
