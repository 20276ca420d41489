use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// An ordered series of account-value samples.
///
/// Invariants enforced at construction: at least 2 samples, every value
/// finite. The series is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySeries(Vec<f64>);

impl EquitySeries {
    pub fn new(values: Vec<f64>) -> Result<Self, CoreError> {
        if values.len() < 2 {
            return Err(CoreError::InsufficientData(
                "equity series".to_string(),
                format!("need at least 2 samples, got {}", values.len()),
            ));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::InvalidInput(
                "equity series".to_string(),
                format!("non-finite value at index {i}"),
            ));
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The simple-return series derived from consecutive samples.
    ///
    /// Length is always `len() - 1`. A zero sample contributes a zero
    /// return rather than a division blow-up.
    pub fn returns(&self) -> ReturnSeries {
        let values = self
            .0
            .windows(2)
            .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
            .collect();
        ReturnSeries(values)
    }
}

/// Periodic simple returns derived from an [`EquitySeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries(Vec<f64>);

impl ReturnSeries {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One peak-to-recovery excursion of the equity curve.
///
/// An episode opens when equity falls below its running peak and closes when
/// equity recovers to that peak. An episode still open at the end of the
/// series is reported with `recovered == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    /// Index of the peak sample the episode fell from.
    pub start_index: usize,
    /// Index of the deepest sample within the episode.
    pub trough_index: usize,
    /// Index of the recovery sample, or the last index for open episodes.
    pub end_index: usize,
    /// Deepest drawdown as a fraction of the peak (0..1).
    pub depth: f64,
    /// Number of samples from peak to end.
    pub duration: usize,
    pub recovered: bool,
}

impl DrawdownEpisode {
    /// Scans the equity curve against a running maximum and extracts every
    /// drawdown episode, in order. Recomputed fresh on every call; episodes
    /// are never cached.
    pub fn scan(equity: &EquitySeries) -> Vec<DrawdownEpisode> {
        let values = equity.values();
        let mut episodes = Vec::new();

        let mut peak = values[0];
        let mut peak_index = 0usize;
        let mut in_drawdown = false;
        let mut trough = f64::INFINITY;
        let mut trough_index = 0usize;

        for (i, &value) in values.iter().enumerate() {
            if value >= peak {
                if in_drawdown {
                    episodes.push(Self::close(peak, peak_index, trough, trough_index, i, true));
                    in_drawdown = false;
                }
                peak = value;
                peak_index = i;
            } else {
                if !in_drawdown {
                    in_drawdown = true;
                    trough = value;
                    trough_index = i;
                } else if value < trough {
                    trough = value;
                    trough_index = i;
                }
            }
        }

        if in_drawdown {
            let last = values.len() - 1;
            episodes.push(Self::close(peak, peak_index, trough, trough_index, last, false));
        }

        episodes
    }

    fn close(
        peak: f64,
        peak_index: usize,
        trough: f64,
        trough_index: usize,
        end_index: usize,
        recovered: bool,
    ) -> DrawdownEpisode {
        let depth = if peak > 0.0 { (peak - trough) / peak } else { 0.0 };
        DrawdownEpisode {
            start_index: peak_index,
            trough_index,
            end_index,
            depth,
            duration: end_index - peak_index,
            recovered,
        }
    }

    /// Slope of the recovery leg (depth regained per sample); zero for a
    /// still-open episode.
    pub fn recovery_slope(&self) -> f64 {
        if !self.recovered || self.end_index == self.trough_index {
            return 0.0;
        }
        self.depth / (self.end_index - self.trough_index) as f64
    }
}
