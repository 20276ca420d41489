use core_types::ReturnSeries;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::warn;

use crate::error::PatternError;
use crate::finding::{AutocorrelationResult, LagStatistic, PatternFinding};

/// Default maximum lag; always capped at len/4.
pub const DEFAULT_MAX_LAG: usize = 10;

const MIN_RETURNS: usize = 8;
const PROBE: &str = "autocorrelation";

/// Ljung-Box test for serial dependence in the return series.
///
/// Reports Q and its p-value at every lag up to `min(max_lag, n/4)`, plus
/// an overall verdict at the deepest lag (0.05 level). Zero-variance or
/// too-short series degrade to a skipped finding.
pub fn autocorrelation(
    returns: &ReturnSeries,
    max_lag: usize,
) -> Result<PatternFinding, PatternError> {
    let values = returns.values();
    let n = values.len();

    if n < MIN_RETURNS {
        warn!(probe = PROBE, n, "return series too short, skipping");
        return Ok(PatternFinding::skipped(
            PROBE,
            format!("insufficient data ({n} returns, need {MIN_RETURNS})"),
        ));
    }

    let lags = max_lag.min(n / 4).max(1);
    let mean = values.iter().sum::<f64>() / n as f64;
    let denom: f64 = values.iter().map(|r| (r - mean) * (r - mean)).sum();
    if denom == 0.0 {
        return Ok(PatternFinding::skipped(PROBE, "zero-variance return series"));
    }

    let nf = n as f64;
    let mut q = 0.0;
    let mut stats = Vec::with_capacity(lags);
    for lag in 1..=lags {
        let num: f64 = (lag..n).map(|t| (values[t] - mean) * (values[t - lag] - mean)).sum();
        let rho = num / denom;
        q += nf * (nf + 2.0) * rho * rho / (nf - lag as f64);

        let chi = ChiSquared::new(lag as f64)
            .map_err(|e| PatternError::Distribution(PROBE.to_string(), e.to_string()))?;
        let p_value = (1.0 - chi.cdf(q)).clamp(0.0, 1.0);

        stats.push(LagStatistic { lag, autocorrelation: rho, q_statistic: q, p_value });
    }

    let final_p = stats[stats.len() - 1].p_value;
    let serial_dependence = final_p < 0.05;
    let interpretation = if serial_dependence {
        format!(
            "serial dependence present up to lag {lags} (Q = {:.2}, p = {final_p:.4}); \
             returns are not independent draws",
            stats[stats.len() - 1].q_statistic
        )
    } else {
        format!("no significant autocorrelation up to lag {lags} (p = {final_p:.4})")
    };

    Ok(PatternFinding::Autocorrelation(AutocorrelationResult {
        lags: stats,
        serial_dependence,
        interpretation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::EquitySeries;

    fn returns_of(equity: Vec<f64>) -> ReturnSeries {
        EquitySeries::new(equity).unwrap().returns()
    }

    #[test]
    fn short_series_degrades_to_skipped() {
        let returns = returns_of(vec![100.0, 101.0, 102.0]);
        assert!(autocorrelation(&returns, DEFAULT_MAX_LAG).unwrap().is_skipped());
    }

    #[test]
    fn flat_series_degrades_to_skipped() {
        let returns = returns_of(vec![100.0; 50]);
        assert!(autocorrelation(&returns, DEFAULT_MAX_LAG).unwrap().is_skipped());
    }

    #[test]
    fn lag_cap_is_quarter_of_length() {
        let equity: Vec<f64> = (0..25).map(|i| 100.0 + (i % 3) as f64).collect();
        let returns = returns_of(equity);
        // 24 returns -> cap at 6 lags.
        match autocorrelation(&returns, DEFAULT_MAX_LAG).unwrap() {
            PatternFinding::Autocorrelation(result) => assert_eq!(result.lags.len(), 6),
            other => panic!("expected autocorrelation result, got {other:?}"),
        }
    }

    #[test]
    fn strongly_periodic_returns_show_dependence() {
        // Equity that alternates up/down produces returns with strong
        // negative lag-1 autocorrelation.
        let mut equity = vec![100.0];
        for i in 0..80 {
            let last = *equity.last().unwrap();
            equity.push(if i % 2 == 0 { last * 1.05 } else { last * 0.96 });
        }
        match autocorrelation(&returns_of(equity), DEFAULT_MAX_LAG).unwrap() {
            PatternFinding::Autocorrelation(result) => {
                assert!(result.serial_dependence);
                assert!(result.lags[0].autocorrelation < -0.5);
            }
            other => panic!("expected autocorrelation result, got {other:?}"),
        }
    }

    #[test]
    fn q_statistic_is_monotonic_in_lag() {
        let equity: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).sin() * 5.0 + i as f64 * 0.1).collect();
        match autocorrelation(&returns_of(equity), DEFAULT_MAX_LAG).unwrap() {
            PatternFinding::Autocorrelation(result) => {
                for pair in result.lags.windows(2) {
                    assert!(pair[1].q_statistic >= pair[0].q_statistic);
                }
            }
            other => panic!("expected autocorrelation result, got {other:?}"),
        }
    }
}
