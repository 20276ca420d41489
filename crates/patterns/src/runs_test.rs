use core_types::TradeRecord;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::error::PatternError;
use crate::finding::{PatternFinding, RunsTestResult};

const MIN_SIGNED_TRADES: usize = 10;
const PROBE: &str = "runs_test";

/// Wald-Wolfowitz runs test over the win/loss sign sequence of trade P&L.
///
/// Compares the observed number of same-sign runs with the count expected
/// under random ordering. Fewer runs than expected means streakiness
/// (momentum-like behavior); more runs means alternation (mean-reversion-
/// like). Zero-P&L trades carry no sign and are excluded.
pub fn runs_test(trades: &[TradeRecord]) -> Result<PatternFinding, PatternError> {
    let signs: Vec<bool> =
        trades.iter().filter(|t| t.pnl != 0.0).map(|t| t.pnl > 0.0).collect();

    let wins = signs.iter().filter(|&&s| s).count();
    let losses = signs.len() - wins;

    if signs.len() < MIN_SIGNED_TRADES || wins == 0 || losses == 0 {
        warn!(probe = PROBE, wins, losses, "sign sequence too thin, skipping");
        return Ok(PatternFinding::skipped(
            PROBE,
            format!(
                "insufficient data ({wins} wins / {losses} losses, \
                 need both signs and >= {MIN_SIGNED_TRADES} signed trades)"
            ),
        ));
    }

    let observed_runs = 1 + signs.windows(2).filter(|w| w[0] != w[1]).count();

    let n1 = wins as f64;
    let n2 = losses as f64;
    let n = n1 + n2;
    let expected_runs = 2.0 * n1 * n2 / n + 1.0;
    let variance = 2.0 * n1 * n2 * (2.0 * n1 * n2 - n) / (n * n * (n - 1.0));

    if variance <= 0.0 {
        return Ok(PatternFinding::skipped(PROBE, "degenerate run-count variance"));
    }

    let z_statistic = (observed_runs as f64 - expected_runs) / variance.sqrt();
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| PatternError::Distribution(PROBE.to_string(), e.to_string()))?;
    let p_value = (2.0 * (1.0 - normal.cdf(z_statistic.abs()))).clamp(0.0, 1.0);

    let interpretation = if p_value >= 0.05 {
        format!(
            "run pattern consistent with random ordering \
             ({observed_runs} runs observed vs {expected_runs:.1} expected, p = {p_value:.4})"
        )
    } else if (observed_runs as f64) < expected_runs {
        format!(
            "streakiness beyond chance: {observed_runs} runs vs {expected_runs:.1} expected \
             (z = {z_statistic:.2}, p = {p_value:.4}); wins and losses cluster"
        )
    } else {
        format!(
            "alternation beyond chance: {observed_runs} runs vs {expected_runs:.1} expected \
             (z = {z_statistic:.2}, p = {p_value:.4}); wins and losses alternate"
        )
    };

    Ok(PatternFinding::RunsTest(RunsTestResult {
        observed_runs,
        expected_runs,
        z_statistic,
        p_value,
        wins,
        losses,
        interpretation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn trades_from_pnls(pnls: &[f64]) -> Vec<TradeRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        pnls.iter()
            .enumerate()
            .map(|(i, &pnl)| TradeRecord { timestamp: start + Duration::hours(i as i64), pnl })
            .collect()
    }

    #[test]
    fn strict_alternation_has_a_low_p_value() {
        let pnls: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 150.0 } else { -75.0 }).collect();
        match runs_test(&trades_from_pnls(&pnls)).unwrap() {
            PatternFinding::RunsTest(result) => {
                assert!(result.p_value < 0.01, "p = {}", result.p_value);
                assert!(result.observed_runs as f64 > result.expected_runs);
                assert!(result.z_statistic > 0.0);
            }
            other => panic!("expected runs test result, got {other:?}"),
        }
    }

    #[test]
    fn blocked_signs_show_streakiness() {
        // 30 wins followed by 30 losses: two runs in total.
        let mut pnls = vec![100.0; 30];
        pnls.extend(vec![-50.0; 30]);
        match runs_test(&trades_from_pnls(&pnls)).unwrap() {
            PatternFinding::RunsTest(result) => {
                assert_eq!(result.observed_runs, 2);
                assert!(result.p_value < 0.01);
                assert!(result.z_statistic < 0.0);
            }
            other => panic!("expected runs test result, got {other:?}"),
        }
    }

    #[test]
    fn single_sign_degrades_to_skipped() {
        let pnls = vec![10.0; 30];
        assert!(runs_test(&trades_from_pnls(&pnls)).unwrap().is_skipped());
    }

    #[test]
    fn zero_pnl_trades_are_excluded_from_the_sign_sequence() {
        let mut pnls: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 10.0 } else { -5.0 }).collect();
        pnls.extend(vec![0.0; 10]);
        match runs_test(&trades_from_pnls(&pnls)).unwrap() {
            PatternFinding::RunsTest(result) => {
                assert_eq!(result.wins + result.losses, 20);
            }
            other => panic!("expected runs test result, got {other:?}"),
        }
    }

    #[test]
    fn too_few_trades_degrades_to_skipped() {
        let pnls = vec![10.0, -5.0, 10.0, -5.0];
        assert!(runs_test(&trades_from_pnls(&pnls)).unwrap().is_skipped());
    }
}
