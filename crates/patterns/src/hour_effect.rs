use core_types::TradeRecord;
use itertools::Itertools;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::warn;

use crate::error::PatternError;
use crate::finding::{HourOfDayEffect, PatternFinding};

/// Minimum trades an hour group needs before it enters the test.
const MIN_TRADES_PER_GROUP: usize = 5;
/// Minimum qualifying hour groups for the test to be meaningful.
const MIN_GROUPS: usize = 2;
/// How many best/worst hours to surface for the leverage tester.
const RANKED_HOURS: usize = 3;

const PROBE: &str = "hour_of_day_effect";

/// Tests whether P&L depends on the hour of day.
///
/// Groups trade P&L by the derived hour and runs a Kruskal-Wallis H-test
/// (non-parametric, so heavy-tailed P&L distributions don't mislead it)
/// across every hour with at least 5 trades. Degrades to a skipped finding
/// when fewer than 2 hours qualify.
pub fn hour_of_day_effect(trades: &[TradeRecord]) -> Result<PatternFinding, PatternError> {
    let mut groups: Vec<(u32, Vec<f64>)> = Vec::new();
    for hour in 0..24u32 {
        let pnls: Vec<f64> =
            trades.iter().filter(|t| t.hour_of_day() == hour).map(|t| t.pnl).collect();
        if pnls.len() >= MIN_TRADES_PER_GROUP {
            groups.push((hour, pnls));
        }
    }

    if groups.len() < MIN_GROUPS {
        warn!(probe = PROBE, groups = groups.len(), "not enough hour groups, skipping");
        return Ok(PatternFinding::skipped(
            PROBE,
            format!(
                "not significant - insufficient samples ({} hour groups with >= {} trades, need {})",
                groups.len(),
                MIN_TRADES_PER_GROUP,
                MIN_GROUPS
            ),
        ));
    }

    let (h_statistic, df) = kruskal_wallis(&groups);
    let chi = ChiSquared::new(df as f64)
        .map_err(|e| PatternError::Distribution(PROBE.to_string(), e.to_string()))?;
    let p_value = (1.0 - chi.cdf(h_statistic)).clamp(0.0, 1.0);
    let significant = p_value < 0.05;

    // Rank hours by mean P&L. Each list gets its own sort so ties resolve
    // by ascending hour index at both ends of the ranking.
    let means: Vec<(u32, f64)> = groups
        .iter()
        .map(|(hour, pnls)| (*hour, pnls.iter().sum::<f64>() / pnls.len() as f64))
        .collect();

    // Cap the ranked lists at half the groups so best and worst never
    // overlap; the leverage tester must not be handed a winning hour to
    // exclude.
    let take = RANKED_HOURS.min(groups.len() / 2).max(1);
    let best_hours: Vec<u32> = means
        .iter()
        .sorted_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        })
        .take(take)
        .map(|(hour, _)| *hour)
        .collect();
    let worst_hours: Vec<u32> = means
        .iter()
        .sorted_by(|a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        })
        .take(take)
        .map(|(hour, _)| *hour)
        .collect();

    let interpretation = if significant {
        format!(
            "P&L differs across hours (H = {h_statistic:.2}, p = {p_value:.4}); \
             strongest hours {best_hours:?}, weakest hours {worst_hours:?}"
        )
    } else {
        format!("no significant hour-of-day effect (H = {h_statistic:.2}, p = {p_value:.4})")
    };

    Ok(PatternFinding::HourOfDayEffect(HourOfDayEffect {
        h_statistic,
        p_value,
        group_count: groups.len(),
        best_hours,
        worst_hours,
        significant,
        interpretation,
    }))
}

/// Kruskal-Wallis H with tie correction. Returns (H, degrees of freedom).
fn kruskal_wallis(groups: &[(u32, Vec<f64>)]) -> (f64, usize) {
    let all: Vec<(usize, f64)> = groups
        .iter()
        .enumerate()
        .flat_map(|(g, (_, pnls))| pnls.iter().map(move |&p| (g, p)))
        .collect();
    let n = all.len() as f64;

    let ranks = average_ranks(&all.iter().map(|(_, v)| *v).collect::<Vec<f64>>());

    // Sum of ranks per group.
    let mut rank_sums = vec![0.0; groups.len()];
    for ((g, _), rank) in all.iter().zip(ranks.iter()) {
        rank_sums[*g] += rank;
    }

    let mut h = 0.0;
    for (g, (_, pnls)) in groups.iter().enumerate() {
        let ni = pnls.len() as f64;
        h += rank_sums[g] * rank_sums[g] / ni;
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    // Tie correction: 1 - sum(t^3 - t) / (n^3 - n).
    let mut sorted: Vec<f64> = all.iter().map(|(_, v)| *v).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }
    let correction = 1.0 - tie_term / (n * n * n - n);
    if correction > 0.0 {
        h /= correction;
    }

    (h, groups.len() - 1)
}

/// Ranks 1..=n with ties sharing their average rank.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j hold tied values; everyone gets the average rank.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}
