use core_types::EquitySeries;
use tracing::warn;

use crate::error::PatternError;
use crate::finding::{DiscordResult, MotifResult, PatternFinding};

/// Default sliding-window length over the equity curve.
pub const DEFAULT_WINDOW: usize = 20;

const MOTIF_PROBE: &str = "motif_discovery";
const DISCORD_PROBE: &str = "discord_detection";

/// Finds the top motif: the pair of non-overlapping windows of the
/// z-normalized equity curve with the minimum Euclidean distance. A close
/// pair marks a shape the curve keeps repeating.
pub fn motif_discovery(
    equity: &EquitySeries,
    window: usize,
) -> Result<PatternFinding, PatternError> {
    let Some(windows) = normalized_windows(equity, window, MOTIF_PROBE) else {
        return Ok(skipped_for_length(MOTIF_PROBE, equity, window));
    };

    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..windows.len() {
        // j >= i + window excludes trivial self-matches and overlaps.
        for j in (i + window)..windows.len() {
            let d = euclidean(&windows[i], &windows[j]);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((i, j, d));
            }
        }
    }

    let Some((first_start, second_start, distance)) = best else {
        return Ok(skipped_for_length(MOTIF_PROBE, equity, window));
    };

    Ok(PatternFinding::Motif(MotifResult {
        window,
        first_start,
        second_start,
        distance,
        interpretation: format!(
            "recurring shape: windows starting at {first_start} and {second_start} \
             (length {window}) are nearly identical after normalization (d = {distance:.3})"
        ),
    }))
}

/// Finds the top discord: the window whose nearest non-overlapping neighbor
/// is farthest away. Such a window matches nothing else in the curve, which
/// usually means a regime change or a rare event.
pub fn discord_detection(
    equity: &EquitySeries,
    window: usize,
) -> Result<PatternFinding, PatternError> {
    let Some(windows) = normalized_windows(equity, window, DISCORD_PROBE) else {
        return Ok(skipped_for_length(DISCORD_PROBE, equity, window));
    };

    let mut discord: Option<(usize, f64)> = None;
    for i in 0..windows.len() {
        let mut nearest = f64::INFINITY;
        for j in 0..windows.len() {
            if i.abs_diff(j) < window {
                continue;
            }
            let d = euclidean(&windows[i], &windows[j]);
            if d < nearest {
                nearest = d;
            }
        }
        if nearest.is_finite() && discord.map_or(true, |(_, best)| nearest > best) {
            discord = Some((i, nearest));
        }
    }

    let Some((start, nearest_neighbor_distance)) = discord else {
        return Ok(skipped_for_length(DISCORD_PROBE, equity, window));
    };

    Ok(PatternFinding::Discord(DiscordResult {
        window,
        start,
        nearest_neighbor_distance,
        interpretation: format!(
            "anomalous segment: the window starting at {start} (length {window}) is \
             unlike any other part of the curve (nearest-neighbor d = \
             {nearest_neighbor_distance:.3})"
        ),
    }))
}

/// Z-normalized windows at every start offset, or `None` when the series
/// cannot hold two non-overlapping windows.
fn normalized_windows(equity: &EquitySeries, window: usize, probe: &str) -> Option<Vec<Vec<f64>>> {
    let values = equity.values();
    if window < 2 || values.len() < 2 * window {
        warn!(probe, len = values.len(), window, "series too short, skipping");
        return None;
    }

    Some(values.windows(window).map(z_normalize).collect())
}

fn z_normalize(window: &[f64]) -> Vec<f64> {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return vec![0.0; window.len()];
    }
    window.iter().map(|v| (v - mean) / std).collect()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

fn skipped_for_length(probe: &str, equity: &EquitySeries, window: usize) -> PatternFinding {
    PatternFinding::skipped(
        probe,
        format!(
            "insufficient data ({} samples, need {} for two non-overlapping windows of {})",
            equity.len(),
            2 * window,
            window
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: Vec<f64>) -> EquitySeries {
        EquitySeries::new(values).unwrap()
    }

    #[test]
    fn short_series_degrades_to_skipped() {
        let equity = series((0..30).map(|i| 100.0 + i as f64).collect());
        assert!(motif_discovery(&equity, 20).unwrap().is_skipped());
        assert!(discord_detection(&equity, 20).unwrap().is_skipped());
    }

    #[test]
    fn repeated_shape_is_found_as_motif() {
        // Two identical ramp-and-dip segments separated by noise-free drift.
        let shape: Vec<f64> = (0..10).map(|i| (i as f64 * 0.7).sin() * 10.0).collect();
        let mut values = Vec::new();
        values.extend(shape.iter().map(|v| 100.0 + v));
        // Aperiodic filler so no two filler windows line up after
        // normalization.
        values.extend((0..30).map(|i| 120.0 + (i as f64 * 0.9).sin() * 7.0 + i as f64 * 1.1));
        values.extend(shape.iter().map(|v| 150.0 + v));
        values.extend((0..10).map(|i| 170.0 + (i as f64 * 1.3).cos() * 4.0));

        let equity = series(values);
        match motif_discovery(&equity, 10).unwrap() {
            PatternFinding::Motif(motif) => {
                // The two planted copies z-normalize to the same shape.
                assert_eq!(motif.first_start, 0);
                assert_eq!(motif.second_start, 40);
                assert!(motif.distance < 1e-9, "d = {}", motif.distance);
            }
            other => panic!("expected motif, got {other:?}"),
        }
    }

    #[test]
    fn motif_pair_never_overlaps() {
        let equity = series((0..80).map(|i| 100.0 + ((i * 13) % 17) as f64).collect());
        match motif_discovery(&equity, 10).unwrap() {
            PatternFinding::Motif(motif) => {
                assert!(motif.second_start >= motif.first_start + motif.window);
            }
            other => panic!("expected motif, got {other:?}"),
        }
    }

    #[test]
    fn planted_anomaly_is_the_discord() {
        // A smooth periodic curve with one violent crash segment.
        let mut values: Vec<f64> =
            (0..100).map(|i| 100.0 + (i as f64 * 0.8).sin() * 4.0).collect();
        for (offset, v) in values.iter_mut().skip(50).take(10).enumerate() {
            *v = 100.0 - 40.0 * (offset as f64 + 1.0) / 10.0;
        }

        let equity = series(values);
        match discord_detection(&equity, 10).unwrap() {
            PatternFinding::Discord(discord) => {
                assert!(
                    (45..=55).contains(&discord.start),
                    "discord at {}, expected near the crash",
                    discord.start
                );
            }
            other => panic!("expected discord, got {other:?}"),
        }
    }

    #[test]
    fn flat_windows_do_not_produce_nan_distances() {
        let mut values = vec![100.0; 30];
        values.extend((0..30).map(|i| 100.0 + i as f64));
        let equity = series(values);
        match motif_discovery(&equity, 10).unwrap() {
            PatternFinding::Motif(motif) => assert!(motif.distance.is_finite()),
            other => panic!("expected motif, got {other:?}"),
        }
    }
}
