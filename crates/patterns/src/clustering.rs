use core_types::{DrawdownEpisode, EquitySeries};
use tracing::warn;

use crate::error::PatternError;
use crate::finding::{ClusterCentroid, DrawdownClusterResult, PatternFinding};

const MIN_EPISODES: usize = 4;
const MAX_K: usize = 5;
const LLOYD_ITERATIONS: usize = 30;
/// A step from k to k+1 must cut inertia by at least this fraction to be
/// accepted. Fixed so "same input => same k" holds.
const ELBOW_IMPROVEMENT: f64 = 0.20;

const PROBE: &str = "drawdown_clustering";

/// Clusters drawdown episodes by shape: depth, duration, recovery slope.
///
/// Distinguishes "shallow and frequent" from "rare and deep" drawdown
/// regimes. Fully deterministic: centers are seeded from quantiles of the
/// depth-ordered episodes and k is chosen by a fixed inertia-drop
/// threshold, so the same input always yields the same clustering.
pub fn drawdown_clustering(equity: &EquitySeries) -> Result<PatternFinding, PatternError> {
    let episodes = DrawdownEpisode::scan(equity);
    if episodes.len() < MIN_EPISODES {
        warn!(probe = PROBE, episodes = episodes.len(), "too few episodes, skipping");
        return Ok(PatternFinding::skipped(
            PROBE,
            format!("insufficient data ({} drawdown episodes, need {MIN_EPISODES})", episodes.len()),
        ));
    }

    let raw: Vec<[f64; 3]> = episodes
        .iter()
        .map(|e| [e.depth, e.duration as f64, e.recovery_slope()])
        .collect();
    let (points, means, stds) = z_score(&raw);

    let k_max = MAX_K.min(episodes.len());
    let mut chosen = fit(&points, 2);
    let mut k = 2;
    while k + 1 <= k_max {
        let next = fit(&points, k + 1);
        if chosen.inertia <= 0.0
            || (chosen.inertia - next.inertia) / chosen.inertia < ELBOW_IMPROVEMENT
        {
            break;
        }
        chosen = next;
        k += 1;
    }

    // Report centroids back in original units, largest-depth cluster first.
    let mut centroids: Vec<ClusterCentroid> = (0..k)
        .map(|c| {
            let count = chosen.labels.iter().filter(|&&l| l == c).count();
            ClusterCentroid {
                depth: chosen.centers[c][0] * stds[0] + means[0],
                duration: chosen.centers[c][1] * stds[1] + means[1],
                recovery_slope: chosen.centers[c][2] * stds[2] + means[2],
                episode_count: count,
            }
        })
        .collect();
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        centroids[b]
            .depth
            .partial_cmp(&centroids[a].depth)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let relabel: Vec<usize> = {
        let mut map = vec![0; k];
        for (new, &old) in order.iter().enumerate() {
            map[old] = new;
        }
        map
    };
    centroids = order.iter().map(|&old| centroids[old].clone()).collect();
    let assignments: Vec<usize> = chosen.labels.iter().map(|&l| relabel[l]).collect();

    let deepest = &centroids[0];
    let shallowest = &centroids[k - 1];
    let interpretation = format!(
        "{k} drawdown regimes across {} episodes: deepest cluster averages \
         {:.1}% depth over {:.0} samples ({} episodes); shallowest averages \
         {:.1}% depth ({} episodes)",
        episodes.len(),
        deepest.depth * 100.0,
        deepest.duration,
        deepest.episode_count,
        shallowest.depth * 100.0,
        shallowest.episode_count,
    );

    Ok(PatternFinding::DrawdownClusters(DrawdownClusterResult {
        k,
        centroids,
        assignments,
        interpretation,
    }))
}

/// Per-dimension z-scoring; a zero-variance dimension maps to zeros.
fn z_score(points: &[[f64; 3]]) -> (Vec<[f64; 3]>, [f64; 3], [f64; 3]) {
    let n = points.len() as f64;
    let mut means = [0.0; 3];
    for p in points {
        for d in 0..3 {
            means[d] += p[d];
        }
    }
    for mean in &mut means {
        *mean /= n;
    }

    let mut stds = [0.0; 3];
    for p in points {
        for d in 0..3 {
            stds[d] += (p[d] - means[d]) * (p[d] - means[d]);
        }
    }
    for std in &mut stds {
        *std = (*std / n).sqrt();
    }

    let scaled = points
        .iter()
        .map(|p| {
            let mut out = [0.0; 3];
            for d in 0..3 {
                out[d] = if stds[d] > 0.0 { (p[d] - means[d]) / stds[d] } else { 0.0 };
            }
            out
        })
        .collect();

    // Zero-variance dimensions un-scale with std 1 so centroids map back
    // onto the shared mean.
    let report_stds = stds.map(|s| if s > 0.0 { s } else { 1.0 });
    (scaled, means, report_stds)
}

struct KMeansFit {
    centers: Vec<[f64; 3]>,
    labels: Vec<usize>,
    inertia: f64,
}

/// Lloyd's algorithm with deterministic quantile seeding along the depth
/// dimension.
fn fit(points: &[[f64; 3]], k: usize) -> KMeansFit {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a][0].partial_cmp(&points[b][0]).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut centers: Vec<[f64; 3]> = (0..k)
        .map(|i| {
            let pos = (i * (points.len() - 1)) / (k - 1).max(1);
            points[order[pos]]
        })
        .collect();

    let mut labels = vec![0usize; points.len()];
    for _ in 0..LLOYD_ITERATIONS {
        for (i, p) in points.iter().enumerate() {
            labels[i] = nearest(p, &centers);
        }

        let mut sums = vec![[0.0; 3]; k];
        let mut counts = vec![0usize; k];
        for (label, p) in labels.iter().zip(points.iter()) {
            for d in 0..3 {
                sums[*label][d] += p[d];
            }
            counts[*label] += 1;
        }

        let mut moved = 0.0f64;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            for d in 0..3 {
                let new = sums[c][d] / counts[c] as f64;
                moved = moved.max((new - centers[c][d]).abs());
                centers[c][d] = new;
            }
        }
        if moved < 1e-6 {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(labels.iter())
        .map(|(p, &l)| squared_distance(p, &centers[l]))
        .sum();

    KMeansFit { centers, labels, inertia }
}

fn nearest(point: &[f64; 3], centers: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (c, center) in centers.iter().enumerate() {
        let d = squared_distance(point, center);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (0..3).map(|d| (a[d] - b[d]) * (a[d] - b[d])).sum()
}
