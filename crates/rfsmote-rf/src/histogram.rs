//! Histogram-based splitting for decision trees.
//!
//! Quantile bin edges are computed once per tree; each node then bins its
//! rows in O(n) and scans O(B) boundaries instead of sorting.

use rand::Rng;

use crate::node::FeatureIndex;
use crate::split::{FeatureDraw, SplitContext, SplitResult, partition, weighted_decrease};

/// Pre-computed quantile bin edges for all features.
#[derive(Debug, Clone)]
pub(crate) struct FeatureBins {
    /// `edges[feature]` is strictly increasing and lies strictly inside
    /// the feature's (min, max). Value `v` falls in bin `#{e : e < v}`.
    edges: Vec<Vec<f64>>,
}

impl FeatureBins {
    /// Build quantile edges at `1/n_bins, 2/n_bins, …` from column-major features.
    ///
    /// Constant columns get no edges and are never split on.
    pub(crate) fn build(col_features: &[Vec<f64>], n_bins: usize) -> Self {
        let edges = col_features
            .iter()
            .map(|col| {
                if col.is_empty() {
                    return Vec::new();
                }
                let mut sorted = col.clone();
                sorted.sort_unstable_by(|a, b| a.total_cmp(b));
                let n = sorted.len();
                let (lo_val, hi_val) = (sorted[0], sorted[n - 1]);
                if lo_val == hi_val {
                    return Vec::new();
                }

                let mut raw: Vec<f64> = (1..n_bins)
                    .map(|k| {
                        let pos = (k as f64 / n_bins as f64) * (n - 1) as f64;
                        let lo = pos.floor() as usize;
                        let hi = (lo + 1).min(n - 1);
                        let frac = pos - lo as f64;
                        sorted[lo] + frac * (sorted[hi] - sorted[lo])
                    })
                    .collect();
                raw.dedup_by(|a, b| *a == *b);
                raw.retain(|&e| e > lo_val && e < hi_val);
                raw
            })
            .collect();

        Self { edges }
    }

    /// Bin index of `value` for `feature`, in `[0, n_edges]`.
    pub(crate) fn bin_index(&self, feature: usize, value: f64) -> usize {
        self.edges[feature].partition_point(|&e| e < value)
    }

    /// Number of split boundaries for `feature` (zero for constant columns).
    pub(crate) fn n_edges(&self, feature: usize) -> usize {
        self.edges[feature].len()
    }

    /// Threshold for the boundary after bin `bin`: values `<=` it go left.
    pub(crate) fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.edges[feature][bin]
    }
}

/// Find the best split for `rows` by scanning bin boundaries.
///
/// A feature whose rows all land in one bin counts as constant here and is
/// skipped without using up the `max_features` budget.
pub(crate) fn find_histogram_split(
    ctx: &SplitContext<'_>,
    rows: &[usize],
    bins: &FeatureBins,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = ctx.col_features.len();
    let n_rows = rows.len();
    if n_rows < 2 || n_features == 0 {
        return None;
    }

    let parent_mass = ctx.class_mass(rows);
    let parent_total: f64 = parent_mass.iter().sum();
    let parent_impurity = ctx.criterion.impurity(&parent_mass, parent_total);

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(FeatureIndex, f64)> = None;

    let mut draw = FeatureDraw::new(n_features);
    let mut scanned = 0usize;
    while scanned < ctx.max_features {
        let Some(feat_idx) = draw.next(rng) else {
            break;
        };
        let n_edges = bins.n_edges(feat_idx);
        if n_edges == 0 {
            continue;
        }

        // Per-bin weighted class mass and row counts.
        let mut bin_mass = vec![vec![0.0f64; ctx.n_classes]; n_edges + 1];
        let mut bin_rows = vec![0usize; n_edges + 1];
        let col = &ctx.col_features[feat_idx];
        for &row in rows {
            let bin = bins.bin_index(feat_idx, col[row]);
            bin_mass[bin][ctx.labels[row]] += ctx.row_weight(row);
            bin_rows[bin] += 1;
        }
        if bin_rows.iter().filter(|&&count| count > 0).count() < 2 {
            continue;
        }
        scanned += 1;

        let mut left_mass = vec![0.0f64; ctx.n_classes];
        let mut right_mass = parent_mass.clone();
        let mut left_total = 0.0f64;
        let mut n_left = 0usize;

        for split_bin in 0..n_edges {
            n_left += bin_rows[split_bin];
            for (class, &m) in bin_mass[split_bin].iter().enumerate() {
                left_mass[class] += m;
                right_mass[class] -= m;
                left_total += m;
            }

            let n_right = n_rows - n_left;
            if n_left == 0 || n_right == 0 {
                continue;
            }
            if n_left < ctx.min_samples_leaf || n_right < ctx.min_samples_leaf {
                continue;
            }

            let right_total = (parent_total - left_total).max(0.0);
            let decrease = weighted_decrease(
                ctx.criterion,
                (parent_impurity, parent_total),
                (&left_mass, left_total),
                (&right_mass, right_total),
            );

            if decrease > best_decrease {
                best_decrease = decrease;
                best = Some((FeatureIndex::new(feat_idx), bins.threshold(feat_idx, split_bin)));
            }
        }
    }

    let (feature, threshold) = best?;
    let (left_indices, right_indices) = partition(ctx, rows, feature, threshold);

    Some(SplitResult {
        feature,
        threshold,
        impurity_decrease: best_decrease,
        left_indices,
        right_indices,
    })
}
