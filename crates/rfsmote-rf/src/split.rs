use rand::Rng;

use crate::histogram::FeatureBins;
use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class-weighted masses.
    ///
    /// `class_mass[c]` is the summed weight of class `c` at the node and
    /// `total` is their sum. Returns zero for an empty node.
    #[must_use]
    pub fn impurity(&self, class_mass: &[f64], total: f64) -> Impurity {
        if total <= 0.0 {
            return Impurity::new(0.0);
        }
        let value = match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_mass
                    .iter()
                    .map(|&m| {
                        let p = m / total;
                        p * p
                    })
                    .sum();
                (1.0 - sum_sq).max(0.0)
            }
            SplitCriterion::Entropy => -class_mass
                .iter()
                .filter(|&&m| m > 0.0)
                .map(|&m| {
                    let p = m / total;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

/// Strategy for locating split thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMethod {
    /// Sort each candidate feature and scan every boundary between distinct values.
    Exact,
    /// Scan quantile bin boundaries computed once per tree.
    Histogram {
        /// Number of quantile bins per feature.
        n_bins: usize,
    },
}

/// Read-only inputs shared by every split search in one tree.
///
/// `col_features` is column-major: `col_features[feature][row]`.
pub(crate) struct SplitContext<'a> {
    pub(crate) col_features: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) class_weights: &'a [f64],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitContext<'_> {
    /// Weight carried by a single row.
    #[inline]
    pub(crate) fn row_weight(&self, row: usize) -> f64 {
        self.class_weights[self.labels[row]]
    }

    /// Per-class weighted mass of the given rows.
    pub(crate) fn class_mass(&self, rows: &[usize]) -> Vec<f64> {
        let mut mass = vec![0.0f64; self.n_classes];
        for &row in rows {
            mass[self.labels[row]] += self.row_weight(row);
        }
        mass
    }
}

/// The chosen split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `W·I - W_l·I_l - W_r·I_r` over weighted masses (MDI numerator).
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Weighted impurity decrease of a candidate split.
#[inline]
pub(crate) fn weighted_decrease(
    criterion: SplitCriterion,
    parent: (Impurity, f64),
    left: (&[f64], f64),
    right: (&[f64], f64),
) -> f64 {
    let (parent_impurity, parent_total) = parent;
    parent_total * parent_impurity.value()
        - left.1 * criterion.impurity(left.0, left.1).value()
        - right.1 * criterion.impurity(right.0, right.1).value()
}

/// Columns in random order, one Fisher-Yates step per draw.
///
/// Split searches pull from this until `max_features` columns that vary at
/// the node have been scanned. Columns constant at the node do not count
/// against that budget, so a node only becomes a leaf for lack of candidates
/// once every column has been tried.
pub(crate) struct FeatureDraw {
    order: Vec<usize>,
    drawn: usize,
}

impl FeatureDraw {
    pub(crate) fn new(n_features: usize) -> Self {
        Self {
            order: (0..n_features).collect(),
            drawn: 0,
        }
    }

    /// Next column not yet drawn, or `None` once all have been.
    pub(crate) fn next(&mut self, rng: &mut impl Rng) -> Option<usize> {
        let n = self.order.len();
        if self.drawn == n {
            return None;
        }
        let j = rng.gen_range(self.drawn..n);
        self.order.swap(self.drawn, j);
        self.drawn += 1;
        Some(self.order[self.drawn - 1])
    }
}

/// Partition `rows` on `feature <= threshold`.
pub(crate) fn partition(
    ctx: &SplitContext<'_>,
    rows: &[usize],
    feature: FeatureIndex,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let col = &ctx.col_features[feature.index()];
    rows.iter().partition(|&&row| col[row] <= threshold)
}

/// Find the best split for `rows` using the configured method.
///
/// Returns `None` when no candidate feature admits a split that respects
/// `min_samples_leaf`.
pub(crate) fn find_split(
    ctx: &SplitContext<'_>,
    rows: &[usize],
    method: SplitMethod,
    bins: Option<&FeatureBins>,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    match (method, bins) {
        (SplitMethod::Histogram { .. }, Some(bins)) => {
            crate::histogram::find_histogram_split(ctx, rows, bins, rng)
        }
        _ => find_best_split(ctx, rows, rng),
    }
}

/// Exact CART split search over a random subset of features.
///
/// For each candidate feature the rows are sorted by value and scanned
/// left-to-right, moving one row's weight at a time from the right child to
/// the left child. Features constant over `rows` are skipped without using
/// up the `max_features` budget.
pub(crate) fn find_best_split(
    ctx: &SplitContext<'_>,
    rows: &[usize],
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
        let col = &ctx.col_features[feat_idx];

        let mut sorted: Vec<(f64, usize)> = rows.iter().map(|&row| (col[row], row)).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        if sorted[0].0 == sorted[n_rows - 1].0 {
            continue;
        }
        scanned += 1;

        let mut left_mass = vec![0.0f64; ctx.n_classes];
        let mut right_mass = parent_mass.clone();
        let mut left_total = 0.0f64;

        for i in 0..(n_rows - 1) {
            let (value, row) = sorted[i];
            let w = ctx.row_weight(row);
            let class = ctx.labels[row];
            left_mass[class] += w;
            right_mass[class] -= w;
            left_total += w;

            let next_value = sorted[i + 1].0;
            if value == next_value {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_rows - n_left;
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
                let mut threshold = value + (next_value - value) / 2.0;
                // Adjacent floats can round the midpoint up onto the right value.
                if threshold >= next_value {
                    threshold = value;
                }
                best = Some((FeatureIndex::new(feat_idx), threshold));
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
