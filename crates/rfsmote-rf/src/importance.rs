//! Feature importance aggregation across trees.

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance score (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Aggregate per-tree MDI importances into ranked features.
///
/// Single-leaf trees contribute all zeros and are skipped. The remaining
/// vectors are summed and renormalized, which equals their mean up to the
/// final normalization. Sorting is stable, so ties keep column order.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0f64; names.len()];
    for tree_imp in per_tree.iter().filter(|imp| imp.iter().any(|&v| v > 0.0)) {
        for (total, &val) in totals.iter_mut().zip(tree_imp) {
            *total += val;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut features: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();

    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feat) in features.iter_mut().enumerate() {
        feat.rank = i + 1;
    }
    features
}

#[cfg(test)]
mod tests {
    use super::aggregate_importances;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn averages_and_ranks() {
        let per_tree = vec![vec![0.5, 0.5, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(3));
        assert_eq!(ranked[0].name, "f0");
        assert!((ranked[0].importance - 0.75).abs() < 1e-12);
        assert_eq!(ranked[1].name, "f1");
        assert!((ranked[1].importance - 0.25).abs() < 1e-12);
        assert_eq!(ranked.iter().map(|f| f.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn all_stumps_give_zero_importances() {
        let ranked = aggregate_importances(&[vec![0.0, 0.0]], &names(2));
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        assert_eq!(ranked[0].name, "f0");
    }
}
