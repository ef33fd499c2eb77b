//! Per-class sample weighting.

use crate::error::RfError;

/// How training rows are weighted by class.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassWeight {
    /// Every row weighs 1.
    Uniform,
    /// Inverse class frequency: `n_samples / (n_present_classes * count_c)`.
    ///
    /// Computed once over the full training labels, not per bootstrap.
    Balanced,
    /// Explicit weight per class index. Classes beyond the vector weigh 1.
    Custom(Vec<f64>),
}

impl ClassWeight {
    /// Resolve to a dense weight vector of length `n_classes`.
    ///
    /// Classes absent from `labels` receive weight 0 under `Balanced`; they
    /// never contribute mass, so the value is irrelevant to training.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidClassWeight`] for a negative or non-finite
    /// custom weight.
    pub fn resolve(&self, labels: &[usize], n_classes: usize) -> Result<Vec<f64>, RfError> {
        match self {
            ClassWeight::Uniform => Ok(vec![1.0; n_classes]),
            ClassWeight::Balanced => {
                let mut counts = vec![0usize; n_classes];
                for &label in labels {
                    counts[label] += 1;
                }
                let n_present = counts.iter().filter(|&&c| c > 0).count();
                let n = labels.len() as f64;
                Ok(counts
                    .iter()
                    .map(|&c| {
                        if c == 0 {
                            0.0
                        } else {
                            n / (n_present as f64 * c as f64)
                        }
                    })
                    .collect())
            }
            ClassWeight::Custom(weights) => {
                for (class, &weight) in weights.iter().enumerate() {
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(RfError::InvalidClassWeight { class, weight });
                    }
                }
                Ok((0..n_classes)
                    .map(|c| weights.get(c).copied().unwrap_or(1.0))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_matches_inverse_frequency() {
        // 6 of class 0, 3 of class 1, 1 of class 2.
        let labels = [0, 0, 0, 0, 0, 0, 1, 1, 1, 2];
        let w = ClassWeight::Balanced.resolve(&labels, 3).unwrap();
        assert!((w[0] - 10.0 / 18.0).abs() < 1e-12);
        assert!((w[1] - 10.0 / 9.0).abs() < 1e-12);
        assert!((w[2] - 10.0 / 3.0).abs() < 1e-12);

        // Each class contributes equal total mass.
        let mass: Vec<f64> = [6.0, 3.0, 1.0].iter().zip(&w).map(|(c, w)| c * w).collect();
        assert!(mass.windows(2).all(|p| (p[0] - p[1]).abs() < 1e-12));
    }

    #[test]
    fn balanced_ignores_absent_classes() {
        let w = ClassWeight::Balanced.resolve(&[0, 0, 2, 2], 3).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-12);
        assert_eq!(w[1], 0.0);
        assert!((w[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn custom_rejects_negative() {
        let err = ClassWeight::Custom(vec![1.0, -0.5]).resolve(&[0, 1], 2).unwrap_err();
        assert!(matches!(err, RfError::InvalidClassWeight { class: 1, .. }));
    }

    #[test]
    fn custom_pads_with_ones() {
        let w = ClassWeight::Custom(vec![2.0]).resolve(&[0, 1, 2], 3).unwrap();
        assert_eq!(w, vec![2.0, 1.0, 1.0]);
    }
}
