use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::argmax;

/// Soft vote of the ensemble for one row: mean of the leaf distributions
/// the row reaches, indexed by class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution(Vec<f64>);

impl ClassDistribution {
    /// Lowest class holding the largest share.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        argmax(&self.0)
    }

    /// Share of class `class`, 0 for classes the forest never saw.
    #[must_use]
    pub fn probability(&self, class: usize) -> f64 {
        self.0.get(class).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl RandomForest {
    fn check_width(&self, sample: &[f64]) -> Result<(), RfError> {
        if sample.len() == self.n_features {
            Ok(())
        } else {
            Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            })
        }
    }

    /// Class of the soft vote for one row.
    ///
    /// # Errors
    ///
    /// [`RfError::PredictionFeatureMismatch`] for a row of the wrong width.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        self.predict_proba(sample)
            .map(|votes| votes.predicted_class())
    }

    /// Soft vote for one row.
    ///
    /// # Errors
    ///
    /// [`RfError::PredictionFeatureMismatch`] for a row of the wrong width.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        self.check_width(sample)?;
        let mut votes = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.predict_proba(sample)?;
            votes.iter_mut().zip(leaf).for_each(|(v, p)| *v += p);
        }
        let scale = 1.0 / self.trees.len() as f64;
        votes.iter_mut().for_each(|v| *v *= scale);
        Ok(ClassDistribution(votes))
    }

    /// Classes for many rows, spread over the rayon pool. Output order
    /// follows input order.
    ///
    /// # Errors
    ///
    /// The first [`RfError::PredictionFeatureMismatch`] encountered.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{RandomForest, RandomForestConfig, RfError};

    /// 30 rows, class 1 from row 15 on.
    fn step_forest() -> (RandomForest, Vec<Vec<f64>>) {
        let features: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i >= 15)).collect();
        let names = ["step".to_string(), "noise".to_string()];
        let forest = RandomForestConfig::new(12)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest();
        (forest, features)
    }

    #[test]
    fn soft_vote_is_a_distribution() {
        let (forest, features) = step_forest();
        for sample in &features {
            let votes = forest.predict_proba(sample).unwrap();
            let sum: f64 = votes.as_slice().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert_eq!(forest.predict(sample).unwrap(), votes.predicted_class());
            assert_eq!(votes.probability(7), 0.0);
        }
    }

    #[test]
    fn batch_keeps_row_order() {
        let (forest, features) = step_forest();
        let batch = forest.predict_batch(&features).unwrap();
        let one_by_one: Vec<usize> = features.iter().map(|s| forest.predict(s).unwrap()).collect();
        assert_eq!(batch, one_by_one);
    }

    #[test]
    fn row_of_wrong_width_rejected() {
        let (forest, _) = step_forest();
        assert!(matches!(
            forest.predict_batch(&[vec![1.0, 2.0, 3.0]]),
            Err(RfError::PredictionFeatureMismatch { expected: 2, got: 3 })
        ));
        assert!(forest.predict_proba(&[1.0]).is_err());
    }
}
