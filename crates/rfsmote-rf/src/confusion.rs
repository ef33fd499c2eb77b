//! Counts of true against predicted labels, and the per-class scores
//! derived from them.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::RfError;

/// A confusion matrix over the labels seen in either the truth or the predictions.
///
/// `as_rows()[i][j]` counts samples whose true label is `labels()[i]` and
/// whose predicted label is `labels()[j]`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    labels: Vec<usize>,
    matrix: Vec<Vec<usize>>,
}

/// One row of the classification report.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// The class label.
    pub class: usize,
    /// TP / (TP + FP); 0.0 if the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 if the class has no true samples.
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 if both are zero.
    pub f1: f64,
    /// Rows whose true label is `class`.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Tally `true_labels[i]` against `predicted[i]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | Zero labels provided |
    /// | [`RfError::PredictionCountMismatch`] | Slices differ in length |
    pub fn from_labels(true_labels: &[usize], predicted: &[usize]) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(RfError::PredictionCountMismatch {
                n_true: true_labels.len(),
                n_predicted: predicted.len(),
            });
        }

        let labels: Vec<usize> = true_labels
            .iter()
            .chain(predicted)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let position = |label: usize| labels.binary_search(&label).unwrap_or_default();

        let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
        for (&t, &p) in true_labels.iter().zip(predicted) {
            matrix[position(t)][position(p)] += 1;
        }
        Ok(Self { labels, matrix })
    }

    /// Share of rows on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.labels.len()).map(|i| self.matrix[i][i]).sum();
        correct as f64 / self.total() as f64
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Per-class precision, recall, F1, and support, in label order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.labels.len();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = (0..n).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.labels[c],
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the labels indexing rows and columns, ascending.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Rows indexed by true label, columns by predicted label.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .matrix
            .iter()
            .flatten()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1)
            .max(8);

        write!(f, "{:>8}", "")?;
        for label in &self.labels {
            write!(f, " {:>width$}", format!("pred_{label}"))?;
        }
        writeln!(f)?;

        for (label, row) in self.labels.iter().zip(&self.matrix) {
            write!(f, "{:>8}", format!("true_{label}"))?;
            for val in row {
                write!(f, " {val:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_labels_score_perfectly() {
        let labels = [2, 0, 1, 0, 0, 2];
        let cm = ConfusionMatrix::from_labels(&labels, &labels).unwrap();
        assert_eq!(cm.accuracy(), 1.0);
        assert!(cm.class_metrics().iter().all(|m| m.f1 == 1.0));
        assert_eq!(cm.total(), 6);
    }

    #[test]
    fn minority_errors_counted_per_class() {
        // Six healthy rows, two prediabetic, two diabetic.
        let truth = [0, 0, 0, 0, 0, 0, 1, 1, 2, 2];
        let predicted = [0, 0, 0, 0, 1, 2, 1, 0, 2, 2];
        let cm = ConfusionMatrix::from_labels(&truth, &predicted).unwrap();

        assert_eq!(
            cm.as_rows().to_vec(),
            vec![vec![4usize, 1, 1], vec![1, 1, 0], vec![0, 0, 2]]
        );
        assert!((cm.accuracy() - 0.7).abs() < 1e-12);
        let m = cm.class_metrics();
        assert!((m[0].precision - 0.8).abs() < 1e-12);
        assert!((m[0].recall - 4.0 / 6.0).abs() < 1e-12);
        assert!((m[1].f1 - 0.5).abs() < 1e-12);
        assert!((m[2].precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m[2].recall, 1.0);
        assert_eq!(m.iter().map(|c| c.support).collect::<Vec<_>>(), vec![6usize, 2, 2]);
    }

    #[test]
    fn label_set_is_union_of_truth_and_predictions() {
        // Label 2 only appears as a prediction, label 5 only as truth.
        let cm = ConfusionMatrix::from_labels(&[0, 5, 0], &[0, 2, 2]).unwrap();
        assert_eq!(cm.labels(), &[0, 2, 5]);
        let metrics = cm.class_metrics();
        assert_eq!(metrics[1].class, 2);
        assert_eq!(metrics[1].support, 0);
        assert_eq!(metrics[1].precision, 0.0);
        assert_eq!(metrics[2].class, 5);
        assert_eq!(metrics[2].recall, 0.0);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            ConfusionMatrix::from_labels(&[], &[]),
            Err(RfError::EmptyDataset)
        ));
        assert!(matches!(
            ConfusionMatrix::from_labels(&[0, 1], &[0]),
            Err(RfError::PredictionCountMismatch { n_true: 2, n_predicted: 1 })
        ));
    }

    #[test]
    fn display_has_header_and_one_line_per_label() {
        let text = ConfusionMatrix::from_labels(&[0, 1, 1], &[0, 1, 0])
            .unwrap()
            .to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("pred_0") && lines[0].contains("pred_1"));
        assert!(lines[2].trim_start().starts_with("true_1"));
    }
}
