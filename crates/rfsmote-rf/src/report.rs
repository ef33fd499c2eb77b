//! Text classification report: per-class metrics plus accuracy and averages.

use std::fmt;

use crate::confusion::{ClassMetrics, ConfusionMatrix};

/// Unweighted or support-weighted mean of per-class metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1.
    pub f1: f64,
}

/// Per-class metrics with accuracy, macro average, and weighted average.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    classes: Vec<ClassMetrics>,
    accuracy: f64,
    total_support: usize,
    digits: usize,
}

impl ClassificationReport {
    /// Build a report from a confusion matrix, printing with 4 digits.
    #[must_use]
    pub fn new(confusion: &ConfusionMatrix) -> Self {
        Self {
            classes: confusion.class_metrics(),
            accuracy: confusion.accuracy(),
            total_support: confusion.total(),
            digits: 4,
        }
    }

    /// Set the number of decimal digits used by `Display`.
    #[must_use]
    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    /// Return the per-class rows.
    #[must_use]
    pub fn classes(&self) -> &[ClassMetrics] {
        &self.classes
    }

    /// Return the overall accuracy.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Unweighted mean over classes.
    #[must_use]
    pub fn macro_avg(&self) -> AverageMetrics {
        let n = self.classes.len() as f64;
        self.average(|_| 1.0 / n)
    }

    /// Mean over classes weighted by support.
    #[must_use]
    pub fn weighted_avg(&self) -> AverageMetrics {
        let total = self.total_support as f64;
        self.average(|m| m.support as f64 / total)
    }

    fn average(&self, weight: impl Fn(&ClassMetrics) -> f64) -> AverageMetrics {
        self.classes.iter().fold(
            AverageMetrics {
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
            },
            |acc, m| {
                let w = weight(m);
                AverageMetrics {
                    precision: acc.precision + w * m.precision,
                    recall: acc.recall + w * m.recall,
                    f1: acc.f1 + w * m.f1,
                }
            },
        )
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.digits;
        let label_width = "weighted avg".len();

        writeln!(
            f,
            "{:>label_width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            writeln!(
                f,
                "{:>label_width$} {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
                m.class, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>label_width$} {:>9} {:>9} {:>9.d$} {:>9}",
            "accuracy", "", "", self.accuracy, self.total_support
        )?;
        for (name, avg) in [("macro avg", self.macro_avg()), ("weighted avg", self.weighted_avg())] {
            writeln!(
                f,
                "{:>label_width$} {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total_support
            )?;
        }
        Ok(())
    }
}
