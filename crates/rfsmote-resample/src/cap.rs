//! Seeded row cap: subsample without replacement when a set is too large.

use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::error::ResampleError;

/// Upper bound on the number of training rows.
///
/// | Parameter  | Default |
/// |------------|---------|
/// | `max_rows` | (required) |
/// | `seed`     | 42      |
#[derive(Debug, Clone)]
pub struct RowCap {
    max_rows: usize,
    seed: u64,
}

impl RowCap {
    /// Create a cap of `max_rows`.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidRowCap`] if `max_rows` is zero.
    pub fn new(max_rows: usize) -> Result<Self, ResampleError> {
        if max_rows == 0 {
            return Err(ResampleError::InvalidRowCap { max_rows });
        }
        Ok(Self { max_rows, seed: 42 })
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the cap.
    #[must_use]
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Keep at most `max_rows` rows.
    ///
    /// Sets at or under the cap pass through unchanged. Larger sets are
    /// replaced by `max_rows` distinct rows drawn without replacement, in
    /// draw order.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::LabelCountMismatch`] when the inputs differ in length.
    #[instrument(skip_all, fields(n_samples = features.len(), max_rows = self.max_rows))]
    pub fn apply(
        &self,
        mut features: Vec<Vec<f64>>,
        labels: Vec<usize>,
    ) -> Result<(Vec<Vec<f64>>, Vec<usize>), ResampleError> {
        if features.len() != labels.len() {
            return Err(ResampleError::LabelCountMismatch {
                n_samples: features.len(),
                n_labels: labels.len(),
            });
        }
        let n = features.len();
        if n <= self.max_rows {
            return Ok((features, labels));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let picked = index::sample(&mut rng, n, self.max_rows);
        let mut kept_features = Vec::with_capacity(self.max_rows);
        let mut kept_labels = Vec::with_capacity(self.max_rows);
        for i in picked {
            kept_features.push(std::mem::take(&mut features[i]));
            kept_labels.push(labels[i]);
        }

        info!(from = n, to = self.max_rows, "training rows capped");
        Ok((kept_features, kept_labels))
    }
}
