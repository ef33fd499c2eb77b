use crate::error::ResampleError;

/// Check that `features` is a non-empty rectangular matrix with one label per row.
///
/// Returns the row width.
pub(crate) fn validate_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, ResampleError> {
    if features.is_empty() {
        return Err(ResampleError::EmptyDataset);
    }
    if features.len() != labels.len() {
        return Err(ResampleError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    let width = features[0].len();
    if let Some((sample_index, row)) = features.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(ResampleError::FeatureCountMismatch {
            expected: width,
            got: row.len(),
            sample_index,
        });
    }
    Ok(width)
}
