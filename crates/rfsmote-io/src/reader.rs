//! CSV dataset reader: numeric column selection and label extraction.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::LabeledDataset;

/// Reads a labeled table from a headed CSV file.
///
/// A column is numeric when every non-empty cell parses as a float.
/// Non-numeric columns are dropped with a warning. Numeric columns become
/// features, except `target`, which becomes the integer class label.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::MissingTargetColumn`] | Target absent from the numeric columns |
/// | [`IoError::NoFeatureColumns`] | No numeric column besides the target |
/// | [`IoError::NonFiniteValue`] | Empty, NaN, or infinite cell in a numeric column |
/// | [`IoError::InvalidLabel`] | Negative or fractional target value |
pub struct DatasetReader {
    path: PathBuf,
    target: String,
}

/// Parsed values of one column, or `None` once a non-numeric cell is seen.
struct Column {
    name: String,
    values: Option<Vec<f64>>,
    first_missing: Option<(usize, String)>,
}

impl Column {
    fn push(&mut self, row_index: usize, raw: &str) {
        let Some(values) = self.values.as_mut() else {
            return;
        };
        let cell = raw.trim();
        let value = if cell.is_empty() {
            f64::NAN
        } else if let Ok(v) = cell.parse::<f64>() {
            v
        } else {
            self.values = None;
            return;
        };
        if !value.is_finite() && self.first_missing.is_none() {
            self.first_missing = Some((row_index, raw.to_string()));
        }
        values.push(value);
    }
}

impl DatasetReader {
    /// Create a reader for `path` that labels rows by the `target` column.
    pub fn new(path: &Path, target: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            target: target.to_string(),
        }
    }

    /// Read and validate the CSV file, returning a [`LabeledDataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), target = %self.target))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our InconsistentRowLength check reports the row.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected = header.len();
        debug!(expected, "read CSV header");

        let mut columns: Vec<Column> = header
            .iter()
            .map(|name| Column {
                name: name.trim().to_string(),
                values: Some(Vec::new()),
                first_missing: None,
            })
            .collect();

        let mut n_rows = 0usize;
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected,
                    got: record.len(),
                });
            }
            for (column, raw) in columns.iter_mut().zip(record.iter()) {
                column.push(row_index, raw);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let (numeric, dropped): (Vec<Column>, Vec<Column>) =
            columns.into_iter().partition(|c| c.values.is_some());
        let dropped: Vec<String> = dropped.into_iter().map(|c| c.name).collect();
        if !dropped.is_empty() {
            warn!(columns = ?dropped, "dropping non-numeric columns");
        }

        if let Some((row_index, column, raw)) = numeric
            .iter()
            .filter_map(|c| c.first_missing.as_ref().map(|(row, raw)| (*row, &c.name, raw)))
            .min_by_key(|&(row, _, _)| row)
        {
            return Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                column: column.clone(),
                raw: raw.clone(),
            });
        }

        let Some(target_pos) = numeric.iter().position(|c| c.name == self.target) else {
            return Err(IoError::MissingTargetColumn {
                path: self.path.clone(),
                target: self.target.clone(),
            });
        };
        if numeric.len() < 2 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
                target: self.target.clone(),
            });
        }

        let mut feature_names = Vec::with_capacity(numeric.len() - 1);
        let mut feature_columns = Vec::with_capacity(numeric.len() - 1);
        let mut target_values = Vec::new();
        for (pos, column) in numeric.into_iter().enumerate() {
            let values = column.values.unwrap_or_default();
            if pos == target_pos {
                target_values = values;
            } else {
                feature_names.push(column.name);
                feature_columns.push(values);
            }
        }

        let labels = target_values
            .iter()
            .enumerate()
            .map(|(row_index, &value)| {
                if value < 0.0 || value.fract() != 0.0 {
                    Err(IoError::InvalidLabel {
                        path: self.path.clone(),
                        row_index,
                        value,
                    })
                } else {
                    Ok(value as usize)
                }
            })
            .collect::<Result<Vec<usize>, IoError>>()?;

        let features: Vec<Vec<f64>> = (0..n_rows)
            .map(|row| feature_columns.iter().map(|col| col[row]).collect())
            .collect();

        info!(
            n_samples = n_rows,
            n_features = feature_names.len(),
            n_dropped = dropped.len(),
            "loaded dataset"
        );

        Ok(LabeledDataset::new(
            self.target.clone(),
            feature_names,
            features,
            labels,
            dropped,
        ))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn read(content: &str, target: &str) -> Result<LabeledDataset, IoError> {
        let f = write_csv(content);
        DatasetReader::new(f.path(), target).read()
    }

    #[test]
    fn reads_features_and_labels() {
        let ds = read("Diabetes_012,BMI,Age\n0.0,25.5,7\n2.0,31.0,9\n1,28.0,5\n", "Diabetes_012").unwrap();
        assert_eq!(ds.feature_names(), ["BMI", "Age"]);
        assert_eq!(ds.labels(), [0, 2, 1]);
        assert_eq!(ds.features()[1], vec![31.0, 9.0]);
        assert!(ds.dropped_columns().is_empty());
    }

    #[test]
    fn drops_text_columns() {
        let ds = read("id,x,y\nA,1,0\nB,2,1\n", "y").unwrap();
        assert_eq!(ds.feature_names(), ["x"]);
        assert_eq!(ds.dropped_columns(), ["id"]);
    }

    #[test]
    fn missing_file() {
        let err = DatasetReader::new(Path::new("/nonexistent/diabetes.csv"), "y")
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn missing_or_textual_target() {
        assert!(matches!(
            read("x,z\n1,2\n", "y").unwrap_err(),
            IoError::MissingTargetColumn { .. }
        ));
        assert!(matches!(
            read("x,y\n1,a\n", "y").unwrap_err(),
            IoError::MissingTargetColumn { .. }
        ));
    }

    #[test]
    fn empty_and_featureless() {
        assert!(matches!(read("x,y\n", "y").unwrap_err(), IoError::EmptyDataset { .. }));
        assert!(matches!(
            read("name,y\nA,1\n", "y").unwrap_err(),
            IoError::NoFeatureColumns { .. }
        ));
    }

    #[test]
    fn non_finite_and_missing_cells() {
        let err = read("x,y\n1,0\nNaN,1\n", "y").unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { row_index: 1, ref column, .. } if column == "x"));
        let err = read("x,y\n1,0\n2,\n", "y").unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { row_index: 1, ref column, .. } if column == "y"));
    }

    #[test]
    fn invalid_labels() {
        assert!(matches!(
            read("x,y\n1,0.5\n", "y").unwrap_err(),
            IoError::InvalidLabel { row_index: 0, .. }
        ));
        assert!(matches!(
            read("x,y\n1,1\n2,-1\n", "y").unwrap_err(),
            IoError::InvalidLabel { row_index: 1, .. }
        ));
    }

    #[test]
    fn ragged_row() {
        let err = read("x,y\n1,0\n2\n", "y").unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength { row_index: 1, expected: 2, got: 1, .. }
        ));
    }
}
