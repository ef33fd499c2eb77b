//! Report artifact writer: importance CSV, importance chart, metrics JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::chart::ImportanceChart;
use crate::domain::RunMetrics;

/// File name of the importance table.
pub const IMPORTANCES_CSV: &str = "rf_smote_feature_importances.csv";

/// File name of the importance chart.
pub const IMPORTANCES_PNG: &str = "rf_smote_feature_importances.png";

/// Writes report artifacts into one output directory.
///
/// Creates the output directory on construction if it does not exist.
pub struct ReportWriter {
    output_dir: PathBuf,
}

/// One row of the importance CSV.
#[derive(Serialize)]
struct ImportanceRow<'a> {
    feature: &'a str,
    importance: f64,
}

impl ReportWriter {
    /// Create a writer targeting `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Return the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `ranked` to [`IMPORTANCES_CSV`] with header `feature,importance`.
    ///
    /// Rows are written in the given order; callers pass them sorted by
    /// descending importance.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::WriteFile`] | file could not be created or flushed |
    /// | [`IoError::WriteCsv`] | a record could not be encoded |
    #[instrument(skip_all)]
    pub fn write_importances(&self, ranked: &[(&str, f64)]) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(IMPORTANCES_CSV);
        let csv_err = |source| IoError::WriteCsv {
            path: path.clone(),
            source,
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_err)?;
        for &(feature, importance) in ranked {
            wtr.serialize(ImportanceRow { feature, importance })
                .map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_features = ranked.len(), "importance table written");
        Ok(path)
    }

    /// Render `ranked` to [`IMPORTANCES_PNG`].
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Chart`] if rendering fails.
    pub fn write_chart(&self, chart: &ImportanceChart, ranked: &[(&str, f64)]) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(IMPORTANCES_PNG);
        chart.render(&path, ranked)?;
        Ok(path)
    }

    /// Write `metrics` as pretty JSON to `path`.
    ///
    /// A relative `path` is taken as given, not joined to the output
    /// directory. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::OutputDirCreate`] | parent directory could not be created |
    /// | [`IoError::WriteFile`] | file could not be written |
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_metrics(&self, path: &Path, metrics: &RunMetrics<'_>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(metrics).map_err(|e| IoError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IoError::OutputDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(path = %path.display(), "metrics written");
        Ok(())
    }
}
