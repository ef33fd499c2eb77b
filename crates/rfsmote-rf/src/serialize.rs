//! Model persistence via bincode.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Header written ahead of the forest so a reader can reject foreign files
/// before decoding any trees.
#[derive(Serialize, Deserialize)]
struct Header {
    format_version: u32,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    /// Write the fitted forest to `path` as a version header followed by
    /// the bincode-encoded forest.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::WriteModel`] | file could not be created or flushed |
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let write_err = |source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
        let header = Header {
            format_version: FORMAT_VERSION,
            n_features: self.n_features,
            n_classes: self.n_classes,
        };
        bincode::serialize_into(&mut writer, &header)
            .and_then(|()| bincode::serialize_into(&mut writer, self))
            .map_err(|source| RfError::SerializeModel { source })?;
        writer.flush().map_err(write_err)?;

        info!(
            n_trees = self.trees.len(),
            n_features = self.n_features,
            "model saved"
        );
        Ok(())
    }

    /// Read a forest written by [`RandomForest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file could not be opened |
    /// | [`RfError::DeserializeModel`] | header or forest failed to decode |
    /// | [`RfError::IncompatibleModelVersion`] | header carries another format version |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let decode_err = |source| RfError::DeserializeModel {
            path: path.to_path_buf(),
            source,
        };

        let header: Header = bincode::deserialize_from(&mut reader).map_err(decode_err)?;
        if header.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: header.format_version,
                path: path.to_path_buf(),
            });
        }

        let forest: RandomForest = bincode::deserialize_from(&mut reader).map_err(decode_err)?;
        debug!(
            n_trees = forest.trees.len(),
            n_features = header.n_features,
            n_classes = header.n_classes,
            "model loaded"
        );
        Ok(forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{FORMAT_VERSION, Header};
    use crate::class_weight::ClassWeight;
    use crate::config::RandomForestConfig;
    use crate::forest::RandomForest;
    use crate::RfError;

    fn fitted() -> RandomForest {
        let features: Vec<Vec<f64>> = (0..24).map(|i| vec![i as f64, (i % 4) as f64]).collect();
        let labels: Vec<usize> = (0..24).map(|i| usize::from(i > 17)).collect();
        let names = vec!["x".to_string(), "y".to_string()];
        RandomForestConfig::new(6)
            .unwrap()
            .with_seed(7)
            .with_class_weight(ClassWeight::Balanced)
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest()
    }

    #[test]
    fn saved_model_predicts_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forest.bin");
        let forest = fitted();
        forest.save(&path).unwrap();
        let loaded = RandomForest::load(&path).unwrap();

        assert_eq!(loaded.feature_names(), forest.feature_names());
        for sample in [vec![2.0, 1.0], vec![20.0, 3.0], vec![17.5, 0.0]] {
            assert_eq!(
                forest.predict_proba(&sample).unwrap().as_slice(),
                loaded.predict_proba(&sample).unwrap().as_slice()
            );
        }
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, RfError::ReadModel { .. }));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"xy").unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, RfError::DeserializeModel { .. }));
    }

    #[test]
    fn foreign_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let header = Header {
            format_version: FORMAT_VERSION + 1,
            n_features: 2,
            n_classes: 2,
        };
        std::fs::write(&path, bincode::serialize(&header).unwrap()).unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            RfError::IncompatibleModelVersion { found, .. } if found == FORMAT_VERSION + 1
        ));
    }
}
