//! The persisted best model

use super::serializer::{decode, encode, ModelMetadata, SerializationFormat};
use crate::data::FeatureMatrix;
use crate::error::{Result, SpendingError};
use crate::preprocessing::StandardScaler;
use crate::training::{CandidateModel, Regressor};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A fitted model with everything needed to score raw feature rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    /// Scaler fitted during outlier filtering; the model was trained on its output
    pub scaler: StandardScaler,
    pub model: CandidateModel,
}

impl ModelArtifact {
    pub fn new(metadata: ModelMetadata, scaler: StandardScaler, model: CandidateModel) -> Self {
        Self {
            metadata,
            scaler,
            model,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.metadata.identifier
    }

    /// Predict from unscaled features. Columns must match the training
    /// columns by name and order.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Array1<f64>> {
        if features.columns() != self.metadata.feature_names.as_slice() {
            return Err(SpendingError::ShapeError {
                expected: format!("columns {:?}", self.metadata.feature_names),
                actual: format!("columns {:?}", features.columns()),
            });
        }
        let scaled = self.scaler.transform(features.values())?;
        self.model.predict(&scaled)
    }
}

/// `<dir>/<identifier>_best_model.<ext>`
pub fn artifact_path(dir: &Path, identifier: &str, format: SerializationFormat) -> PathBuf {
    dir.join(format!("{}_best_model.{}", identifier, format.extension()))
}

/// Write `artifact` into `dir`, replacing any file already at the target path.
///
/// The artifact is fully encoded before the file is opened, so an encoding
/// failure leaves the directory untouched.
pub fn save_model(artifact: &ModelArtifact, dir: &Path, format: SerializationFormat) -> Result<PathBuf> {
    let bytes = encode(artifact, format)?;

    fs::create_dir_all(dir).map_err(|e| {
        SpendingError::Persistence(format!("failed to create {}: {}", dir.display(), e))
    })?;

    let path = artifact_path(dir, artifact.identifier(), format);
    fs::write(&path, &bytes).map_err(|e| {
        SpendingError::Persistence(format!("failed to write {}: {}", path.display(), e))
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "Saved model artifact");
    Ok(path)
}

/// Read an artifact written by [`save_model`]; the format follows the extension
pub fn load_model(path: &Path) -> Result<ModelArtifact> {
    let format = SerializationFormat::from_path(path)?;
    let bytes = fs::read(path).map_err(|e| {
        SpendingError::Persistence(format!("failed to read {}: {}", path.display(), e))
    })?;
    decode(&bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::LinearRegression;
    use ndarray::array;
    use tempfile::TempDir;

    fn fitted_artifact() -> ModelArtifact {
        let raw = array![[1.0, 10.0], [2.0, 20.0], [3.0, 10.0], [4.0, 20.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&raw).unwrap();
        let mut model = LinearRegression::new();
        model.fit(&scaled, &y).unwrap();

        let metadata = ModelMetadata::new("LinearRegression")
            .with_features(vec!["a".to_string(), "b".to_string()])
            .with_target("total spending")
            .add_metric("mape", 0.0);
        ModelArtifact::new(metadata, scaler, CandidateModel::LinearRegression(model))
    }

    fn raw_features(columns: &[&str]) -> FeatureMatrix {
        FeatureMatrix::new(
            columns.iter().map(|c| c.to_string()).collect(),
            array![[5.0, 10.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_artifact_path() {
        let path = artifact_path(Path::new("out"), "RandomForest", SerializationFormat::Binary);
        assert_eq!(path, Path::new("out").join("RandomForest_best_model.bin"));
        let path = artifact_path(Path::new("out"), "LinearRegression", SerializationFormat::Json);
        assert_eq!(path, Path::new("out").join("LinearRegression_best_model.json"));
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = TempDir::new().unwrap();
        let artifact = fitted_artifact();

        for format in [SerializationFormat::Binary, SerializationFormat::Json] {
            let path = save_model(&artifact, dir.path(), format).unwrap();
            let loaded = load_model(&path).unwrap();
            assert_eq!(loaded.metadata, artifact.metadata);
            assert_eq!(loaded.scaler, artifact.scaler);
            let features = raw_features(&["a", "b"]);
            let expected = artifact.predict(&features).unwrap();
            assert_eq!(loaded.predict(&features).unwrap(), expected);
            assert!((expected[0] - 11.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_save_overwrites_silently() {
        let dir = TempDir::new().unwrap();
        let path = artifact_path(dir.path(), "LinearRegression", SerializationFormat::Binary);
        fs::write(&path, b"stale").unwrap();

        let written = save_model(&fitted_artifact(), dir.path(), SerializationFormat::Binary).unwrap();
        assert_eq!(written, path);
        assert!(load_model(&path).is_ok());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("models").join("latest");
        let path = save_model(&fitted_artifact(), &nested, SerializationFormat::Binary).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_predict_checks_column_order() {
        let artifact = fitted_artifact();
        let swapped = raw_features(&["b", "a"]);
        assert!(matches!(artifact.predict(&swapped), Err(SpendingError::ShapeError { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_model(&dir.path().join("RandomForest_best_model.bin")).unwrap_err();
        assert!(matches!(err, SpendingError::Persistence(_)));
    }
}
