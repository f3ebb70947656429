//! Persisted fitted models, one JSON file per (model kind, window width).

use crate::classifier::Classifier;
use crate::error::ModelError;
use crate::registry::Model;
use chrono::{DateTime, Utc};
use sentistock_core::{FeatureColumn, ModelKind, ModelParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `<dir>/<kind>_window<W>.json`
#[must_use]
pub fn artifact_path(dir: &Path, kind: ModelKind, window: usize) -> PathBuf {
    dir.join(format!("{kind}_window{window}.json"))
}

/// A fitted model plus the metadata needed to feed it a live vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub window: usize,
    pub columns: Vec<FeatureColumn>,
    pub params: ModelParams,
    pub trained_at: DateTime<Utc>,
    pub train_size: usize,
    pub model: Model,
}

impl ModelArtifact {
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }

    /// Feature vector length the model expects.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.model
            .n_features()
            .unwrap_or(self.window * self.columns.len())
    }

    /// Writes the artifact through a temporary file and renames it into place.
    ///
    /// # Errors
    /// Returns [`ModelError::Io`] or [`ModelError::Json`].
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ModelError> {
        fs::create_dir_all(dir)?;
        let path = artifact_path(dir, self.kind(), self.window);
        let tmp = dir.join(format!(".{}_window{}.json.tmp", self.kind(), self.window));

        let json = serde_json::to_vec(self)?;
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(
            model = %self.kind(),
            window = self.window,
            path = %path.display(),
            "Saved model artifact"
        );
        Ok(path)
    }

    /// Loads the artifact for (`kind`, `window`).
    ///
    /// # Errors
    /// [`ModelError::MissingArtifact`] if no file exists, otherwise
    /// [`ModelError::Io`] or [`ModelError::Json`].
    pub fn load(dir: &Path, kind: ModelKind, window: usize) -> Result<Self, ModelError> {
        let path = artifact_path(dir, kind, window);
        if !path.exists() {
            return Err(ModelError::MissingArtifact { path });
        }
        let bytes = fs::read(&path)?;
        let artifact: Self = serde_json::from_slice(&bytes)?;
        debug!(model = %kind, window, path = %path.display(), "Loaded model artifact");
        Ok(artifact)
    }
}

/// Deletes the artifact for (`kind`, `window`). Returns false if there was none.
///
/// # Errors
/// Returns [`ModelError::Io`] if the file exists but cannot be removed.
pub fn remove_artifact(dir: &Path, kind: ModelKind, window: usize) -> Result<bool, ModelError> {
    let path = artifact_path(dir, kind, window);
    match fs::remove_file(&path) {
        Ok(()) => {
            info!(model = %kind, window, path = %path.display(), "Removed model artifact");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fitted(kind: ModelKind) -> ModelArtifact {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i), 1.0]).collect();
        let y: Vec<u8> = (0..40).map(|i| u8::from(i % 5 > 1)).collect();
        let params = ModelParams::default().with_estimators(5).with_max_depth(2);
        let mut model = Model::new(kind, &params).unwrap();
        model.fit(&x, &y).unwrap();
        ModelArtifact {
            window: 1,
            columns: vec![FeatureColumn::Close, FeatureColumn::Volume],
            params,
            trained_at: Utc::now(),
            train_size: x.len(),
            model,
        }
    }

    #[test]
    fn path_is_keyed_by_kind_and_window() {
        let path = artifact_path(Path::new("models"), ModelKind::LightGbm, 15);
        assert_eq!(path, PathBuf::from("models/lightgbm_window15.json"));
    }

    #[test]
    fn save_then_load_predicts_identically() {
        let dir = TempDir::new().unwrap();
        for kind in ModelKind::ALL {
            let artifact = fitted(kind);
            artifact.save(dir.path()).unwrap();
            let loaded = ModelArtifact::load(dir.path(), kind, 1).unwrap();
            assert_eq!(loaded.kind(), kind);
            let before = artifact.model.predict_proba(&[3.0, 1.0]).unwrap();
            let after = loaded.model.predict_proba(&[3.0, 1.0]).unwrap();
            assert!((before - after).abs() < 1e-9, "{kind}");
        }
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn missing_artifact_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = ModelArtifact::load(dir.path(), ModelKind::XgBoost, 30).unwrap_err();
        assert!(matches!(err, ModelError::MissingArtifact { .. }));
    }

    #[test]
    fn save_overwrites_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let mut first = fitted(ModelKind::DecisionTree);
        first.train_size = 1;
        first.save(dir.path()).unwrap();
        let second = fitted(ModelKind::DecisionTree);
        second.save(dir.path()).unwrap();
        let loaded = ModelArtifact::load(dir.path(), ModelKind::DecisionTree, 1).unwrap();
        assert_eq!(loaded.train_size, 40);
    }

    #[test]
    fn remove_deletes_only_the_named_artifact() {
        let dir = TempDir::new().unwrap();
        fitted(ModelKind::DecisionTree).save(dir.path()).unwrap();
        fitted(ModelKind::RandomForest).save(dir.path()).unwrap();

        assert!(remove_artifact(dir.path(), ModelKind::DecisionTree, 1).unwrap());
        assert!(!remove_artifact(dir.path(), ModelKind::DecisionTree, 1).unwrap());
        assert!(ModelArtifact::load(dir.path(), ModelKind::RandomForest, 1).is_ok());
    }
}
