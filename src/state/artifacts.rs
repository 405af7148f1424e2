use crate::config::ArtifactConfig;
use crate::error::{AppError, Result};
use crate::ml::models::Metrics;
use crate::ml::service::EnrollmentModel;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Trait for model artifact persistence
pub trait ArtifactStore: Send + Sync {
    /// Persist the model blob and its metrics document
    fn save(&self, model: &EnrollmentModel, metrics: &Metrics) -> Result<()>;

    /// Load the model and metrics written by the last `save`
    fn load(&self) -> Result<(EnrollmentModel, Metrics)>;

    /// Whether an artifact is available to load
    fn exists(&self) -> bool;
}

/// Directory-backed store: a bincode model blob next to a pretty JSON metrics file
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    model_path: PathBuf,
    metrics_path: PathBuf,
}

impl FsArtifactStore {
    /// Create a store in `dir` with the default file names
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::from_config(&ArtifactConfig {
            dir: dir.as_ref().to_path_buf(),
            ..ArtifactConfig::default()
        })
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self {
            model_path: config.model_path(),
            metrics_path: config.metrics_path(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, model: &EnrollmentModel, metrics: &Metrics) -> Result<()> {
        Self::ensure_parent(&self.model_path)?;
        Self::ensure_parent(&self.metrics_path)?;

        fs::write(&self.model_path, bincode::serialize(model)?)?;
        fs::write(&self.metrics_path, serde_json::to_string_pretty(metrics)?)?;

        tracing::info!(
            model = %self.model_path.display(),
            metrics = %self.metrics_path.display(),
            "Artifacts saved"
        );
        Ok(())
    }

    fn load(&self) -> Result<(EnrollmentModel, Metrics)> {
        let model: EnrollmentModel = bincode::deserialize(&Self::read(&self.model_path)?)?;
        let metrics: Metrics = serde_json::from_slice(&Self::read(&self.metrics_path)?)?;

        tracing::debug!(model = %self.model_path.display(), "Artifacts loaded");
        Ok((model, metrics))
    }

    fn exists(&self) -> bool {
        self.model_path.is_file() && self.metrics_path.is_file()
    }
}

/// In-process store holding the encoded artifact, for tests
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifact: RwLock<Option<(Vec<u8>, String)>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn save(&self, model: &EnrollmentModel, metrics: &Metrics) -> Result<()> {
        let encoded = (bincode::serialize(model)?, serde_json::to_string(metrics)?);
        let mut artifact = self
            .artifact
            .write()
            .map_err(|_| AppError::Internal("artifact lock poisoned".to_string()))?;
        *artifact = Some(encoded);
        Ok(())
    }

    fn load(&self) -> Result<(EnrollmentModel, Metrics)> {
        let artifact = self
            .artifact
            .read()
            .map_err(|_| AppError::Internal("artifact lock poisoned".to_string()))?;
        match artifact.as_ref() {
            Some((model, metrics)) => Ok((
                bincode::deserialize(model)?,
                serde_json::from_str(metrics)?,
            )),
            None => Err(AppError::ModelNotLoaded),
        }
    }

    fn exists(&self) -> bool {
        self.artifact
            .read()
            .map(|artifact| artifact.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::LogisticRegressionClassifier;
    use crate::ml::features::FeaturePipeline;
    use tempfile::TempDir;

    fn metrics() -> Metrics {
        Metrics {
            accuracy: 0.75,
            precision: 0.5,
            recall: 0.25,
            f1: 0.3125,
            roc_auc: 0.875,
        }
    }

    fn untrained_model() -> EnrollmentModel {
        EnrollmentModel::new(
            FeaturePipeline::new(),
            LogisticRegressionClassifier::new(10, 1.0),
        )
    }

    #[test]
    fn test_fs_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path().join("nested"));
        assert!(!store.exists());

        store.save(&untrained_model(), &metrics()).unwrap();
        assert!(store.exists());

        let (model, loaded) = store.load().unwrap();
        assert_eq!(loaded, metrics());
        assert_eq!(model.metadata().hyperparameters["max_iterations"], "10");
    }

    #[test]
    fn test_metrics_file_is_pretty_json() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.save(&untrained_model(), &metrics()).unwrap();

        let text = fs::read_to_string(store.metrics_path()).unwrap();
        assert!(text.contains("\n  \"accuracy\": 0.75"));
        assert!(store.model_path().ends_with("model.bin"));
    }

    #[test]
    fn test_fs_store_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, AppError::Io(ref e) if e.to_string().contains("model.bin")));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryArtifactStore::new();
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(AppError::ModelNotLoaded)));

        store.save(&untrained_model(), &metrics()).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap().1, metrics());
    }
}
