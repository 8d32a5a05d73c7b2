//! Persisted model artifact.
//!
//! Layout on disk: one prefix byte, one version byte, then the bitcode
//! encoding of the stored artifact. The forest itself travels inside that
//! envelope as aprender's bincode serialization.

use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ForestConfig;
use crate::constants::artifact::{ARTIFACT_VERSION, BITCODE_PREFIX, PARTIAL_EXTENSION};
use crate::errors::SortpickError;
use crate::features::{FEATURE_NAMES, FeatureVector};
use crate::forest::{Classifier, RandomForest};
use crate::sorting::Algorithm;

/// Forest hyperparameters as persisted, in fixed-width integers.
#[derive(Clone, Debug, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct PersistedForestParams {
    /// Number of trees.
    pub trees: u64,
    /// Maximum depth, if limited.
    pub max_depth: Option<u64>,
    /// Forest seed.
    pub seed: u64,
}

impl From<&ForestConfig> for PersistedForestParams {
    fn from(config: &ForestConfig) -> Self {
        Self {
            trees: config.trees as u64,
            max_depth: config.max_depth.map(|d| d as u64),
            seed: config.seed,
        }
    }
}

/// Provenance recorded alongside the classifier.
#[derive(Clone, Debug, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct TrainingMetadata {
    /// Hyperparameters the forest was fit with.
    pub forest: PersistedForestParams,
    /// Base seed of the generated dataset; `None` for imported datasets.
    pub dataset_seed: Option<u64>,
    /// Examples in the full dataset (train plus test).
    pub examples: u64,
    /// Held-out accuracy.
    pub accuracy: f64,
    /// Training time, seconds since the Unix epoch.
    pub trained_at: i64,
}

impl TrainingMetadata {
    /// Training time as a UTC timestamp.
    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.trained_at, 0)
    }
}

/// Wire form of [`ModelArtifact`].
#[derive(bitcode::Encode, bitcode::Decode)]
struct StoredArtifact {
    feature_names: Vec<String>,
    classes: Vec<Algorithm>,
    model: Vec<u8>,
    metadata: TrainingMetadata,
}

/// Trained classifier plus everything needed to audit where it came from.
#[derive(Clone, Debug)]
pub struct ModelArtifact {
    feature_names: Vec<String>,
    forest: RandomForest,
    metadata: TrainingMetadata,
}

impl ModelArtifact {
    /// Wrap a fitted forest, stamping the current time.
    pub fn new(
        forest: RandomForest,
        config: &ForestConfig,
        dataset_seed: Option<u64>,
        examples: usize,
        accuracy: f64,
    ) -> Self {
        Self {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            forest,
            metadata: TrainingMetadata {
                forest: config.into(),
                dataset_seed,
                examples: examples as u64,
                accuracy,
                trained_at: Utc::now().timestamp(),
            },
        }
    }

    /// Underlying forest.
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Provenance of this model.
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    /// Feature names the model was trained on, in input order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Encode with format prefix and version byte.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SortpickError> {
        let stored = StoredArtifact {
            feature_names: self.feature_names.clone(),
            classes: self.forest.classes().to_vec(),
            model: self.forest.model_bytes()?,
            metadata: self.metadata.clone(),
        };
        let payload = bitcode::encode(&stored);
        let mut out = Vec::with_capacity(2 + payload.len());
        out.push(BITCODE_PREFIX);
        out.push(ARTIFACT_VERSION);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode and validate bytes produced by [`ModelArtifact::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SortpickError> {
        let Some((&prefix, rest)) = bytes.split_first() else {
            return Err(SortpickError::Artifact("artifact is empty".to_string()));
        };
        if prefix != BITCODE_PREFIX {
            return Err(SortpickError::Artifact(
                "bitcode payload missing expected prefix".to_string(),
            ));
        }
        let Some((&version, payload)) = rest.split_first() else {
            return Err(SortpickError::Artifact("artifact has no version byte".to_string()));
        };
        if version != ARTIFACT_VERSION {
            return Err(SortpickError::Artifact(format!(
                "unsupported artifact version {version} (expected {ARTIFACT_VERSION})"
            )));
        }
        let stored: StoredArtifact = bitcode::decode(payload)
            .map_err(|err| SortpickError::Artifact(format!("failed to decode artifact: {err}")))?;
        if stored.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(SortpickError::Artifact(format!(
                "artifact features {:?} do not match {:?}",
                stored.feature_names, FEATURE_NAMES
            )));
        }
        Ok(Self {
            forest: RandomForest::from_parts(stored.classes, &stored.model)?,
            feature_names: stored.feature_names,
            metadata: stored.metadata,
        })
    }

    /// Write atomically: encode into a sibling `.partial` file, then rename
    /// over `path`. An interrupted save leaves any previous model intact.
    pub fn save(&self, path: &Path) -> Result<(), SortpickError> {
        ensure_parent_dir(path)?;
        let partial = partial_path(path);
        fs::write(&partial, self.to_bytes()?)?;
        if let Err(err) = fs::rename(&partial, path) {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }
        info!(
            path = %path.display(),
            classes = self.forest.classes().len(),
            trees = self.metadata.forest.trees,
            "saved model artifact"
        );
        Ok(())
    }

    /// Read and validate an artifact from `path`.
    ///
    /// A file that cannot be read is [`SortpickError::ModelUnavailable`]; one
    /// that reads but does not decode is [`SortpickError::Artifact`].
    pub fn load(path: &Path) -> Result<Self, SortpickError> {
        let bytes = fs::read(path).map_err(|err| SortpickError::ModelUnavailable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let artifact = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            classes = ?artifact.forest.classes(),
            accuracy = artifact.metadata.accuracy,
            "loaded model artifact"
        );
        Ok(artifact)
    }
}

impl Classifier for ModelArtifact {
    fn classes(&self) -> &[Algorithm] {
        self.forest.classes()
    }

    fn predict(&self, features: &FeatureVector) -> Algorithm {
        self.forest.predict(features)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Option<Vec<(Algorithm, f64)>> {
        self.forest.predict_proba(features)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_EXTENSION);
    path.with_file_name(name)
}

fn ensure_parent_dir(path: &Path) -> Result<(), SortpickError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn artifact() -> ModelArtifact {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..10 {
            rows.push([10.0, 1.0, 1.0, 9.0, 5.0, 2.0, 1.0]);
            labels.push(Algorithm::Bubble);
            rows.push([10.0, 0.1, 1.0, 9.0, 5.0, 2.0, 0.1]);
            labels.push(Algorithm::Quick);
        }
        let config = ForestConfig {
            trees: 5,
            ..ForestConfig::default()
        };
        let forest = RandomForest::fit(&rows, &labels, &config).unwrap();
        ModelArtifact::new(forest, &config, Some(7), rows.len(), 1.0)
    }

    #[test]
    fn save_then_load_restores_the_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        let original = artifact();
        original.save(&path).unwrap();
        assert!(!partial_path(&path).exists());

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.to_bytes().unwrap(), original.to_bytes().unwrap());
        assert_eq!(loaded.metadata(), original.metadata());
        assert_eq!(loaded.metadata().dataset_seed, Some(7));
        assert_eq!(loaded.metadata().forest.trees, 5);
        assert!(loaded.metadata().trained_at().is_some());
        assert_eq!(loaded.classes(), &[Algorithm::Bubble, Algorithm::Quick]);

        let sorted = FeatureVector::from_array([10.0, 1.0, 1.0, 9.0, 5.0, 2.0, 1.0]);
        assert_eq!(loaded.predict(&sorted), Algorithm::Bubble);
        assert_eq!(loaded.predict_proba(&sorted), original.predict_proba(&sorted));
    }

    #[test]
    fn missing_file_is_model_unavailable() {
        let dir = tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, SortpickError::ModelUnavailable { .. }));
    }

    #[test]
    fn corrupt_bytes_are_rejected() {
        let bytes = artifact().to_bytes().unwrap();

        let mut wrong_prefix = bytes.clone();
        wrong_prefix[0] = b'X';
        assert!(matches!(
            ModelArtifact::from_bytes(&wrong_prefix),
            Err(SortpickError::Artifact(_))
        ));

        let mut wrong_version = bytes.clone();
        wrong_version[1] = ARTIFACT_VERSION + 1;
        let err = ModelArtifact::from_bytes(&wrong_version).unwrap_err();
        assert!(err.to_string().contains("version"));

        assert!(ModelArtifact::from_bytes(&bytes[..bytes.len() / 2]).is_err());
        assert!(ModelArtifact::from_bytes(&[]).is_err());
    }

    #[test]
    fn failed_save_keeps_the_previous_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let original = artifact();
        original.save(&path).unwrap();

        // A directory squatting on the partial path makes the write fail.
        fs::create_dir(partial_path(&path)).unwrap();
        assert!(original.save(&path).is_err());
        assert_eq!(
            ModelArtifact::load(&path).unwrap().to_bytes().unwrap(),
            original.to_bytes().unwrap()
        );
    }
}
