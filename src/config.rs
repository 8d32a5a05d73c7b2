use std::env;
use std::path::PathBuf;

use crate::constants::artifact::DEFAULT_MODEL_FILENAME;
use crate::constants::dataset::{DEFAULT_SAMPLE_COUNT, DEFAULT_SIZES};
use crate::constants::service::{DEFAULT_ADDR, MODEL_PATH_ENV};
use crate::constants::training::{
    DEFAULT_FOREST_SEED, DEFAULT_SPLIT_SEED, DEFAULT_TEST_RATIO, DEFAULT_TREE_COUNT,
};
use crate::corpus::Distribution;
use crate::errors::SortpickError;
use crate::labeler::CostKind;

/// Controls synthetic dataset generation.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetConfig {
    /// Number of labeled examples to generate.
    pub samples: usize,
    /// Sequence lengths; each example picks one uniformly.
    pub sizes: Vec<usize>,
    /// Input distributions; each example picks one uniformly.
    pub distributions: Vec<Distribution>,
    /// Base seed for sequence generation. `None` draws one (and logs it).
    ///
    /// Timings are never reproducible, so a fixed seed reproduces sequences
    /// and features but not necessarily wall-clock labels.
    pub seed: Option<u64>,
    /// Cost function used to pick each label.
    pub cost: CostKind,
    /// Label examples on the rayon pool instead of the calling thread.
    pub parallel: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLE_COUNT,
            sizes: DEFAULT_SIZES.to_vec(),
            distributions: Distribution::ALL.to_vec(),
            seed: None,
            cost: CostKind::WallClock,
            parallel: true,
        }
    }
}

impl DatasetConfig {
    /// Reject configurations that cannot produce a dataset.
    pub fn validate(&self) -> Result<(), SortpickError> {
        if self.samples == 0 {
            return Err(SortpickError::Configuration(
                "samples must be greater than zero".to_string(),
            ));
        }
        if self.sizes.is_empty() {
            return Err(SortpickError::Configuration(
                "at least one sequence size is required".to_string(),
            ));
        }
        if self.sizes.contains(&0) {
            return Err(SortpickError::Configuration(
                "sequence sizes must be greater than zero".to_string(),
            ));
        }
        if self.distributions.is_empty() {
            return Err(SortpickError::Configuration(
                "at least one distribution is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Random forest hyperparameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ForestConfig {
    /// Number of trees.
    pub trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Seed for bootstrap sampling; tree `i` draws with `seed + i`.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: DEFAULT_TREE_COUNT,
            max_depth: None,
            seed: DEFAULT_FOREST_SEED,
        }
    }
}

impl ForestConfig {
    /// Reject hyperparameters the forest cannot fit with.
    pub fn validate(&self) -> Result<(), SortpickError> {
        if self.trees == 0 {
            return Err(SortpickError::Configuration(
                "forest needs at least one tree".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(SortpickError::Configuration(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.seed.checked_add(self.trees as u64).is_none() {
            return Err(SortpickError::Configuration(format!(
                "seed {} leaves no room for {} per-tree seeds",
                self.seed, self.trees
            )));
        }
        Ok(())
    }
}

/// Top-level training configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    /// Dataset generation settings.
    pub dataset: DatasetConfig,
    /// Classifier settings.
    pub forest: ForestConfig,
    /// Fraction of examples held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the stratified split.
    pub split_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            forest: ForestConfig::default(),
            test_ratio: DEFAULT_TEST_RATIO,
            split_seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl TrainingConfig {
    /// Validate every nested section.
    pub fn validate(&self) -> Result<(), SortpickError> {
        self.dataset.validate()?;
        self.forest.validate()?;
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(SortpickError::Configuration(format!(
                "test_ratio must lie strictly between 0 and 1, got {}",
                self.test_ratio
            )));
        }
        Ok(())
    }
}

/// Prediction service settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    /// `host:port` to listen on.
    pub addr: String,
    /// Model artifact to load at startup.
    pub model_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            model_path: resolve_model_path(None),
        }
    }
}

/// Resolve the model path: explicit value, then `SORTPICK_MODEL`, then the
/// default filename in the working directory.
pub fn resolve_model_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            env::var_os(MODEL_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TrainingConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_degenerate_settings() {
        let mut config = TrainingConfig::default();
        config.dataset.samples = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.dataset.sizes = vec![10, 0];
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.dataset.distributions.clear();
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.test_ratio = 1.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.forest.trees = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.forest.max_depth = Some(0);
        assert!(matches!(
            config.validate(),
            Err(SortpickError::Configuration(_))
        ));

        let mut config = TrainingConfig::default();
        config.forest.seed = u64::MAX - 1;
        assert!(matches!(
            config.validate(),
            Err(SortpickError::Configuration(_))
        ));
    }

    #[test]
    fn explicit_model_path_wins() {
        let path = resolve_model_path(Some(PathBuf::from("/tmp/explicit.bin")));
        assert_eq!(path, PathBuf::from("/tmp/explicit.bin"));
    }
}
