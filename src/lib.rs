#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runners shared by the binaries.
pub mod apps;
/// Persisted model artifact (bitcode, atomic save).
pub mod artifact;
/// Typed configuration with defaults.
pub mod config;
/// Centralized constants used across generation, training, and serving.
pub mod constants;
/// Synthetic sequence distributions.
pub mod corpus;
/// Labeled datasets and CSV export.
pub mod dataset;
/// Sequence feature extraction.
pub mod features;
/// Random forest classifier.
pub mod forest;
mod hash;
/// Cost models and winner selection.
pub mod labeler;
/// Evaluation and skew metrics.
pub mod metrics;
/// Prediction service and HTTP transport.
pub mod service;
/// Instrumented sorting algorithms.
pub mod sorting;
/// Stratified train/test splits.
pub mod splits;
/// Training orchestration.
pub mod training;

mod errors;

pub use artifact::ModelArtifact;
pub use config::{DatasetConfig, ForestConfig, ServiceConfig, TrainingConfig};
pub use corpus::{CorpusGenerator, Distribution};
pub use dataset::{Dataset, DatasetSummary, LabeledExample};
pub use errors::SortpickError;
pub use features::{FeatureVector, extract};
pub use forest::{Classifier, RandomForest};
pub use labeler::{CostKind, CostModel, Labeler, Labeling, TieBreak, label, select_winner};
pub use metrics::{ConfusionMatrix, TrainingReport};
pub use service::{Predictor, Recommendation, normalize_request};
pub use sorting::{Algorithm, Measurement};
pub use training::{TrainingOutcome, train, train_and_save, train_from_dataset};
