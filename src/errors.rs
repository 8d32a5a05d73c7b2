use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for measurement, training, persistence, and service failures.
#[derive(Debug, Error)]
pub enum SortpickError {
    #[error("model at '{}' is unavailable: {reason}", path.display())]
    ModelUnavailable { path: PathBuf, reason: String },
    #[error("model artifact is invalid: {0}")]
    Artifact(String),
    #[error("label '{label}' has {count} example(s); at least {required} are needed to stratify")]
    InsufficientData {
        label: String,
        count: usize,
        required: usize,
    },
    #[error("training failed: {0}")]
    Training(String),
    #[error("dataset row {row} is malformed: {details}")]
    Dataset { row: usize, details: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
