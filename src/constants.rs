use crate::sorting::Algorithm;

/// Constants used by the synthetic corpus generator.
pub mod corpus {
    /// Smallest value drawn by the `uniform` distribution (inclusive).
    pub const UNIFORM_MIN: i64 = 1;
    /// Largest value drawn by the `uniform` distribution (inclusive).
    pub const UNIFORM_MAX: i64 = 100;
    /// One random pairwise swap is applied per this many elements of a `nearly_sorted` sequence.
    pub const NEARLY_SORTED_SWAP_DIVISOR: usize = 20;
    /// Pool size of a `few_unique` sequence is its length divided by this value.
    pub const FEW_UNIQUE_POOL_DIVISOR: usize = 5;
    /// Lower bound on the `few_unique` pool size.
    pub const FEW_UNIQUE_POOL_MIN: usize = 2;
    /// Largest value placed into a `few_unique` pool (values start at 1).
    pub const FEW_UNIQUE_VALUE_MAX: i64 = 5;
}

/// Constants used by dataset generation and export.
pub mod dataset {
    /// Default number of labeled examples generated for one training run.
    pub const DEFAULT_SAMPLE_COUNT: usize = 1800;
    /// Default sequence sizes sampled during dataset generation.
    pub const DEFAULT_SIZES: [usize; 4] = [10, 20, 30, 50];
    /// Default filename for the CSV dataset export.
    pub const DEFAULT_DATASET_FILENAME: &str = "benchmark_dataset.csv";
    /// Emit a progress log line every this many generated examples.
    pub const PROGRESS_LOG_INTERVAL: usize = 500;
}

/// Constants used by the train/test split and the forest.
pub mod training {
    /// Fraction of examples held out for evaluation.
    pub const DEFAULT_TEST_RATIO: f64 = 0.2;
    /// Seed for the stratified split.
    pub const DEFAULT_SPLIT_SEED: u64 = 42;
    /// Minimum examples per label for a stratified split.
    pub const MIN_EXAMPLES_PER_LABEL: usize = 2;
    /// Number of trees in the forest.
    pub const DEFAULT_TREE_COUNT: usize = 200;
    /// Seed for bootstrap sampling.
    pub const DEFAULT_FOREST_SEED: u64 = 42;
}

/// Constants used by the persisted model artifact.
pub mod artifact {
    /// Prefix marker for bitcode-encoded artifact payloads.
    pub const BITCODE_PREFIX: u8 = b'B';
    /// Version tag of the artifact layout.
    pub const ARTIFACT_VERSION: u8 = 1;
    /// Default filename for the persisted model.
    pub const DEFAULT_MODEL_FILENAME: &str = "model.bin";
    /// Extension used for the temporary file written before the final rename.
    pub const PARTIAL_EXTENSION: &str = "partial";
}

/// Constants used by the prediction service.
pub mod service {
    use super::Algorithm;

    /// Default listen address for the HTTP transport.
    pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
    /// Environment variable consulted for the model path when no flag is given.
    pub const MODEL_PATH_ENV: &str = "SORTPICK_MODEL";
    /// Algorithm answered when no trained model is loaded.
    pub const FALLBACK_ALGORITHM: Algorithm = Algorithm::Merge;
    /// Error message attached to fallback responses.
    pub const MISSING_MODEL_MESSAGE: &str = "model not found. Run training script on server.";
    /// Static body for the liveness check.
    pub const HEALTH_STATUS: &str = "ok";
    /// Largest request body read by the HTTP transport.
    pub const MAX_REQUEST_BYTES: u64 = 1 << 20;
}
