//! Training orchestration: dataset, stratified split, forest, evaluation,
//! persistence.

use std::path::Path;
use tracing::{info, warn};

use crate::artifact::ModelArtifact;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::errors::SortpickError;
use crate::forest::{Classifier, RandomForest};
use crate::metrics::{ConfusionMatrix, TrainingReport};
use crate::splits::stratified_split;

/// Everything a training run produced.
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    /// The trained model, ready to save.
    pub artifact: ModelArtifact,
    /// Held-out evaluation.
    pub report: TrainingReport,
    /// Full dataset the model was trained and evaluated on.
    pub dataset: Dataset,
}

/// Generate a dataset per `config.dataset` and train on it.
pub fn train(config: &TrainingConfig) -> Result<TrainingOutcome, SortpickError> {
    config.validate()?;
    let dataset = Dataset::build(&config.dataset)?;
    train_from_dataset(dataset, config)
}

/// Train on an existing dataset, skipping generation.
///
/// Only the split and forest settings of `config` are used.
pub fn train_from_dataset(
    dataset: Dataset,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, SortpickError> {
    config.forest.validate()?;
    if dataset.is_empty() {
        return Err(SortpickError::Training("dataset is empty".to_string()));
    }

    let labels = dataset.labels();
    let rows = dataset.feature_rows();
    let split = stratified_split(&labels, config.test_ratio, config.split_seed)?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        "split dataset"
    );

    let train_rows: Vec<_> = split.train.iter().map(|&i| rows[i]).collect();
    let train_labels: Vec<_> = split.train.iter().map(|&i| labels[i]).collect();
    let forest = RandomForest::fit(&train_rows, &train_labels, &config.forest)?;

    let mut confusion = ConfusionMatrix::new(forest.classes());
    for &i in &split.test {
        let predicted = forest.predict(&dataset.examples()[i].features);
        confusion.record(labels[i], predicted);
    }
    let report = TrainingReport::from_confusion(split.train.len(), confusion);
    info!(accuracy = report.accuracy, macro_f1 = report.macro_f1, "evaluated model");
    if let Some(skew) = dataset.summary().label_skew
        && skew.labels < 2
    {
        warn!(
            label = ?skew.per_label.first().map(|share| share.label),
            "dataset has a single label; the model cannot discriminate"
        );
    }

    let artifact = ModelArtifact::new(
        forest,
        &config.forest,
        dataset.seed(),
        dataset.len(),
        report.accuracy,
    );
    Ok(TrainingOutcome {
        artifact,
        report,
        dataset,
    })
}

/// Train, then persist the model to `model_path` and the CSV export to
/// `dataset_path` (when given).
///
/// The model is only written after training succeeded, so a failed run never
/// replaces a previously saved model.
pub fn train_and_save(
    config: &TrainingConfig,
    model_path: &Path,
    dataset_path: Option<&Path>,
) -> Result<TrainingOutcome, SortpickError> {
    let outcome = train(config)?;
    if let Some(path) = dataset_path {
        outcome.dataset.save_csv(path)?;
    }
    outcome.artifact.save(model_path)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatasetConfig, ForestConfig};
    use crate::corpus::Distribution;
    use crate::dataset::LabeledExample;
    use crate::features::FeatureVector;
    use crate::labeler::{CostKind, Measurements, TieBreak};
    use crate::sorting::Algorithm;

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            dataset: DatasetConfig {
                samples: 120,
                sizes: vec![8, 16],
                // Merge sort wins both on comparisons, keeping labels stable.
                distributions: vec![Distribution::Reversed, Distribution::NearlySorted],
                seed: Some(5),
                cost: CostKind::Comparisons,
                ..DatasetConfig::default()
            },
            forest: ForestConfig {
                trees: 10,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        }
    }

    fn example(label: Algorithm, sortedness: f64) -> LabeledExample {
        LabeledExample {
            features: FeatureVector {
                size: 10,
                sortedness,
                ..FeatureVector::EMPTY
            },
            label,
            tie_break: TieBreak::Primary,
            distribution: Distribution::Uniform,
            measurements: Measurements::new(),
        }
    }

    #[test]
    fn trains_on_a_small_generated_corpus() {
        let outcome = train(&quick_config()).unwrap();
        assert_eq!(outcome.dataset.len(), 120);
        assert_eq!(
            outcome.report.train_size + outcome.report.test_size,
            outcome.dataset.len()
        );
        assert!((0.0..=1.0).contains(&outcome.report.accuracy));
        assert_eq!(outcome.artifact.metadata().examples, 120);
        assert_eq!(outcome.artifact.metadata().dataset_seed, Some(5));
    }

    #[test]
    fn separable_dataset_scores_perfectly() {
        let mut examples = Vec::new();
        for i in 0..20 {
            examples.push(example(Algorithm::Bubble, 0.9 + f64::from(i) / 1000.0));
            examples.push(example(Algorithm::Quick, 0.1 + f64::from(i) / 1000.0));
        }
        let outcome =
            train_from_dataset(Dataset::from_examples(examples), &quick_config()).unwrap();
        assert_eq!(outcome.report.accuracy, 1.0);
        assert_eq!(outcome.report.test_size, 8);
        assert_eq!(outcome.artifact.metadata().dataset_seed, None);
    }

    #[test]
    fn too_few_examples_per_label_fail() {
        let dataset = Dataset::from_examples(vec![
            example(Algorithm::Bubble, 0.9),
            example(Algorithm::Bubble, 0.8),
            example(Algorithm::Heap, 0.1),
        ]);
        let err = train_from_dataset(dataset, &quick_config()).unwrap_err();
        assert!(matches!(err, SortpickError::InsufficientData { .. }));

        let err = train_from_dataset(Dataset::default(), &quick_config()).unwrap_err();
        assert!(matches!(err, SortpickError::Training(_)));
    }
}
