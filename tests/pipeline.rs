use std::fs;

use sortpick::service::http::{Context, handle_request};
use sortpick::sorting::Algorithm;
use sortpick::{
    Classifier, CostKind, Dataset, DatasetConfig, Distribution, ForestConfig, ModelArtifact,
    Predictor, SortpickError, TrainingConfig, train_and_save, train_from_dataset,
};
use tempfile::tempdir;

fn config() -> TrainingConfig {
    TrainingConfig {
        dataset: DatasetConfig {
            samples: 200,
            sizes: vec![10, 20],
            distributions: Distribution::ALL.to_vec(),
            seed: Some(21),
            cost: CostKind::Swaps,
            parallel: true,
        },
        forest: ForestConfig {
            trees: 12,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    }
}

#[test]
fn trained_model_round_trips_through_disk_and_serves() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.bin");
    let csv = dir.path().join("benchmark_dataset.csv");
    train_and_save(&config(), &model, Some(&csv)).unwrap();

    let artifact = ModelArtifact::load(&model).unwrap();
    assert_eq!(artifact.metadata().examples, 200);
    assert_eq!(artifact.metadata().dataset_seed, Some(21));
    assert!(!artifact.classes().is_empty());
    assert!(
        artifact
            .feature_names()
            .iter()
            .map(String::as_str)
            .eq(["n", "sortedness", "unique_ratio", "range", "mean", "std", "long_run"])
    );

    let predictor = Predictor::load(&model);
    assert!(predictor.is_ready());
    let recommendation = predictor.recommend(&[5.0, 4.0, 3.0, 2.0, 1.0]);
    assert!(artifact.classes().contains(&recommendation.algorithm));
    assert!(recommendation.confidence > 0.0 && recommendation.confidence <= 1.0);
    assert!(recommendation.error.is_none());

    let context = Context { predictor };
    let request = rouille::Request::fake_http(
        "POST",
        "/recommend",
        vec![("Content-Type".into(), "application/json".into())],
        br#"{"array": [3, 1, 2]}"#.to_vec(),
    );
    let response = handle_request(&request, &context);
    assert_eq!(response.status_code, 200);
}

#[test]
fn csv_export_is_enough_to_retrain() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.bin");
    let csv = dir.path().join("benchmark_dataset.csv");
    train_and_save(&config(), &model, Some(&csv)).unwrap();

    let text = fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 201);
    for algorithm in Algorithm::ALL {
        assert!(text.lines().next().unwrap().contains(&format!("swaps_{algorithm}")));
    }

    let dataset = Dataset::load_csv(&csv).unwrap();
    assert_eq!(dataset.len(), 200);
    assert_eq!(dataset.seed(), None);
    let outcome = train_from_dataset(dataset, &config()).unwrap();
    assert_eq!(outcome.report.train_size + outcome.report.test_size, 200);
}

#[test]
fn failed_training_leaves_the_previous_model_alone() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.bin");
    fs::write(&model, b"previous model").unwrap();

    let mut bad = config();
    bad.dataset.sizes.clear();
    let err = train_and_save(&bad, &model, None).unwrap_err();
    assert!(matches!(err, SortpickError::Configuration(_)));
    assert_eq!(fs::read(&model).unwrap(), b"previous model");
    assert!(!Predictor::load(&model).is_ready());
}
