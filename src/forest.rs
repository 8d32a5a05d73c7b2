//! Classifier seam over aprender's random forest.
//!
//! aprender works on class indices and `f32` matrices; [`RandomForest`] keeps
//! the `Algorithm` for every index and converts [`FeatureVector`]s on the way
//! in. Vote-share probabilities come from the forest itself, but the winning
//! class is picked here so that vote ties always resolve to the lowest index.

use aprender::primitives::Matrix;
use aprender::tree::RandomForestClassifier;
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::ForestConfig;
use crate::errors::SortpickError;
use crate::features::{FEATURE_COUNT, FeatureVector};
use crate::sorting::Algorithm;

/// Feature row in [`FeatureVector::to_array`] order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Anything that maps a [`FeatureVector`] to an algorithm.
pub trait Classifier: Send + Sync {
    /// Labels this classifier can emit, in probability order.
    fn classes(&self) -> &[Algorithm];

    /// Most likely algorithm for `features`.
    fn predict(&self, features: &FeatureVector) -> Algorithm;

    /// Probability per class, in [`Classifier::classes`] order.
    ///
    /// `None` when the classifier cannot produce probabilities.
    fn predict_proba(&self, _features: &FeatureVector) -> Option<Vec<(Algorithm, f64)>> {
        None
    }
}

/// Bagged decision trees fit by aprender, labeled with [`Algorithm`]s.
#[derive(Clone, Debug)]
pub struct RandomForest {
    classes: Vec<Algorithm>,
    model: RandomForestClassifier,
}

fn to_matrix(rows: &[FeatureRow]) -> Result<Matrix<f32>, String> {
    let data: Vec<f32> = rows.iter().flatten().map(|&v| v as f32).collect();
    Matrix::from_vec(rows.len(), FEATURE_COUNT, data).map_err(str::to_string)
}

/// Most frequent class; ties go to the lowest index.
fn argmax(shares: &[f64]) -> usize {
    let mut best = 0;
    for (class, &share) in shares.iter().enumerate() {
        if share > shares[best] {
            best = class;
        }
    }
    best
}

impl RandomForest {
    /// Fit a forest on `rows` labeled by `labels`.
    ///
    /// Classes are the distinct labels in algorithm order; aprender sees each
    /// label as its position in that list.
    pub fn fit(
        rows: &[FeatureRow],
        labels: &[Algorithm],
        config: &ForestConfig,
    ) -> Result<Self, SortpickError> {
        config.validate()?;
        if rows.is_empty() {
            return Err(SortpickError::Training(
                "cannot fit a forest on zero examples".to_string(),
            ));
        }
        if rows.len() != labels.len() {
            return Err(SortpickError::Training(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let classes: Vec<Algorithm> = labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();
        let matrix = to_matrix(rows).map_err(SortpickError::Training)?;

        let mut model = RandomForestClassifier::new(config.trees).with_random_state(config.seed);
        if let Some(depth) = config.max_depth {
            model = model.with_max_depth(depth);
        }
        model
            .fit(&matrix, &encoded)
            .map_err(|err| SortpickError::Training(format!("forest fit failed: {err}")))?;

        debug!(
            trees = config.trees,
            classes = classes.len(),
            rows = rows.len(),
            "fitted random forest"
        );
        Ok(Self { classes, model })
    }

    /// Share of trees voting for each class (in [`Classifier::classes`]
    /// order) for `row`.
    pub fn vote_shares(&self, row: &FeatureRow) -> Vec<f64> {
        let Ok(matrix) = to_matrix(std::slice::from_ref(row)) else {
            return vec![0.0; self.classes.len()];
        };
        let proba = self.model.predict_proba(&matrix);
        let (_, columns) = proba.shape();
        (0..self.classes.len())
            .map(|class| {
                if class < columns {
                    f64::from(proba.get(0, class))
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Encode the fitted aprender model (bincode, as aprender saves models).
    pub(crate) fn model_bytes(&self) -> Result<Vec<u8>, SortpickError> {
        bincode::serialize(&self.model)
            .map_err(|err| SortpickError::Artifact(format!("failed to encode forest: {err}")))
    }

    /// Rebuild a forest from [`RandomForest::model_bytes`] and its class list.
    pub(crate) fn from_parts(classes: Vec<Algorithm>, bytes: &[u8]) -> Result<Self, SortpickError> {
        let model: RandomForestClassifier = bincode::deserialize(bytes)
            .map_err(|err| SortpickError::Artifact(format!("failed to decode forest: {err}")))?;
        let forest = Self { classes, model };
        forest.validate()?;
        Ok(forest)
    }

    /// Check that a decoded forest is usable: a strictly ordered class list
    /// and vote shares that cover exactly those classes and sum to one.
    pub fn validate(&self) -> Result<(), SortpickError> {
        if self.classes.is_empty() {
            return Err(SortpickError::Artifact("forest has no classes".to_string()));
        }
        if self.classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SortpickError::Artifact(
                "forest classes are not strictly ordered".to_string(),
            ));
        }
        let origin = to_matrix(&[[0.0; FEATURE_COUNT]]).map_err(SortpickError::Artifact)?;
        let proba = self.model.predict_proba(&origin);
        if proba.shape() != (1, self.classes.len()) {
            return Err(SortpickError::Artifact(format!(
                "forest votes over {} classes but lists {}",
                proba.shape().1,
                self.classes.len()
            )));
        }
        let total: f64 = (0..self.classes.len())
            .map(|class| f64::from(proba.get(0, class)))
            .sum();
        if !total.is_finite() || (total - 1.0).abs() > 1e-3 {
            return Err(SortpickError::Artifact(format!(
                "forest vote shares sum to {total}"
            )));
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[Algorithm] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Algorithm {
        let shares = self.vote_shares(&features.to_array());
        self.classes[argmax(&shares)]
    }

    fn predict_proba(&self, features: &FeatureVector) -> Option<Vec<(Algorithm, f64)>> {
        let shares = self.vote_shares(&features.to_array());
        Some(self.classes.iter().copied().zip(shares).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sortedness: f64, size: f64) -> FeatureRow {
        [size, sortedness, 1.0, 10.0, 5.0, 2.0, 0.5]
    }

    /// Mostly sorted inputs labeled bubble, shuffled ones merge. Sortedness is
    /// the only feature that varies.
    fn separable() -> (Vec<FeatureRow>, Vec<Algorithm>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let step = i as f64 * 0.004;
            rows.push(row(0.8 + step, 20.0));
            labels.push(Algorithm::Bubble);
            rows.push(row(0.1 + step, 20.0));
            labels.push(Algorithm::Merge);
        }
        (rows, labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            trees: 15,
            seed: 3,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn learns_a_separable_problem() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        assert_eq!(forest.classes(), &[Algorithm::Bubble, Algorithm::Merge]);
        forest.validate().unwrap();

        let sorted = FeatureVector::from_array(row(0.9, 20.0));
        let shuffled = FeatureVector::from_array(row(0.2, 20.0));
        assert_eq!(forest.predict(&sorted), Algorithm::Bubble);
        assert_eq!(forest.predict(&shuffled), Algorithm::Merge);

        let proba = forest.predict_proba(&sorted).unwrap();
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().map(|(_, p)| p).sum::<f64>() - 1.0).abs() < 1e-6);
        assert_eq!(proba[0], (Algorithm::Bubble, 1.0));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let (rows, labels) = separable();
        let a = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        let b = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        assert_eq!(a.model_bytes().unwrap(), b.model_bytes().unwrap());
    }

    #[test]
    fn single_class_predicts_it_with_certainty() {
        let rows = vec![row(0.1, 5.0), row(0.7, 9.0), row(0.3, 3.0)];
        let labels = vec![Algorithm::Heap; 3];
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        let features = FeatureVector::from_array(row(0.5, 4.0));
        assert_eq!(forest.predict(&features), Algorithm::Heap);
        assert_eq!(
            forest.predict_proba(&features),
            Some(vec![(Algorithm::Heap, 1.0)])
        );
    }

    #[test]
    fn model_bytes_rebuild_the_same_forest() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        let bytes = forest.model_bytes().unwrap();
        let restored = RandomForest::from_parts(forest.classes().to_vec(), &bytes).unwrap();
        let query = FeatureVector::from_array(row(0.85, 20.0));
        assert_eq!(restored.predict_proba(&query), forest.predict_proba(&query));
    }

    #[test]
    fn rejects_mismatched_or_empty_input() {
        let config = small_config();
        assert!(matches!(
            RandomForest::fit(&[], &[], &config),
            Err(SortpickError::Training(_))
        ));
        assert!(matches!(
            RandomForest::fit(&[row(0.5, 3.0)], &[], &config),
            Err(SortpickError::Training(_))
        ));
    }

    #[test]
    fn decoding_rejects_mismatched_class_lists() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        let bytes = forest.model_bytes().unwrap();

        let extra = vec![Algorithm::Bubble, Algorithm::Merge, Algorithm::Heap];
        assert!(matches!(
            RandomForest::from_parts(extra, &bytes),
            Err(SortpickError::Artifact(_))
        ));
        let unordered = vec![Algorithm::Merge, Algorithm::Bubble];
        assert!(RandomForest::from_parts(unordered, &bytes).is_err());
        assert!(RandomForest::from_parts(Vec::new(), &bytes).is_err());
        assert!(RandomForest::from_parts(forest.classes().to_vec(), &bytes[..3]).is_err());
    }

    #[test]
    fn vote_ties_go_to_the_lowest_class() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.0, 0.5, 0.5]), 1);
    }
}
