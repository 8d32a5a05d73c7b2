use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use crate::constants::training::MIN_EXAMPLES_PER_LABEL;
use crate::errors::SortpickError;
use crate::sorting::Algorithm;

/// Index partition of a dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StratifiedSplit {
    /// Training indices, ascending.
    pub train: Vec<usize>,
    /// Held-out indices, ascending.
    pub test: Vec<usize>,
}

/// Split `labels` into train/test indices, preserving per-label proportions.
///
/// Every label keeps at least one example on each side, so a label with fewer
/// than two examples is an error. Labels are processed in algorithm order with
/// one RNG seeded from `seed`, so the split is reproducible.
pub fn stratified_split(
    labels: &[Algorithm],
    test_ratio: f64,
    seed: u64,
) -> Result<StratifiedSplit, SortpickError> {
    if labels.is_empty() {
        return Err(SortpickError::Training("dataset is empty".to_string()));
    }
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(SortpickError::Configuration(format!(
            "test_ratio must lie strictly between 0 and 1, got {test_ratio}"
        )));
    }

    let mut by_label: BTreeMap<Algorithm, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_label.entry(*label).or_default().push(index);
    }
    if let Some((label, indices)) = by_label
        .iter()
        .find(|(_, indices)| indices.len() < MIN_EXAMPLES_PER_LABEL)
    {
        return Err(SortpickError::InsufficientData {
            label: label.to_string(),
            count: indices.len(),
            required: MIN_EXAMPLES_PER_LABEL,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = StratifiedSplit::default();
    for mut indices in by_label.into_values() {
        indices.shuffle(&mut rng);
        let count = indices.len();
        let held_out = ((count as f64 * test_ratio).round() as usize).clamp(1, count - 1);
        split.test.extend_from_slice(&indices[..held_out]);
        split.train.extend_from_slice(&indices[held_out..]);
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}
