use serde::{Deserialize, Serialize};

/// Number of numeric fields in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 7;

/// Column names in [`FeatureVector::to_array`] order.
///
/// These are also the JSON keys and CSV headers used on the wire.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "n",
    "sortedness",
    "unique_ratio",
    "range",
    "mean",
    "std",
    "long_run",
];

/// Fixed-size statistical summary of a sequence.
///
/// The offline labeling path and the live prediction path both go through
/// [`extract`]; nothing else builds these from raw data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Sequence length.
    #[serde(rename = "n")]
    pub size: usize,
    /// Fraction of adjacent pairs already in non-decreasing order.
    pub sortedness: f64,
    /// Distinct values divided by length.
    pub unique_ratio: f64,
    /// `max - min`.
    pub range: f64,
    /// Population mean.
    pub mean: f64,
    /// Population standard deviation (divides by `n`).
    #[serde(rename = "std")]
    pub std_dev: f64,
    /// Longest non-decreasing run divided by length.
    #[serde(rename = "long_run")]
    pub long_run_ratio: f64,
}

impl FeatureVector {
    /// Canonical descriptor of the empty sequence.
    pub const EMPTY: FeatureVector = FeatureVector {
        size: 0,
        sortedness: 1.0,
        unique_ratio: 0.0,
        range: 0.0,
        mean: 0.0,
        std_dev: 0.0,
        long_run_ratio: 0.0,
    };

    /// Flatten into classifier input order (see [`FEATURE_NAMES`]).
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.size as f64,
            self.sortedness,
            self.unique_ratio,
            self.range,
            self.mean,
            self.std_dev,
            self.long_run_ratio,
        ]
    }

    /// Rebuild from classifier input order. `size` is truncated to an integer.
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            size: values[0].max(0.0) as usize,
            sortedness: values[1],
            unique_ratio: values[2],
            range: values[3],
            mean: values[4],
            std_dev: values[5],
            long_run_ratio: values[6],
        }
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Summarize `sequence` into a [`FeatureVector`].
///
/// Pure and deterministic; `O(n log n)` because distinct values are counted
/// by sorting a copy.
pub fn extract(sequence: &[f64]) -> FeatureVector {
    let n = sequence.len();
    if n == 0 {
        return FeatureVector::EMPTY;
    }
    let len = n as f64;

    let (min, max) = sequence
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let (mean, std_dev) = mean_and_std(sequence);

    FeatureVector {
        size: n,
        sortedness: sortedness(sequence),
        unique_ratio: distinct_count(sequence) as f64 / len,
        range: (max - min).min(f64::MAX),
        mean,
        std_dev,
        long_run_ratio: longest_nondecreasing_run(sequence) as f64 / len,
    }
}

/// Population mean and standard deviation in one Welford pass.
///
/// Values are divided by the largest magnitude first so that sums of finite
/// inputs near `f64::MAX` stay finite.
fn mean_and_std(sequence: &[f64]) -> (f64, f64) {
    let scale = sequence.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return (0.0, 0.0);
    }
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (k, v) in sequence.iter().enumerate() {
        let u = v / scale;
        let delta = u - mean;
        mean += delta / (k + 1) as f64;
        m2 += delta * (u - mean);
    }
    let variance = (m2 / sequence.len() as f64).max(0.0);
    (mean * scale, variance.sqrt() * scale)
}

/// Fraction of adjacent pairs with `a[i] <= a[i + 1]`; `1.0` below two elements.
pub fn sortedness(sequence: &[f64]) -> f64 {
    if sequence.len() < 2 {
        return 1.0;
    }
    let ordered = sequence.windows(2).filter(|w| w[0] <= w[1]).count();
    ordered as f64 / (sequence.len() - 1) as f64
}

/// Length of the longest run where each element is `>=` its predecessor.
pub fn longest_nondecreasing_run(sequence: &[f64]) -> usize {
    if sequence.is_empty() {
        return 0;
    }
    let mut best = 1;
    let mut current = 1;
    for w in sequence.windows(2) {
        if w[1] >= w[0] {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

fn distinct_count(sequence: &[f64]) -> usize {
    let mut sorted = sequence.to_vec();
    sorted.sort_by(f64::total_cmp);
    // `==` rather than bit equality so 0.0 and -0.0 count once.
    sorted.dedup();
    sorted.len()
}
