use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::constants::corpus::{
    FEW_UNIQUE_POOL_DIVISOR, FEW_UNIQUE_POOL_MIN, FEW_UNIQUE_VALUE_MAX, NEARLY_SORTED_SWAP_DIVISOR,
    UNIFORM_MAX, UNIFORM_MIN,
};
use crate::errors::SortpickError;

/// Named input distribution for synthetic sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Independent draws from `[UNIFORM_MIN, UNIFORM_MAX]`.
    Uniform,
    /// `1..=n` with about `n / 20` random pairwise swaps (at least one).
    NearlySorted,
    /// Strictly descending `n..=1`.
    Reversed,
    /// Draws with repetition from a small pool of values in `1..=5`.
    FewUnique,
}

impl Distribution {
    /// Every distribution, in dataset sampling order.
    pub const ALL: [Distribution; 4] = [
        Distribution::Uniform,
        Distribution::NearlySorted,
        Distribution::Reversed,
        Distribution::FewUnique,
    ];

    /// Stable snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Distribution::Uniform => "uniform",
            Distribution::NearlySorted => "nearly_sorted",
            Distribution::Reversed => "reversed",
            Distribution::FewUnique => "few_unique",
        }
    }

    /// Resolve a name, falling back to [`Distribution::Uniform`] when unknown.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            debug!(name, "unknown distribution, using uniform");
            Distribution::Uniform
        })
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distribution {
    type Err = SortpickError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Distribution::ALL
            .into_iter()
            .find(|dist| dist.as_str() == raw.trim())
            .ok_or_else(|| SortpickError::Configuration(format!("unknown distribution '{raw}'")))
    }
}

/// Generate a sequence of `size` elements drawn from `distribution`.
pub fn generate<R: Rng + ?Sized>(size: usize, distribution: Distribution, rng: &mut R) -> Vec<f64> {
    match distribution {
        Distribution::Uniform => (0..size)
            .map(|_| rng.random_range(UNIFORM_MIN..=UNIFORM_MAX) as f64)
            .collect(),
        Distribution::Reversed => (1..=size).rev().map(|v| v as f64).collect(),
        Distribution::NearlySorted => {
            let mut values: Vec<f64> = (1..=size).map(|v| v as f64).collect();
            if size > 0 {
                let swaps = (size / NEARLY_SORTED_SWAP_DIVISOR).max(1);
                for _ in 0..swaps {
                    let i = rng.random_range(0..size);
                    let j = rng.random_range(0..size);
                    values.swap(i, j);
                }
            }
            values
        }
        Distribution::FewUnique => {
            let pool_size = (size / FEW_UNIQUE_POOL_DIVISOR).max(FEW_UNIQUE_POOL_MIN);
            let pool: Vec<f64> = (0..pool_size)
                .map(|_| rng.random_range(1..=FEW_UNIQUE_VALUE_MAX) as f64)
                .collect();
            (0..size)
                .map(|_| pool[rng.random_range(0..pool.len())])
                .collect()
        }
    }
}

/// Stateful generator owning its RNG.
///
/// Seeded generators reproduce the same sequences; unseeded ones draw a seed
/// from the OS.
#[derive(Debug, Clone)]
pub struct CorpusGenerator {
    rng: StdRng,
}

impl CorpusGenerator {
    /// Create a generator, deterministic when `seed` is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Generate one sequence from `distribution`.
    pub fn generate(&mut self, size: usize, distribution: Distribution) -> Vec<f64> {
        generate(size, distribution, &mut self.rng)
    }

    /// Generate one sequence by distribution name (unknown names mean uniform).
    pub fn generate_named(&mut self, size: usize, name: &str) -> Vec<f64> {
        self.generate(size, Distribution::from_name(name))
    }
}
