//! Instrumented sorting suite.
//!
//! Each algorithm is a plain function over a mutable slice plus a [`Counters`]
//! sink; [`Algorithm`] is the registry that maps an identifier to its
//! function. Counting is purely observational: removing the counters leaves a
//! textbook implementation of each sort.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::errors::SortpickError;

mod bubble;
mod heap;
mod merge;
mod quick;
mod selection;

/// Identifier of one of the five instrumented sorting algorithms.
///
/// Declaration order doubles as the fixed order used to resolve ties that
/// survive every cost key (bubble < selection < merge < quick < heap).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bitcode::Encode,
    bitcode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Bubble sort without early exit.
    Bubble,
    /// Selection sort; swaps only when the minimum moved.
    Selection,
    /// Top-down merge sort.
    Merge,
    /// Lomuto-partition quick sort with the last element as pivot.
    Quick,
    /// Binary max-heap sort.
    Heap,
}

impl Algorithm {
    /// Every algorithm, in tie-break order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Bubble,
        Algorithm::Selection,
        Algorithm::Merge,
        Algorithm::Quick,
        Algorithm::Heap,
    ];

    /// Stable lower-case identifier (`bubble`, `selection`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::Bubble => "bubble",
            Algorithm::Selection => "selection",
            Algorithm::Merge => "merge",
            Algorithm::Quick => "quick",
            Algorithm::Heap => "heap",
        }
    }

    /// Position of this algorithm in [`Algorithm::ALL`].
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Sort `data` ascending in place, recording work into `counters`.
    pub fn sort<T: PartialOrd + Clone>(self, data: &mut [T], counters: &mut Counters) {
        match self {
            Algorithm::Bubble => bubble::sort(data, counters),
            Algorithm::Selection => selection::sort(data, counters),
            Algorithm::Merge => merge::sort(data, counters),
            Algorithm::Quick => quick::sort(data, counters),
            Algorithm::Heap => heap::sort(data, counters),
        }
    }

    /// Sort a private copy of `sequence` and return it with its measurement.
    ///
    /// The timed region covers only the sort; the copy is made before the
    /// clock starts. `sequence` itself is never touched.
    pub fn run<T: PartialOrd + Clone>(self, sequence: &[T]) -> SortRun<T> {
        let mut working = sequence.to_vec();
        let mut counters = Counters::default();
        let started = Instant::now();
        self.sort(&mut working, &mut counters);
        let elapsed = started.elapsed();
        SortRun {
            sorted: working,
            measurement: Measurement {
                comparisons: counters.comparisons,
                swaps: counters.swaps,
                elapsed,
            },
        }
    }

    /// Measure this algorithm on `sequence`, discarding the sorted output.
    pub fn measure<T: PartialOrd + Clone>(self, sequence: &[T]) -> Measurement {
        self.run(sequence).measurement
    }

    /// Upper bound on comparisons for an input of length `n`.
    ///
    /// Quadratic for bubble, selection, and quick sort (worst case), and
    /// `O(n log n)` for merge and heap sort.
    pub fn worst_case_comparisons(self, n: usize) -> u64 {
        let n = n as u64;
        let log2 = ceil_log2(n);
        match self {
            Algorithm::Bubble | Algorithm::Selection | Algorithm::Quick => {
                n * n.saturating_sub(1) / 2
            }
            Algorithm::Merge => n * log2,
            Algorithm::Heap => 2 * n * log2 + 2 * n,
        }
    }
}

fn ceil_log2(n: u64) -> u64 {
    if n <= 1 {
        0
    } else {
        u64::from(64 - (n - 1).leading_zeros())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SortpickError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == raw.trim())
            .ok_or_else(|| SortpickError::Configuration(format!("unknown algorithm '{raw}'")))
    }
}

/// Work counted for one (algorithm, sequence) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Element-pair ordering tests executed.
    pub comparisons: u64,
    /// Element exchanges (merge sort: right-sublist draws during merging).
    pub swaps: u64,
    /// Wall-clock time spent inside the sort.
    pub elapsed: Duration,
}

impl Measurement {
    /// Build a measurement from explicit values.
    pub fn new(comparisons: u64, swaps: u64, elapsed: Duration) -> Self {
        Self {
            comparisons,
            swaps,
            elapsed,
        }
    }

    /// Elapsed time in fractional milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Output of [`Algorithm::run`].
#[derive(Clone, Debug)]
pub struct SortRun<T> {
    /// The sorted copy.
    pub sorted: Vec<T>,
    /// Counters and timing of the sort.
    pub measurement: Measurement,
}

/// Comparison and swap tally threaded through a sort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    /// Ordering tests executed so far.
    pub comparisons: u64,
    /// Exchanges (or merge draws) recorded so far.
    pub swaps: u64,
}

impl Counters {
    /// Counted `a < b`.
    pub fn less<T: PartialOrd>(&mut self, a: &T, b: &T) -> bool {
        self.comparisons += 1;
        a < b
    }

    /// Counted `a <= b`.
    pub fn less_eq<T: PartialOrd>(&mut self, a: &T, b: &T) -> bool {
        self.comparisons += 1;
        a <= b
    }

    /// Counted `a > b`.
    pub fn greater<T: PartialOrd>(&mut self, a: &T, b: &T) -> bool {
        self.comparisons += 1;
        a > b
    }

    /// Exchange `data[i]` and `data[j]` and count it, even when `i == j`.
    pub fn swap<T>(&mut self, data: &mut [T], i: usize, j: usize) {
        data.swap(i, j);
        self.swaps += 1;
    }

    /// Count a data movement that is not a literal exchange.
    pub fn record_swap(&mut self) {
        self.swaps += 1;
    }
}
