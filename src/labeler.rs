//! Ground-truth labeling: run every algorithm on a sequence and pick the
//! cheapest one under a pluggable cost function.
//!
//! The production cost is wall-clock first, then swaps, then comparisons.
//! Elapsed times for small inputs are often equal at timer resolution, so the
//! secondary keys decide many labels; every [`Labeling`] reports which key
//! decided it through [`TieBreak`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::SortpickError;
use crate::sorting::{Algorithm, Measurement};

/// Lexicographic cost key; smaller is better.
pub type CostKey = (u128, u64, u64);

/// One measurement per algorithm, keyed in tie-break order.
pub type Measurements = BTreeMap<Algorithm, Measurement>;

/// Maps a [`Measurement`] to the key the labeler minimizes.
pub trait CostModel: Send + Sync {
    /// Lexicographic key for `measurement`.
    fn key(&self, measurement: &Measurement) -> CostKey;
}

/// Elapsed nanoseconds, then swaps, then comparisons.
#[derive(Clone, Copy, Debug, Default)]
pub struct WallClock;

impl CostModel for WallClock {
    fn key(&self, m: &Measurement) -> CostKey {
        (m.elapsed.as_nanos(), m.swaps, m.comparisons)
    }
}

/// Comparisons only. Reproducible across machines.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComparisonsOnly;

impl CostModel for ComparisonsOnly {
    fn key(&self, m: &Measurement) -> CostKey {
        (u128::from(m.comparisons), 0, 0)
    }
}

/// Swaps only. Reproducible across machines.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwapsOnly;

impl CostModel for SwapsOnly {
    fn key(&self, m: &Measurement) -> CostKey {
        (u128::from(m.swaps), 0, 0)
    }
}

/// Runtime-selectable cost function (CLI and configuration surface).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostKind {
    /// See [`WallClock`].
    #[default]
    WallClock,
    /// See [`ComparisonsOnly`].
    Comparisons,
    /// See [`SwapsOnly`].
    Swaps,
}

impl CostKind {
    /// Stable kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            CostKind::WallClock => "wall-clock",
            CostKind::Comparisons => "comparisons",
            CostKind::Swaps => "swaps",
        }
    }
}

impl CostModel for CostKind {
    fn key(&self, m: &Measurement) -> CostKey {
        match self {
            CostKind::WallClock => WallClock.key(m),
            CostKind::Comparisons => ComparisonsOnly.key(m),
            CostKind::Swaps => SwapsOnly.key(m),
        }
    }
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostKind {
    type Err = SortpickError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "wall-clock" | "wallclock" | "time" => Ok(CostKind::WallClock),
            "comparisons" => Ok(CostKind::Comparisons),
            "swaps" => Ok(CostKind::Swaps),
            other => Err(SortpickError::Configuration(format!(
                "unknown cost model '{other}' (expected wall-clock, comparisons or swaps)"
            ))),
        }
    }
}

/// Which component of the cost key separated the winner from the runner-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The primary key alone decided (or there was no competitor).
    Primary,
    /// Tied on the primary key; the secondary key decided.
    Secondary,
    /// Tied on primary and secondary; the tertiary key decided.
    Tertiary,
    /// Tied on the whole key; the fixed algorithm order decided.
    FixedOrder,
}

impl TieBreak {
    /// Every variant, from most to least decisive.
    pub const ALL: [TieBreak; 4] = [
        TieBreak::Primary,
        TieBreak::Secondary,
        TieBreak::Tertiary,
        TieBreak::FixedOrder,
    ];

    /// Stable snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            TieBreak::Primary => "primary",
            TieBreak::Secondary => "secondary",
            TieBreak::Tertiary => "tertiary",
            TieBreak::FixedOrder => "fixed_order",
        }
    }

    fn between(winner: CostKey, runner_up: CostKey) -> Self {
        if winner.0 != runner_up.0 {
            TieBreak::Primary
        } else if winner.1 != runner_up.1 {
            TieBreak::Secondary
        } else if winner.2 != runner_up.2 {
            TieBreak::Tertiary
        } else {
            TieBreak::FixedOrder
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = SortpickError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        TieBreak::ALL
            .into_iter()
            .find(|tie| tie.as_str() == raw.trim())
            .ok_or_else(|| SortpickError::Configuration(format!("unknown tie-break '{raw}'")))
    }
}

/// Pick the argmin of `(cost key, algorithm rank)` over `measurements`.
///
/// Returns `None` only for an empty map.
pub fn select_winner<C: CostModel + ?Sized>(
    measurements: &Measurements,
    cost: &C,
) -> Option<(Algorithm, TieBreak)> {
    let mut ranked: Vec<(CostKey, Algorithm)> = measurements
        .iter()
        .map(|(algorithm, m)| (cost.key(m), *algorithm))
        .collect();
    // `Algorithm`'s `Ord` is its rank, so this is the documented total order.
    ranked.sort_unstable();
    let (best_key, winner) = *ranked.first()?;
    let tie_break = ranked
        .get(1)
        .map_or(TieBreak::Primary, |(key, _)| TieBreak::between(best_key, *key));
    Some((winner, tie_break))
}

/// Result of labeling one sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Labeling {
    /// Cheapest algorithm under the labeler's cost model.
    pub winner: Algorithm,
    /// Key component that decided the winner.
    pub tie_break: TieBreak,
    /// Every algorithm's measurement on this sequence.
    pub measurements: Measurements,
}

impl Labeling {
    /// Measurement recorded for `algorithm`.
    pub fn measurement(&self, algorithm: Algorithm) -> Option<&Measurement> {
        self.measurements.get(&algorithm)
    }
}

/// Runs the whole suite on a sequence and labels it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Labeler<C = WallClock> {
    cost: C,
}

impl Labeler<WallClock> {
    /// Labeler with the production wall-clock cost.
    pub fn new() -> Self {
        Self { cost: WallClock }
    }
}

impl<C: CostModel> Labeler<C> {
    /// Labeler minimizing `cost` instead.
    pub fn with_cost(cost: C) -> Self {
        Self { cost }
    }

    /// Cost model in use.
    pub fn cost(&self) -> &C {
        &self.cost
    }

    /// Measure all five algorithms on independent copies of `sequence`, one
    /// after another, and select the winner.
    pub fn label<T: PartialOrd + Clone>(&self, sequence: &[T]) -> Labeling {
        let measurements: Measurements = Algorithm::ALL
            .into_iter()
            .map(|algorithm| (algorithm, algorithm.measure(sequence)))
            .collect();
        // `measurements` always holds all five algorithms.
        let (winner, tie_break) = select_winner(&measurements, &self.cost)
            .unwrap_or((Algorithm::ALL[0], TieBreak::FixedOrder));
        Labeling {
            winner,
            tie_break,
            measurements,
        }
    }
}

/// Label `sequence` with the production cost model.
pub fn label<T: PartialOrd + Clone>(sequence: &[T]) -> Labeling {
    Labeler::new().label(sequence)
}
