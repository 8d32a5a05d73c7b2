//! Labeled datasets: parallel generation, summary statistics and CSV
//! export/import.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatasetConfig;
use crate::constants::dataset::PROGRESS_LOG_INTERVAL;
use crate::corpus::{self, Distribution};
use crate::errors::SortpickError;
use crate::features::{self, FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
use crate::hash::mix_seed;
use crate::labeler::{CostModel, Labeler, Measurements, TieBreak};
use crate::metrics::{LabelSkew, label_skew};
use crate::sorting::{Algorithm, Measurement};

/// One generated sequence reduced to its features, label and raw measurements.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledExample {
    /// Descriptor of the generated sequence.
    pub features: FeatureVector,
    /// Winning algorithm.
    pub label: Algorithm,
    /// Cost key component that decided `label`.
    pub tie_break: TieBreak,
    /// Distribution the sequence was drawn from.
    pub distribution: Distribution,
    /// All five measurements, kept for audit.
    pub measurements: Measurements,
}

impl LabeledExample {
    /// Extract features from `sequence` and label it with `labeler`.
    pub fn from_sequence<C: CostModel>(
        sequence: &[f64],
        distribution: Distribution,
        labeler: &Labeler<C>,
    ) -> Self {
        let labeling = labeler.label(sequence);
        Self {
            features: features::extract(sequence),
            label: labeling.winner,
            tie_break: labeling.tie_break,
            distribution,
            measurements: labeling.measurements,
        }
    }
}

/// Ordered collection of labeled examples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    examples: Vec<LabeledExample>,
    seed: Option<u64>,
}

/// Counts describing a dataset's balance.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSummary {
    /// Number of examples.
    pub total: usize,
    /// Examples per winning algorithm.
    pub label_counts: BTreeMap<Algorithm, usize>,
    /// Examples per source distribution.
    pub distribution_counts: BTreeMap<Distribution, usize>,
    /// Examples per deciding key component.
    pub tie_break_counts: BTreeMap<TieBreak, usize>,
    /// Label skew, `None` for an empty dataset.
    pub label_skew: Option<LabelSkew>,
}

impl DatasetSummary {
    /// Examples whose label was not decided by the primary key.
    pub fn tie_broken(&self) -> usize {
        self.tie_break_counts
            .iter()
            .filter(|(tie, _)| **tie != TieBreak::Primary)
            .map(|(_, count)| count)
            .sum()
    }
}

impl Dataset {
    /// Wrap existing examples.
    pub fn from_examples(examples: Vec<LabeledExample>) -> Self {
        Self {
            examples,
            seed: None,
        }
    }

    /// Generate and label `config.samples` examples.
    ///
    /// Each example owns an RNG derived from the base seed and its index, so
    /// sequences and features do not depend on `config.parallel`. Measurement
    /// of the five algorithms stays sequential inside one example.
    pub fn build(config: &DatasetConfig) -> Result<Self, SortpickError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        info!(
            samples = config.samples,
            seed,
            cost = %config.cost,
            parallel = config.parallel,
            "generating labeled dataset"
        );

        let labeler = Labeler::with_cost(config.cost);
        let done = AtomicUsize::new(0);
        let make = |index: usize| {
            let mut rng = StdRng::seed_from_u64(mix_seed(seed, index as u64));
            let size = config.sizes[rng.random_range(0..config.sizes.len())];
            let distribution =
                config.distributions[rng.random_range(0..config.distributions.len())];
            let sequence = corpus::generate(size, distribution, &mut rng);
            let example = LabeledExample::from_sequence(&sequence, distribution, &labeler);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if finished % PROGRESS_LOG_INTERVAL == 0 {
                debug!(finished, total = config.samples, "labeled examples");
            }
            example
        };
        let examples: Vec<LabeledExample> = if config.parallel {
            (0..config.samples).into_par_iter().map(&make).collect()
        } else {
            (0..config.samples).map(&make).collect()
        };

        let dataset = Self {
            examples,
            seed: Some(seed),
        };
        let summary = dataset.summary();
        info!(
            examples = summary.total,
            labels = ?summary.label_counts,
            tie_broken = summary.tie_broken(),
            "dataset ready"
        );
        Ok(dataset)
    }

    /// Base seed the dataset was generated from, if it was generated here.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// All examples in generation order.
    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// `true` when there are no examples.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Labels in example order.
    pub fn labels(&self) -> Vec<Algorithm> {
        self.examples.iter().map(|e| e.label).collect()
    }

    /// Feature rows in example order.
    pub fn feature_rows(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.examples.iter().map(|e| e.features.to_array()).collect()
    }

    /// Label, distribution and tie-break counts.
    pub fn summary(&self) -> DatasetSummary {
        let mut label_counts = BTreeMap::new();
        let mut distribution_counts = BTreeMap::new();
        let mut tie_break_counts = BTreeMap::new();
        for example in &self.examples {
            *label_counts.entry(example.label).or_insert(0) += 1;
            *distribution_counts.entry(example.distribution).or_insert(0) += 1;
            *tie_break_counts.entry(example.tie_break).or_insert(0) += 1;
        }
        let skew = label_skew(&label_counts);
        DatasetSummary {
            total: self.examples.len(),
            label_counts,
            distribution_counts,
            tie_break_counts,
            label_skew: skew,
        }
    }

    /// CSV header: features, label columns, then per-algorithm measurements.
    pub fn csv_header() -> Vec<String> {
        let mut header: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        header.extend(["label", "distribution", "tie_break"].map(String::from));
        for algorithm in Algorithm::ALL {
            header.push(format!("time_{algorithm}_ms"));
            header.push(format!("comparisons_{algorithm}"));
            header.push(format!("swaps_{algorithm}"));
        }
        header
    }

    /// Write the dataset as CSV with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), SortpickError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(Self::csv_header())?;
        for example in &self.examples {
            let f = &example.features;
            let mut row = vec![
                f.size.to_string(),
                f.sortedness.to_string(),
                f.unique_ratio.to_string(),
                f.range.to_string(),
                f.mean.to_string(),
                f.std_dev.to_string(),
                f.long_run_ratio.to_string(),
                example.label.to_string(),
                example.distribution.to_string(),
                example.tie_break.to_string(),
            ];
            for algorithm in Algorithm::ALL {
                let m = example
                    .measurements
                    .get(&algorithm)
                    .copied()
                    .unwrap_or_default();
                row.push(m.elapsed_ms().to_string());
                row.push(m.comparisons.to_string());
                row.push(m.swaps.to_string());
            }
            out.write_record(&row)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the CSV export to `path`, replacing any existing file.
    pub fn save_csv(&self, path: &Path) -> Result<(), SortpickError> {
        self.write_csv(File::create(path)?)?;
        info!(path = %path.display(), rows = self.examples.len(), "wrote dataset export");
        Ok(())
    }

    /// Read a CSV export produced by [`Dataset::write_csv`].
    ///
    /// Columns are matched by name, so their order may differ.
    pub fn read_csv<R: io::Read>(reader: R) -> Result<Self, SortpickError> {
        let mut input = csv::Reader::from_reader(reader);
        let columns: HashMap<String, usize> = input
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        let mut examples = Vec::new();
        for (index, record) in input.records().enumerate() {
            let record = record?;
            let row = CsvRow {
                record: &record,
                columns: &columns,
                row: index + 1,
            };
            examples.push(row.example()?);
        }
        Ok(Self::from_examples(examples))
    }

    /// Read a CSV export from `path`.
    pub fn load_csv(path: &Path) -> Result<Self, SortpickError> {
        let dataset = Self::read_csv(File::open(path)?)?;
        info!(path = %path.display(), rows = dataset.len(), "loaded dataset export");
        Ok(dataset)
    }
}

struct CsvRow<'a> {
    record: &'a csv::StringRecord,
    columns: &'a HashMap<String, usize>,
    row: usize,
}

impl CsvRow<'_> {
    fn malformed(&self, details: String) -> SortpickError {
        SortpickError::Dataset {
            row: self.row,
            details,
        }
    }

    fn field(&self, name: &str) -> Result<&str, SortpickError> {
        self.columns
            .get(name)
            .and_then(|i| self.record.get(*i))
            .map(str::trim)
            .ok_or_else(|| self.malformed(format!("missing column '{name}'")))
    }

    fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<T, SortpickError> {
        let raw = self.field(name)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("column '{name}' has invalid value '{raw}'")))
    }

    fn example(&self) -> Result<LabeledExample, SortpickError> {
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            *slot = self.parse(name)?;
        }
        let mut features = FeatureVector::from_array(values);
        features.size = self.parse("n")?;

        let mut measurements = Measurements::new();
        for algorithm in Algorithm::ALL {
            let ms: f64 = self.parse(&format!("time_{algorithm}_ms"))?;
            let elapsed = Duration::try_from_secs_f64(ms / 1000.0)
                .map_err(|_| self.malformed(format!("negative or invalid time for {algorithm}")))?;
            measurements.insert(
                algorithm,
                Measurement::new(
                    self.parse(&format!("comparisons_{algorithm}"))?,
                    self.parse(&format!("swaps_{algorithm}"))?,
                    elapsed,
                ),
            );
        }

        Ok(LabeledExample {
            features,
            label: self.parse("label")?,
            tie_break: self.parse("tie_break")?,
            distribution: self.parse("distribution")?,
            measurements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::CostKind;

    fn small_config(parallel: bool) -> DatasetConfig {
        DatasetConfig {
            samples: 40,
            sizes: vec![5, 12],
            seed: Some(9),
            cost: CostKind::Comparisons,
            parallel,
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn parallel_and_sequential_builds_agree() {
        let parallel = Dataset::build(&small_config(true)).unwrap();
        let sequential = Dataset::build(&small_config(false)).unwrap();
        assert_eq!(parallel.len(), 40);
        assert_eq!(parallel.seed(), Some(9));
        assert_eq!(parallel.feature_rows(), sequential.feature_rows());
        assert_eq!(parallel.labels(), sequential.labels());
    }

    #[test]
    fn examples_carry_all_measurements_and_valid_sizes() {
        let dataset = Dataset::build(&small_config(false)).unwrap();
        for example in dataset.examples() {
            assert!([5, 12].contains(&example.features.size));
            assert_eq!(example.measurements.len(), Algorithm::ALL.len());
        }
    }

    #[test]
    fn summary_counts_add_up() {
        let dataset = Dataset::build(&small_config(false)).unwrap();
        let summary = dataset.summary();
        assert_eq!(summary.total, 40);
        assert_eq!(summary.label_counts.values().sum::<usize>(), 40);
        assert_eq!(summary.distribution_counts.values().sum::<usize>(), 40);
        assert_eq!(summary.tie_break_counts.values().sum::<usize>(), 40);
        assert_eq!(summary.label_skew.unwrap().total, 40);
    }

    #[test]
    fn csv_export_reads_back() {
        let dataset = Dataset::build(&small_config(false)).unwrap();
        let mut bytes = Vec::new();
        dataset.write_csv(&mut bytes).unwrap();

        let text = String::from_utf8(bytes.clone()).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("n,sortedness,unique_ratio,range,mean,std,long_run,label"));
        assert!(header.ends_with("swaps_heap"));

        let restored = Dataset::read_csv(bytes.as_slice()).unwrap();
        assert_eq!(restored.len(), dataset.len());
        for (a, b) in restored.examples().iter().zip(dataset.examples()) {
            assert_eq!(a.features, b.features);
            assert_eq!(a.label, b.label);
            assert_eq!(a.tie_break, b.tie_break);
            assert_eq!(a.distribution, b.distribution);
            for algorithm in Algorithm::ALL {
                let (x, y) = (a.measurements[&algorithm], b.measurements[&algorithm]);
                assert_eq!((x.comparisons, x.swaps), (y.comparisons, y.swaps));
            }
        }
    }

    #[test]
    fn malformed_rows_report_their_position() {
        let mut bytes = Vec::new();
        Dataset::from_examples(Vec::new())
            .write_csv(&mut bytes)
            .unwrap();
        let mut text = String::from_utf8(bytes).unwrap();
        let mut row = vec!["3", "0.5", "1", "2", "2", "0.8", "0.6", "shell", "uniform", "primary"];
        row.extend(std::iter::repeat_n("1", Algorithm::ALL.len() * 3));
        text.push_str(&row.join(","));
        text.push('\n');

        let err = Dataset::read_csv(text.as_bytes()).unwrap_err();
        match err {
            SortpickError::Dataset { row, details } => {
                assert_eq!(row, 1);
                assert!(details.contains("label"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
