use std::collections::BTreeMap;
use std::fmt;

use crate::sorting::Algorithm;

/// Aggregate skew of per-label example counts.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSkew {
    pub total: usize,
    pub labels: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub max_share: f64,
    pub min_share: f64,
    pub ratio: f64,
    pub per_label: Vec<LabelShare>,
}

/// One label's share of a dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelShare {
    pub label: Algorithm,
    pub count: usize,
    pub share: f64,
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Compute skew metrics from per-label counts.
///
/// Only labels present in `counts` participate; a label that never won is
/// simply absent rather than counted as zero.
pub fn label_skew(counts: &BTreeMap<Algorithm, usize>) -> Option<LabelSkew> {
    let min = *counts.values().min()?;
    let max = *counts.values().max()?;
    let total: usize = counts.values().sum();
    let labels = counts.len();
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut per_label: Vec<LabelShare> = counts
        .iter()
        .map(|(label, count)| LabelShare {
            label: *label,
            count: *count,
            share: share(*count, total),
        })
        .collect();
    per_label.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    Some(LabelSkew {
        total,
        labels,
        min,
        max,
        mean: total as f64 / labels as f64,
        max_share: share(max, total),
        min_share: share(min, total),
        ratio,
        per_label,
    })
}

/// Multi-class confusion matrix; rows are actual labels, columns predictions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfusionMatrix {
    classes: Vec<Algorithm>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Empty matrix over `classes`.
    pub fn new(classes: &[Algorithm]) -> Self {
        Self {
            classes: classes.to_vec(),
            counts: vec![vec![0; classes.len()]; classes.len()],
        }
    }

    /// Record one prediction. Labels outside `classes` are ignored.
    pub fn record(&mut self, actual: Algorithm, predicted: Algorithm) {
        if let (Some(row), Some(col)) = (self.index_of(actual), self.index_of(predicted)) {
            self.counts[row][col] += 1;
        }
    }

    fn index_of(&self, class: Algorithm) -> Option<usize> {
        self.classes.iter().position(|c| *c == class)
    }

    /// Classes in row/column order.
    pub fn classes(&self) -> &[Algorithm] {
        &self.classes
    }

    /// Count of examples labeled `actual` and predicted `predicted`.
    pub fn count(&self, actual: Algorithm, predicted: Algorithm) -> usize {
        match (self.index_of(actual), self.index_of(predicted)) {
            (Some(row), Some(col)) => self.counts[row][col],
            _ => 0,
        }
    }

    /// Number of recorded predictions.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of correct predictions (the diagonal).
    pub fn correct(&self) -> usize {
        (0..self.classes.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Fraction of correct predictions; `0.0` when empty.
    pub fn accuracy(&self) -> f64 {
        share(self.correct(), self.total())
    }

    /// Examples whose actual label is `class`.
    pub fn support(&self, class: Algorithm) -> usize {
        self.index_of(class)
            .map_or(0, |row| self.counts[row].iter().sum())
    }

    /// Examples predicted as `class`.
    pub fn predicted(&self, class: Algorithm) -> usize {
        self.index_of(class)
            .map_or(0, |col| self.counts.iter().map(|row| row[col]).sum())
    }

    fn true_positive(&self, class: Algorithm) -> usize {
        self.count(class, class)
    }

    /// `tp / (tp + fp)`; `0.0` when nothing was predicted as `class`.
    pub fn precision(&self, class: Algorithm) -> f64 {
        share(self.true_positive(class), self.predicted(class))
    }

    /// `tp / (tp + fn)`; `0.0` when `class` has no support.
    pub fn recall(&self, class: Algorithm) -> f64 {
        share(self.true_positive(class), self.support(class))
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self, class: Algorithm) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

/// Held-out metrics for one class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMetrics {
    pub algorithm: Algorithm,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Evaluation summary produced by a training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    /// Examples used to fit the classifier.
    pub train_size: usize,
    /// Examples held out for evaluation.
    pub test_size: usize,
    /// Held-out accuracy.
    pub accuracy: f64,
    /// Per-class metrics in class order.
    pub per_class: Vec<ClassMetrics>,
    /// Unweighted mean precision over classes.
    pub macro_precision: f64,
    /// Unweighted mean recall over classes.
    pub macro_recall: f64,
    /// Unweighted mean F1 over classes.
    pub macro_f1: f64,
    /// Full held-out confusion matrix.
    pub confusion: ConfusionMatrix,
}

impl TrainingReport {
    /// Derive every metric from a held-out confusion matrix.
    pub fn from_confusion(train_size: usize, confusion: ConfusionMatrix) -> Self {
        let per_class: Vec<ClassMetrics> = confusion
            .classes()
            .iter()
            .map(|&algorithm| ClassMetrics {
                algorithm,
                precision: confusion.precision(algorithm),
                recall: confusion.recall(algorithm),
                f1: confusion.f1(algorithm),
                support: confusion.support(algorithm),
            })
            .collect();
        let mean = |pick: fn(&ClassMetrics) -> f64| {
            if per_class.is_empty() {
                0.0
            } else {
                per_class.iter().map(pick).sum::<f64>() / per_class.len() as f64
            }
        };
        let macro_precision = mean(|m| m.precision);
        let macro_recall = mean(|m| m.recall);
        let macro_f1 = mean(|m| m.f1);
        Self {
            train_size,
            test_size: confusion.total(),
            accuracy: confusion.accuracy(),
            per_class,
            macro_precision,
            macro_recall,
            macro_f1,
            confusion,
        }
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "train={} test={} accuracy={:.4}",
            self.train_size, self.test_size, self.accuracy
        )?;
        writeln!(
            f,
            "{:>10} {:>9} {:>9} {:>9} {:>8}",
            "class", "precision", "recall", "f1", "support"
        )?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>10} {:>9.3} {:>9.3} {:>9.3} {:>8}",
                m.algorithm.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        write!(
            f,
            "{:>10} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            "macro", self.macro_precision, self.macro_recall, self.macro_f1, self.test_size
        )
    }
}
