use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use tracing::info;

use crate::config::{DatasetConfig, ForestConfig, ServiceConfig, TrainingConfig, resolve_model_path};
use crate::constants::dataset::{DEFAULT_DATASET_FILENAME, DEFAULT_SAMPLE_COUNT};
use crate::constants::service::DEFAULT_ADDR;
use crate::constants::training::{
    DEFAULT_FOREST_SEED, DEFAULT_SPLIT_SEED, DEFAULT_TEST_RATIO, DEFAULT_TREE_COUNT,
};
use crate::corpus::Distribution;
use crate::dataset::Dataset;
use crate::features;
use crate::labeler::{CostKind, Labeler};
use crate::service::http;
use crate::sorting::Algorithm;
use crate::training::{TrainingOutcome, train_and_save, train_from_dataset};

#[derive(Debug, Parser)]
#[command(
    name = "sortpick-train",
    disable_help_subcommand = true,
    about = "Generate a labeled corpus and train the recommender",
    long_about = "Generate synthetic sequences, label each with the cheapest sorting algorithm, fit a random forest on their features, and persist the model plus a CSV export of the dataset.",
    after_help = "The model path is resolved in order by --model, the SORTPICK_MODEL environment variable, then model.bin."
)]
struct TrainCli {
    #[arg(
        long,
        default_value_t = DEFAULT_SAMPLE_COUNT,
        value_parser = parse_positive_usize,
        help = "Number of labeled examples to generate"
    )]
    samples: usize,
    #[arg(
        long,
        value_name = "N,N,...",
        value_parser = parse_sizes,
        default_value = "10,20,30,50",
        help = "Comma-separated sequence sizes to sample from"
    )]
    sizes: Sizes,
    #[arg(
        long,
        value_name = "NAME,NAME,...",
        value_parser = parse_distributions,
        default_value = "uniform,nearly_sorted,reversed,few_unique",
        help = "Comma-separated input distributions to sample from"
    )]
    distributions: Distributions,
    #[arg(long, help = "Optional deterministic seed for sequence generation")]
    seed: Option<u64>,
    #[arg(
        long,
        value_parser = parse_cost,
        default_value = "wall-clock",
        help = "Labeling cost: wall-clock, comparisons or swaps"
    )]
    cost: CostKind,
    #[arg(long, help = "Label examples on the calling thread only")]
    sequential: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_TREE_COUNT,
        value_parser = parse_positive_usize,
        help = "Number of trees in the forest"
    )]
    trees: usize,
    #[arg(long = "max-depth", help = "Optional maximum tree depth")]
    max_depth: Option<usize>,
    #[arg(long = "forest-seed", default_value_t = DEFAULT_FOREST_SEED)]
    forest_seed: u64,
    #[arg(
        long = "test-ratio",
        default_value_t = DEFAULT_TEST_RATIO,
        help = "Fraction of examples held out for evaluation"
    )]
    test_ratio: f64,
    #[arg(long = "split-seed", default_value_t = DEFAULT_SPLIT_SEED)]
    split_seed: u64,
    #[arg(long, value_name = "PATH", help = "Where to write the model artifact")]
    model: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_DATASET_FILENAME,
        help = "Where to write the CSV dataset export"
    )]
    dataset: PathBuf,
    #[arg(long = "no-export", help = "Skip writing the CSV dataset export")]
    no_export: bool,
    #[arg(
        long = "from-dataset",
        value_name = "PATH",
        conflicts_with_all = ["samples", "seed", "sequential"],
        help = "Retrain from an existing CSV export instead of generating"
    )]
    from_dataset: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "sortpick-serve",
    disable_help_subcommand = true,
    about = "Serve sorting algorithm recommendations over HTTP",
    after_help = "Without a loadable model every answer is the fallback (merge, confidence 0)."
)]
struct ServeCli {
    #[arg(long, default_value = DEFAULT_ADDR, help = "Listen address (host:port)")]
    addr: String,
    #[arg(long, value_name = "PATH", help = "Model artifact to load")]
    model: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "sortpick-label",
    disable_help_subcommand = true,
    about = "Measure every algorithm on one sequence and show the label"
)]
struct LabelCli {
    #[arg(
        long,
        value_name = "X,Y,...",
        value_parser = parse_array,
        allow_hyphen_values = true,
        help = "Comma-separated numbers to label"
    )]
    array: Numbers,
    #[arg(
        long,
        value_parser = parse_cost,
        default_value = "wall-clock",
        help = "Labeling cost: wall-clock, comparisons or swaps"
    )]
    cost: CostKind,
}

// Newtypes keep clap from treating `Vec<_>` fields as repeated arguments.
#[derive(Debug, Clone)]
struct Sizes(Vec<usize>);
#[derive(Debug, Clone)]
struct Distributions(Vec<Distribution>);
#[derive(Debug, Clone)]
struct Numbers(Vec<f64>);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runner behind `sortpick-train`.
pub fn run_train<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<TrainCli, _>(std::iter::once("sortpick-train".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = TrainingConfig {
        dataset: DatasetConfig {
            samples: cli.samples,
            sizes: cli.sizes.0,
            distributions: cli.distributions.0,
            seed: cli.seed,
            cost: cli.cost,
            parallel: !cli.sequential,
        },
        forest: ForestConfig {
            trees: cli.trees,
            max_depth: cli.max_depth,
            seed: cli.forest_seed,
            ..ForestConfig::default()
        },
        test_ratio: cli.test_ratio,
        split_seed: cli.split_seed,
    };
    let model_path = resolve_model_path(cli.model);
    let export = (!cli.no_export).then_some(cli.dataset.as_path());

    let outcome = match &cli.from_dataset {
        Some(source) => {
            let dataset = Dataset::load_csv(source)?;
            let outcome = train_from_dataset(dataset, &config)?;
            outcome.artifact.save(&model_path)?;
            outcome
        }
        None => train_and_save(&config, &model_path, export)?,
    };
    print_outcome(&outcome);
    info!(model = %model_path.display(), "training finished");
    Ok(())
}

fn print_outcome(outcome: &TrainingOutcome) {
    let summary = outcome.dataset.summary();
    println!("dataset: {} examples", summary.total);
    for (label, count) in &summary.label_counts {
        println!("  {label:>10}: {count}");
    }
    if let Some(skew) = &summary.label_skew {
        println!(
            "label skew: max share {:.3}, max/min ratio {:.2}",
            skew.max_share, skew.ratio
        );
    }
    println!(
        "labels decided past the primary cost key: {}",
        summary.tie_broken()
    );
    println!();
    println!("{}", outcome.report);
}

/// Runner behind `sortpick-serve`.
pub fn run_serve<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<ServeCli, _>(std::iter::once("sortpick-serve".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };
    http::run(ServiceConfig {
        addr: cli.addr,
        model_path: resolve_model_path(cli.model),
    })?;
    Ok(())
}

/// Runner behind `sortpick-label`.
pub fn run_label<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<LabelCli, _>(std::iter::once("sortpick-label".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let sequence = cli.array.0;
    let features = features::extract(&sequence);
    let labeling = Labeler::with_cost(cli.cost).label(&sequence);

    println!("{}", serde_json::to_string_pretty(&features)?);
    println!(
        "{:>10} {:>12} {:>12} {:>8}",
        "algorithm", "elapsed_ms", "comparisons", "swaps"
    );
    for algorithm in Algorithm::ALL {
        if let Some(m) = labeling.measurement(algorithm) {
            println!(
                "{:>10} {:>12.6} {:>12} {:>8}",
                algorithm.as_str(),
                m.elapsed_ms(),
                m.comparisons,
                m.swaps
            );
        }
    }
    println!(
        "winner: {} (cost {}, decided by {})",
        labeling.winner, cli.cost, labeling.tie_break
    );
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_sizes(raw: &str) -> Result<Sizes, String> {
    let sizes = raw
        .split(',')
        .map(parse_positive_usize)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Sizes(sizes))
}

fn parse_distributions(raw: &str) -> Result<Distributions, String> {
    let distributions = raw
        .split(',')
        .map(|name| name.parse::<Distribution>().map_err(|err| err.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Distributions(distributions))
}

fn parse_cost(raw: &str) -> Result<CostKind, String> {
    raw.parse().map_err(|err: crate::SortpickError| err.to_string())
}

fn parse_array(raw: &str) -> Result<Numbers, String> {
    if raw.trim().is_empty() {
        return Ok(Numbers(Vec::new()));
    }
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("'{}' is not a finite number", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Numbers(values))
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(parse_cli::<TrainCli, _>(["sortpick-train", "--help"]).unwrap().is_none());
        assert!(run_label(args(&["--help"])).is_ok());
    }

    #[test]
    fn train_defaults_match_the_reference_setup() {
        let cli = parse_cli::<TrainCli, _>(["sortpick-train"]).unwrap().unwrap();
        assert_eq!(cli.samples, 1800);
        assert_eq!(cli.sizes.0, vec![10, 20, 30, 50]);
        assert_eq!(cli.distributions.0, Distribution::ALL.to_vec());
        assert_eq!(cli.cost, CostKind::WallClock);
        assert_eq!(cli.trees, 200);
        assert_eq!(cli.dataset, PathBuf::from("benchmark_dataset.csv"));
    }

    #[test]
    fn list_parsers_reject_bad_entries() {
        assert!(parse_sizes("10,0").is_err());
        assert!(parse_distributions("uniform,zipf").is_err());
        assert!(parse_cost("latency").is_err());
        assert!(parse_array("1,x").is_err());
        assert_eq!(parse_array("-2, 3.5,1").unwrap().0, vec![-2.0, 3.5, 1.0]);
        assert!(parse_array("").unwrap().0.is_empty());
    }

    #[test]
    fn label_runner_accepts_negative_numbers() {
        run_label(args(&["--array", "-3,1,2", "--cost", "comparisons"])).unwrap();
    }

    #[test]
    fn train_runner_writes_model_and_export() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("model.bin");
        let export = dir.path().join("dataset.csv");
        run_train(args(&[
            "--samples",
            "40",
            "--sizes",
            "6,12",
            "--distributions",
            "reversed",
            "--cost",
            "comparisons",
            "--seed",
            "3",
            "--trees",
            "5",
            "--model",
            model.to_str().unwrap(),
            "--dataset",
            export.to_str().unwrap(),
        ]))
        .unwrap();
        assert!(model.exists());
        assert!(export.exists());

        let retrained = dir.path().join("retrained.bin");
        run_train(args(&[
            "--from-dataset",
            export.to_str().unwrap(),
            "--trees",
            "3",
            "--model",
            retrained.to_str().unwrap(),
        ]))
        .unwrap();
        assert!(retrained.exists());
    }
}
