use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use rfsmote_io::{
    AverageScore, ClassScore, DatasetReader, FeatureScore, ImportanceChart, ReportWriter,
    RunMetrics,
};
use rfsmote_resample::{ClassCounts, RowCap, SamplingStrategy, SmoteConfig, StratifiedSplit};
use rfsmote_rf::{
    AverageMetrics, ClassWeight, ClassificationReport, ConfusionMatrix, MaxFeatures,
    RandomForestConfig, SplitMethod,
};

#[derive(Parser)]
#[command(name = "rfsmote")]
#[command(about = "Train a class-weighted RandomForest on SMOTE-balanced health indicators")]
#[command(version)]
struct Cli {
    /// Path to the input CSV file
    #[arg(long, default_value = "diabetes.csv")]
    data: PathBuf,

    /// Name of the integer class column
    #[arg(long, default_value = "Diabetes_012")]
    target: String,

    /// Output directory for the importance table and chart
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Row count every non-majority class is oversampled to
    #[arg(long, default_value_t = 30_000)]
    smote_target: usize,

    /// Number of same-class neighbors SMOTE interpolates toward
    #[arg(long, default_value_t = 5)]
    k_neighbors: usize,

    /// Upper bound on training rows after oversampling
    #[arg(long, default_value_t = 150_000)]
    max_train_rows: usize,

    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 80)]
    n_trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value_t = 8)]
    max_depth: usize,

    /// Split-finding strategy: "exact" or "histogram"
    #[arg(long, default_value = "exact")]
    split_method: String,

    /// Quantile bins per feature for the histogram split method
    #[arg(long, default_value_t = 256)]
    n_bins: usize,

    /// Number of features drawn in the importance chart
    #[arg(long, default_value_t = 15)]
    top_n: usize,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Also write a metrics JSON file to this path
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Also save the trained model to this path
    #[arg(long)]
    model_out: Option<PathBuf>,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,
}

/// Logged as JSON on the final `info!` event.
#[derive(Serialize)]
struct RunSummary {
    n_train: usize,
    n_test: usize,
    n_trees: usize,
    accuracy: f64,
    importances_csv: PathBuf,
    importances_png: PathBuf,
}

fn parse_split_method(s: &str, n_bins: usize) -> Result<SplitMethod> {
    match s {
        "exact" => Ok(SplitMethod::Exact),
        "histogram" => Ok(SplitMethod::Histogram { n_bins }),
        other => bail!("unknown split method: {other} (expected exact or histogram)"),
    }
}

fn counts_map(counts: &ClassCounts) -> BTreeMap<usize, usize> {
    counts.iter().collect()
}

fn average_score(avg: AverageMetrics) -> AverageScore {
    AverageScore {
        precision: avg.precision,
        recall: avg.recall,
        f1: avg.f1,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    if !cli.data.is_file() {
        let cwd = std::env::current_dir().unwrap_or_default();
        bail!("data file {} not found in {}", cli.data.display(), cwd.display());
    }

    // Validate all configuration before any work.
    let split_method = parse_split_method(&cli.split_method, cli.n_bins)?;
    let splitter = StratifiedSplit::new(cli.test_size)?.with_seed(cli.seed);
    let cap = RowCap::new(cli.max_train_rows)?.with_seed(cli.seed);
    let rf_config = RandomForestConfig::new(cli.n_trees)?
        .with_max_depth(Some(cli.max_depth))
        .with_max_features(MaxFeatures::Sqrt)
        .with_class_weight(ClassWeight::Balanced)
        .with_split_method(split_method)
        .with_seed(cli.seed);

    // 1. Load
    info!(path = %cli.data.display(), "loading data");
    let dataset = DatasetReader::new(&cli.data, &cli.target)
        .read()
        .context("failed to load dataset")?;
    let (feature_names, features, labels) = dataset.into_parts();
    let full_counts = ClassCounts::from_labels(&labels);
    info!(distribution = %full_counts, "class distribution (original)");

    // 2. Split
    let split = splitter
        .split(&features, &labels)
        .context("stratified split failed")?;
    drop(features);
    let train_counts = ClassCounts::from_labels(&split.train_labels);
    info!(distribution = %train_counts, "class distribution (train before SMOTE)");

    // 3. Oversample
    let smote = SmoteConfig::new(SamplingStrategy::NotMajority(cli.smote_target))
        .with_k_neighbors(cli.k_neighbors)
        .with_seed(cli.seed);
    let strategy = smote.strategy().targets(&train_counts)?;
    info!(sampling_strategy = ?strategy, "SMOTE sampling strategy");
    let resampled = smote
        .resample(&split.train_features, &split.train_labels)
        .context("SMOTE resampling failed")?;
    let smote_counts = ClassCounts::from_labels(&resampled.labels);
    info!(distribution = %smote_counts, "class distribution (train after SMOTE)");

    // 4. Cap
    let (train_x, train_y) = cap
        .apply(resampled.features, resampled.labels)
        .context("row cap failed")?;
    let capped_counts = ClassCounts::from_labels(&train_y);
    info!(n_rows = train_y.len(), distribution = %capped_counts, "training set ready");

    // 5. Train
    info!(n_trees = cli.n_trees, max_depth = cli.max_depth, "training RandomForest");
    let result = rf_config
        .fit(&train_x, &train_y, &feature_names)
        .context("RandomForest training failed")?;

    let meta = result.metadata();
    info!(
        class_weights = ?meta.class_weights,
        max_features = meta.max_features,
        total_nodes = meta.total_nodes,
        deepest = meta.deepest,
        "RandomForest fitted"
    );

    // 6. Evaluate
    let predicted = result
        .forest()
        .predict_batch(&split.test_features)
        .context("prediction failed")?;
    let confusion = ConfusionMatrix::from_labels(&split.test_labels, &predicted)?;
    let report = ClassificationReport::new(&confusion);

    println!("\nAccuracy: {:.4}", confusion.accuracy());
    println!("\nClassification report:\n{report}");
    println!("Confusion matrix:\n{confusion}");

    // 7. Write artifacts
    let ranked = result.ranked_pairs();
    let writer = ReportWriter::new(&cli.output_dir)?;
    let csv_path = writer.write_importances(&ranked)?;
    let png_path = writer.write_chart(&ImportanceChart::default().with_top_n(cli.top_n), &ranked)?;

    if let Some(metrics_path) = &cli.metrics {
        let metrics = RunMetrics {
            accuracy: report.accuracy(),
            classes: report
                .classes()
                .iter()
                .map(|m| ClassScore {
                    class: m.class,
                    precision: m.precision,
                    recall: m.recall,
                    f1: m.f1,
                    support: m.support,
                })
                .collect(),
            macro_avg: average_score(report.macro_avg()),
            weighted_avg: average_score(report.weighted_avg()),
            labels: confusion.labels(),
            confusion_matrix: confusion.as_rows(),
            class_distribution: BTreeMap::from([
                ("original", counts_map(&full_counts)),
                ("train", counts_map(&train_counts)),
                ("train_smote", counts_map(&smote_counts)),
                ("train_capped", counts_map(&capped_counts)),
                ("test", counts_map(&ClassCounts::from_labels(&split.test_labels))),
            ]),
            importances: result
                .importances()
                .iter()
                .map(|f| FeatureScore {
                    feature: &f.name,
                    importance: f.importance,
                    rank: f.rank,
                })
                .collect(),
        };
        writer.write_metrics(metrics_path, &metrics)?;
    }

    if let Some(model_path) = &cli.model_out {
        result
            .forest()
            .save(model_path)
            .context("failed to save model")?;
    }

    let summary = RunSummary {
        n_train: train_y.len(),
        n_test: split.test_labels.len(),
        n_trees: result.forest().n_trees(),
        accuracy: confusion.accuracy(),
        importances_csv: csv_path,
        importances_png: png_path,
    };
    info!(summary = %serde_json::to_string(&summary)?, "done");

    Ok(())
}
