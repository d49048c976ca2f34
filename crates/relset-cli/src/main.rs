//! relset CLI - Command-line interface
//!
//! Usage:
//!   relset build [--input <glob>] [--output <dir>] [--config <file>]
//!   relset stats [--input <glob>]

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relset_core::{AppConfig, LoggingConfig, RelationRegistry};
use relset_dataset::{build_dataset, DatasetWriter};
use relset_extractor::TripleAggregator;
use relset_parser::{load_corpus, HoldoutRouter};

#[derive(Parser)]
#[command(name = "relset")]
#[command(about = "Relation-extraction dataset builder for annotated documents")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate, split and write the dataset
    Build(BuildArgs),
    /// Print label statistics without writing anything
    Stats {
        /// Glob pattern of annotation export files
        #[arg(long)]
        input: Option<String>,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Glob pattern of annotation export files
    #[arg(long)]
    input: Option<String>,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Share of the training pool kept as train
    #[arg(long)]
    train_ratio: Option<f64>,

    /// Ignore holdout keywords and carve test out of the corpus
    #[arg(long)]
    no_holdout: bool,
}

impl BuildArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(input) = &self.input {
            config.input.pattern = input.clone();
        }
        if let Some(output) = &self.output {
            config.output.dir = output.clone();
        }
        if let Some(ratio) = self.train_ratio {
            config.split.train_ratio = ratio;
        }
        if self.no_holdout {
            config.holdout.keywords.clear();
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Default filter when `RUST_LOG` is unset: relset crates only
fn default_filter(level: &str) -> String {
    ["relset", "relset_core", "relset_parser", "relset_extractor", "relset_dataset"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.level).into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build(config: &AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let corpus = load_corpus(&config.input.pattern)
        .with_context(|| format!("Failed to load annotations from {}", config.input.pattern))?;
    let mut failed = corpus.failures.len();

    let router = HoldoutRouter::from_config(&config.holdout);
    let (training_docs, holdout_docs) = router.partition(corpus.documents);
    tracing::info!(
        "{} training document(s), {} holdout document(s)",
        training_docs.len(),
        holdout_docs.len()
    );

    let aggregator = TripleAggregator::new();
    let mut registry = RelationRegistry::new();
    let (training, training_failures) = aggregator.aggregate_into(&training_docs, &mut registry);
    let (holdout, holdout_failures) = aggregator.aggregate_into(&holdout_docs, &mut registry);
    failed += training_failures.len() + holdout_failures.len();

    let dataset = build_dataset(training, holdout, &config.split)?;
    let writer = DatasetWriter::from_config(&config.output);
    dataset
        .write(&writer, &registry)
        .with_context(|| format!("Failed to write dataset to {}", config.output.dir.display()))?;

    println!(
        "Wrote {} train, {} validation, {} test record(s) and {} relation label(s) to {}",
        dataset.train.len(),
        dataset.validation.len(),
        dataset.test.len(),
        registry.len(),
        config.output.dir.display()
    );
    if failed > 0 {
        println!("Skipped {failed} malformed document(s); see log for details");
    }
    Ok(())
}

/// Corpus summary printed by `relset stats`
#[derive(Debug)]
struct CorpusStats {
    documents: usize,
    records: usize,
    triples: usize,
    failed: usize,
    /// `(id, label, triple count)` in registry order
    labels: Vec<(usize, String, usize)>,
}

fn collect_stats(config: &AppConfig) -> anyhow::Result<CorpusStats> {
    let corpus = load_corpus(&config.input.pattern)
        .with_context(|| format!("Failed to load annotations from {}", config.input.pattern))?;
    let aggregation = TripleAggregator::new().aggregate_corpus(&corpus.documents);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in &aggregation.records {
        for (label, n) in record.label_counts() {
            *counts.entry(label).or_default() += n;
        }
    }

    let labels = aggregation
        .registry
        .iter()
        .map(|(id, label)| (id, label.to_string(), counts.get(label).copied().unwrap_or(0)))
        .collect();

    Ok(CorpusStats {
        documents: corpus.documents.len(),
        records: aggregation.records.len(),
        triples: aggregation.triple_count(),
        failed: corpus.failures.len() + aggregation.failures.len(),
        labels,
    })
}

fn stats(config: &AppConfig) -> anyhow::Result<()> {
    let summary = collect_stats(config)?;

    println!(
        "{} document(s), {} record(s), {} triple(s), {} failed",
        summary.documents, summary.records, summary.triples, summary.failed
    );
    for (id, label, count) in &summary.labels {
        println!("{:>4}  {:<32} {}", id, label, count);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    init_tracing(&config.logging);

    match cli.command {
        Commands::Build(args) => {
            args.apply(&mut config);
            build(&config)
        }
        Commands::Stats { input } => {
            if let Some(input) = input {
                config.input.pattern = input;
            }
            stats(&config)
        }
    }
}
