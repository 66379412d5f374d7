//! ember-vectorizer - Vectorize raw feature shards into memory-mapped matrices
//!
//! Reads `train_features_*.jsonl` and `test_features.jsonl` from a data
//! directory and writes `X_{split}.dat` / `y_{split}.dat` next to them.

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ember_vectorizer::config::{CliArgs, PipelineConfig};
use ember_vectorizer::extractor::FeatureExtractor;
use ember_vectorizer::metadata::create_metadata;
use ember_vectorizer::pipeline::VectorizationCoordinator;

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn print_banner(config: &PipelineConfig) {
    if config.quiet {
        return;
    }

    println!("ember-vectorizer v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Data dir: {:?}", config.data_dir);
    println!(
        "Splits: {:?}, Train shards: {}",
        config.selection.splits(),
        config.train_shards
    );
    println!(
        "Features: {} (dim={}, field='{}')",
        config.feature_version, config.dim, config.feature_field
    );
    println!(
        "Threads: {}, Queue depth: {}, Storage: {:?}",
        config.threads, config.queue_depth, config.allocation
    );
    println!("====================================\n");
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet)?;

    // Build configuration
    let config = PipelineConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    print_banner(&config);

    let layout = config.layout();
    let extractor = config.extractor();

    let summaries = if config.vectorize {
        info!(
            "Vectorizing with {} (dim={})",
            extractor.version(),
            extractor.dim()
        );
        let coordinator = VectorizationCoordinator::new(&extractor, config.vectorize_options());
        coordinator
            .vectorize_all(&layout, config.selection)
            .context("Vectorization failed")?
    } else {
        Vec::new()
    };

    if config.metadata {
        info!("Creating metadata file");
        let table = create_metadata(&layout, config.threads, !config.quiet)
            .context("Metadata creation failed")?;
        info!("Metadata holds {} rows", table.len());
    }

    // Print summary
    if !config.quiet && !summaries.is_empty() {
        println!("\n====================================");
        println!("VECTORIZATION COMPLETE");
        println!("====================================");
        for summary in &summaries {
            println!("{}", summary.summary());
        }
        let total_rows: u64 = summaries.iter().map(|s| s.rows).sum();
        println!("Total rows: {}", total_rows);
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
