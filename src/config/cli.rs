//! Command-line argument parsing
//!
//! Arguments are grouped by category for clarity.

use clap::Parser;
use std::path::PathBuf;

use crate::dataset::{SplitSelection, DEFAULT_TRAIN_SHARDS};
use crate::extractor::precomputed::DEFAULT_FEATURE_FIELD;
use crate::extractor::DEFAULT_FEATURE_EPOCH;
use crate::pipeline::{effective_threads, DEFAULT_QUEUE_DEPTH};

/// Vector length of the 2018 feature schema
pub const DEFAULT_DIM: usize = 2381;

/// Vectorize line-delimited raw feature records into memory-mapped matrices
#[derive(Parser, Debug, Clone)]
#[command(name = "ember-vectorizer")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Data Directory =====
    /// Directory holding the raw shards; outputs are written next to them
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: PathBuf,

    /// Number of training shards (train_features_0.jsonl ...)
    #[arg(long = "train-shards", default_value_t = DEFAULT_TRAIN_SHARDS)]
    pub train_shards: usize,

    /// Only process one split: train or test
    #[arg(long = "subset")]
    pub subset: Option<String>,

    // ===== Features =====
    /// Feature schema version
    #[arg(short = 'v', long = "feature-version", default_value_t = DEFAULT_FEATURE_EPOCH)]
    pub feature_version: u32,

    /// Feature vector length
    #[arg(long = "dim", default_value_t = DEFAULT_DIM)]
    pub dim: usize,

    /// Record field holding the precomputed feature vector
    #[arg(long = "feature-field", default_value = DEFAULT_FEATURE_FIELD)]
    pub feature_field: String,

    // ===== Execution =====
    /// Number of worker threads (0 = available parallelism)
    #[arg(short = 't', long = "threads", default_value_t = 0)]
    pub threads: usize,

    /// Tasks queued ahead of the workers
    #[arg(long = "queue-depth", default_value_t = DEFAULT_QUEUE_DEPTH)]
    pub queue_depth: usize,

    /// Keep existing output files of the right size instead of truncating
    #[arg(long = "reuse-storage")]
    pub reuse_storage: bool,

    /// Do not vectorize (useful with --metadata)
    #[arg(long = "skip-vectorize")]
    pub skip_vectorize: bool,

    /// Also write metadata.csv
    #[arg(long = "metadata")]
    pub metadata: bool,

    // ===== Output =====
    /// Quiet mode (errors only, no progress bar)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose logging
    #[arg(long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.dim == 0 {
            return Err("--dim must be at least 1".to_string());
        }

        if self.train_shards == 0 {
            return Err("--train-shards must be at least 1".to_string());
        }

        if self.queue_depth == 0 {
            return Err("--queue-depth must be at least 1".to_string());
        }

        if self.skip_vectorize && !self.metadata {
            return Err("--skip-vectorize without --metadata leaves nothing to do".to_string());
        }

        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        SplitSelection::parse(self.subset.as_deref()).map_err(|e| e.to_string())?;

        Ok(())
    }

    /// Get effective number of threads (0 = auto-detect)
    pub fn effective_threads(&self) -> usize {
        effective_threads(self.threads)
    }
}
