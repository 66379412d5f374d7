//! Pipeline configuration derived from CLI arguments

use super::cli::CliArgs;
use crate::dataset::{DataLayout, SplitSelection};
use crate::extractor::{FeatureVersion, PrecomputedExtractor};
use crate::pipeline::VectorizeOptions;
use crate::storage::AllocationMode;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Data
    pub data_dir: PathBuf,
    pub train_shards: usize,
    pub selection: SplitSelection,

    // Features
    pub feature_version: FeatureVersion,
    pub dim: usize,
    pub feature_field: String,

    // Execution
    pub threads: usize,
    pub queue_depth: usize,
    pub allocation: AllocationMode,
    pub vectorize: bool,
    pub metadata: bool,

    // Output
    pub quiet: bool,
    pub verbose: bool,
}

impl PipelineConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        // Validate first
        args.validate()?;

        let selection = SplitSelection::parse(args.subset.as_deref()).map_err(|e| e.to_string())?;

        let allocation = if args.reuse_storage {
            AllocationMode::Reuse
        } else {
            AllocationMode::Truncate
        };

        Ok(Self {
            data_dir: args.data_dir.clone(),
            train_shards: args.train_shards,
            selection,

            feature_version: FeatureVersion::new(args.feature_version),
            dim: args.dim,
            feature_field: args.feature_field.clone(),

            threads: args.effective_threads(),
            queue_depth: args.queue_depth,
            allocation,
            vectorize: !args.skip_vectorize,
            metadata: args.metadata,

            quiet: args.quiet,
            verbose: args.verbose,
        })
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::with_train_shards(&self.data_dir, self.train_shards)
    }

    pub fn extractor(&self) -> PrecomputedExtractor {
        PrecomputedExtractor::new(self.dim)
            .with_field(self.feature_field.clone())
            .with_version(self.feature_version)
    }

    pub fn vectorize_options(&self) -> VectorizeOptions {
        VectorizeOptions {
            threads: self.threads,
            queue_depth: self.queue_depth,
            allocation: self.allocation,
            show_progress: !self.quiet,
        }
    }
}
