//! On-disk layout of a data directory
//!
//! A data directory holds the raw JSONL shards for each split, the
//! vectorized matrix/label files, the manifest and the metadata table:
//!
//! ```text
//! train_features_0.jsonl .. train_features_{N-1}.jsonl
//! test_features.jsonl
//! X_train.dat  y_train.dat  X_test.dat  y_test.dat
//! vectorized.json  metadata.csv
//! ```

use std::path::{Path, PathBuf};

use super::split::Split;

/// Default number of training shards
pub const DEFAULT_TRAIN_SHARDS: usize = 6;

/// Manifest file name
pub const MANIFEST_FILE: &str = "vectorized.json";

/// Metadata table file name
pub const METADATA_FILE: &str = "metadata.csv";

/// Resolves every path the pipeline reads or writes
#[derive(Debug, Clone)]
pub struct DataLayout {
    data_dir: PathBuf,
    train_shards: usize,
}

impl DataLayout {
    /// Layout with the default shard count
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::with_train_shards(data_dir, DEFAULT_TRAIN_SHARDS)
    }

    /// Layout with an explicit number of training shards
    pub fn with_train_shards<P: AsRef<Path>>(data_dir: P, train_shards: usize) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            train_shards,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn train_shards(&self) -> usize {
        self.train_shards
    }

    /// Raw feature shards for a split, in declared order
    pub fn raw_feature_paths(&self, split: Split) -> Vec<PathBuf> {
        match split {
            Split::Train => (0..self.train_shards)
                .map(|i| self.data_dir.join(format!("train_features_{}.jsonl", i)))
                .collect(),
            Split::Test => vec![self.data_dir.join("test_features.jsonl")],
        }
    }

    /// Feature matrix file for a split
    pub fn features_path(&self, split: Split) -> PathBuf {
        self.data_dir.join(format!("X_{}.dat", split.as_str()))
    }

    /// Label vector file for a split
    pub fn labels_path(&self, split: Split) -> PathBuf {
        self.data_dir.join(format!("y_{}.dat", split.as_str()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(MANIFEST_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(METADATA_FILE)
    }
}
