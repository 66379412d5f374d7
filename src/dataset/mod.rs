//! Dataset layout and read access
//!
//! This module provides memory-mapped, read-only access to vectorized
//! feature matrices and label vectors, the train/test split selectors and
//! the on-disk layout of a data directory.

pub mod binary_dataset;
pub mod layout;
pub mod manifest;
pub mod reader;
pub mod split;

pub use binary_dataset::{LabelMask, MatrixView, VectorView, ELEMENT_SIZE, UNLABELED};
pub use layout::{DataLayout, DEFAULT_TRAIN_SHARDS, MANIFEST_FILE, METADATA_FILE};
pub use manifest::{Manifest, SplitEntry};
pub use reader::{read_vectorized_features, DatasetReader, SplitData, VectorizedFeatures};
pub use split::{Split, SplitSelection};
