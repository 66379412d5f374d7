//! ember-vectorizer library
//!
//! Converts line-delimited raw feature records into dense `f32` matrices
//! stored as flat memory-mapped files, for out-of-core training and
//! inference.
//!
//! Vectorization counts the records of a split, preallocates the matrix and
//! label files at their final size, then fans the records out to a scoped
//! worker pool. Each worker maps the files itself and writes only the rows
//! it was handed, so no two workers ever touch the same bytes.

pub mod config;
pub mod dataset;
pub mod extractor;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod storage;
pub mod utils;

pub use dataset::{read_vectorized_features, DataLayout, Split, SplitSelection};
pub use extractor::{FeatureExtractor, FeatureVersion, PrecomputedExtractor};
pub use metadata::{create_metadata, read_metadata};
pub use model::{predict_sample, train_model, Classifier, Trainer, TrainingSet};
pub use pipeline::{create_vectorized_features, VectorizationCoordinator, VectorizeOptions};
pub use utils::{Result, VectorizeError};
