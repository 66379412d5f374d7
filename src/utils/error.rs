//! Error types for ember-vectorizer

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::Split;

/// Top-level pipeline error
#[derive(Error, Debug)]
pub enum VectorizeError {
    #[error("Failed to read input file {path}: {source}")]
    InputFile { path: PathBuf, source: io::Error },

    #[error("Malformed record at {split} row {row}: {reason}")]
    Decode {
        split: Split,
        row: u64,
        reason: String,
    },

    #[error("Extractor failed at {split} row {row}: {reason}")]
    Extractor {
        split: Split,
        row: u64,
        reason: String,
    },

    #[error("Extractor returned {actual} values at {split} row {row}, expected {expected}")]
    DimensionMismatch {
        split: Split,
        row: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Row index {row} out of range for {split} (allocated {rows} rows)")]
    RowIndexOutOfRange { split: Split, row: u64, rows: u64 },

    #[error("Input for {split} changed between passes: counted {counted} rows, generated {generated} tasks")]
    RowCountDrift {
        split: Split,
        counted: u64,
        generated: u64,
    },

    #[error("Failed to vectorize sample: {0}")]
    Sample(#[from] ExtractorError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Shape mismatch for {path}: {reason}")]
    ShapeMismatch { path: PathBuf, reason: String },

    #[error("Existing file {path} is {actual} bytes, expected {expected} bytes")]
    SizeConflict {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("No completed run recorded for {split}; its files may be partial or stale")]
    IncompleteSplit { split: Split },

    #[error("Feature version mismatch: files written with {written}, reader expects {expected}")]
    VersionMismatch { written: u32, expected: u32 },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Failure raised by a feature extractor, before it is tied to a row
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("missing payload field '{0}'")]
    MissingField(String),

    #[error("payload field '{field}' is not numeric at position {position}")]
    NotNumeric { field: String, position: usize },

    #[error("sample is {actual} bytes, expected {expected} bytes")]
    SampleSize { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

/// Failure decoding one raw record line
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record has an empty identifier")]
    EmptyIdentifier,
}

pub type Result<T> = std::result::Result<T, VectorizeError>;
