//! Utility modules

pub mod error;

pub use error::{DecodeError, ExtractorError, Result, VectorizeError};
