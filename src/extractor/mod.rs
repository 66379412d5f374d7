//! Feature extractor contract
//!
//! The pipeline treats feature extraction as a black box: an extractor maps
//! a decoded record (training path) or a raw binary sample (inference path)
//! to a vector of exactly [`FeatureExtractor::dim`] values. Both paths must
//! agree on length and on what each position means for a given
//! [`FeatureVersion`].

pub mod precomputed;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::RawRecord;
use crate::utils::ExtractorError;

pub use precomputed::PrecomputedExtractor;

/// Default feature schema epoch
pub const DEFAULT_FEATURE_EPOCH: u32 = 2018;

/// Feature schema version
///
/// Selects the extractor's dimensionality and field interpretation. Files
/// written with one version must be read with the same version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVersion(u32);

impl FeatureVersion {
    pub const fn new(epoch: u32) -> Self {
        Self(epoch)
    }

    pub const fn epoch(&self) -> u32 {
        self.0
    }
}

impl Default for FeatureVersion {
    fn default() -> Self {
        Self(DEFAULT_FEATURE_EPOCH)
    }
}

impl fmt::Display for FeatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Maps records and raw samples to fixed-length feature vectors
///
/// One instance is shared by every vectorization worker.
pub trait FeatureExtractor: Send + Sync {
    /// Output vector length
    fn dim(&self) -> usize;

    /// Schema version this extractor implements
    fn version(&self) -> FeatureVersion {
        FeatureVersion::default()
    }

    /// Vectorize a precomputed raw record
    fn vectorize(&self, record: &RawRecord) -> Result<Vec<f32>, ExtractorError>;

    /// Vectorize a single unseen binary sample
    fn vectorize_sample(&self, sample: &[u8]) -> Result<Vec<f32>, ExtractorError>;
}

impl<T: FeatureExtractor + ?Sized> FeatureExtractor for &T {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn version(&self) -> FeatureVersion {
        (**self).version()
    }

    fn vectorize(&self, record: &RawRecord) -> Result<Vec<f32>, ExtractorError> {
        (**self).vectorize(record)
    }

    fn vectorize_sample(&self, sample: &[u8]) -> Result<Vec<f32>, ExtractorError> {
        (**self).vectorize_sample(sample)
    }
}
