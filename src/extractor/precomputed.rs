//! Extractor for records that already carry their feature vector

use serde_json::Value;

use super::{FeatureExtractor, FeatureVersion};
use crate::record::RawRecord;
use crate::utils::ExtractorError;

/// Default payload field holding the vector
pub const DEFAULT_FEATURE_FIELD: &str = "features";

/// Reads a numeric array from a payload field
///
/// Inference samples are `dim` little-endian `f32` values. The extractor
/// does not check the array length; the row writer rejects vectors whose
/// length differs from [`FeatureExtractor::dim`].
#[derive(Debug, Clone)]
pub struct PrecomputedExtractor {
    field: String,
    dim: usize,
    version: FeatureVersion,
}

impl PrecomputedExtractor {
    pub fn new(dim: usize) -> Self {
        Self {
            field: DEFAULT_FEATURE_FIELD.to_string(),
            dim,
            version: FeatureVersion::default(),
        }
    }

    /// Read vectors from a different payload field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_version(mut self, version: FeatureVersion) -> Self {
        self.version = version;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl FeatureExtractor for PrecomputedExtractor {
    fn dim(&self) -> usize {
        self.dim
    }

    fn version(&self) -> FeatureVersion {
        self.version
    }

    fn vectorize(&self, record: &RawRecord) -> Result<Vec<f32>, ExtractorError> {
        let values = match record.field(&self.field) {
            Some(Value::Array(values)) => values,
            _ => return Err(ExtractorError::MissingField(self.field.clone())),
        };

        values
            .iter()
            .enumerate()
            .map(|(position, v)| {
                v.as_f64()
                    .map(|x| x as f32)
                    .ok_or_else(|| ExtractorError::NotNumeric {
                        field: self.field.clone(),
                        position,
                    })
            })
            .collect()
    }

    fn vectorize_sample(&self, sample: &[u8]) -> Result<Vec<f32>, ExtractorError> {
        let expected = self.dim * std::mem::size_of::<f32>();
        if sample.len() != expected {
            return Err(ExtractorError::SampleSize {
                expected,
                actual: sample.len(),
            });
        }
        Ok(sample
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}
