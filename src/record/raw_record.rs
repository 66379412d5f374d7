//! Decoded raw feature records
//!
//! Each input line is a JSON object. The fields the pipeline relies on are
//! validated here, at the decode boundary; everything else is kept as the
//! extractor-specific payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::DecodeError;

/// Record label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Label {
    Unlabeled,
    Benign,
    Malicious,
}

impl Label {
    /// Value stored in the label vector
    #[inline]
    pub fn as_f32(&self) -> f32 {
        i64::from(*self) as f32
    }

    pub fn is_labeled(&self) -> bool {
        !matches!(self, Label::Unlabeled)
    }
}

impl TryFrom<i64> for Label {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Label::Unlabeled),
            0 => Ok(Label::Benign),
            1 => Ok(Label::Malicious),
            other => Err(format!("label must be -1, 0 or 1, got {}", other)),
        }
    }
}

impl From<Label> for i64 {
    fn from(label: Label) -> Self {
        match label {
            Label::Unlabeled => -1,
            Label::Benign => 0,
            Label::Malicious => 1,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// One decoded raw feature record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    /// Content hash of the sample
    #[serde(rename = "sha256")]
    pub identifier: String,

    pub label: Label,

    /// First-seen date
    #[serde(default)]
    pub appeared: Option<String>,

    /// Classification family
    #[serde(rename = "avclass", default)]
    pub family: Option<String>,

    /// Extractor-specific fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RawRecord {
    /// Decode one input line; invalid UTF-8 is a decode error
    pub fn decode(line: impl AsRef<[u8]>) -> Result<Self, DecodeError> {
        let record: RawRecord = serde_json::from_slice(line.as_ref())?;
        if record.identifier.is_empty() {
            return Err(DecodeError::EmptyIdentifier);
        }
        Ok(record)
    }

    /// Look up a payload field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}
