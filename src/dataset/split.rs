//! Train/test partition selectors

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::{Result, VectorizeError};

/// Dataset partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// All splits in pipeline order
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    /// Parse a split name, rejecting anything outside {train, test}
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            other => Err(VectorizeError::InvalidArgument(format!(
                "unknown split '{}', expected 'train' or 'test'",
                other
            ))),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which splits an operation should touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitSelection {
    #[default]
    Both,
    Only(Split),
}

impl SplitSelection {
    /// Parse an optional subset name; `None` selects both splits
    pub fn parse(subset: Option<&str>) -> Result<Self> {
        match subset {
            None => Ok(SplitSelection::Both),
            Some(name) => Split::parse(name).map(SplitSelection::Only),
        }
    }

    /// Whether `split` is part of this selection
    pub fn includes(&self, split: Split) -> bool {
        match self {
            SplitSelection::Both => true,
            SplitSelection::Only(only) => *only == split,
        }
    }

    /// Selected splits in pipeline order
    pub fn splits(&self) -> Vec<Split> {
        Split::ALL
            .into_iter()
            .filter(|s| self.includes(*s))
            .collect()
    }
}
