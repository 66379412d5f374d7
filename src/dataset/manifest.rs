//! Vectorization manifest
//!
//! The feature files are headerless, so the shape and feature version they
//! were written with live in a JSON sidecar next to them. An entry for a
//! split is only recorded after that split finished vectorizing; a crash
//! mid-run leaves the split without an entry.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::split::Split;
use crate::extractor::FeatureVersion;
use crate::utils::{Result, VectorizeError};

/// Manifest format version
pub const MANIFEST_FORMAT: u32 = 2;

/// Per-split record of a completed run
///
/// Each split carries the version and dim it was written with, since the
/// splits of one directory can be vectorized by separate runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitEntry {
    pub feature_version: FeatureVersion,
    pub dim: usize,
    pub rows: u64,
}

impl SplitEntry {
    pub fn new(feature_version: FeatureVersion, dim: usize, rows: u64) -> Self {
        Self {
            feature_version,
            dim,
            rows,
        }
    }
}

/// Contents of `vectorized.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format: u32,
    #[serde(default)]
    pub splits: BTreeMap<Split, SplitEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            format: MANIFEST_FORMAT,
            splits: BTreeMap::new(),
        }
    }

    /// Load the manifest, `Ok(None)` if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let bytes = match fs::read(path.as_ref()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        let format = value.get("format").and_then(|f| f.as_u64()).unwrap_or(0);
        if format != u64::from(MANIFEST_FORMAT) {
            return Err(VectorizeError::InvalidArgument(format!(
                "unsupported manifest format {} in {:?}; re-vectorize the data directory",
                format,
                path.as_ref()
            )));
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Write the manifest via a temporary file and rename
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        debug!("Wrote manifest {:?}", path);
        Ok(())
    }

    /// Start a run for `split`: keep the other splits' entries and clear
    /// the one being rewritten
    pub fn begin_split(existing: Option<Manifest>, split: Split) -> Self {
        let mut manifest = existing.unwrap_or_default();
        manifest.format = MANIFEST_FORMAT;
        manifest.splits.remove(&split);
        manifest
    }

    pub fn record_split(&mut self, split: Split, entry: SplitEntry) {
        self.splits.insert(split, entry);
    }

    pub fn split(&self, split: Split) -> Option<SplitEntry> {
        self.splits.get(&split).copied()
    }

    /// Entry for `split`, rejecting a missing entry or one written with a
    /// different feature version or dim
    pub fn check_split(
        &self,
        path: &Path,
        split: Split,
        feature_version: FeatureVersion,
        dim: usize,
    ) -> Result<SplitEntry> {
        let entry = self
            .split(split)
            .ok_or(VectorizeError::IncompleteSplit { split })?;
        if entry.feature_version != feature_version {
            return Err(VectorizeError::VersionMismatch {
                written: entry.feature_version.epoch(),
                expected: feature_version.epoch(),
            });
        }
        if entry.dim != dim {
            return Err(VectorizeError::ShapeMismatch {
                path: path.to_path_buf(),
                reason: format!(
                    "{} written with dim {}, reader expects dim {}",
                    split, entry.dim, dim
                ),
            });
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(epoch: u32, dim: usize, rows: u64) -> SplitEntry {
        SplitEntry::new(FeatureVersion::new(epoch), dim, rows)
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectorized.json");

        assert!(Manifest::load(&path).unwrap().is_none());

        let mut manifest = Manifest::new();
        manifest.record_split(Split::Train, entry(2018, 4, 10));
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.split(Split::Train), Some(entry(2018, 4, 10)));
        assert_eq!(loaded.split(Split::Test), None);
    }

    #[test]
    fn test_load_rejects_other_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectorized.json");
        fs::write(&path, r#"{"format":1,"feature_version":2018,"dim":4,"splits":{}}"#).unwrap();

        assert!(matches!(
            Manifest::load(&path),
            Err(VectorizeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_begin_split_keeps_other_splits() {
        let mut old = Manifest::new();
        old.record_split(Split::Train, entry(2017, 4, 5));
        old.record_split(Split::Test, entry(2017, 4, 3));

        let next = Manifest::begin_split(Some(old), Split::Train);
        assert_eq!(next.split(Split::Train), None);
        assert_eq!(next.split(Split::Test), Some(entry(2017, 4, 3)));
    }

    #[test]
    fn test_check_split() {
        let mut manifest = Manifest::new();
        manifest.record_split(Split::Train, entry(2018, 4, 7));
        let path = Path::new("vectorized.json");
        let v2018 = FeatureVersion::new(2018);

        assert_eq!(
            manifest.check_split(path, Split::Train, v2018, 4).unwrap().rows,
            7
        );
        assert!(matches!(
            manifest.check_split(path, Split::Train, FeatureVersion::new(2017), 4),
            Err(VectorizeError::VersionMismatch { written: 2018, expected: 2017 })
        ));
        assert!(matches!(
            manifest.check_split(path, Split::Train, v2018, 8),
            Err(VectorizeError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            manifest.check_split(path, Split::Test, v2018, 4),
            Err(VectorizeError::IncompleteSplit { split: Split::Test })
        ));
    }
}
