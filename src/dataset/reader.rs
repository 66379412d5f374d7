//! Opening vectorized splits for training and evaluation

use tracing::debug;

use super::binary_dataset::{LabelMask, MatrixView, VectorView};
use super::layout::DataLayout;
use super::manifest::Manifest;
use super::split::{Split, SplitSelection};
use crate::extractor::{FeatureExtractor, FeatureVersion};
use crate::utils::{Result, VectorizeError};

/// Feature matrix and labels of one split
pub struct SplitData {
    pub split: Split,
    pub features: MatrixView,
    pub labels: VectorView,
}

impl SplitData {
    pub fn rows(&self) -> usize {
        self.features.rows()
    }

    /// Mask of rows with a known label
    pub fn labeled_mask(&self) -> LabelMask {
        self.labels.labeled_mask()
    }
}

/// Result of reading one or both splits
#[derive(Default)]
pub struct VectorizedFeatures {
    pub train: Option<SplitData>,
    pub test: Option<SplitData>,
}

impl VectorizedFeatures {
    pub fn get(&self, split: Split) -> Option<&SplitData> {
        match split {
            Split::Train => self.train.as_ref(),
            Split::Test => self.test.as_ref(),
        }
    }

    /// Take ownership of one split
    pub fn take(&mut self, split: Split) -> Option<SplitData> {
        match split {
            Split::Train => self.train.take(),
            Split::Test => self.test.take(),
        }
    }
}

/// Opens vectorized files with a fixed row width and feature version
#[derive(Debug, Clone)]
pub struct DatasetReader {
    layout: DataLayout,
    dim: usize,
    version: FeatureVersion,
}

impl DatasetReader {
    pub fn new(layout: DataLayout, dim: usize, version: FeatureVersion) -> Self {
        Self {
            layout,
            dim,
            version,
        }
    }

    /// Reader matching an extractor's dimensionality and version
    pub fn for_extractor<E: FeatureExtractor + ?Sized>(layout: DataLayout, extractor: &E) -> Self {
        Self::new(layout, extractor.dim(), extractor.version())
    }

    /// Open one split
    ///
    /// When a manifest is present, it must hold an entry for the split
    /// written with the same feature version and dim, and the row count must
    /// match the recorded one.
    pub fn open_split(&self, split: Split) -> Result<SplitData> {
        let manifest_path = self.layout.manifest_path();
        let entry = match Manifest::load(&manifest_path)? {
            Some(manifest) => {
                Some(manifest.check_split(&manifest_path, split, self.version, self.dim)?)
            }
            None => {
                debug!("No manifest in {:?}; checking file shape only", self.layout.data_dir());
                None
            }
        };

        let features = MatrixView::open(self.layout.features_path(split), self.dim)?;
        let labels = VectorView::open(self.layout.labels_path(split))?;

        if labels.len() != features.rows() {
            return Err(VectorizeError::ShapeMismatch {
                path: labels.path().to_path_buf(),
                reason: format!(
                    "{} labels for {} feature rows",
                    labels.len(),
                    features.rows()
                ),
            });
        }

        if let Some(entry) = entry {
            if entry.rows != features.rows() as u64 {
                return Err(VectorizeError::ShapeMismatch {
                    path: features.path().to_path_buf(),
                    reason: format!(
                        "manifest records {} rows, file holds {}",
                        entry.rows,
                        features.rows()
                    ),
                });
            }
        }

        debug!(
            "Opened {} split: {} rows, dim={}",
            split,
            features.rows(),
            self.dim
        );

        Ok(SplitData {
            split,
            features,
            labels,
        })
    }

    /// Open every split in `selection`
    pub fn read(&self, selection: SplitSelection) -> Result<VectorizedFeatures> {
        let mut result = VectorizedFeatures::default();
        for split in selection.splits() {
            let data = self.open_split(split)?;
            match split {
                Split::Train => result.train = Some(data),
                Split::Test => result.test = Some(data),
            }
        }
        Ok(result)
    }
}

/// Read vectorized features for `subset` ("train", "test", or both when `None`)
pub fn read_vectorized_features<E: FeatureExtractor + ?Sized>(
    layout: &DataLayout,
    subset: Option<&str>,
    extractor: &E,
) -> Result<VectorizedFeatures> {
    let selection = SplitSelection::parse(subset)?;
    DatasetReader::for_extractor(layout.clone(), extractor).read(selection)
}
