//! Training and prediction contract
//!
//! The classifier itself lives outside this crate. This module hands a
//! trainer the labeled rows of the train split and turns a raw sample into
//! a score through the same extractor that produced the training matrix.

use tracing::info;

use crate::dataset::{DataLayout, DatasetReader, LabelMask, MatrixView, Split, VectorView};
use crate::extractor::FeatureExtractor;
use crate::utils::{Result, VectorizeError};

/// Train split restricted to labeled rows
///
/// The mask selects rows in place; nothing is copied out of the mapped
/// files.
pub struct TrainingSet<'a> {
    pub features: &'a MatrixView,
    pub labels: &'a VectorView,
    pub mask: LabelMask,
}

impl<'a> TrainingSet<'a> {
    /// Mask out rows labeled unlabeled
    pub fn labeled(features: &'a MatrixView, labels: &'a VectorView) -> Self {
        Self {
            features,
            labels,
            mask: labels.labeled_mask(),
        }
    }

    /// Number of rows a trainer will see
    pub fn len(&self) -> usize {
        self.mask.selected()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.selected() == 0
    }

    pub fn dim(&self) -> usize {
        self.features.dim()
    }

    /// Labeled `(row, label)` pairs
    pub fn rows(&self) -> impl Iterator<Item = (&[f32], f32)> + '_ {
        self.mask.select(self.features, self.labels)
    }
}

/// Fits a model from a training set
pub trait Trainer {
    type Model: Classifier;

    fn train(&self, set: &TrainingSet<'_>) -> Result<Self::Model>;
}

/// Scores a single feature vector
pub trait Classifier {
    /// Malicious-class probability
    fn score(&self, features: &[f32]) -> f64;
}

/// Train a model on the labeled rows of the train split under `layout`
pub fn train_model<T, E>(layout: &DataLayout, trainer: &T, extractor: &E) -> Result<T::Model>
where
    T: Trainer,
    E: FeatureExtractor + ?Sized,
{
    let reader = DatasetReader::for_extractor(layout.clone(), extractor);
    let train = reader.open_split(Split::Train)?;
    let set = TrainingSet::labeled(&train.features, &train.labels);

    info!(
        "Training on {} of {} rows (dim={})",
        set.len(),
        train.rows(),
        set.dim()
    );
    trainer.train(&set)
}

/// Score one raw sample
pub fn predict_sample<M, E>(model: &M, extractor: &E, sample: &[u8]) -> Result<f64>
where
    M: Classifier + ?Sized,
    E: FeatureExtractor + ?Sized,
{
    let features = extractor.vectorize_sample(sample)?;
    if features.len() != extractor.dim() {
        return Err(VectorizeError::InvalidArgument(format!(
            "sample vectorized to {} values, expected {}",
            features.len(),
            extractor.dim()
        )));
    }
    Ok(model.score(&features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Manifest, SplitEntry};
    use crate::extractor::{FeatureVersion, PrecomputedExtractor};
    use std::fs;
    use std::path::Path;

    /// Scores by distance to the mean of malicious rows
    struct MeanTrainer;

    struct MeanModel {
        malicious: Vec<f32>,
        seen: usize,
    }

    impl Trainer for MeanTrainer {
        type Model = MeanModel;

        fn train(&self, set: &TrainingSet<'_>) -> Result<MeanModel> {
            let mut malicious = vec![0.0; set.dim()];
            let mut count = 0;
            for (row, label) in set.rows() {
                if label == 1.0 {
                    for (m, v) in malicious.iter_mut().zip(row) {
                        *m += v;
                    }
                    count += 1;
                }
            }
            if count > 0 {
                malicious.iter_mut().for_each(|m| *m /= count as f32);
            }
            Ok(MeanModel {
                malicious,
                seen: set.len(),
            })
        }
    }

    impl Classifier for MeanModel {
        fn score(&self, features: &[f32]) -> f64 {
            let dist: f32 = self
                .malicious
                .iter()
                .zip(features)
                .map(|(m, v)| (m - v).abs())
                .sum();
            1.0 / (1.0 + dist as f64)
        }
    }

    fn write_f32s(path: &Path, values: &[f32]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_unlabeled_rows_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_f32s(
            &layout.features_path(Split::Train),
            &[1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0],
        );
        write_f32s(&layout.labels_path(Split::Train), &[1.0, -1.0]);

        let extractor = PrecomputedExtractor::new(4);
        let model = train_model(&layout, &MeanTrainer, &extractor).unwrap();

        assert_eq!(model.seen, 1);
        assert_eq!(model.malicious, vec![1.0; 4]);
    }

    #[test]
    fn test_train_rejects_other_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_f32s(&layout.features_path(Split::Train), &[1.0, 1.0]);
        write_f32s(&layout.labels_path(Split::Train), &[1.0]);
        let mut manifest = Manifest::new();
        manifest.record_split(Split::Train, SplitEntry::new(FeatureVersion::new(2017), 2, 1));
        manifest.save(layout.manifest_path()).unwrap();

        let extractor = PrecomputedExtractor::new(2);
        let err = train_model(&layout, &MeanTrainer, &extractor)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            VectorizeError::VersionMismatch {
                written: 2017,
                expected: 2018
            }
        ));
    }

    #[test]
    fn test_predict_sample_scores_vector() {
        let model = MeanModel {
            malicious: vec![1.0, 1.0],
            seen: 1,
        };
        let extractor = PrecomputedExtractor::new(2);
        let sample: Vec<u8> = [1.0f32, 1.0].iter().flat_map(|v| v.to_le_bytes()).collect();

        let score = predict_sample(&model, &extractor, &sample).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_sample_size_error() {
        let model = MeanModel {
            malicious: vec![0.0; 2],
            seen: 0,
        };
        let extractor = PrecomputedExtractor::new(2);
        let err = predict_sample(&model, &extractor, &[0u8; 3]).unwrap_err();
        assert!(matches!(err, VectorizeError::Sample(_)));
    }
}
