//! Per-worker row writer
//!
//! Every worker maps the feature and label files read-write on its own.
//! The mappings share the underlying pages, and each task writes only the
//! row it was assigned, so workers never touch the same bytes and need no
//! locking. Correctness rests on the coordinator handing out every row
//! index exactly once.

use memmap2::MmapMut;

use super::allocator::AllocationHandle;
use super::ELEMENT_SIZE;
use crate::dataset::Split;
use crate::extractor::FeatureExtractor;
use crate::record::RawRecord;
use crate::utils::{Result, VectorizeError};

/// Read-write view of one split's matrix and label files
pub struct RowWriter {
    split: Split,
    rows: u64,
    dim: usize,
    features: MmapMut,
    labels: MmapMut,
}

impl RowWriter {
    /// Map both files for writing
    ///
    /// Fails if either file no longer has its allocated size, or if the two
    /// handles disagree on the row count.
    pub fn open(split: Split, features: &AllocationHandle, labels: &AllocationHandle) -> Result<Self> {
        if features.rows() != labels.rows() || labels.dim() != 1 {
            return Err(VectorizeError::ShapeMismatch {
                path: labels.path().to_path_buf(),
                reason: format!(
                    "label allocation ({} x {}) does not match feature rows {}",
                    labels.rows(),
                    labels.dim(),
                    features.rows()
                ),
            });
        }

        let features_file = features.open_rw()?;
        let labels_file = labels.open_rw()?;

        // SAFETY: The files are sized by the allocator and not resized while
        // mapped. Concurrent mappings in other workers only write other rows.
        let features_map = unsafe { MmapMut::map_mut(&features_file) }?;
        let labels_map = unsafe { MmapMut::map_mut(&labels_file) }?;

        Ok(Self {
            split,
            rows: features.rows(),
            dim: features.dim(),
            features: features_map,
            labels: labels_map,
        })
    }

    #[inline(always)]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Decode one raw line, vectorize it and store it at `row`
    pub fn write_record<E>(&mut self, row: u64, line: &[u8], extractor: &E) -> Result<()>
    where
        E: FeatureExtractor + ?Sized,
    {
        let record = RawRecord::decode(line).map_err(|e| VectorizeError::Decode {
            split: self.split,
            row,
            reason: e.to_string(),
        })?;

        let vector = extractor
            .vectorize(&record)
            .map_err(|e| VectorizeError::Extractor {
                split: self.split,
                row,
                reason: e.to_string(),
            })?;

        self.write_row(row, &vector, record.label.as_f32())
    }

    /// Store a computed vector and its label at `row`
    pub fn write_row(&mut self, row: u64, vector: &[f32], label: f32) -> Result<()> {
        if row >= self.rows {
            return Err(VectorizeError::RowIndexOutOfRange {
                split: self.split,
                row,
                rows: self.rows,
            });
        }
        if vector.len() != self.dim {
            return Err(VectorizeError::DimensionMismatch {
                split: self.split,
                row,
                expected: self.dim,
                actual: vector.len(),
            });
        }

        let row_bytes = self.dim * ELEMENT_SIZE;
        let start = row as usize * row_bytes;
        let dst = &mut self.features[start..start + row_bytes];
        for (chunk, value) in dst.chunks_exact_mut(ELEMENT_SIZE).zip(vector) {
            chunk.copy_from_slice(&value.to_ne_bytes());
        }

        let start = row as usize * ELEMENT_SIZE;
        self.labels[start..start + ELEMENT_SIZE].copy_from_slice(&label.to_ne_bytes());
        Ok(())
    }

    /// Flush both mappings to their files
    pub fn flush(&self) -> Result<()> {
        self.features.flush()?;
        self.labels.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PrecomputedExtractor;
    use crate::storage::StorageAllocator;
    use std::fs;

    fn read_f32s(path: &std::path::Path) -> Vec<f32> {
        fs::read(path)
            .unwrap()
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    fn allocate(dir: &std::path::Path, rows: u64, dim: usize) -> (AllocationHandle, AllocationHandle) {
        let allocator = StorageAllocator::default();
        (
            allocator.allocate(dir.join("X.dat"), rows, dim).unwrap(),
            allocator.allocate_labels(dir.join("y.dat"), rows).unwrap(),
        )
    }

    #[test]
    fn test_write_single_row() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = allocate(dir.path(), 3, 2);

        let mut writer = RowWriter::open(Split::Train, &x, &y).unwrap();
        writer.write_row(1, &[5.0, 6.0], 1.0).unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert_eq!(read_f32s(x.path()), vec![0.0, 0.0, 5.0, 6.0, 0.0, 0.0]);
        assert_eq!(read_f32s(y.path()), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_write_record() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = allocate(dir.path(), 1, 3);
        let extractor = PrecomputedExtractor::new(3);

        let mut writer = RowWriter::open(Split::Test, &x, &y).unwrap();
        writer
            .write_record(0, br#"{"sha256":"a","label":-1,"features":[1,2,3]}"#, &extractor)
            .unwrap();
        drop(writer);

        assert_eq!(read_f32s(x.path()), vec![1.0, 2.0, 3.0]);
        assert_eq!(read_f32s(y.path()), vec![-1.0]);
    }

    #[test]
    fn test_out_of_range_row() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = allocate(dir.path(), 2, 2);

        let mut writer = RowWriter::open(Split::Train, &x, &y).unwrap();
        let err = writer.write_row(2, &[1.0, 1.0], 0.0).unwrap_err();
        assert!(matches!(
            err,
            VectorizeError::RowIndexOutOfRange { row: 2, rows: 2, .. }
        ));
    }

    #[test]
    fn test_wrong_vector_length() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = allocate(dir.path(), 2, 2);

        let mut writer = RowWriter::open(Split::Train, &x, &y).unwrap();
        let err = writer.write_row(0, &[1.0, 1.0, 1.0], 0.0).unwrap_err();
        assert!(matches!(
            err,
            VectorizeError::DimensionMismatch { expected: 2, actual: 3, .. }
        ));
        drop(writer);
        // Nothing written for the failed row
        assert!(read_f32s(x.path()).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_decode_and_extractor_errors_carry_row() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = allocate(dir.path(), 2, 2);
        let extractor = PrecomputedExtractor::new(2);

        let mut writer = RowWriter::open(Split::Train, &x, &y).unwrap();
        let err = writer.write_record(1, b"{broken", &extractor).unwrap_err();
        assert!(matches!(err, VectorizeError::Decode { row: 1, split: Split::Train, .. }));

        let err = writer
            .write_record(0, b"{\"sha256\":\"\xff\",\"label\":0}", &extractor)
            .unwrap_err();
        assert!(matches!(err, VectorizeError::Decode { row: 0, .. }));

        let err = writer
            .write_record(0, br#"{"sha256":"a","label":0}"#, &extractor)
            .unwrap_err();
        assert!(matches!(err, VectorizeError::Extractor { row: 0, .. }));
    }

    #[test]
    fn test_mismatched_handles() {
        let dir = tempfile::tempdir().unwrap();
        let allocator = StorageAllocator::default();
        let x = allocator.allocate(dir.path().join("X.dat"), 3, 2).unwrap();
        let y = allocator.allocate_labels(dir.path().join("y.dat"), 2).unwrap();

        assert!(matches!(
            RowWriter::open(Split::Train, &x, &y),
            Err(VectorizeError::ShapeMismatch { .. })
        ));
    }
}
