//! Memory-mapped feature matrix and label vector views
//!
//! Finished `X_*.dat` / `y_*.dat` files are mapped read-only and exposed
//! as `f32` slices without copying. The row count is derived from the file
//! size, so a size that does not divide evenly into rows is rejected.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::utils::{Result, VectorizeError};

/// Size of one stored element
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f32>();

/// Label value marking an unlabeled record
pub const UNLABELED: f32 = -1.0;

fn map_read_only(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|source| VectorizeError::InputFile {
        path: path.to_path_buf(),
        source,
    })?;
    // SAFETY: The file is opened read-only; vectorization has finished
    // (all writers joined) before any view is opened.
    let mmap = unsafe { Mmap::map(&file) }?;
    Ok(mmap)
}

/// Reinterpret mapped bytes as `f32` values
fn as_f32(mmap: &Mmap) -> &[f32] {
    if mmap.is_empty() {
        return &[];
    }
    // SAFETY: Mappings are page aligned, the length was checked to be a
    // multiple of 4, and the files store native-endian f32.
    unsafe {
        std::slice::from_raw_parts(mmap.as_ptr() as *const f32, mmap.len() / ELEMENT_SIZE)
    }
}

/// Read-only `(rows, dim)` view of a feature matrix file
#[derive(Debug)]
pub struct MatrixView {
    mmap: Mmap,
    path: PathBuf,
    rows: usize,
    dim: usize,
}

impl MatrixView {
    /// Map a feature matrix file with the given row width
    ///
    /// # Returns
    /// * `Err(ShapeMismatch)` if the file size is not a whole number of rows
    pub fn open<P: AsRef<Path>>(path: P, dim: usize) -> Result<Self> {
        let path = path.as_ref();
        if dim == 0 {
            return Err(VectorizeError::InvalidArgument(
                "feature dimension must be non-zero".to_string(),
            ));
        }

        let mmap = map_read_only(path)?;
        let stride = dim * ELEMENT_SIZE;
        if mmap.len() % stride != 0 {
            return Err(VectorizeError::ShapeMismatch {
                path: path.to_path_buf(),
                reason: format!(
                    "{} bytes is not a multiple of the row stride {} (dim {})",
                    mmap.len(),
                    stride,
                    dim
                ),
            });
        }

        Ok(Self {
            rows: mmap.len() / stride,
            mmap,
            path: path.to_path_buf(),
            dim,
        })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole matrix, row-major
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        as_f32(&self.mmap)
    }

    /// Get row at index (zero-copy)
    ///
    /// # Panics
    /// Panics if `idx >= rows()`
    #[inline]
    pub fn row(&self, idx: usize) -> &[f32] {
        assert!(idx < self.rows, "row index out of bounds");
        let start = idx * self.dim;
        &self.as_slice()[start..start + self.dim]
    }

    /// Get row at index with bounds checking
    #[inline]
    pub fn try_row(&self, idx: usize) -> Option<&[f32]> {
        if idx >= self.rows {
            return None;
        }
        Some(self.row(idx))
    }

    /// Iterate rows in order
    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.as_slice().chunks_exact(self.dim)
    }
}

/// Read-only view of a label vector file
#[derive(Debug)]
pub struct VectorView {
    mmap: Mmap,
    path: PathBuf,
}

impl VectorView {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mmap = map_read_only(path)?;
        if mmap.len() % ELEMENT_SIZE != 0 {
            return Err(VectorizeError::ShapeMismatch {
                path: path.to_path_buf(),
                reason: format!("{} bytes is not a multiple of {}", mmap.len(), ELEMENT_SIZE),
            });
        }
        Ok(Self {
            mmap,
            path: path.to_path_buf(),
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mmap.len() / ELEMENT_SIZE
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        as_f32(&self.mmap)
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<f32> {
        self.as_slice().get(idx).copied()
    }

    /// Boolean mask of rows whose label is not [`UNLABELED`]
    pub fn labeled_mask(&self) -> LabelMask {
        LabelMask::from_labels(self.as_slice())
    }
}

/// Boolean row selector over a matrix/label pair
///
/// Selecting rows through the mask borrows the mapped data instead of
/// copying the selected rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMask {
    keep: Vec<bool>,
    selected: usize,
}

impl LabelMask {
    pub fn from_labels(labels: &[f32]) -> Self {
        let keep: Vec<bool> = labels.iter().map(|&y| y != UNLABELED).collect();
        let selected = keep.iter().filter(|&&k| k).count();
        Self { keep, selected }
    }

    /// Total rows covered by the mask
    pub fn len(&self) -> usize {
        self.keep.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keep.is_empty()
    }

    /// Number of rows kept
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[inline]
    pub fn is_selected(&self, idx: usize) -> bool {
        self.keep.get(idx).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.keep
    }

    /// Indices of kept rows
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| if k { Some(i) } else { None })
    }

    /// Kept `(row, label)` pairs, borrowed from the views
    ///
    /// Iteration stops at the first row missing from either view, so views
    /// shorter than the mask yield fewer pairs instead of panicking.
    pub fn select<'a>(
        &'a self,
        features: &'a MatrixView,
        labels: &'a VectorView,
    ) -> impl Iterator<Item = (&'a [f32], f32)> + 'a {
        self.indices()
            .map_while(move |i| Some((features.try_row(i)?, labels.get(i)?)))
    }
}
