//! Fixed-size storage allocation
//!
//! Feature matrices and label vectors are preallocated at their final size
//! before any row is written. The returned [`AllocationHandle`] carries the
//! shape the file was sized for; writers are built from handles so a shape
//! disagreement is caught when the writer is opened, not at a stray write.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ELEMENT_SIZE;
use crate::utils::{Result, VectorizeError};

/// How an allocation treats a file already present at the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationMode {
    /// Create or truncate, then size the file
    #[default]
    Truncate,
    /// Keep an existing file of exactly the required size; fail on any other size
    Reuse,
}

/// Shape and location of a preallocated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationHandle {
    path: PathBuf,
    rows: u64,
    dim: usize,
    byte_len: u64,
}

impl AllocationHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Bytes per row
    pub fn row_bytes(&self) -> usize {
        self.dim * ELEMENT_SIZE
    }

    /// Open the file read-write, checking it still has the allocated size
    pub(crate) fn open_rw(&self) -> Result<File> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let actual = file.metadata()?.len();
        if actual != self.byte_len {
            return Err(VectorizeError::SizeConflict {
                path: self.path.clone(),
                expected: self.byte_len,
                actual,
            });
        }
        Ok(file)
    }
}

/// Required byte length for `rows` rows of `dim` f32 values
pub fn required_bytes(rows: u64, dim: usize) -> Result<u64> {
    rows.checked_mul(dim as u64)
        .and_then(|n| n.checked_mul(ELEMENT_SIZE as u64))
        .ok_or_else(|| {
            VectorizeError::InvalidArgument(format!(
                "{} rows of dim {} overflows the addressable file size",
                rows, dim
            ))
        })
}

/// Creates fixed-size binary files
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageAllocator {
    mode: AllocationMode,
}

impl StorageAllocator {
    pub fn new(mode: AllocationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Allocate a `(rows, dim)` feature matrix file
    pub fn allocate<P: AsRef<Path>>(&self, path: P, rows: u64, dim: usize) -> Result<AllocationHandle> {
        if dim == 0 {
            return Err(VectorizeError::InvalidArgument(
                "feature dimension must be non-zero".to_string(),
            ));
        }
        let path = path.as_ref();
        let byte_len = required_bytes(rows, dim)?;

        match self.mode {
            AllocationMode::Truncate => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                file.set_len(byte_len)?;
            }
            AllocationMode::Reuse => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(path)?;
                let actual = file.metadata()?.len();
                if actual == 0 {
                    file.set_len(byte_len)?;
                } else if actual != byte_len {
                    return Err(VectorizeError::SizeConflict {
                        path: path.to_path_buf(),
                        expected: byte_len,
                        actual,
                    });
                }
            }
        }

        debug!(
            "Allocated {:?}: {} rows x {} ({} bytes, {:?})",
            path, rows, dim, byte_len, self.mode
        );

        Ok(AllocationHandle {
            path: path.to_path_buf(),
            rows,
            dim,
            byte_len,
        })
    }

    /// Allocate a label vector file of `rows` values
    pub fn allocate_labels<P: AsRef<Path>>(&self, path: P, rows: u64) -> Result<AllocationHandle> {
        self.allocate(path, rows, 1)
    }
}
