//! Preallocated binary storage and the per-worker row writer
//!
//! - StorageAllocator: sizes matrix/label files before vectorization
//! - RowWriter: writes one assigned row at a time through a private mapping

pub mod allocator;
pub mod writer;

pub use crate::dataset::binary_dataset::ELEMENT_SIZE;
pub use allocator::{required_bytes, AllocationHandle, AllocationMode, StorageAllocator};
pub use writer::RowWriter;
