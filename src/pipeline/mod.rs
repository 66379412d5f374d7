//! Parallel vectorization pipeline
//!
//! This module provides the multi-threaded vectorization system:
//! - ProgressCounters: Atomic counters shared by producer, workers and reporter
//! - TaskPool: Scoped worker pool fed from a bounded queue
//! - vectorize_worker: Per-thread loop writing assigned rows in place
//! - VectorizationCoordinator: Count, allocate, distribute, join

pub mod coordinator;
pub mod counters;
pub mod pool;
pub mod progress;
pub mod worker;

pub use coordinator::{
    create_vectorized_features, SplitSummary, VectorizationCoordinator, VectorizeOptions,
};
pub use counters::ProgressCounters;
pub use pool::{effective_threads, PoolReport, TaskPool, TaskQueue, DEFAULT_QUEUE_DEPTH};
pub use progress::format_count;
pub use worker::{RowTask, WorkerResult};
