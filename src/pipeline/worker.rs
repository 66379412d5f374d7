//! Vectorization worker
//!
//! Each worker owns its [`RowWriter`] exclusively. The only synchronization
//! points are the task queue and the atomic progress counters.

use std::time::Instant;

use hdrhistogram::Histogram;

use super::pool::TaskQueue;
use crate::dataset::Split;
use crate::extractor::FeatureExtractor;
use crate::storage::{AllocationHandle, RowWriter};
use crate::utils::{Result, VectorizeError};

/// Upper bound for recorded per-row latencies (one hour, in microseconds)
const MAX_LATENCY_US: u64 = 3_600_000_000;

/// One raw record and the row it must be written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTask {
    pub row: u64,
    pub line: Vec<u8>,
}

/// Result from a worker thread
pub struct WorkerResult {
    /// Worker ID
    pub worker_id: usize,
    /// Per-row decode + vectorize + write latency (microseconds)
    pub histogram: Histogram<u64>,
    /// Rows this worker wrote
    pub rows_written: u64,
}

pub(crate) fn new_latency_histogram() -> Result<Histogram<u64>> {
    Histogram::new_with_bounds(1, MAX_LATENCY_US, 3)
        .map_err(|e| VectorizeError::Worker(format!("failed to create histogram: {}", e)))
}

/// Pull tasks until the queue is drained, writing each row in place
pub fn vectorize_worker<E>(
    worker_id: usize,
    split: Split,
    features: &AllocationHandle,
    labels: &AllocationHandle,
    extractor: &E,
    queue: &TaskQueue<'_, RowTask>,
) -> Result<WorkerResult>
where
    E: FeatureExtractor + ?Sized,
{
    let mut writer = RowWriter::open(split, features, labels)?;
    let mut histogram = new_latency_histogram()?;
    let mut rows_written = 0u64;

    while let Some(task) = queue.next_task() {
        let start = Instant::now();
        writer.write_record(task.row, &task.line, extractor)?;
        histogram.saturating_record(start.elapsed().as_micros() as u64);
        rows_written += 1;
        queue.counters().record_finished(1);
    }

    writer.flush()?;

    Ok(WorkerResult {
        worker_id,
        histogram,
        rows_written,
    })
}
