//! Vectorization coordinator
//!
//! Runs the two-pass pipeline for a split:
//! 1. count the input lines to fix the row count,
//! 2. preallocate the matrix and label files at their final size,
//! 3. re-read the inputs, pairing each line with its ordinal row index,
//! 4. drain those tasks through a scoped worker pool,
//! 5. return only after every worker has flushed and been joined.
//!
//! Every row index comes from a single enumeration of the input, so each
//! row is written by exactly one task and workers need no locks.

use std::time::Duration;

use hdrhistogram::Histogram;
use tracing::{debug, info, warn};

use super::pool::{effective_threads, TaskPool, DEFAULT_QUEUE_DEPTH};
use super::progress::format_count;
use super::worker::{new_latency_histogram, vectorize_worker, RowTask, WorkerResult};
use crate::dataset::{DataLayout, Manifest, Split, SplitEntry, SplitSelection};
use crate::extractor::FeatureExtractor;
use crate::record::RawRecordStream;
use crate::storage::{AllocationHandle, AllocationMode, StorageAllocator};
use crate::utils::{Result, VectorizeError};

/// Tuning for a vectorization run
#[derive(Debug, Clone, Copy)]
pub struct VectorizeOptions {
    /// Worker threads (0 = available parallelism)
    pub threads: usize,
    /// Bound on tasks queued ahead of the workers
    pub queue_depth: usize,
    /// How existing output files are treated
    pub allocation: AllocationMode,
    /// Draw a progress bar
    pub show_progress: bool,
}

impl Default for VectorizeOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            allocation: AllocationMode::Truncate,
            show_progress: false,
        }
    }
}

/// Outcome of vectorizing one split
#[derive(Debug)]
pub struct SplitSummary {
    pub split: Split,
    pub rows: u64,
    pub dim: usize,
    pub workers: usize,
    pub duration: Duration,
    /// Merged per-row latency histogram (microseconds)
    pub histogram: Histogram<u64>,
}

impl SplitSummary {
    /// Rows per second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.rows as f64 / secs
        } else {
            0.0
        }
    }

    /// Get percentile latency in microseconds
    pub fn percentile_us(&self, p: f64) -> u64 {
        self.histogram.value_at_percentile(p)
    }

    /// One-line summary for logs and the console
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows x {} in {:.2}s ({} rows/s, {} workers, p50={}us p99={}us max={}us)",
            self.split,
            format_count(self.rows),
            self.dim,
            self.duration.as_secs_f64(),
            format_count(self.throughput() as u64),
            self.workers,
            self.percentile_us(50.0),
            self.percentile_us(99.0),
            self.histogram.max()
        )
    }
}

/// Drives allocation and task distribution for one extractor
pub struct VectorizationCoordinator<'a, E: FeatureExtractor + ?Sized> {
    extractor: &'a E,
    options: VectorizeOptions,
}

impl<'a, E: FeatureExtractor + ?Sized> VectorizationCoordinator<'a, E> {
    pub fn new(extractor: &'a E, options: VectorizeOptions) -> Self {
        Self { extractor, options }
    }

    pub fn options(&self) -> &VectorizeOptions {
        &self.options
    }

    /// Vectorize every split in `selection` under `layout`
    pub fn vectorize_all(
        &self,
        layout: &DataLayout,
        selection: SplitSelection,
    ) -> Result<Vec<SplitSummary>> {
        selection
            .splits()
            .into_iter()
            .map(|split| self.vectorize_split(layout, split))
            .collect()
    }

    /// Vectorize one split of a data directory and record it in the manifest
    pub fn vectorize_split(&self, layout: &DataLayout, split: Split) -> Result<SplitSummary> {
        info!("Vectorizing {} set", split);

        let manifest_path = layout.manifest_path();
        let existing = match Manifest::load(&manifest_path) {
            Ok(existing) => existing,
            Err(VectorizeError::InvalidArgument(reason)) => {
                warn!("Replacing manifest: {}", reason);
                None
            }
            Err(e) => return Err(e),
        };
        let mut manifest = Manifest::begin_split(existing, split);
        manifest.save(&manifest_path)?;

        let stream = RawRecordStream::new(layout.raw_feature_paths(split));
        let summary = self.vectorize_stream(
            split,
            &stream,
            layout.features_path(split),
            layout.labels_path(split),
        )?;

        manifest.record_split(
            split,
            SplitEntry::new(self.extractor.version(), summary.dim, summary.rows),
        );
        manifest.save(&manifest_path)?;
        info!("{}", summary.summary());
        Ok(summary)
    }

    /// Vectorize an arbitrary input stream into the given output files
    pub fn vectorize_stream<P, Q>(
        &self,
        split: Split,
        stream: &RawRecordStream,
        features_path: P,
        labels_path: Q,
    ) -> Result<SplitSummary>
    where
        P: AsRef<std::path::Path>,
        Q: AsRef<std::path::Path>,
    {
        let rows = stream.count()?;
        info!(
            "Counted {} {} rows across {} files",
            format_count(rows),
            split,
            stream.paths().len()
        );

        let allocator = StorageAllocator::new(self.options.allocation);
        let features = allocator.allocate(features_path, rows, self.extractor.dim())?;
        let labels = allocator.allocate_labels(labels_path, rows)?;

        let tasks = stream.iter().enumerate().map(|(row, line)| {
            line.map(|line| RowTask {
                row: row as u64,
                line,
            })
        });

        self.drain(split, &features, &labels, tasks)
    }

    /// Run `tasks` against already allocated storage
    ///
    /// Fails if the tasks do not cover exactly the allocated rows: extra
    /// rows surface as `RowIndexOutOfRange` from the writer, missing rows
    /// as `RowCountDrift`.
    pub fn drain<I>(
        &self,
        split: Split,
        features: &AllocationHandle,
        labels: &AllocationHandle,
        tasks: I,
    ) -> Result<SplitSummary>
    where
        I: IntoIterator<Item = Result<RowTask>>,
    {
        let rows = features.rows();
        let threads = effective_threads(self.options.threads).min(rows.max(1) as usize);
        let pool = TaskPool::new(threads)
            .with_queue_depth(self.options.queue_depth)
            .with_progress(self.options.show_progress);

        let extractor = self.extractor;
        let report = pool.run(split.as_str(), rows, tasks, |worker_id, queue| {
            vectorize_worker(worker_id, split, features, labels, extractor, queue)
        })?;

        if report.issued != rows {
            return Err(VectorizeError::RowCountDrift {
                split,
                counted: rows,
                generated: report.issued,
            });
        }

        self.merge_results(split, features.dim(), report.outputs, report.duration)
    }

    /// Merge per-worker results
    fn merge_results(
        &self,
        split: Split,
        dim: usize,
        results: Vec<WorkerResult>,
        duration: Duration,
    ) -> Result<SplitSummary> {
        let mut histogram = new_latency_histogram()?;
        let mut rows = 0u64;
        let workers = results.len();

        for result in results {
            debug!(
                "Worker {} wrote {} {} rows",
                result.worker_id, result.rows_written, split
            );
            histogram.add(&result.histogram).map_err(|e| {
                VectorizeError::Worker(format!(
                    "failed to merge latency histogram of worker {}: {:?}",
                    result.worker_id, e
                ))
            })?;
            rows += result.rows_written;
        }

        Ok(SplitSummary {
            split,
            rows,
            dim,
            workers,
            duration,
            histogram,
        })
    }
}

/// Vectorize the train and test splits of a data directory
pub fn create_vectorized_features<E: FeatureExtractor + ?Sized>(
    layout: &DataLayout,
    extractor: &E,
    options: VectorizeOptions,
) -> Result<Vec<SplitSummary>> {
    VectorizationCoordinator::new(extractor, options).vectorize_all(layout, SplitSelection::Both)
}
