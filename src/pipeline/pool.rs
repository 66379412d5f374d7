//! Scoped worker pool
//!
//! A pool lives for exactly one call to [`TaskPool::run`]: the workers are
//! spawned in a thread scope, fed from a bounded queue by the calling
//! thread, and all joined before `run` returns. The first failure shuts the
//! pool down; remaining tasks are abandoned and the whole run fails.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::counters::ProgressCounters;
use super::progress::report_progress;
use crate::utils::{Result, VectorizeError};

/// Default bound on queued tasks
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Resolve a thread count (0 = auto-detect)
pub fn effective_threads(threads: usize) -> usize {
    if threads == 0 {
        thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
    } else {
        threads
    }
}

/// Worker-side handle to the shared task queue
pub struct TaskQueue<'a, T> {
    rx: Arc<Mutex<Receiver<T>>>,
    counters: &'a ProgressCounters,
}

impl<T> TaskQueue<'_, T> {
    /// Next task, or `None` once the queue is drained or the pool shut down
    pub fn next_task(&self) -> Option<T> {
        if self.counters.is_shutdown() {
            return None;
        }
        let rx = self.rx.lock();
        rx.recv().ok()
    }

    pub fn counters(&self) -> &ProgressCounters {
        self.counters
    }
}

/// Outputs of a completed run
pub struct PoolReport<W> {
    /// One output per worker, in worker id order
    pub outputs: Vec<W>,
    /// Number of tasks the producer generated
    pub issued: u64,
    pub duration: Duration,
}

/// Pool configuration
#[derive(Debug, Clone, Copy)]
pub struct TaskPool {
    threads: usize,
    queue_depth: usize,
    show_progress: bool,
}

impl TaskPool {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: effective_threads(threads),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            show_progress: false,
        }
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Drain `tasks` through `threads` workers
    ///
    /// Each worker calls `work` once with its id and the queue, and pulls
    /// tasks until the queue reports `None`. `total` is only used for
    /// progress display.
    pub fn run<T, I, W, F>(&self, label: &str, total: u64, tasks: I, work: F) -> Result<PoolReport<W>>
    where
        T: Send,
        I: IntoIterator<Item = Result<T>>,
        W: Send,
        F: Fn(usize, &TaskQueue<'_, T>) -> Result<W> + Sync,
    {
        let counters = ProgressCounters::with_total(total);
        let first_error: Mutex<Option<VectorizeError>> = Mutex::new(None);
        let fail = |e: VectorizeError| {
            let mut slot = first_error.lock();
            if slot.is_none() {
                *slot = Some(e);
            }
            counters.signal_shutdown();
        };

        let threads = self.threads.max(1);
        let (tx, rx) = mpsc::sync_channel::<T>(self.queue_depth);
        let rx = Arc::new(Mutex::new(rx));
        let start = Instant::now();

        debug!("Starting {} pool: {} workers, queue depth {}", label, threads, self.queue_depth);

        let outputs = thread::scope(|s| {
            let reporter = if self.show_progress {
                Some(s.spawn(|| report_progress(&counters, label)))
            } else {
                None
            };

            let handles: Vec<_> = (0..threads)
                .map(|worker_id| {
                    let queue = TaskQueue {
                        rx: Arc::clone(&rx),
                        counters: &counters,
                    };
                    let work = &work;
                    let fail = &fail;
                    s.spawn(move || match work(worker_id, &queue) {
                        Ok(output) => Some(output),
                        Err(e) => {
                            fail(e);
                            None
                        }
                    })
                })
                .collect();
            // Workers hold the only receivers now; if they all exit early
            // the producer's send fails instead of blocking forever.
            drop(rx);

            for task in tasks {
                if counters.is_shutdown() {
                    break;
                }
                match task {
                    Ok(task) => {
                        counters.record_issued();
                        if tx.send(task).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        fail(e);
                        break;
                    }
                }
            }
            drop(tx);

            let mut outputs = Vec::with_capacity(threads);
            for (worker_id, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Some(output)) => outputs.push(output),
                    Ok(None) => {}
                    Err(_) => fail(VectorizeError::Worker(format!(
                        "worker {} panicked",
                        worker_id
                    ))),
                }
            }

            counters.signal_shutdown();
            if let Some(reporter) = reporter {
                let _ = reporter.join();
            }
            outputs
        });

        if let Some(e) = first_error.into_inner() {
            return Err(e);
        }

        let (_, issued) = counters.progress();
        Ok(PoolReport {
            outputs,
            issued,
            duration: start.elapsed(),
        })
    }
}
