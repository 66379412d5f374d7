//! Shared atomic counters for a pipeline run
//!
//! These are the ONLY synchronization points between workers besides the
//! task queue. Row data is never shared through them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Progress and shutdown state shared by the producer, workers and reporter
pub struct ProgressCounters {
    /// Tasks handed to the queue
    pub tasks_issued: AtomicU64,

    /// Tasks completed successfully
    pub tasks_finished: AtomicU64,

    /// Shutdown signal (failure or end of run)
    pub shutdown: AtomicBool,

    /// Expected number of tasks
    total: u64,
}

impl ProgressCounters {
    /// Create counters expecting `total` tasks
    pub fn with_total(total: u64) -> Self {
        Self {
            tasks_issued: AtomicU64::new(0),
            tasks_finished: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            total,
        }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Claim the next task number
    #[inline]
    pub fn record_issued(&self) -> u64 {
        self.tasks_issued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_finished(&self, count: u64) {
        self.tasks_finished.fetch_add(count, Ordering::Relaxed);
    }

    /// Signal shutdown to all workers
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Get current progress as (finished, issued)
    pub fn progress(&self) -> (u64, u64) {
        (
            self.tasks_finished.load(Ordering::Relaxed),
            self.tasks_issued.load(Ordering::Relaxed),
        )
    }
}
