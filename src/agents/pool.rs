//! Round-robin pool of execution workers.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::oracle::OracleRef;

use super::leaf::ExecutionWorker;

/// Fixed-size set of interchangeable workers.
///
/// # Invariants
/// - `workers` is never empty
/// - `next_worker` visits workers in index order, wrapping
pub struct WorkerPool {
    workers: Vec<ExecutionWorker>,
    next: AtomicUsize,
}

impl WorkerPool {
    /// Create `size` workers sharing one oracle (at least one worker).
    pub fn new(oracle: OracleRef, size: usize) -> Self {
        let workers = (1..=size.max(1))
            .map(|index| ExecutionWorker::new(index, oracle.clone()))
            .collect();
        Self {
            workers,
            next: AtomicUsize::new(0),
        }
    }

    /// Next worker in rotation.
    pub fn next_worker(&self) -> &ExecutionWorker {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        &self.workers[slot]
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
