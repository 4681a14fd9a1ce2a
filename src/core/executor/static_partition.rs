// src/core/executor/static_partition.rs

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{trace, warn};

use super::cancel::CancellationToken;
use super::worker::SolverWorker;
use super::{partition_ranges, BatchResult, BatchStrategy};
use crate::core::common::KdSolverError;
use crate::core::config::{available_parallelism, DEFAULT_JOIN_POLL_INTERVAL_MS};
use crate::core::kdtree::{Coordinate, KdPoint, KdTree};

/// Splits a batch into contiguous chunks and solves each on its own OS thread.
///
/// Workers never talk to each other. The caller blocks until every worker has
/// reported, re-checking the cancellation token every `poll_interval`.
#[derive(Debug, Clone)]
pub struct StaticPartitionStrategy {
    worker_count: usize,
    poll_interval: Duration,
}

impl StaticPartitionStrategy {
    /// Uses `worker_count` threads (at least one).
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            poll_interval: Duration::from_millis(DEFAULT_JOIN_POLL_INTERVAL_MS),
        }
    }

    /// One thread per available hardware thread.
    pub fn with_default_parallelism() -> Self {
        Self::new(available_parallelism())
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Default for StaticPartitionStrategy {
    fn default() -> Self {
        Self::with_default_parallelism()
    }
}

type ChunkReport<T> = (usize, BatchResult<T>);

impl<T: Coordinate> BatchStrategy<T> for StaticPartitionStrategy {
    fn name(&self) -> &'static str {
        "static_partition"
    }

    fn solve_batch(
        &self,
        tree: &Arc<KdTree<T>>,
        queries: &[KdPoint<T>],
        cancel: &CancellationToken,
    ) -> BatchResult<T> {
        if cancel.is_cancelled() {
            return Err(KdSolverError::Interrupted("batch cancelled before dispatch".to_string()));
        }

        let ranges = partition_ranges(queries.len(), self.worker_count);
        let (sender, receiver) = mpsc::channel::<ChunkReport<T>>();

        for (index, range) in ranges.iter().cloned().enumerate() {
            trace!(chunk = index, start = range.start, end = range.end, "dispatching worker thread");
            let worker = SolverWorker::new(Arc::clone(tree), queries[range].to_vec());
            let sender = sender.clone();
            let cancel = cancel.clone();
            thread::Builder::new().name(format!("kd-solver-{index}")).spawn(move || {
                // The receiver is gone if the batch was cancelled; the result is discarded.
                let _ = sender.send((index, worker.run(&cancel)));
            })?;
        }
        drop(sender);

        let mut chunks: Vec<Option<Vec<Option<KdPoint<T>>>>> = ranges.iter().map(|_| None).collect();
        let mut remaining = ranges.len();

        while remaining > 0 {
            if cancel.is_cancelled() {
                warn!(pending_chunks = remaining, "batch cancelled while joining worker threads");
                return Err(KdSolverError::Interrupted(
                    "batch cancelled while joining worker threads".to_string(),
                ));
            }
            match receiver.recv_timeout(self.poll_interval) {
                Ok((index, result)) => {
                    chunks[index] = Some(result?);
                    remaining -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!(pending_chunks = remaining, "worker thread exited without reporting");
                    return Err(KdSolverError::WorkerFailed(format!(
                        "{remaining} worker thread(s) exited without reporting results"
                    )));
                }
            }
        }

        Ok(chunks.into_iter().flatten().flatten().collect())
    }
}
