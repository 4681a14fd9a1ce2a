// src/core/executor/fork_join.rs

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::trace;

use super::cancel::CancellationToken;
use super::worker::solve_sequential;
use super::{BatchResult, BatchStrategy};
use crate::core::common::KdSolverError;
use crate::core::config::DEFAULT_SPLIT_THRESHOLD;
use crate::core::kdtree::{Coordinate, KdPoint, KdTree};

/// Recursively halves a batch on a work-stealing pool.
///
/// Batches of at most `threshold` queries are solved sequentially; larger ones
/// are split in two and both halves handed to `rayon::join`, which lets idle
/// workers steal the second half. Halves are concatenated left then right.
#[derive(Debug, Clone)]
pub struct ForkJoinStrategy {
    threshold: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl ForkJoinStrategy {
    /// Runs on rayon's global pool.
    pub fn new(threshold: usize) -> Self {
        Self { threshold: threshold.max(1), pool: None }
    }

    /// Runs on a caller-supplied pool.
    pub fn with_pool(threshold: usize, pool: Arc<ThreadPool>) -> Self {
        Self { threshold: threshold.max(1), pool: Some(pool) }
    }

    /// Runs on a dedicated pool of `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Runtime` if the pool cannot be created.
    pub fn with_threads(threshold: usize, threads: usize) -> Result<Self, KdSolverError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("kd-solver-fj-{index}"))
            .build()
            .map_err(|e| KdSolverError::Runtime(format!("Failed to build fork-join pool: {e}")))?;
        Ok(Self::with_pool(threshold, Arc::new(pool)))
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for ForkJoinStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT_THRESHOLD)
    }
}

impl<T: Coordinate> BatchStrategy<T> for ForkJoinStrategy {
    fn name(&self) -> &'static str {
        "fork_join"
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

        let tree: &KdTree<T> = tree;
        let run = || solve_recursive(tree, queries, self.threshold, cancel);
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

fn solve_recursive<T: Coordinate>(
    tree: &KdTree<T>,
    queries: &[KdPoint<T>],
    threshold: usize,
    cancel: &CancellationToken,
) -> BatchResult<T> {
    if queries.len() <= threshold {
        trace!(len = queries.len(), "solving fork-join leaf");
        return solve_sequential(tree, queries, cancel);
    }

    let (left, right) = queries.split_at(queries.len() / 2);
    let (left_result, right_result) = rayon::join(
        || solve_recursive(tree, left, threshold, cancel),
        || solve_recursive(tree, right, threshold, cancel),
    );

    let mut results = left_result?;
    results.extend(right_result?);
    Ok(results)
}
