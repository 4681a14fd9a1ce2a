// src/core/executor/worker.rs

use std::sync::Arc;

use super::cancel::CancellationToken;
use super::BatchResult;
use crate::core::common::KdSolverError;
use crate::core::kdtree::{Coordinate, KdPoint, KdTree};
use crate::core::solver::Solver;

/// One contiguous chunk of a batch together with the tree it is solved against.
///
/// A worker owns its chunk and a handle on the shared tree, so it can be moved
/// into a thread or task. Each run creates its own `Solver`.
#[derive(Debug)]
pub struct SolverWorker<T: Coordinate> {
    tree: Arc<KdTree<T>>,
    queries: Vec<KdPoint<T>>,
}

impl<T: Coordinate> SolverWorker<T> {
    pub fn new(tree: Arc<KdTree<T>>, queries: Vec<KdPoint<T>>) -> Self {
        Self { tree, queries }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Solves every query of the chunk; `result[i]` answers `queries[i]`.
    ///
    /// # Errors
    ///
    /// `KdSolverError::Interrupted` once `cancel` fires, or the first per-query
    /// `KdSolverError::Tree` error.
    pub fn run(&self, cancel: &CancellationToken) -> BatchResult<T> {
        solve_sequential(&self.tree, &self.queries, cancel)
    }
}

/// Solves `queries` in order on the calling thread.
pub(crate) fn solve_sequential<T: Coordinate>(
    tree: &KdTree<T>,
    queries: &[KdPoint<T>],
    cancel: &CancellationToken,
) -> BatchResult<T> {
    let solver = Solver::new(tree);
    queries
        .iter()
        .map(|query| {
            if cancel.is_cancelled() {
                return Err(KdSolverError::Interrupted("worker stopped by cancellation".to_string()));
            }
            solver.find_nearest(query).map_err(KdSolverError::from)
        })
        .collect()
}
