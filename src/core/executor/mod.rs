// src/core/executor/mod.rs

//! Concurrent execution of nearest-neighbour query batches.
//!
//! A batch is fanned out over workers that each own a `Solver` and share one
//! read-only `Arc<KdTree>`, then fanned back in. Whatever the scheduling
//! discipline, `result[i]` answers `queries[i]`: no strategy reorders, drops or
//! duplicates entries, and no state besides the tree is shared.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, debug_span, Instrument};

use crate::core::common::KdSolverError;
use crate::core::config::{SolverConfig, StrategyKind};
use crate::core::kdtree::{Coordinate, KdPoint, KdTree};
use crate::core::solver::Solver;

pub use self::cancel::CancellationToken;
pub use self::cooperative::CooperativeStrategy;
pub use self::fork_join::ForkJoinStrategy;
pub use self::static_partition::StaticPartitionStrategy;
pub use self::worker::SolverWorker;

mod cancel;
mod cooperative;
mod fork_join;
mod static_partition;
mod worker;

/// Ordered per-query results of a batch; `None` where every stored point equals the query.
pub type BatchResult<T> = Result<Vec<Option<KdPoint<T>>>, KdSolverError>;

/// A scheduling discipline for solving a batch of queries against one tree.
pub trait BatchStrategy<T: Coordinate>: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Solves `queries`, returning results in input order.
    ///
    /// # Errors
    ///
    /// * `KdSolverError::Interrupted` if `cancel` fires before all results are in.
    /// * `KdSolverError::Tree` if a query does not match the tree's dimensionality.
    /// * `KdSolverError::WorkerFailed`, `Runtime` or `Io` if workers could not run.
    fn solve_batch(
        &self,
        tree: &Arc<KdTree<T>>,
        queries: &[KdPoint<T>],
        cancel: &CancellationToken,
    ) -> BatchResult<T>;
}

/// Splits `0..len` into at most `parts` contiguous, non-empty ranges whose
/// lengths differ by at most one. Earlier ranges get the extra elements.
pub fn partition_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, len.max(1));
    if len == 0 {
        return Vec::new();
    }
    let base = len / parts;
    let extra = len % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for index in 0..parts {
        let end = start + base + usize::from(index < extra);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Batch query front end: one shared tree plus a pluggable strategy.
pub struct QueryExecutor<T: Coordinate> {
    tree: Arc<KdTree<T>>,
    strategy: Arc<dyn BatchStrategy<T>>,
    // Set when `strategy` is cooperative, so async callers can await it directly.
    cooperative: Option<CooperativeStrategy>,
}

impl<T: Coordinate> QueryExecutor<T> {
    pub fn new<S: BatchStrategy<T> + 'static>(tree: Arc<KdTree<T>>, strategy: S) -> Self {
        Self { tree, strategy: Arc::new(strategy), cooperative: None }
    }

    pub fn with_boxed_strategy(tree: Arc<KdTree<T>>, strategy: Box<dyn BatchStrategy<T>>) -> Self {
        Self { tree, strategy: Arc::from(strategy), cooperative: None }
    }

    /// Uses `strategy` for blocking batches and its async entry point for
    /// [`QueryExecutor::find_nearest_points_async`].
    pub fn with_cooperative(tree: Arc<KdTree<T>>, strategy: CooperativeStrategy) -> Self {
        Self { tree, strategy: Arc::new(strategy.clone()), cooperative: Some(strategy) }
    }

    /// Picks the strategy and its parameters from `config`.
    ///
    /// A cooperative strategy spawns onto the caller's runtime when created
    /// inside one, and onto a runtime of its own otherwise.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Configuration` for an invalid config and
    /// `KdSolverError::Io` if a cooperative runtime cannot be started.
    pub fn from_config(tree: Arc<KdTree<T>>, config: &SolverConfig) -> Result<Self, KdSolverError> {
        config.validate()?;
        let strategy: Box<dyn BatchStrategy<T>> = match config.strategy {
            StrategyKind::StaticPartition => Box::new(
                StaticPartitionStrategy::new(config.worker_count).poll_interval(config.join_poll_interval()),
            ),
            StrategyKind::ForkJoin => Box::new(ForkJoinStrategy::new(config.split_threshold)),
            StrategyKind::Cooperative => {
                let strategy = CooperativeStrategy::current_or_owned(config.worker_count)?;
                return Ok(Self::with_cooperative(tree, strategy));
            }
        };
        Ok(Self::with_boxed_strategy(tree, strategy))
    }

    /// Builds the tree with `config`'s builder settings, then the executor.
    ///
    /// # Errors
    ///
    /// `KdSolverError::Tree` if the tree cannot be built, otherwise as
    /// [`QueryExecutor::from_config`].
    pub fn build(points: &[KdPoint<T>], config: &SolverConfig) -> Result<Self, KdSolverError> {
        let tree = config.tree_builder().build(points)?;
        Self::from_config(Arc::new(tree), config)
    }

    pub fn tree(&self) -> &Arc<KdTree<T>> {
        &self.tree
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Answers a single query on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Tree` on a dimensionality mismatch.
    pub fn find_nearest(&self, query: &KdPoint<T>) -> Result<Option<KdPoint<T>>, KdSolverError> {
        Ok(Solver::new(&self.tree).find_nearest(query)?)
    }

    /// Solves a batch that cannot be cancelled.
    ///
    /// # Errors
    ///
    /// See [`BatchStrategy::solve_batch`].
    pub fn find_nearest_points(&self, queries: &[KdPoint<T>]) -> BatchResult<T> {
        self.find_nearest_points_with_cancel(queries, &CancellationToken::new())
    }

    /// Solves a batch, giving up with `KdSolverError::Interrupted` once `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`BatchStrategy::solve_batch`].
    pub fn find_nearest_points_with_cancel(
        &self,
        queries: &[KdPoint<T>],
        cancel: &CancellationToken,
    ) -> BatchResult<T> {
        let span = debug_span!("batch_query", strategy = self.strategy.name(), queries = queries.len());
        let _guard = span.enter();

        let started = Instant::now();
        debug!("solving batch");
        let results = self.strategy.solve_batch(&self.tree, queries, cancel)?;
        debug!(results = results.len(), elapsed_ms = started.elapsed().as_millis(), "batch solved");
        Ok(results)
    }

    /// Solves a batch from async code without blocking the runtime.
    ///
    /// A cooperative strategy is awaited directly. Any other strategy runs on
    /// tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// See [`BatchStrategy::solve_batch`]. A blocking-pool task that panics is
    /// reported as `KdSolverError::WorkerFailed`.
    pub async fn find_nearest_points_async(
        &self,
        queries: &[KdPoint<T>],
        cancel: &CancellationToken,
    ) -> BatchResult<T> {
        let span = debug_span!("batch_query", strategy = self.strategy.name(), queries = queries.len());
        async {
            let started = Instant::now();
            debug!("solving batch");
            let results = match &self.cooperative {
                Some(cooperative) => cooperative.find_nearest_points_async(&self.tree, queries, cancel).await?,
                None => {
                    let strategy = Arc::clone(&self.strategy);
                    let tree = Arc::clone(&self.tree);
                    let queries = queries.to_vec();
                    let cancel = cancel.clone();
                    tokio::task::spawn_blocking(move || strategy.solve_batch(&tree, &queries, &cancel))
                        .await
                        .map_err(|e| KdSolverError::WorkerFailed(format!("blocking batch failed: {e}")))??
                }
            };
            debug!(results = results.len(), elapsed_ms = started.elapsed().as_millis(), "batch solved");
            Ok::<_, KdSolverError>(results)
        }
        .instrument(span)
        .await
    }
}

impl<T: Coordinate> std::fmt::Debug for QueryExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("tree_nodes", &self.tree.len())
            .field("strategy", &self.strategy.name())
            .finish()
    }
}
