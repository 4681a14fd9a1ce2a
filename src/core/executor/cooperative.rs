// src/core/executor/cooperative.rs

use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::cancel::CancellationToken;
use super::worker::SolverWorker;
use super::{partition_ranges, BatchResult, BatchStrategy};
use crate::core::common::KdSolverError;
use crate::core::config::available_parallelism;
use crate::core::kdtree::{Coordinate, KdPoint, KdTree};

/// Splits a batch into contiguous chunks and runs each as a tokio task.
///
/// The orchestrating future only suspends while awaiting the chunk tasks; a
/// single search never yields. Results are awaited in dispatch order.
#[derive(Debug, Clone)]
pub struct CooperativeStrategy {
    task_count: usize,
    handle: Handle,
    // Keeps an owned runtime alive for as long as any clone of the strategy.
    runtime: Option<Arc<OwnedRuntime>>,
}

/// Runtime created by the strategy itself.
///
/// Dropping it shuts the runtime down in the background, which tokio allows
/// from inside an async context, unlike dropping a `Runtime` directly.
#[derive(Debug)]
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

impl CooperativeStrategy {
    /// Creates a strategy backed by its own multi-threaded runtime.
    ///
    /// Tasks still running when the last clone is dropped are abandoned.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Io` if the runtime cannot be started.
    pub fn new(task_count: usize) -> Result<Self, KdSolverError> {
        let runtime = Builder::new_multi_thread().thread_name("kd-solver-task").enable_all().build()?;
        Ok(Self {
            task_count: task_count.max(1),
            handle: runtime.handle().clone(),
            runtime: Some(Arc::new(OwnedRuntime(Some(runtime)))),
        })
    }

    /// One task per available hardware thread, on an owned runtime.
    ///
    /// # Errors
    ///
    /// Same as [`CooperativeStrategy::new`].
    pub fn with_default_parallelism() -> Result<Self, KdSolverError> {
        Self::new(available_parallelism())
    }

    /// Spawns tasks on an existing runtime.
    pub fn with_handle(task_count: usize, handle: Handle) -> Self {
        Self { task_count: task_count.max(1), handle, runtime: None }
    }

    /// Spawns tasks on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Runtime` when called outside a tokio runtime.
    pub fn current(task_count: usize) -> Result<Self, KdSolverError> {
        let handle = Handle::try_current().map_err(|e| KdSolverError::Runtime(e.to_string()))?;
        Ok(Self::with_handle(task_count, handle))
    }

    /// Runs on the caller's runtime when there is one, otherwise on an owned one.
    ///
    /// # Errors
    ///
    /// Same as [`CooperativeStrategy::new`].
    pub fn current_or_owned(task_count: usize) -> Result<Self, KdSolverError> {
        match Handle::try_current() {
            Ok(handle) => Ok(Self::with_handle(task_count, handle)),
            Err(_) => Self::new(task_count),
        }
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    /// Whether the strategy spawns onto a runtime it created itself.
    pub fn owns_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// Solves a batch, suspending until every chunk task has finished or
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// * `KdSolverError::Interrupted` if `cancel` fires first; running tasks are
    ///   aborted and their results dropped.
    /// * `KdSolverError::WorkerFailed` if a task panicked or was aborted.
    /// * `KdSolverError::Tree` for an invalid query.
    pub async fn find_nearest_points_async<T: Coordinate>(
        &self,
        tree: &Arc<KdTree<T>>,
        queries: &[KdPoint<T>],
        cancel: &CancellationToken,
    ) -> BatchResult<T> {
        if cancel.is_cancelled() {
            return Err(KdSolverError::Interrupted("batch cancelled before dispatch".to_string()));
        }

        let tasks: Vec<JoinHandle<BatchResult<T>>> = partition_ranges(queries.len(), self.task_count)
            .into_iter()
            .enumerate()
            .map(|(index, range)| {
                trace!(chunk = index, start = range.start, end = range.end, "dispatching solver task");
                let worker = SolverWorker::new(Arc::clone(tree), queries[range].to_vec());
                let cancel = cancel.clone();
                self.handle.spawn(async move { worker.run(&cancel) })
            })
            .collect();
        let abort_handles: Vec<_> = tasks.iter().map(JoinHandle::abort_handle).collect();

        let join_in_order = async {
            let mut results = Vec::with_capacity(queries.len());
            for task in tasks {
                let chunk = task
                    .await
                    .map_err(|e| KdSolverError::WorkerFailed(format!("solver task failed: {e}")))??;
                results.extend(chunk);
            }
            Ok::<_, KdSolverError>(results)
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(tasks = abort_handles.len(), "batch cancelled while awaiting solver tasks");
                for handle in &abort_handles {
                    handle.abort();
                }
                Err(KdSolverError::Interrupted("batch cancelled while awaiting solver tasks".to_string()))
            }
            result = join_in_order => result,
        }
    }
}

impl<T: Coordinate> BatchStrategy<T> for CooperativeStrategy {
    fn name(&self) -> &'static str {
        "cooperative"
    }

    /// Blocks the calling thread on the strategy's runtime.
    ///
    /// Fails with `KdSolverError::Runtime` when called from inside an async
    /// context; await [`CooperativeStrategy::find_nearest_points_async`] there.
    fn solve_batch(
        &self,
        tree: &Arc<KdTree<T>>,
        queries: &[KdPoint<T>],
        cancel: &CancellationToken,
    ) -> BatchResult<T> {
        if Handle::try_current().is_ok() {
            return Err(KdSolverError::Runtime(
                "cannot block on a batch from inside an async context; \
                 await find_nearest_points_async instead"
                    .to_string(),
            ));
        }
        self.handle.block_on(self.find_nearest_points_async(tree, queries, cancel))
    }
}
