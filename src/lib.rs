#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::cast_possible_wrap)]
#![warn(clippy::cast_sign_loss)]
#![forbid(unsafe_code)]
#![deny(clippy::todo, clippy::module_inception, clippy::correctness, clippy::perf)]
#![warn(clippy::all)]

//! # kdsolver: nearest-other-point search over k-d trees
//!
//! `kdsolver` builds a static k-d tree over points of any dimensionality and
//! answers, for each query, the stored point nearest to it other than the query
//! itself. It features:
//! - Approximate-median construction from a small random sample, optionally seeded
//! - Exact branch-and-bound search that never returns the query point
//! - Batch execution over a shared read-only tree with three interchangeable
//!   strategies: static partitioning on OS threads, recursive fork-join on a
//!   work-stealing pool, and cooperative tokio tasks
//! - Caller-driven cancellation of running batches
//! - TOML-backed configuration
//!
//! ```no_run
//! use kdsolver::{KdPoint, QueryExecutor, SolverConfig};
//!
//! # fn main() -> kdsolver::Result<()> {
//! let points: Vec<KdPoint<f64>> = vec![[0.0, 0.0].into(), [5.0, 5.0].into(), [0.1, 0.1].into()];
//! let executor = QueryExecutor::build(&points, &SolverConfig::default())?;
//! let nearest = executor.find_nearest_points(&points)?;
//! assert_eq!(nearest[0], Some(points[2].clone()));
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export key types for easier use by library consumers
pub use crate::core::common::KdSolverError;
pub use crate::core::config::{SolverConfig, SolverConfigBuilder, StrategyKind};
pub use crate::core::executor::{
    BatchStrategy, CancellationToken, CooperativeStrategy, ForkJoinStrategy, QueryExecutor,
    StaticPartitionStrategy,
};
pub use crate::core::kdtree::{Coordinate, KdPoint, KdTree, KdTreeBuilder, KdTreeError};
pub use crate::core::solver::{Neighbor, Solver};

/// Core result type for the library
pub type Result<T> = std::result::Result<T, KdSolverError>;
