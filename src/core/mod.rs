pub mod common;
pub mod config;
pub mod executor; // Batch strategies
pub mod kdtree;
pub mod solver;
#[cfg(test)]
pub(crate) mod testing;
pub use self::config::SolverConfig;
