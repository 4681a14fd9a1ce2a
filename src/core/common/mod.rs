pub mod error;
pub use error::KdSolverError;
