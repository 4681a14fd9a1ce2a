use crate::core::kdtree::KdTreeError;
use std::fmt;

/// Crate-level error for batch execution and configuration.
#[derive(Debug)]
pub enum KdSolverError {
    /// Building or querying the tree failed.
    Tree(KdTreeError),
    /// The caller cancelled a batch while it was waiting on its workers.
    Interrupted(String),
    /// A worker thread or task ended without reporting its results.
    WorkerFailed(String),
    /// The async runtime could not be used for the requested call.
    Runtime(String),
    Configuration(String),
    Io(std::io::Error),
}

impl fmt::Display for KdSolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(e) => write!(f, "Tree Error: {}", e),
            Self::Interrupted(s) => write!(f, "Interrupted: {}", s),
            Self::WorkerFailed(s) => write!(f, "Worker Failed: {}", s),
            Self::Runtime(s) => write!(f, "Runtime Error: {}", s),
            Self::Configuration(s) => write!(f, "Configuration error: {}", s),
            Self::Io(e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl std::error::Error for KdSolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KdTreeError> for KdSolverError {
    fn from(err: KdTreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<std::io::Error> for KdSolverError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl KdSolverError {
    /// Whether this error reports a caller-initiated cancellation.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}
