// src/core/kdtree/error.rs

use std::fmt;

/// Errors raised while building or querying a KD-Tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdTreeError {
    /// The point collection handed to the builder was empty.
    EmptyInput,
    /// The first point had no coordinates, so no split axis exists.
    InvalidDimension,
    /// Two points (or a point and the tree) disagree on dimensionality.
    DimensionMismatch { expected: usize, actual: usize },
    /// A coordinate was requested outside `[0, dimensions)`.
    AxisOutOfBounds { axis: usize, dimensions: usize },
}

impl fmt::Display for KdTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => {
                write!(f, "KD-Tree Empty Input: at least one point is required to build a tree")
            }
            Self::InvalidDimension => {
                write!(f, "KD-Tree Invalid Dimension: points must have at least one coordinate")
            }
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "KD-Tree Dimension Mismatch: expected {expected} dimensions, got {actual}"
            ),
            Self::AxisOutOfBounds { axis, dimensions } => write!(
                f,
                "KD-Tree Axis Out Of Bounds: axis {axis} is outside [0, {dimensions})"
            ),
        }
    }
}

impl std::error::Error for KdTreeError {}

/// Result type for KD-Tree operations.
pub type KdTreeResult<T> = Result<T, KdTreeError>;
