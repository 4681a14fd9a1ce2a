// src/core/kdtree/point.rs

//! Immutable fixed-dimension points stored in and queried against a `KdTree`.

use super::error::{KdTreeError, KdTreeResult};
use num_traits::ToPrimitive;
use std::fmt;
use std::sync::Arc;

/// Numeric type usable as a point coordinate.
///
/// Coordinates only need a partial order for splitting and a lossy conversion to
/// `f64` for distance computation, so every primitive integer and float qualifies.
pub trait Coordinate:
    Copy + PartialOrd + ToPrimitive + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Converts the coordinate to `f64`. Values `ToPrimitive` cannot represent map to NaN.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T> Coordinate for T where
    T: Copy + PartialOrd + ToPrimitive + fmt::Debug + fmt::Display + Send + Sync + 'static
{
}

/// A point in `dimensions()`-dimensional space.
///
/// The coordinate buffer is shared, so cloning a point is a reference-count bump.
/// Two points are equal when all their coordinates are equal in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct KdPoint<T: Coordinate> {
    coordinates: Arc<[T]>,
}

impl<T: Coordinate> KdPoint<T> {
    /// Creates a point from its coordinates.
    pub fn new(coordinates: Vec<T>) -> Self {
        Self { coordinates: coordinates.into() }
    }

    /// Number of coordinates of this point.
    pub fn dimensions(&self) -> usize {
        self.coordinates.len()
    }

    /// Returns the value on the given axis.
    ///
    /// # Errors
    ///
    /// Returns `KdTreeError::AxisOutOfBounds` if `axis >= self.dimensions()`.
    pub fn coordinate(&self, axis: usize) -> KdTreeResult<T> {
        self.coordinates.get(axis).copied().ok_or(KdTreeError::AxisOutOfBounds {
            axis,
            dimensions: self.coordinates.len(),
        })
    }

    pub fn coordinates(&self) -> &[T] {
        &self.coordinates
    }

    /// Squared euclidean distance to `other`, always computed in `f64`.
    ///
    /// # Errors
    ///
    /// Returns `KdTreeError::DimensionMismatch` if both points differ in dimensionality.
    pub fn distance_squared(&self, other: &Self) -> KdTreeResult<f64> {
        if self.dimensions() != other.dimensions() {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(self.distance_squared_unchecked(other))
    }

    /// Distance for callers that already validated the dimensionality.
    pub(crate) fn distance_squared_unchecked(&self, other: &Self) -> f64 {
        self.coordinates
            .iter()
            .zip(other.coordinates.iter())
            .map(|(a, b)| a.as_f64() - b.as_f64())
            .map(|delta| delta * delta)
            .sum()
    }

    /// Coordinate lookup for callers that already validated the axis.
    pub(crate) fn axis_value(&self, axis: usize) -> T {
        self.coordinates[axis]
    }
}

impl<T: Coordinate> From<Vec<T>> for KdPoint<T> {
    fn from(coordinates: Vec<T>) -> Self {
        Self::new(coordinates)
    }
}

impl<T: Coordinate> From<&[T]> for KdPoint<T> {
    fn from(coordinates: &[T]) -> Self {
        Self { coordinates: coordinates.into() }
    }
}

impl<T: Coordinate, const N: usize> From<[T; N]> for KdPoint<T> {
    fn from(coordinates: [T; N]) -> Self {
        Self::new(coordinates.to_vec())
    }
}

impl<T: Coordinate> fmt::Display for KdPoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}
