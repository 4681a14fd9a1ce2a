// src/core/kdtree/builder.rs

//! Logic for building a KD-Tree from a set of points.
//!
//! Each node stores an approximate median of its subset as pivot. The median is
//! estimated from a small random sample, which keeps construction cheap while
//! still producing a tree of roughly logarithmic height. Split quality depends on
//! the sample; search correctness does not.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, debug_span};

use super::error::{KdTreeError, KdTreeResult};
use super::node::{KdNode, NodeId, Side};
use super::point::{Coordinate, KdPoint};
use super::tree::KdTree;

/// Share of a subset sampled to approximate its median (1%).
pub const DEFAULT_MEDIAN_SAMPLE_FRACTION: f64 = 0.01;

/// A subset of points still waiting for its node.
struct PendingSubtree<T: Coordinate> {
    points: Vec<KdPoint<T>>,
    depth: usize,
    parent: Option<(NodeId, Side)>,
}

/// Configures and runs tree construction.
#[derive(Debug, Clone, PartialEq)]
pub struct KdTreeBuilder {
    sample_fraction: f64,
    seed: Option<u64>,
}

impl KdTreeBuilder {
    pub fn new() -> Self {
        Self { sample_fraction: DEFAULT_MEDIAN_SAMPLE_FRACTION, seed: None }
    }

    /// Sets the share of each subset sampled for the median estimate.
    pub fn sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = fraction;
        self
    }

    /// Fixes the sampling seed so repeated builds produce identical trees.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds a tree, seeding `StdRng` from the configured seed or from entropy.
    ///
    /// # Errors
    ///
    /// * `KdTreeError::EmptyInput` if `points` is empty.
    /// * `KdTreeError::InvalidDimension` if the first point has no coordinates.
    /// * `KdTreeError::DimensionMismatch` if any point differs in dimensionality
    ///   from the first one.
    pub fn build<T: Coordinate>(&self, points: &[KdPoint<T>]) -> KdTreeResult<KdTree<T>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.build_with_rng(points, &mut rng)
    }

    /// Builds a tree drawing every pivot sample from `rng`.
    ///
    /// # Errors
    ///
    /// Same as [`KdTreeBuilder::build`].
    pub fn build_with_rng<T: Coordinate, R: Rng + ?Sized>(
        &self,
        points: &[KdPoint<T>],
        rng: &mut R,
    ) -> KdTreeResult<KdTree<T>> {
        let dimensions = validate_points(points)?;
        let span = debug_span!("kdtree_build", points = points.len(), dimensions);
        let _guard = span.enter();

        let mut nodes: Vec<KdNode<T>> = Vec::with_capacity(points.len());
        let mut pending = vec![PendingSubtree { points: points.to_vec(), depth: 0, parent: None }];

        while let Some(PendingSubtree { points: subset, depth, parent }) = pending.pop() {
            if subset.is_empty() {
                continue;
            }

            let axis = depth % dimensions;
            let pivot = approximate_median(&subset, axis, self.sample_fraction, rng);
            let (left, right) = partition_around(subset, &pivot, axis);

            let id = nodes.len();
            nodes.push(KdNode::new(pivot, depth, axis, parent.map(|(parent_id, _)| parent_id)));
            if let Some((parent_id, side)) = parent {
                nodes[parent_id].attach(side, id);
            }

            // Right goes first so the left subtree is built next: arena order is pre-order.
            pending.push(PendingSubtree { points: right, depth: depth + 1, parent: Some((id, Side::Right)) });
            pending.push(PendingSubtree { points: left, depth: depth + 1, parent: Some((id, Side::Left)) });
        }

        let tree = KdTree::from_parts(nodes, 0, dimensions);
        debug!(
            input_points = points.len(),
            nodes = tree.len(),
            height = tree.height(),
            "built kd-tree"
        );
        Ok(tree)
    }
}

impl Default for KdTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks the input and returns its dimensionality.
fn validate_points<T: Coordinate>(points: &[KdPoint<T>]) -> KdTreeResult<usize> {
    let first = points.first().ok_or(KdTreeError::EmptyInput)?;
    let dimensions = first.dimensions();
    if dimensions == 0 {
        return Err(KdTreeError::InvalidDimension);
    }
    if let Some(odd) = points.iter().find(|p| p.dimensions() != dimensions) {
        return Err(KdTreeError::DimensionMismatch { expected: dimensions, actual: odd.dimensions() });
    }
    Ok(dimensions)
}

/// Sample size for a subset: `max(1, round(fraction * len))`, never more than `len`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub(crate) fn sample_size(len: usize, fraction: f64) -> usize {
    let raw = (len as f64 * fraction).round();
    if raw.is_finite() && raw >= 1.0 {
        (raw as usize).min(len.max(1))
    } else {
        1
    }
}

/// Picks the middle element of a random sample sorted on `axis`.
///
/// Samples are drawn independently with replacement, so the same point may
/// appear several times in one sample.
fn approximate_median<T: Coordinate, R: Rng + ?Sized>(
    points: &[KdPoint<T>],
    axis: usize,
    fraction: f64,
    rng: &mut R,
) -> KdPoint<T> {
    let mut sample: Vec<&KdPoint<T>> = (0..sample_size(points.len(), fraction))
        .map(|_| &points[rng.gen_range(0..points.len())])
        .collect();

    sample.sort_by(|a, b| {
        a.axis_value(axis).partial_cmp(&b.axis_value(axis)).unwrap_or(Ordering::Equal)
    });

    sample[sample.len() / 2].clone()
}

/// Splits `points` into (≤ pivot, > pivot) on `axis`.
///
/// Every point value-equal to the pivot is dropped, not only the pivot itself.
fn partition_around<T: Coordinate>(
    points: Vec<KdPoint<T>>,
    pivot: &KdPoint<T>,
    axis: usize,
) -> (Vec<KdPoint<T>>, Vec<KdPoint<T>>) {
    let split_value = pivot.axis_value(axis);
    let mut left = Vec::with_capacity(points.len() / 2);
    let mut right = Vec::with_capacity(points.len() / 2);

    for point in points.into_iter().filter(|p| p != pivot) {
        if point.axis_value(axis) > split_value {
            right.push(point);
        } else {
            left.push(point);
        }
    }
    (left, right)
}
