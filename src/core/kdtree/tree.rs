// src/core/kdtree/tree.rs

//! Defines the immutable `KdTree` that owns the node arena.

use super::builder::KdTreeBuilder;
use super::error::KdTreeResult;
use super::node::{KdNode, NodeId};
use super::point::{Coordinate, KdPoint};
use rand::Rng;

/// A KD-Tree built once from a non-empty point set.
///
/// All nodes live in one arena; the root always exists. There is no mutating API
/// after construction, so a tree behind an `Arc` can be read by any number of
/// threads or tasks without locking.
#[derive(Debug, Clone)]
pub struct KdTree<T: Coordinate> {
    nodes: Vec<KdNode<T>>,
    root: NodeId,
    dimensions: usize,
}

impl<T: Coordinate> KdTree<T> {
    pub(super) fn from_parts(nodes: Vec<KdNode<T>>, root: NodeId, dimensions: usize) -> Self {
        Self { nodes, root, dimensions }
    }

    /// Builds a tree with the default builder and an entropy-seeded generator.
    ///
    /// # Errors
    ///
    /// See [`KdTreeBuilder::build`].
    pub fn build(points: &[KdPoint<T>]) -> KdTreeResult<Self> {
        KdTreeBuilder::new().build(points)
    }

    /// Builds a reproducible tree: the same seed and input yield the same tree.
    ///
    /// # Errors
    ///
    /// See [`KdTreeBuilder::build`].
    pub fn build_seeded(points: &[KdPoint<T>], seed: u64) -> KdTreeResult<Self> {
        KdTreeBuilder::new().seed(seed).build(points)
    }

    /// Builds a tree drawing pivot samples from `rng`.
    ///
    /// # Errors
    ///
    /// See [`KdTreeBuilder::build`].
    pub fn build_with_rng<R: Rng + ?Sized>(points: &[KdPoint<T>], rng: &mut R) -> KdTreeResult<Self> {
        KdTreeBuilder::new().build_with_rng(points, rng)
    }

    /// Dimensionality shared by every point in the tree.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Split axis used for nodes at `depth`.
    pub fn axis_index(&self, depth: usize) -> usize {
        depth % self.dimensions
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &KdNode<T> {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: NodeId) -> Option<&KdNode<T>> {
        self.nodes.get(id)
    }

    /// Arena lookup for ids handed out by this tree.
    pub(crate) fn node_at(&self, id: NodeId) -> &KdNode<T> {
        &self.nodes[id]
    }

    /// Number of nodes, i.e. number of distinct stored points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree cannot be built from an empty point set.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels, 1 for a single-node tree.
    pub fn height(&self) -> usize {
        self.nodes.iter().map(KdNode::depth).max().map_or(0, |deepest| deepest + 1)
    }

    /// Iterates over `(id, node)` pairs in arena order (pre-order, left before right).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &KdNode<T>)> {
        self.nodes.iter().enumerate()
    }

    /// Iterates over the points stored in the tree.
    pub fn points(&self) -> impl Iterator<Item = &KdPoint<T>> {
        self.nodes.iter().map(KdNode::point)
    }
}
