// src/core/kdtree/node.rs

use super::point::{Coordinate, KdPoint};

/// Node identifier: index into the owning tree's node arena.
pub type NodeId = usize;

/// Which side of its parent a node hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A single KD-Tree node.
///
/// Children are owned by the tree's arena and referenced by `NodeId`. The parent
/// link is a plain back-reference used for unwinding during search; it carries no
/// ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct KdNode<T: Coordinate> {
    point: KdPoint<T>,
    depth: usize,
    axis: usize,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<T: Coordinate> KdNode<T> {
    pub(super) fn new(point: KdPoint<T>, depth: usize, axis: usize, parent: Option<NodeId>) -> Self {
        Self { point, depth, axis, parent, left: None, right: None }
    }

    /// Links a child during the build. Nodes are never relinked afterwards.
    pub(super) fn attach(&mut self, side: Side, child: NodeId) {
        match side {
            Side::Left => self.left = Some(child),
            Side::Right => self.right = Some(child),
        }
    }

    pub fn point(&self) -> &KdPoint<T> {
        &self.point
    }

    /// Distance from the root (root = 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Split axis, `depth % dimensions`.
    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn has_left(&self) -> bool {
        self.left.is_some()
    }

    pub fn has_right(&self) -> bool {
        self.right.is_some()
    }

    pub fn has_children(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    /// Number of present child links (0, 1 or 2).
    pub fn child_count(&self) -> usize {
        usize::from(self.left.is_some()) + usize::from(self.right.is_some())
    }

    pub fn is_leaf(&self) -> bool {
        !self.has_children()
    }
}
