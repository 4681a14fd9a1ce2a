// src/core/solver/mod.rs

//! Nearest-neighbour search over a built `KdTree`.
//!
//! The search descends to the leaf whose region contains the query, then unwinds
//! towards the starting node. On the way up every ancestor is evaluated as a
//! candidate, and the far subtree of an ancestor is searched only when the
//! splitting hyperplane lies closer to the query than the best distance found so
//! far. That test is exact for axis-aligned splits under euclidean distance.
//!
//! The query point itself is never returned: stored points value-equal to the
//! query are skipped as candidates.

use crate::core::kdtree::{Coordinate, KdPoint, KdTree, KdTreeError, KdTreeResult, NodeId};

/// A search result: the nearest stored point and its squared distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<T: Coordinate> {
    pub point: KdPoint<T>,
    pub distance_squared: f64,
}

/// Running best of one query. Never shared between queries.
struct CurrentBest<'t, T: Coordinate> {
    point: Option<&'t KdPoint<T>>,
    distance_squared: f64,
}

impl<'t, T: Coordinate> CurrentBest<'t, T> {
    fn new() -> Self {
        Self { point: None, distance_squared: f64::INFINITY }
    }

    /// Takes `candidate` if it is closer than the current best and is not the query.
    fn offer(&mut self, candidate: &'t KdPoint<T>, query: &KdPoint<T>) {
        if candidate == query {
            return;
        }
        let distance_squared = candidate.distance_squared_unchecked(query);
        if self.point.is_none() || distance_squared < self.distance_squared {
            self.point = Some(candidate);
            self.distance_squared = distance_squared;
        }
    }
}

/// Stateless nearest-neighbour solver bound to one tree.
///
/// A solver only borrows the tree, so each worker of a batch creates its own.
#[derive(Debug, Clone, Copy)]
pub struct Solver<'t, T: Coordinate> {
    tree: &'t KdTree<T>,
}

impl<'t, T: Coordinate> Solver<'t, T> {
    pub fn new(tree: &'t KdTree<T>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'t KdTree<T> {
        self.tree
    }

    /// Returns the stored point nearest to `query`, excluding points equal to `query`.
    ///
    /// `Ok(None)` means every stored point equals the query, which can only happen
    /// for a single-node tree queried with its own point.
    ///
    /// # Errors
    ///
    /// Returns `KdTreeError::DimensionMismatch` if `query` does not have the
    /// tree's dimensionality.
    pub fn find_nearest(&self, query: &KdPoint<T>) -> KdTreeResult<Option<KdPoint<T>>> {
        Ok(self.find_nearest_neighbor(query)?.map(|neighbor| neighbor.point))
    }

    /// Like [`Solver::find_nearest`], also reporting the squared distance.
    ///
    /// # Errors
    ///
    /// Returns `KdTreeError::DimensionMismatch` on a dimensionality mismatch.
    pub fn find_nearest_neighbor(&self, query: &KdPoint<T>) -> KdTreeResult<Option<Neighbor<T>>> {
        if query.dimensions() != self.tree.dimensions() {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.tree.dimensions(),
                actual: query.dimensions(),
            });
        }

        let mut best = CurrentBest::new();
        self.solve_for_node(self.tree.root_id(), query, &mut best);

        Ok(best.point.map(|point| Neighbor {
            point: point.clone(),
            distance_squared: best.distance_squared,
        }))
    }

    /// Full search of the subtree rooted at `top`, feeding the shared running best.
    fn solve_for_node(&self, top: NodeId, query: &KdPoint<T>, best: &mut CurrentBest<'t, T>) {
        let leaf = self.find_leaf(top, query);
        best.offer(self.tree.node_at(leaf).point(), query);
        self.unwind_from(leaf, top, query, best);
    }

    /// Follows the build-time split rule down to a leaf.
    fn find_leaf(&self, start: NodeId, query: &KdPoint<T>) -> NodeId {
        let mut current = start;
        loop {
            let node = self.tree.node_at(current);
            current = match (node.left(), node.right()) {
                (None, None) => return current,
                (Some(only), None) | (None, Some(only)) => only,
                (Some(left), Some(right)) => {
                    let axis = node.axis();
                    if query.axis_value(axis) > node.point().axis_value(axis) {
                        right
                    } else {
                        left
                    }
                }
            };
        }
    }

    /// Walks from `leaf` up to `top`, checking ancestors and, where the pruning
    /// test cannot rule it out, the sibling subtree we did not come from.
    fn unwind_from(&self, leaf: NodeId, top: NodeId, query: &KdPoint<T>, best: &mut CurrentBest<'t, T>) {
        let stop = self.tree.node_at(top).parent();
        let mut working = leaf;

        while self.tree.node_at(working).parent() != stop {
            let Some(parent_id) = self.tree.node_at(working).parent() else {
                break;
            };
            let parent = self.tree.node_at(parent_id);
            best.offer(parent.point(), query);

            let axis = parent.axis();
            let axis_distance = parent.point().axis_value(axis).as_f64() - query.axis_value(axis).as_f64();

            if axis_distance * axis_distance < best.distance_squared {
                if let (Some(left), Some(right)) = (parent.left(), parent.right()) {
                    let other = if left == working { right } else { left };
                    self.solve_for_node(other, query, best);
                }
            }

            working = parent_id;
        }
    }
}
