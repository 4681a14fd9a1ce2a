// src/core/kdtree/mod.rs

//! KD-Tree over fixed-dimension points.
//!
//! A tree is built once from a complete point set and never changes afterwards.
//! Nodes are stored in an arena owned by [`KdTree`]; links between nodes are
//! [`NodeId`] indices, with the parent link used only for upward traversal.

pub use self::builder::{KdTreeBuilder, DEFAULT_MEDIAN_SAMPLE_FRACTION};
pub use self::error::{KdTreeError, KdTreeResult};
pub use self::node::{KdNode, NodeId, Side};
pub use self::point::{Coordinate, KdPoint};
pub use self::tree::KdTree;

mod builder;
mod error;
mod node;
mod point;
mod tree;
