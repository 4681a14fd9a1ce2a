// src/core/kdtree/tests/test_builder.rs

use crate::core::kdtree::builder::sample_size;
use crate::core::kdtree::{Coordinate, KdNode, KdPoint, KdTree, KdTreeBuilder, KdTreeError, NodeId};
use crate::core::testing::{init_tracing, RandomPointGenerator};
use proptest::prelude::*;

const POINT_COUNT: usize = 5_000;
const MIN_DIMENSIONS: usize = 1;
const MAX_DIMENSIONS: usize = 10;

/// Collects the points of the subtree rooted at `id`.
fn subtree_points<T: Coordinate>(tree: &KdTree<T>, id: Option<NodeId>) -> Vec<KdPoint<T>> {
    let mut points = Vec::new();
    let mut stack: Vec<NodeId> = id.into_iter().collect();
    while let Some(current) = stack.pop() {
        let node = tree.node(current).unwrap();
        points.push(node.point().clone());
        stack.extend(node.left());
        stack.extend(node.right());
    }
    points
}

fn check_children<T: Coordinate>(tree: &KdTree<T>, id: NodeId, node: &KdNode<T>) {
    let axis = node.axis();
    assert_eq!(axis, tree.axis_index(node.depth()));
    let split = node.point().coordinate(axis).unwrap();

    for child_id in [node.left(), node.right()].into_iter().flatten() {
        let child = tree.node(child_id).unwrap();
        assert_eq!(child.depth(), node.depth() + 1);
        assert_eq!(child.axis(), tree.axis_index(child.depth()));
        assert!(child.has_parent());
        assert_eq!(child.parent(), Some(id));
    }

    for point in subtree_points(tree, node.left()) {
        assert!(point.coordinate(axis).unwrap() <= split, "{point} is left of {} on axis {axis}", node.point());
    }
    for point in subtree_points(tree, node.right()) {
        assert!(point.coordinate(axis).unwrap() > split, "{point} is right of {} on axis {axis}", node.point());
    }

    let expected_children = usize::from(node.has_left()) + usize::from(node.has_right());
    assert_eq!(node.child_count(), expected_children);
    assert_eq!(node.has_children(), expected_children > 0);
    assert_eq!(node.is_leaf(), expected_children == 0);
}

pub(crate) fn assert_tree_invariants<T: Coordinate>(tree: &KdTree<T>) {
    assert!(!tree.root().has_parent());
    assert_eq!(tree.root().depth(), 0);
    for (id, node) in tree.iter() {
        check_children(tree, id, node);
    }
    // Every node is reachable from the root exactly once.
    assert_eq!(subtree_points(tree, Some(tree.root_id())).len(), tree.len());
}

#[test]
fn test_kdtree_for_all_dimension_counts() {
    init_tracing();
    let mut generator = RandomPointGenerator::new(0);
    for dimensions in MIN_DIMENSIONS..=MAX_DIMENSIONS {
        let points = generator.generate_points(dimensions, POINT_COUNT);
        let tree = KdTree::build_seeded(&points, 42).unwrap();

        assert_eq!(tree.dimensions(), dimensions);
        assert_eq!(tree.len(), POINT_COUNT);
        assert_tree_invariants(&tree);
    }
}

#[test]
fn test_kdtree_with_no_points() {
    let points: Vec<KdPoint<f64>> = Vec::new();
    assert_eq!(KdTree::build(&points).unwrap_err(), KdTreeError::EmptyInput);
}

#[test]
fn test_kdtree_with_zero_dimensional_points() {
    let points = vec![KdPoint::<f64>::new(Vec::new())];
    assert_eq!(KdTree::build(&points).unwrap_err(), KdTreeError::InvalidDimension);
}

#[test]
fn test_kdtree_with_mixed_dimensions() {
    let points = vec![KdPoint::from([1.0, 2.0]), KdPoint::from([1.0, 2.0, 3.0])];
    assert_eq!(
        KdTree::build(&points).unwrap_err(),
        KdTreeError::DimensionMismatch { expected: 2, actual: 3 }
    );
}

#[test]
fn test_single_point_tree() {
    let tree = KdTree::build(&[KdPoint::from([3, 4])]).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.height(), 1);
    assert!(tree.root().is_leaf());
    assert!(!tree.root().has_parent());
    assert_eq!(tree.root().point(), &KdPoint::from([3, 4]));
}

#[test]
fn test_identical_points_collapse_into_one_node() {
    let points = vec![KdPoint::from([5.0, 5.0]); 10];
    let tree = KdTree::build(&points).unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.root().is_leaf());
}

#[test]
fn test_duplicates_of_a_pivot_are_dropped_together() {
    let points = vec![
        KdPoint::from([1.0, 1.0]),
        KdPoint::from([1.0, 1.0]),
        KdPoint::from([2.0, 2.0]),
        KdPoint::from([2.0, 2.0]),
        KdPoint::from([3.0, 0.0]),
    ];
    let tree = KdTree::build_seeded(&points, 7).unwrap();

    // One node per distinct value, regardless of which point became a pivot first.
    assert_eq!(tree.len(), 3);
    for distinct in [[1.0, 1.0], [2.0, 2.0], [3.0, 0.0]] {
        let expected = KdPoint::from(distinct);
        assert_eq!(tree.points().filter(|p| **p == expected).count(), 1);
    }
    assert_tree_invariants(&tree);
}

#[test]
fn test_seeded_builds_are_reproducible() {
    let points = RandomPointGenerator::new(3).generate_points(3, 2_000);
    let first = KdTree::build_seeded(&points, 99).unwrap();
    let second = KdTreeBuilder::new().seed(99).build(&points).unwrap();

    assert_eq!(first.len(), second.len());
    for ((_, a), (_, b)) in first.iter().zip(second.iter()) {
        assert_eq!(a.point(), b.point());
        assert_eq!(a.parent(), b.parent());
        assert_eq!(a.left(), b.left());
        assert_eq!(a.right(), b.right());
    }
}

#[test]
fn test_larger_sample_fraction_still_valid() {
    let points = RandomPointGenerator::new(11).generate_points(2, 1_000);
    let tree = KdTreeBuilder::new().sample_fraction(0.25).seed(5).build(&points).unwrap();
    assert_eq!(tree.len(), 1_000);
    assert_tree_invariants(&tree);
}

#[test]
fn test_sample_size() {
    assert_eq!(sample_size(1, 0.01), 1);
    assert_eq!(sample_size(149, 0.01), 1);
    assert_eq!(sample_size(150, 0.01), 2);
    assert_eq!(sample_size(100_000, 0.01), 1_000);
    assert_eq!(sample_size(10, f64::NAN), 1);
    assert_eq!(sample_size(10, 1e30), 10);
    assert_eq!(sample_size(10, f64::INFINITY), 1);
}

#[test]
fn test_oversized_sample_fraction_is_capped() {
    let input_points = RandomPointGenerator::new(8).generate_points(2, 10);
    let tree = KdTreeBuilder::new().sample_fraction(1e30).seed(1).build(&input_points).unwrap();
    assert_tree_invariants(&tree);
    assert_eq!(tree.len(), 10);
}

#[test]
fn test_integer_coordinates() {
    let points: Vec<KdPoint<i64>> = (0..200).map(|i| KdPoint::from([i % 17, i / 17, -i])).collect();
    let tree = KdTree::build_seeded(&points, 1).unwrap();
    assert_eq!(tree.len(), 200);
    assert_tree_invariants(&tree);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Small integer grids produce many duplicates; the invariant must still hold
    /// and every distinct value must end up in exactly one node.
    #[test]
    fn prop_tree_invariants_hold(
        seed in any::<u64>(),
        dimensions in 1usize..5,
        raw in proptest::collection::vec(-8i32..8, 1..400),
    ) {
        let points: Vec<KdPoint<i32>> = raw
            .chunks(dimensions)
            .filter(|chunk| chunk.len() == dimensions)
            .map(KdPoint::from)
            .collect();
        prop_assume!(!points.is_empty());

        let tree = KdTree::build_seeded(&points, seed).unwrap();
        assert_tree_invariants(&tree);

        let mut distinct: Vec<&KdPoint<i32>> = Vec::new();
        for point in &points {
            if !distinct.contains(&point) {
                distinct.push(point);
            }
        }
        prop_assert_eq!(tree.len(), distinct.len());
    }
}
