// src/core/solver/tests/test_search.rs

use crate::core::kdtree::{KdPoint, KdTree, KdTreeError};
use crate::core::solver::Solver;
use crate::core::testing::{brute_force_nearest_distance, init_tracing, RandomPointGenerator};
use approx::assert_relative_eq;

const POINT_COUNT: usize = 20_000;

fn explicit_points() -> Vec<KdPoint<f64>> {
    vec![
        KdPoint::from([0.0, 0.0]),
        KdPoint::from([5.0, 5.0]),
        KdPoint::from([8.0, 5.0]),
        KdPoint::from([-30.0, -30.0]),
        KdPoint::from([-40.0, -40.0]),
        KdPoint::from([0.01, 0.01]),
    ]
}

#[test]
fn test_find_nearest_point_for_explicit_data() {
    let input_points = explicit_points();
    // Every seed yields a different tree shape; the answers must not change.
    for seed in 0..32 {
        let tree = KdTree::build_seeded(&input_points, seed).unwrap();
        let solver = Solver::new(&tree);

        let nearest: Vec<KdPoint<f64>> = input_points
            .iter()
            .map(|p| solver.find_nearest(p).unwrap().unwrap())
            .collect();

        assert_eq!(nearest[0], input_points[5]);
        assert_eq!(nearest[1], input_points[2]);
        assert_eq!(nearest[2], input_points[1]);
        assert_eq!(nearest[3], input_points[4]);
        assert_eq!(nearest[4], input_points[3]);
        assert_eq!(nearest[5], input_points[0]);
    }
}

#[test]
fn test_nearest_point_is_never_self() {
    init_tracing();
    let input_points = RandomPointGenerator::new(0).generate_points(3, POINT_COUNT);
    let tree = KdTree::build_seeded(&input_points, 0).unwrap();
    let solver = Solver::new(&tree);

    for point in &input_points {
        let nearest = solver.find_nearest(point).unwrap().unwrap();
        assert_ne!(&nearest, point);
    }
}

#[test]
fn test_matches_brute_force_for_all_dimension_counts() {
    let mut generator = RandomPointGenerator::new(1);
    for dimensions in 1..=10 {
        let input_points = generator.generate_points(dimensions, 2_000);
        let queries = generator.generate_points(dimensions, 100);
        let tree = KdTree::build_seeded(&input_points, dimensions as u64).unwrap();
        let solver = Solver::new(&tree);

        for query in input_points.iter().take(100).chain(queries.iter()) {
            let neighbor = solver.find_nearest_neighbor(query).unwrap().unwrap();
            let expected = brute_force_nearest_distance(&input_points, query).unwrap();
            assert_relative_eq!(neighbor.distance_squared, expected);
            assert_relative_eq!(neighbor.point.distance_squared(query).unwrap(), expected);
        }
    }
}

#[test]
fn test_query_near_stored_point_returns_it() {
    let input_points = RandomPointGenerator::new(2).generate_points(3, 5_000);
    let tree = KdTree::build_seeded(&input_points, 2).unwrap();
    let solver = Solver::new(&tree);

    for point in input_points.iter().take(500) {
        let nudged: Vec<f64> = point.coordinates().iter().map(|v| v + 1e-6).collect();
        let nearest = solver.find_nearest(&KdPoint::new(nudged)).unwrap().unwrap();
        assert_eq!(&nearest, point);
    }
}

#[test]
fn test_repeated_queries_are_idempotent() {
    let input_points = RandomPointGenerator::new(4).generate_points(4, 3_000);
    let tree = KdTree::build(&input_points).unwrap();
    let solver = Solver::new(&tree);

    for query in input_points.iter().take(200) {
        let first = solver.find_nearest(query).unwrap();
        let second = Solver::new(&tree).find_nearest(query).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_single_point_tree() {
    let tree = KdTree::build(&[KdPoint::from([1.0, 2.0])]).unwrap();
    let solver = Solver::new(&tree);

    assert_eq!(solver.find_nearest(&KdPoint::from([1.0, 2.0])).unwrap(), None);

    let neighbor = solver.find_nearest_neighbor(&KdPoint::from([4.0, 6.0])).unwrap().unwrap();
    assert_eq!(neighbor.point, KdPoint::from([1.0, 2.0]));
    assert_relative_eq!(neighbor.distance_squared, 25.0);
}

#[test]
fn test_query_dimension_mismatch() {
    let tree = KdTree::build(&[KdPoint::from([1.0, 2.0])]).unwrap();
    let result = Solver::new(&tree).find_nearest(&KdPoint::from([1.0, 2.0, 3.0]));
    assert_eq!(result, Err(KdTreeError::DimensionMismatch { expected: 2, actual: 3 }));
}

#[test]
fn test_integer_points() {
    let input_points: Vec<KdPoint<i32>> = vec![
        KdPoint::from([2, 3]),
        KdPoint::from([5, 4]),
        KdPoint::from([9, 6]),
        KdPoint::from([4, 7]),
        KdPoint::from([8, 1]),
        KdPoint::from([7, 2]),
    ];
    let tree = KdTree::build_seeded(&input_points, 3).unwrap();
    let solver = Solver::new(&tree);

    let neighbor = solver.find_nearest_neighbor(&KdPoint::from([8, 1])).unwrap().unwrap();
    assert_eq!(neighbor.point, KdPoint::from([7, 2]));
    assert_relative_eq!(neighbor.distance_squared, 2.0);

    let neighbor = solver.find_nearest_neighbor(&KdPoint::from([9, 9])).unwrap().unwrap();
    assert_eq!(neighbor.point, KdPoint::from([9, 6]));
}
