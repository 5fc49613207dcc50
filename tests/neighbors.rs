//! Tests for the layered neighbor finder

use hotspot::synthetic::random_points;
use hotspot::{GpsPoint, NeighborFinder};

fn assert_layered_matches_exact(finder: &NeighborFinder, sw: GpsPoint, ne: GpsPoint, seed: u64) {
    let points = random_points(250, (sw, ne), seed);
    for i in 0..points.len() {
        assert_eq!(
            finder.neighbors(&points, i),
            finder.neighbors_exact(&points, i),
            "subject {} (seed {})",
            i,
            seed
        );
    }
}

#[test]
fn test_layered_equals_exact_dense() {
    let finder = NeighborFinder::new(120.0, 2000.0);
    for seed in 0..4 {
        assert_layered_matches_exact(
            &finder,
            GpsPoint::new(45.00, 7.00),
            GpsPoint::new(45.01, 7.015),
            seed,
        );
    }
}

#[test]
fn test_layered_equals_exact_sparse() {
    // Spread over ~100 km so the pre-filter rejects most candidates
    let finder = NeighborFinder::new(5000.0, 2000.0);
    for seed in 10..14 {
        assert_layered_matches_exact(
            &finder,
            GpsPoint::new(-34.5, -59.0),
            GpsPoint::new(-33.5, -58.0),
            seed,
        );
    }
}

#[test]
fn test_no_neighbors_when_isolated() {
    let points = random_points(1, (GpsPoint::new(10.0, 10.0), GpsPoint::new(10.1, 10.1)), 3);
    let finder = NeighborFinder::new(120.0, 2000.0);
    assert!(finder.neighbors(&points, 0).is_empty());
}
