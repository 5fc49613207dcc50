//! Tests for boundary tracing and ring assembly

use hotspot::synthetic::offset;
use hotspot::{assemble_rings, trace_cluster, GpsPoint, HotspotError};

fn grid(origin: &GpsPoint, east: f64, rows: usize, cols: usize, spacing: f64) -> Vec<GpsPoint> {
    let mut points = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            points.push(offset(origin, east + c as f64 * spacing, r as f64 * spacing));
        }
    }
    points
}

fn contains_coord(points: &[GpsPoint], coord: &[f64; 2]) -> bool {
    points
        .iter()
        .any(|p| p.longitude == coord[0] && p.latitude == coord[1])
}

#[test]
fn test_closed_loop_uses_every_edge_once() {
    // Hexagon edges, shuffled and with mixed orientation
    let edges = [[3, 4], [1, 0], [5, 0], [2, 3], [1, 2], [5, 4]];
    let rings = assemble_rings(&edges).unwrap();
    assert_eq!(rings.len(), 1);

    let ring = &rings[0];
    assert_eq!(ring.len(), edges.len() + 1);
    assert_eq!(ring.first(), ring.last());

    let mut walked: Vec<[usize; 2]> = ring
        .windows(2)
        .map(|w| if w[0] < w[1] { [w[0], w[1]] } else { [w[1], w[0]] })
        .collect();
    let mut expected: Vec<[usize; 2]> = edges
        .iter()
        .map(|&[a, b]| if a < b { [a, b] } else { [b, a] })
        .collect();
    walked.sort_unstable();
    expected.sort_unstable();
    assert_eq!(walked, expected);
}

#[test]
fn test_disjoint_loops_make_two_rings() {
    let edges = [[0, 1], [10, 11], [1, 2], [11, 12], [2, 0], [12, 10]];
    let rings = assemble_rings(&edges).unwrap();
    assert_eq!(rings.len(), 2);
    assert!(rings.iter().all(|r| r.len() == 4 && r.first() == r.last()));
    assert!(rings[0].contains(&0));
    assert!(rings[1].contains(&10));
}

#[test]
fn test_dangling_edge_is_malformed() {
    let edges = [[0, 1], [1, 2], [2, 0], [5, 6]];
    let err = assemble_rings(&edges).unwrap_err();
    assert!(matches!(err, HotspotError::MalformedHull { ring_len: 2, remaining_edges: 0 }));
}

#[test]
fn test_empty_edges_no_rings() {
    assert!(assemble_rings(&[]).unwrap().is_empty());
}

#[test]
fn test_triangle_cluster_convex_hull() {
    let origin = GpsPoint::new(45.07, 7.68);
    let points = vec![
        origin,
        offset(&origin, 50.0, 0.0),
        offset(&origin, 20.0, 40.0),
    ];
    let polygon = trace_cluster(&points, 0.0).unwrap().unwrap();
    assert_eq!(polygon.rings.len(), 1);

    let ring = &polygon.rings[0];
    assert_eq!(ring.len(), 4);
    assert_eq!(ring.first(), ring.last());
    assert!(ring.iter().all(|c| contains_coord(&points, c)));
}

#[test]
fn test_separate_groups_sorted_by_bounding_box() {
    let origin = GpsPoint::new(45.07, 7.68);
    let mut points = grid(&origin, 0.0, 5, 5, 100.0);
    points.extend(grid(&origin, 1000.0, 2, 2, 100.0));

    // Triangles bridging the 600 m gap are far too large for this alpha
    let polygon = trace_cluster(&points, 5.0).unwrap().unwrap();
    assert_eq!(polygon.rings.len(), 2);
    assert_eq!(polygon.rings[0].len(), 17);
    assert_eq!(polygon.rings[1].len(), 5);
    for ring in &polygon.rings {
        assert_eq!(ring.first(), ring.last());
        assert!(ring.iter().all(|c| contains_coord(&points, c)));
    }
}

#[test]
fn test_polygon_serializes_as_ring_list() {
    let origin = GpsPoint::new(45.07, 7.68);
    let points = vec![
        origin,
        offset(&origin, 50.0, 0.0),
        offset(&origin, 20.0, 40.0),
    ];
    let polygon = trace_cluster(&points, 0.0).unwrap().unwrap();

    let json = serde_json::to_value(&polygon).unwrap();
    let rings = json.as_array().unwrap();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].as_array().unwrap().len(), 4);

    let geojson = polygon.to_geojson();
    assert_eq!(geojson["type"], "Polygon");
    assert_eq!(geojson["coordinates"], json);
}

#[test]
fn test_collinear_cluster_has_no_polygon() {
    let origin = GpsPoint::new(0.0, 10.0);
    let points: Vec<GpsPoint> = (0..5).map(|i| offset(&origin, i as f64 * 10.0, 0.0)).collect();
    assert!(trace_cluster(&points, 0.0).unwrap().is_none());
}
