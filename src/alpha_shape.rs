//! Alpha shapes over planar points.
//!
//! The Delaunay triangulation is filtered down to the triangles whose
//! circumradius `r` satisfies `r * alpha < 1`; the boundary of what remains
//! (edges used by exactly one kept triangle) is the concave hull. With
//! `alpha <= 0` every triangle is kept and the result is the convex hull.

use std::collections::HashMap;

use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::{HotspotError, Result};

/// An undirected hull edge between two input indices.
pub type Edge = [usize; 2];

/// Boundary edges of the alpha shape of `points`, as indices into `points`.
///
/// Coincident input points collapse onto the first occurrence. Edges are
/// returned in a deterministic order (triangulation face order).
pub fn alpha_shape(alpha: f64, points: &[[f64; 2]]) -> Result<Vec<Edge>> {
    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    // vertex handle index -> first input index at that position
    let mut input_of_vertex: HashMap<usize, usize> = HashMap::with_capacity(points.len());

    for (i, p) in points.iter().enumerate() {
        let handle = triangulation
            .insert(Point2::new(p[0], p[1]))
            .map_err(|e| HotspotError::Triangulation(format!("point {}: {:?}", i, e)))?;
        input_of_vertex.entry(handle.index()).or_insert(i);
    }

    let mut edge_order: Vec<Edge> = Vec::new();
    let mut edge_uses: HashMap<Edge, usize> = HashMap::new();

    for face in triangulation.inner_faces() {
        let vertices = face.vertices();
        let positions = vertices.map(|v| {
            let p = v.position();
            [p.x, p.y]
        });
        if !keep_triangle(alpha, &positions) {
            continue;
        }

        let ids = vertices.map(|v| input_of_vertex[&v.fix().index()]);
        for (a, b) in [(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[0])] {
            let key = if a < b { [a, b] } else { [b, a] };
            let uses = edge_uses.entry(key).or_insert(0);
            if *uses == 0 {
                edge_order.push([a, b]);
            }
            *uses += 1;
        }
    }

    Ok(edge_order
        .into_iter()
        .filter(|[a, b]| {
            let key = if a < b { [*a, *b] } else { [*b, *a] };
            edge_uses[&key] == 1
        })
        .collect())
}

fn keep_triangle(alpha: f64, t: &[[f64; 2]; 3]) -> bool {
    if alpha <= 0.0 {
        return true;
    }
    match circumradius(t) {
        Some(r) => r * alpha < 1.0,
        None => false,
    }
}

/// Circumradius of a triangle, `None` when it is degenerate.
pub fn circumradius(t: &[[f64; 2]; 3]) -> Option<f64> {
    let side = |p: [f64; 2], q: [f64; 2]| ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)).sqrt();
    let a = side(t[0], t[1]);
    let b = side(t[1], t[2]);
    let c = side(t[2], t[0]);
    let cross = (t[1][0] - t[0][0]) * (t[2][1] - t[0][1]) - (t[1][1] - t[0][1]) * (t[2][0] - t[0][0]);
    let area = cross.abs() / 2.0;
    if area <= f64::EPSILON {
        return None;
    }
    Some(a * b * c / (4.0 * area))
}
