//! Tracing cluster outlines into closed polygon rings.
//!
//! The alpha-shape boundary is an unordered bag of edges. Ring assembly grows
//! one open chain at a time from either end until it closes, then starts a new
//! ring from the next unconsumed edge. Matching is a linear scan of the
//! remaining pool, O(n²) per ring: fine for clusters of tens of points, not for
//! much larger inputs.

use geo::{Coord, LineString, Winding};
use serde::{Deserialize, Serialize};

use crate::alpha_shape::{alpha_shape, Edge};
use crate::error::{HotspotError, Result};
use crate::geo_utils::bounds_area;
use crate::projection::project;
use crate::{Bounds, GpsPoint};

/// One closed ring of `[longitude, latitude]` pairs (first == last).
pub type Ring = Vec<[f64; 2]>;

/// A polygon as an ordered list of rings, largest bounding box first.
///
/// Ring orientation is left as traced. Use [`Polygon::to_geo`] for a
/// geometry with normalized winding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// GeoJSON geometry object (`{"type": "Polygon", "coordinates": ...}`).
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": self.rings,
        })
    }

    /// Convert to a `geo` polygon: first ring exterior, the rest interiors,
    /// with RFC 7946 winding (exterior counter-clockwise, holes clockwise).
    pub fn to_geo(&self) -> Option<geo::Polygon<f64>> {
        let mut rings = self.rings.iter().map(|ring| {
            LineString::new(ring.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect())
        });
        let mut exterior = rings.next()?;
        exterior.make_ccw_winding();
        let interiors = rings
            .map(|mut ring| {
                ring.make_cw_winding();
                ring
            })
            .collect();
        Some(geo::Polygon::new(exterior, interiors))
    }
}

/// Assemble unordered boundary edges into closed rings of point indices.
///
/// Each returned ring starts and ends with the same index and every edge is
/// used exactly once. Fails if an open ring cannot be extended.
pub fn assemble_rings(edges: &[Edge]) -> Result<Vec<Vec<usize>>> {
    let mut pool: Vec<Option<Edge>> = edges.iter().copied().map(Some).collect();
    let mut remaining = pool.len();
    let mut rings = Vec::new();

    for seed in 0..pool.len() {
        let Some(edge) = pool[seed].take() else {
            continue;
        };
        remaining -= 1;
        let mut ring: Vec<usize> = edge.to_vec();

        while ring.first() != ring.last() {
            let first = ring[0];
            let last = ring[ring.len() - 1];
            let slot = pool
                .iter()
                .position(|e| matches!(e, Some([a, b]) if [first, last].contains(a) || [first, last].contains(b)));
            let Some([a, b]) = slot.and_then(|i| pool[i].take()) else {
                return Err(HotspotError::MalformedHull {
                    ring_len: ring.len(),
                    remaining_edges: remaining,
                });
            };
            remaining -= 1;

            if first == a {
                ring.insert(0, b);
            } else if first == b {
                ring.insert(0, a);
            } else if last == a {
                ring.push(b);
            } else {
                ring.push(a);
            }
        }
        rings.push(ring);
    }

    Ok(rings)
}

/// Trace the outline of one cluster.
///
/// Returns `Ok(None)` for degenerate clusters (fewer than three distinct
/// positions, or no area at all) and an error for malformed hulls.
pub fn trace_cluster(points: &[GpsPoint], alpha: f64) -> Result<Option<Polygon>> {
    if distinct_positions(points) < 3 {
        return Ok(None);
    }

    let projected = project(points);
    let plane: Vec<[f64; 2]> = projected.iter().map(|p| p.plane).collect();
    let hull = alpha_shape(alpha, &plane)?;
    if hull.is_empty() {
        return Ok(None);
    }

    let mut rings: Vec<Ring> = assemble_rings(&hull)?
        .into_iter()
        .map(|ring| ring.into_iter().map(|i| projected[i].geo).collect())
        .collect();

    // Presentation order only: biggest bounding box first
    rings.sort_by(|a, b| ring_area(b).total_cmp(&ring_area(a)));

    Ok(Some(Polygon { rings }))
}

fn ring_area(ring: &Ring) -> f64 {
    let points: Vec<GpsPoint> = ring.iter().map(|[lng, lat]| GpsPoint::new(*lat, *lng)).collect();
    Bounds::from_points(&points).map_or(0.0, |b| bounds_area(&b))
}

fn distinct_positions(points: &[GpsPoint]) -> usize {
    let mut seen: Vec<(u64, u64)> = points
        .iter()
        .map(|p| (p.latitude.to_bits(), p.longitude.to_bits()))
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
