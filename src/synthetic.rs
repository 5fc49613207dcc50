//! Synthetic report clouds for stress testing and benchmarking.
//!
//! Generates dense "hotspots" of reports around known centers plus uniformly
//! scattered background reports, giving ground truth for clustering checks.
//! Feature-gated behind `synthetic`; not part of production builds.
//!
//! # Example
//!
//! ```rust
//! use hotspot::synthetic::{HotspotConfig, SyntheticScenario};
//! use hotspot::GpsPoint;
//!
//! let scenario = SyntheticScenario {
//!     origin: GpsPoint::new(45.07, 7.68),
//!     hotspots: vec![HotspotConfig { offset_meters: (0.0, 0.0), reports: 30, sigma_meters: 25.0 }],
//!     background_reports: 10,
//!     background_radius_meters: 20_000.0,
//!     kinds: vec!["acc".to_string()],
//!     seed: 42,
//! };
//!
//! let dataset = scenario.generate();
//! assert_eq!(dataset.points.len(), 40);
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{GpsPoint, NotificationPoint};

/// One dense group of reports.
#[derive(Debug, Clone)]
pub struct HotspotConfig {
    /// Center offset from the scenario origin, (east, north) in meters.
    pub offset_meters: (f64, f64),
    /// Number of reports in the group.
    pub reports: usize,
    /// Gaussian spread of the reports around the center, in meters.
    pub sigma_meters: f64,
}

/// Scenario configuration for generating synthetic reports.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Origin of the scenario.
    pub origin: GpsPoint,
    /// Dense groups (ground truth clusters).
    pub hotspots: Vec<HotspotConfig>,
    /// Number of scattered background reports.
    pub background_reports: usize,
    /// Radius of the disc the background is drawn from, in meters.
    pub background_radius_meters: f64,
    /// Kind tags, assigned round-robin.
    pub kinds: Vec<String>,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// A generated dataset with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    /// All reports, hotspot members first, in generation order.
    pub points: Vec<NotificationPoint>,
    /// Report ids of each hotspot.
    pub hotspot_ids: Vec<Vec<String>>,
    /// Centers of the hotspots.
    pub centers: Vec<GpsPoint>,
}

/// Meters per degree of latitude (approximately constant).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

fn meters_to_deg_lng(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lng
}

/// Offset a point by (east, north) meters.
pub fn offset(origin: &GpsPoint, east: f64, north: f64) -> GpsPoint {
    let latitude = origin.latitude + meters_to_deg_lat(north);
    GpsPoint::new(latitude, origin.longitude + meters_to_deg_lng(east, origin.latitude))
}

/// Box-Muller pair of standard normal samples.
fn gaussian_pair(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.gen();
    let r = (-2.0 * u1.ln()).sqrt();
    (r * (2.0 * PI * u2).cos(), r * (2.0 * PI * u2).sin())
}

impl SyntheticScenario {
    /// Generate the dataset; identical seeds give identical datasets.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut points = Vec::new();
        let mut hotspot_ids = Vec::with_capacity(self.hotspots.len());
        let mut centers = Vec::with_capacity(self.hotspots.len());

        for (h, hotspot) in self.hotspots.iter().enumerate() {
            let center = offset(&self.origin, hotspot.offset_meters.0, hotspot.offset_meters.1);
            let mut ids = Vec::with_capacity(hotspot.reports);
            for i in 0..hotspot.reports {
                let (dx, dy) = gaussian_pair(&mut rng);
                let p = offset(&center, dx * hotspot.sigma_meters, dy * hotspot.sigma_meters);
                let id = format!("hotspot{}-{}", h, i);
                points.push(self.point(&id, p, points.len()));
                ids.push(id);
            }
            hotspot_ids.push(ids);
            centers.push(center);
        }

        for i in 0..self.background_reports {
            // Uniform over the disc
            let r = self.background_radius_meters * rng.gen::<f64>().sqrt();
            let theta = rng.gen_range(0.0..(2.0 * PI));
            let p = offset(&self.origin, r * theta.cos(), r * theta.sin());
            points.push(self.point(&format!("background-{}", i), p, points.len()));
        }

        SyntheticDataset {
            points,
            hotspot_ids,
            centers,
        }
    }

    fn point(&self, id: &str, p: GpsPoint, n: usize) -> NotificationPoint {
        let kind = if self.kinds.is_empty() {
            "oth"
        } else {
            self.kinds[n % self.kinds.len()].as_str()
        };
        NotificationPoint::new(id, p.latitude, p.longitude, kind, n as i64)
    }
}

/// Uniformly random points inside a box, for property checks.
pub fn random_points(count: usize, bounds: (GpsPoint, GpsPoint), seed: u64) -> Vec<NotificationPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (sw, ne) = bounds;
    (0..count)
        .map(|i| {
            let lat = rng.gen_range(sw.latitude..ne.latitude);
            let lng = rng.gen_range(sw.longitude..ne.longitude);
            NotificationPoint::new(&format!("r{}", i), lat, lng, "oth", 0)
        })
        .collect()
}
