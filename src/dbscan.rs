//! DBSCAN over report points.
//!
//! Labels live in an array indexed by input position and the expansion
//! frontier is a plain queue of indices. Cluster ids are assigned in input
//! order starting at 1, so they are only meaningful within one run.

use std::collections::{BTreeMap, VecDeque};

use log::debug;

use crate::neighbors::NeighborFinder;
use crate::NotificationPoint;

/// Label of one point after (or during) a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Not enough neighbors; may still be promoted by a later expansion.
    Noise,
    /// Member of the cluster with this id (>= 1).
    Cluster(u32),
}

/// Output of a DBSCAN run.
#[derive(Debug, Clone)]
pub struct DbscanResult {
    /// One label per input point, in input order.
    pub labels: Vec<Label>,
    /// Number of clusters created; ids are `1..=cluster_count`.
    pub cluster_count: u32,
}

impl DbscanResult {
    /// Cluster id of the point at `index`, `None` for noise.
    pub fn cluster_of(&self, index: usize) -> Option<u32> {
        match self.labels.get(index) {
            Some(Label::Cluster(id)) => Some(*id),
            _ => None,
        }
    }

    /// Map point id -> cluster id, noise excluded.
    pub fn label_map(&self, points: &[NotificationPoint]) -> BTreeMap<String, u32> {
        points
            .iter()
            .zip(&self.labels)
            .filter_map(|(p, label)| match label {
                Label::Cluster(id) => Some((p.id.clone(), *id)),
                Label::Noise => None,
            })
            .collect()
    }

    /// Member indices of every cluster, keyed by cluster id, in input order.
    pub fn members(&self) -> BTreeMap<u32, Vec<usize>> {
        let mut members: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (index, label) in self.labels.iter().enumerate() {
            if let Label::Cluster(id) = label {
                members.entry(*id).or_default().push(index);
            }
        }
        members
    }

    /// Indices of points left as noise.
    pub fn noise(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == Label::Noise)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Density-based clusterer.
#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    finder: NeighborFinder,
    min_points: usize,
}

impl Dbscan {
    pub fn new(finder: NeighborFinder, min_points: usize) -> Self {
        Self { finder, min_points }
    }

    /// Label every point. Sequential by construction: id assignment depends
    /// on input order.
    pub fn run(&self, points: &[NotificationPoint]) -> DbscanResult {
        let mut labels: Vec<Option<Label>> = vec![None; points.len()];
        let mut current: u32 = 0;
        let mut frontier: VecDeque<usize> = VecDeque::new();

        for index in 0..points.len() {
            if labels[index].is_some() {
                continue;
            }
            let neighbors = self.finder.neighbors(points, index);
            if neighbors.len() < self.min_points {
                labels[index] = Some(Label::Noise);
                continue;
            }

            current += 1;
            labels[index] = Some(Label::Cluster(current));
            frontier.extend(neighbors);

            while let Some(next) = frontier.pop_front() {
                match labels[next] {
                    // Border point reached from a core point: promote, don't expand
                    Some(Label::Noise) => {
                        labels[next] = Some(Label::Cluster(current));
                        continue;
                    }
                    // First writer wins
                    Some(Label::Cluster(_)) => continue,
                    None => {}
                }

                labels[next] = Some(Label::Cluster(current));
                let next_neighbors = self.finder.neighbors(points, next);
                if next_neighbors.len() >= self.min_points {
                    frontier.extend(
                        next_neighbors
                            .into_iter()
                            .filter(|n| !matches!(labels[*n], Some(Label::Cluster(_)))),
                    );
                }
            }

            debug!(
                "[Dbscan] Cluster {} seeded by point {}",
                current, points[index].id
            );
        }

        DbscanResult {
            labels: labels
                .into_iter()
                .map(|label| label.unwrap_or(Label::Noise))
                .collect(),
            cluster_count: current,
        }
    }
}
