//! Grouping of buildings that are too far from any road

use geo::Coord;
use petgraph::unionfind::UnionFind;
use rstar::{RTree, primitives::GeomWithData};

use crate::geometry::is_finite;

/// Produces representative points for groups of remote buildings.
pub trait BuildingClusterer {
    /// Centers of the groups found among `points`, where points closer than
    /// `threshold` belong to the same group.
    fn cluster_centers(&self, points: &[Coord<f64>], threshold: f64) -> Vec<Coord<f64>>;
}

/// Single-linkage agglomeration cut at the distance threshold.
///
/// Only groups of two or more buildings yield a center; a lone remote
/// building is connected to the road network directly.
#[derive(Debug, Clone, Copy)]
pub struct AgglomerativeClusterer {
    pub min_cluster_size: usize,
}

impl Default for AgglomerativeClusterer {
    fn default() -> Self {
        Self { min_cluster_size: 2 }
    }
}

impl BuildingClusterer for AgglomerativeClusterer {
    fn cluster_centers(&self, points: &[Coord<f64>], threshold: f64) -> Vec<Coord<f64>> {
        let points: Vec<Coord<f64>> = points.iter().copied().filter(|c| is_finite(*c)).collect();
        if points.is_empty() {
            return Vec::new();
        }

        let tree = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(i, c)| GeomWithData::new([c.x, c.y], i))
                .collect(),
        );
        let mut clusters = UnionFind::<usize>::new(points.len());
        let max_distance_2 = threshold * threshold;
        for (i, c) in points.iter().enumerate() {
            for neighbor in tree.locate_within_distance([c.x, c.y], max_distance_2) {
                if neighbor.data != i {
                    clusters.union(i, neighbor.data);
                }
            }
        }

        // Groups keep the order of their first member.
        let mut roots: Vec<usize> = Vec::new();
        let mut members: Vec<Vec<Coord<f64>>> = Vec::new();
        for (i, c) in points.iter().enumerate() {
            let root = clusters.find_mut(i);
            let slot = match roots.iter().position(|r| *r == root) {
                Some(slot) => slot,
                None => {
                    roots.push(root);
                    members.push(Vec::new());
                    members.len() - 1
                }
            };
            members[slot].push(*c);
        }

        members
            .into_iter()
            .filter(|group| group.len() >= self.min_cluster_size.max(1))
            .map(|group| {
                let n = group.len() as f64;
                let sum = group
                    .iter()
                    .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| acc + *c);
                Coord {
                    x: sum.x / n,
                    y: sum.y / n,
                }
            })
            .collect()
    }
}
