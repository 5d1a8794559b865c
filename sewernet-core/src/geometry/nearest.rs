//! Nearest-neighbour queries backed by `rstar`

use geo::{Coord, LineString};
use rstar::{PointDistance, RTree, primitives::{GeomWithData, Line}};

use super::{coord_distance, is_finite, project_on_segment};
use crate::model::{NodeKey, RoadGraph};

type IndexedSegment = GeomWithData<Line<[f64; 2]>, (NodeKey, NodeKey)>;

/// Closest edge found for a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Endpoints of the graph edge owning the segment
    pub edge: (NodeKey, NodeKey),
    /// Perpendicular foot of the query point on the segment
    pub projection: Coord<f64>,
    pub distance: f64,
}

/// Spatial index over the segments of every road edge, each segment
/// pointing back to the edge it belongs to.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    tree: RTree<IndexedSegment>,
}

impl SegmentIndex {
    /// Indexes all edges of `graph` except private sewer links.
    pub fn from_graph(graph: &RoadGraph) -> Self {
        let segments = graph
            .edges()
            .filter(|(_, _, edge)| !edge.private_sewer)
            .flat_map(|(a, b, edge)| segments_of(&edge.geometry, (a, b)))
            .collect();
        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn insert_edge(&mut self, a: NodeKey, b: NodeKey, geometry: &LineString<f64>) {
        for segment in segments_of(geometry, (a, b)) {
            self.tree.insert(segment);
        }
    }

    pub fn remove_edge(&mut self, a: NodeKey, b: NodeKey, geometry: &LineString<f64>) {
        for segment in segments_of(geometry, (a, b)) {
            self.tree.remove(&segment);
        }
    }

    /// Closest indexed edge to `point`; `None` for an empty index or a
    /// non-finite query.
    pub fn nearest(&self, point: Coord<f64>) -> Option<SegmentHit> {
        if !is_finite(point) {
            return None;
        }
        let query = [point.x, point.y];
        let segment = self.tree.nearest_neighbor(&query)?;
        let line = segment.geom();
        let projection = project_on_segment(
            point,
            Coord {
                x: line.from[0],
                y: line.from[1],
            },
            Coord {
                x: line.to[0],
                y: line.to[1],
            },
        );
        Some(SegmentHit {
            edge: segment.data,
            projection,
            distance: segment.distance_2(&query).sqrt(),
        })
    }
}

fn segments_of(
    geometry: &LineString<f64>,
    edge: (NodeKey, NodeKey),
) -> impl Iterator<Item = IndexedSegment> + '_ {
    geometry.lines().map(move |line| {
        GeomWithData::new(
            Line::new([line.start.x, line.start.y], [line.end.x, line.end.y]),
            edge,
        )
    })
}

/// Closest pair of points between two point sets, with their distance.
///
/// Non-finite coordinates are ignored; `None` when either side has no
/// usable point.
pub fn nearest_between(
    from: &[Coord<f64>],
    to: &[Coord<f64>],
) -> Option<(Coord<f64>, Coord<f64>, f64)> {
    let targets: Vec<[f64; 2]> = to
        .iter()
        .filter(|c| is_finite(**c))
        .map(|c| [c.x, c.y])
        .collect();
    let tree = RTree::bulk_load(targets);

    from.iter()
        .filter(|c| is_finite(**c))
        .filter_map(|c| {
            let hit = tree.nearest_neighbor(&[c.x, c.y])?;
            let target = Coord { x: hit[0], y: hit[1] };
            Some((*c, target, coord_distance(*c, target)))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2))
}
