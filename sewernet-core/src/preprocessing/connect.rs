//! Attaching buildings, cluster centers and sinks to the road graph

use geo::{Coord, Geometry, LineString};
use log::{debug, info, warn};
use rstar::{RTree, primitives::GeomWithData};
use serde_json::{Map, Value};

use super::clustering::BuildingClusterer;
use crate::config::{Clustering, PreprocessingConfig};
use crate::geometry::{
    SegmentHit, SegmentIndex, coord_distance, representative_point, split_line_at,
};
use crate::model::{NodeKey, NodeType, RoadEdge, RoadGraph};
use crate::{Error, Result};

/// Building footprint or point with its attributes.
#[derive(Debug, Clone)]
pub struct Building {
    pub geometry: Geometry<f64>,
    pub attributes: Map<String, Value>,
}

impl Building {
    pub fn new(geometry: Geometry<f64>, attributes: Map<String, Value>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }
}

/// Splices nodes into the nearest road edge, keeping a segment index in
/// step with every split.
pub struct BuildingConnector<'a> {
    graph: &'a mut RoadGraph,
    index: SegmentIndex,
    add_private_sewer: bool,
}

impl<'a> BuildingConnector<'a> {
    pub fn new(graph: &'a mut RoadGraph, add_private_sewer: bool) -> Self {
        let index = SegmentIndex::from_graph(graph);
        Self {
            graph,
            index,
            add_private_sewer,
        }
    }

    /// Distance from `point` to the closest road edge.
    pub fn distance_to_roads(&self, point: Coord<f64>) -> Option<f64> {
        self.index.nearest(point).map(|hit| hit.distance)
    }

    /// Adds a node of `node_type` at `point` and links it to the closest
    /// road edge. Returns the key of the added node, `None` when no edge
    /// can be found.
    pub fn attach_to_roads(
        &mut self,
        point: Coord<f64>,
        node_type: NodeType,
        attributes: Map<String, Value>,
    ) -> Result<Option<NodeKey>> {
        let Some(hit) = self.index.nearest(point) else {
            warn!("No road edge found near ({}, {}), node skipped", point.x, point.y);
            return Ok(None);
        };
        let key = NodeKey::try_from(point)?;

        if !self.add_private_sewer && node_type == NodeType::Building {
            let splice = self.split_edge(&hit)?;
            self.tag(splice, node_type, attributes)?;
            return Ok(Some(splice));
        }

        self.graph.ensure_node(key);
        self.tag(key, node_type, attributes)?;
        let splice = self.split_edge(&hit)?;
        if splice != key {
            let geometry = LineString::new(vec![key.coord(), splice.coord()]);
            let edge = if node_type == NodeType::Building {
                RoadEdge::private_sewer(geometry)
            } else {
                RoadEdge::new(geometry, Map::new())
            };
            self.graph.add_edge(key, splice, edge);
        }
        Ok(Some(key))
    }

    /// Adds a building at `point` linked to the cluster center `center`.
    pub fn attach_to_center(
        &mut self,
        point: Coord<f64>,
        center: NodeKey,
        attributes: Map<String, Value>,
    ) -> Result<NodeKey> {
        let key = NodeKey::try_from(point)?;
        self.graph.ensure_node(key);
        self.tag(key, NodeType::Building, attributes)?;
        if key != center {
            let geometry = LineString::new(vec![key.coord(), center.coord()]);
            self.graph
                .add_edge(key, center, RoadEdge::private_sewer(geometry));
        }
        Ok(key)
    }

    fn tag(&mut self, key: NodeKey, node_type: NodeType, attributes: Map<String, Value>) -> Result<()> {
        let node = self.graph.node_mut(&key).ok_or(Error::NodeNotFound(key))?;
        node.node_type = node_type;
        node.attributes.extend(attributes);
        Ok(())
    }

    /// Splits the edge of `hit` at its projection point and returns the
    /// splice node. A projection onto an edge end reuses that end.
    fn split_edge(&mut self, hit: &SegmentHit) -> Result<NodeKey> {
        let (u, v) = hit.edge;
        let splice = NodeKey::try_from(hit.projection)?;
        if splice == u || splice == v {
            if let Some(node) = self.graph.node_mut(&splice) {
                node.connection_node = true;
            }
            return Ok(splice);
        }

        let Some(edge_id) = self
            .graph
            .edges_between(&u, &v)
            .into_iter()
            .find(|e| self.graph.edge(*e).is_some_and(|edge| !edge.private_sewer))
        else {
            return Err(Error::InvalidData(format!(
                "indexed edge {u} -> {v} is missing from the road graph"
            )));
        };
        let edge = self
            .graph
            .remove_edge(edge_id)
            .ok_or_else(|| Error::InvalidData(format!("edge {u} -> {v} vanished during split")))?;

        let oriented = edge.oriented_from(u);
        self.index.remove_edge(u, v, &edge.geometry);
        let (head, tail) = split_line_at(&oriented, splice.coord());

        let mut first = RoadEdge::new(head, edge.attributes.clone());
        first.road_network = edge.road_network;
        let mut second = RoadEdge::new(tail, edge.attributes);
        second.road_network = edge.road_network;

        self.index.insert_edge(u, splice, &first.geometry);
        self.index.insert_edge(splice, v, &second.geometry);
        self.graph.add_edge(u, splice, first);
        self.graph.add_edge(splice, v, second);
        if let Some(node) = self.graph.node_mut(&splice) {
            node.connection_node = true;
        }
        debug!("Split edge {u} -> {v} at {splice}");
        Ok(splice)
    }
}

/// Connects every building to the road graph.
///
/// With clustering enabled, buildings farther than
/// `max_connection_length` from any road are grouped first. Each center
/// is spliced into the road network, closest to the roads first, and a
/// building whose nearest center is closer than its nearest road links
/// to that center instead. Returns the keys of the connected buildings.
pub fn connect_buildings(
    graph: &mut RoadGraph,
    buildings: &[Building],
    config: &PreprocessingConfig,
    clusterer: &dyn BuildingClusterer,
) -> Result<Vec<NodeKey>> {
    let mut points = Vec::with_capacity(buildings.len());
    for (i, building) in buildings.iter().enumerate() {
        let point = representative_point(&building.geometry)
            .map_err(|e| Error::InvalidGeometry(format!("building {i}: {e}")))?;
        match point {
            Some(point) => points.push((point.0, building.attributes.clone())),
            None => warn!("Skipped building {i} with empty or non-finite geometry"),
        }
    }

    let mut connector = BuildingConnector::new(graph, config.add_private_sewer);
    if connector.index.is_empty() {
        warn!("Road graph has no edges, {} buildings left unconnected", points.len());
        return Ok(Vec::new());
    }

    let mut centers: Vec<NodeKey> = Vec::new();
    if config.clustering == Clustering::Centers {
        let remote: Vec<Coord<f64>> = points
            .iter()
            .map(|(c, _)| *c)
            .filter(|c| {
                connector
                    .distance_to_roads(*c)
                    .is_some_and(|d| d > config.max_connection_length)
            })
            .collect();

        let mut raw = clusterer.cluster_centers(&remote, config.max_connection_length);
        raw.sort_by(|a, b| {
            let da = connector.distance_to_roads(*a).unwrap_or(f64::INFINITY);
            let db = connector.distance_to_roads(*b).unwrap_or(f64::INFINITY);
            da.total_cmp(&db)
        });
        for center in raw {
            if let Some(key) = connector.attach_to_roads(center, NodeType::ClusterCenter, Map::new())? {
                centers.push(key);
            }
        }
        if !centers.is_empty() {
            info!("Connected {} cluster centers for {} remote buildings", centers.len(), remote.len());
        }
    }

    let center_tree = RTree::bulk_load(
        centers
            .iter()
            .map(|key| GeomWithData::new([key.x(), key.y()], *key))
            .collect(),
    );

    let mut connected = Vec::with_capacity(points.len());
    for (point, attributes) in points {
        let road_distance = connector.distance_to_roads(point).unwrap_or(f64::INFINITY);
        let closer_center = center_tree
            .nearest_neighbor(&[point.x, point.y])
            .map(|center| center.data)
            .filter(|center| coord_distance(center.coord(), point) < road_distance);

        let key = match closer_center {
            Some(center) => Some(connector.attach_to_center(point, center, attributes)?),
            None => connector.attach_to_roads(point, NodeType::Building, attributes)?,
        };
        connected.extend(key);
    }

    info!("Connected {} buildings to the road graph", connected.len());
    Ok(connected)
}
