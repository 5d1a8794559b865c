//! Unsimplified road graph and component bridging

use geo::{Geometry, LineString};
use itertools::Itertools;
use log::{info, warn};
use serde_json::{Map, Value};

use crate::geometry::{line_parts, nearest_between};
use crate::model::{NodeKey, RoadEdge, RoadGraph};
use crate::{Error, Result};

/// Line feature with its non-geometry attributes.
#[derive(Debug, Clone)]
pub struct RoadFeature {
    pub geometry: Geometry<f64>,
    pub attributes: Map<String, Value>,
}

impl RoadFeature {
    pub fn new(geometry: Geometry<f64>, attributes: Map<String, Value>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }
}

/// Builds an undirected graph with one node per vertex and one edge per
/// segment of every input line.
///
/// A segment repeated between the same two vertices overwrites the
/// earlier record. Every node is tagged as part of the road network.
pub fn create_unsimplified_graph(features: &[RoadFeature]) -> Result<RoadGraph> {
    let mut graph = RoadGraph::new();

    for (i, feature) in features.iter().enumerate() {
        let parts = line_parts(&feature.geometry)
            .map_err(|e| Error::InvalidGeometry(format!("road feature {i}: {e}")))?;
        for part in parts {
            for (start, end) in part.coords().copied().tuple_windows() {
                let a = NodeKey::try_from(start)?;
                let b = NodeKey::try_from(end)?;
                if a == b {
                    continue;
                }
                let geometry = LineString::new(vec![a.coord(), b.coord()]);
                graph.set_edge(a, b, RoadEdge::new(geometry, feature.attributes.clone()));
            }
        }
    }

    for node in graph.nodes_mut() {
        node.road_network = true;
    }

    info!(
        "Created unsimplified graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Joins disjoint components with straight bridge edges until the graph
/// is connected. Returns the number of bridges added.
///
/// Each round links the smallest component to the closest node of all
/// others, so the total bridge length is not minimal for three or more
/// components.
pub fn connect_subgraphs(graph: &mut RoadGraph) -> usize {
    let mut bridges = 0;
    loop {
        let components = graph.weakly_connected_components();
        let Some((component, rest)) = components.split_last() else {
            break;
        };
        if rest.is_empty() {
            break;
        }

        let from: Vec<_> = component.iter().map(NodeKey::coord).collect();
        let to: Vec<_> = rest.iter().flatten().map(NodeKey::coord).collect();
        let Some((a, b, distance)) = nearest_between(&from, &to) else {
            warn!(
                "Skipped bridging of a component with {} nodes, no usable coordinates",
                component.len()
            );
            break;
        };

        // Both ends come from existing node keys.
        let (Ok(a), Ok(b)) = (NodeKey::try_from(a), NodeKey::try_from(b)) else {
            warn!("Skipped bridging between non-finite coordinates");
            break;
        };
        let mut edge = RoadEdge::new(LineString::new(vec![a.coord(), b.coord()]), Map::new());
        edge.road_network = true;
        graph.add_edge(a, b, edge);
        bridges += 1;
        log::debug!("Bridged {a} and {b} over {distance:.2} m");
    }

    if bridges > 0 {
        info!("Connected road graph with {bridges} bridge edges");
    }
    bridges
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, MultiLineString};
    use serde_json::json;

    fn feature(geometry: Geometry<f64>, name: &str) -> RoadFeature {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!(name));
        RoadFeature::new(geometry, attributes)
    }

    #[test]
    fn test_one_edge_per_segment() {
        let roads = vec![
            feature(
                line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 20.0, y: 0.0)].into(),
                "main",
            ),
            feature(line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0)].into(), "side"),
        ];
        let graph = create_unsimplified_graph(&roads).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.nodes().all(|n| n.road_network));

        let junction = NodeKey::new(10.0, 0.0).unwrap();
        assert_eq!(graph.degree(&junction), 3);
    }

    #[test]
    fn test_duplicate_segment_overwrites() {
        let roads = vec![
            feature(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(), "first"),
            feature(line_string![(x: 10.0, y: 0.0), (x: 0.0, y: 0.0)].into(), "second"),
        ];
        let graph = create_unsimplified_graph(&roads).unwrap();
        assert_eq!(graph.edge_count(), 1);
        let (_, _, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.attributes["name"], json!("second"));
    }

    #[test]
    fn test_multipart_lines_are_split() {
        let multi = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)],
            line_string![(x: 50.0, y: 0.0), (x: 55.0, y: 0.0)],
        ]);
        let graph = create_unsimplified_graph(&[feature(multi.into(), "split")]).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.weakly_connected_components().len(), 2);
    }

    #[test]
    fn test_rejects_non_line_geometry() {
        let result = create_unsimplified_graph(&[feature(point!(x: 1.0, y: 1.0).into(), "p")]);
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn test_bridging_connects_all_components() {
        let roads = vec![
            feature(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(), "a"),
            feature(line_string![(x: 20.0, y: 0.0), (x: 30.0, y: 0.0)].into(), "b"),
            feature(line_string![(x: 10.0, y: 50.0), (x: 10.0, y: 60.0)].into(), "c"),
        ];
        let mut graph = create_unsimplified_graph(&roads).unwrap();
        assert_eq!(connect_subgraphs(&mut graph), 2);
        assert_eq!(graph.weakly_connected_components().len(), 1);

        let bridges: Vec<_> = graph.edges().filter(|(_, _, e)| e.road_network).collect();
        assert_eq!(bridges.len(), 2);
        assert!(bridges.iter().any(|(a, b, e)| {
            let ends = [*a, *b];
            ends.contains(&NodeKey::new(10.0, 0.0).unwrap())
                && ends.contains(&NodeKey::new(20.0, 0.0).unwrap())
                && (e.length - 10.0).abs() < 1e-9
        }));
    }

    #[test]
    fn test_bridging_connected_graph_is_noop() {
        let roads = vec![feature(
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(),
            "a",
        )];
        let mut graph = create_unsimplified_graph(&roads).unwrap();
        assert_eq!(connect_subgraphs(&mut graph), 0);
        assert_eq!(connect_subgraphs(&mut RoadGraph::new()), 0);
    }
}
