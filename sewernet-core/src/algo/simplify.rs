//! Topological simplification of the road graph
//!
//! Chains of pass-through nodes between two essential nodes are merged into
//! one edge carrying the concatenated geometry.

use geo::{Coord, LineString};
use hashbrown::{HashMap, HashSet};
use log::info;
use serde_json::{Map, Value};

use crate::model::{NodeKey, RoadEdge, RoadGraph};
use crate::{Error, Result};

/// Nodes that must survive simplification.
///
/// A node is essential unless it has exactly two incident edges. Splice
/// points, typed nodes (buildings, cluster centers, sinks) and road dead
/// ends are always essential.
pub fn essential_nodes(graph: &RoadGraph) -> HashSet<NodeKey> {
    graph
        .nodes()
        .filter(|node| {
            let degree = graph.degree(&node.key);
            let pass_through = degree == 2 && !node.connection_node;
            let dead_end = node.road_network && degree == 1;
            !pass_through || dead_end || node.node_type.is_typed()
        })
        .map(|node| node.key)
        .collect()
}

/// Walks from `endpoint` through `successor` until the next essential node.
///
/// The returned path starts at `endpoint`. It ends at an essential node,
/// back at `endpoint` for a loop, or at the last node reached when the
/// chain stops short of one.
fn build_path(
    graph: &RoadGraph,
    endpoint: NodeKey,
    successor: NodeKey,
    essential: &HashSet<NodeKey>,
) -> Result<Vec<NodeKey>> {
    let mut path = vec![endpoint, successor];
    let mut on_path: HashSet<NodeKey> = HashSet::from([endpoint, successor]);

    let Some(next) = graph
        .neighbors(&successor)
        .into_iter()
        .find(|n| !on_path.contains(n))
    else {
        return Ok(path);
    };
    path.push(next);
    on_path.insert(next);
    let mut current = next;

    while !essential.contains(&current) {
        let successors: Vec<NodeKey> = graph
            .neighbors(&current)
            .into_iter()
            .filter(|n| !on_path.contains(n))
            .collect();
        match successors.as_slice() {
            [only] => {
                current = *only;
                path.push(current);
                on_path.insert(current);
            }
            [] => {
                if graph.neighbors(&current).contains(&endpoint) {
                    path.push(endpoint);
                }
                return Ok(path);
            }
            _ => return Err(Error::MalformedTopology(current)),
        }
    }
    Ok(path)
}

/// Merges the edges along `path` into a single edge.
///
/// Geometries are concatenated in path order and lengths summed. Each
/// attribute keeps its value if all edges agree, otherwise the list of
/// distinct values; a `length` attribute is summed instead.
fn merge_path(graph: &RoadGraph, path: &[NodeKey]) -> Result<RoadEdge> {
    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut length = 0.0;
    let mut all_private = true;
    let mut road_network = false;
    let mut values: HashMap<String, Vec<Value>> = HashMap::new();
    let mut length_attribute: Option<f64> = None;

    for pair in path.windows(2) {
        let (u, v) = (pair[0], pair[1]);
        let edge = graph
            .edges_between(&u, &v)
            .into_iter()
            .find_map(|e| graph.edge(e))
            .ok_or(Error::MalformedTopology(u))?;

        let segment = edge.oriented_from(u);
        let skip = usize::from(!coords.is_empty());
        coords.extend(segment.0.into_iter().skip(skip));
        length += edge.length;
        all_private &= edge.private_sewer;
        road_network |= edge.road_network;

        for (key, value) in &edge.attributes {
            if key == "length" {
                *length_attribute.get_or_insert(0.0) += value.as_f64().unwrap_or(0.0);
                continue;
            }
            let distinct = values.entry(key.clone()).or_default();
            if !distinct.contains(value) {
                distinct.push(value.clone());
            }
        }
    }

    let mut attributes: Map<String, Value> = values
        .into_iter()
        .map(|(key, mut distinct)| {
            let value = if distinct.len() == 1 {
                distinct.remove(0)
            } else {
                Value::Array(distinct)
            };
            (key, value)
        })
        .collect();
    if let Some(total) = length_attribute {
        attributes.insert("length".to_string(), Value::from(total));
    }

    Ok(RoadEdge {
        geometry: LineString::new(coords),
        length,
        attributes,
        private_sewer: all_private,
        road_network,
    })
}

/// Collapses every chain of pass-through nodes into a single edge.
///
/// Parallel chains between the same pair of essential nodes become
/// parallel edges. A node with more than one unvisited successor inside a
/// chain is a `MalformedTopology` error.
pub fn simplify_graph(graph: &RoadGraph) -> Result<RoadGraph> {
    let essential = essential_nodes(graph);
    let mut claimed: HashSet<NodeKey> = HashSet::new();
    let mut paths: Vec<Vec<NodeKey>> = Vec::new();

    for endpoint in graph.keys().filter(|k| essential.contains(k)) {
        for successor in graph.neighbors(&endpoint) {
            if essential.contains(&successor) || claimed.contains(&successor) {
                continue;
            }
            let path = build_path(graph, endpoint, successor, &essential)?;
            claimed.extend(path[1..path.len() - 1].iter().copied());
            paths.push(path);
        }
    }

    let mut simplified = graph.clone();
    for path in &paths {
        let merged = merge_path(graph, path)?;
        if let (Some(first), Some(last)) = (path.first(), path.last()) {
            simplified.add_edge(*first, *last, merged);
        }
    }
    for key in &claimed {
        simplified.remove_node(key);
    }

    info!(
        "Simplified graph from {} to {} nodes and from {} to {} edges",
        graph.node_count(),
        simplified.node_count(),
        graph.edge_count(),
        simplified.edge_count()
    );
    Ok(simplified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;
    use geo::line_string;
    use serde_json::json;

    fn key(x: f64, y: f64) -> NodeKey {
        NodeKey::new(x, y).unwrap()
    }

    fn road(graph: &mut RoadGraph, a: (f64, f64), b: (f64, f64), name: &str) {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!(name));
        attributes.insert("length".to_string(), json!(key(a.0, a.1).distance(&key(b.0, b.1))));
        let geometry = line_string![(x: a.0, y: a.1), (x: b.0, y: b.1)];
        graph.set_edge(key(a.0, a.1), key(b.0, b.1), RoadEdge::new(geometry, attributes));
        for node in graph.nodes_mut() {
            node.road_network = true;
        }
    }

    #[test]
    fn test_chain_is_collapsed() {
        let mut graph = RoadGraph::new();
        road(&mut graph, (0.0, 0.0), (10.0, 0.0), "a");
        road(&mut graph, (10.0, 0.0), (20.0, 5.0), "a");
        road(&mut graph, (20.0, 5.0), (30.0, 5.0), "b");

        let simplified = simplify_graph(&graph).unwrap();
        assert_eq!(simplified.node_count(), 2);
        assert_eq!(simplified.edge_count(), 1);

        let (_, _, edge) = simplified.edges().next().unwrap();
        let expected: f64 = graph.edges().map(|(_, _, e)| e.length).sum();
        assert!((edge.length - expected).abs() < 1e-9);
        assert_eq!(edge.geometry.0.len(), 4);
        assert_eq!(edge.attributes["name"], json!(["a", "b"]));
        assert!((edge.attributes["length"].as_f64().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_identical_attributes_stay_scalar() {
        let mut graph = RoadGraph::new();
        road(&mut graph, (0.0, 0.0), (10.0, 0.0), "a");
        road(&mut graph, (10.0, 0.0), (20.0, 0.0), "a");
        let simplified = simplify_graph(&graph).unwrap();
        let (_, _, edge) = simplified.edges().next().unwrap();
        assert_eq!(edge.attributes["name"], json!("a"));
    }

    #[test]
    fn test_connection_nodes_survive() {
        let mut graph = RoadGraph::new();
        road(&mut graph, (0.0, 0.0), (10.0, 0.0), "a");
        road(&mut graph, (10.0, 0.0), (20.0, 0.0), "a");
        road(&mut graph, (20.0, 0.0), (30.0, 0.0), "a");
        graph.node_mut(&key(10.0, 0.0)).unwrap().connection_node = true;

        let simplified = simplify_graph(&graph).unwrap();
        assert!(simplified.contains(&key(10.0, 0.0)));
        assert!(!simplified.contains(&key(20.0, 0.0)));
        assert_eq!(simplified.edge_count(), 2);
    }

    #[test]
    fn test_typed_nodes_survive() {
        let mut graph = RoadGraph::new();
        road(&mut graph, (0.0, 0.0), (10.0, 0.0), "a");
        road(&mut graph, (10.0, 0.0), (20.0, 0.0), "a");
        graph.node_mut(&key(10.0, 0.0)).unwrap().node_type = NodeType::ClusterCenter;
        let simplified = simplify_graph(&graph).unwrap();
        assert_eq!(simplified.node_count(), 3);
    }

    #[test]
    fn test_parallel_chains_become_parallel_edges() {
        // Two routes between the junctions (0,0) and (20,0).
        let mut graph = RoadGraph::new();
        road(&mut graph, (-10.0, 0.0), (0.0, 0.0), "west");
        road(&mut graph, (0.0, 0.0), (10.0, 10.0), "north");
        road(&mut graph, (10.0, 10.0), (20.0, 0.0), "north");
        road(&mut graph, (0.0, 0.0), (10.0, -10.0), "south");
        road(&mut graph, (10.0, -10.0), (20.0, 0.0), "south");
        road(&mut graph, (20.0, 0.0), (30.0, 0.0), "east");

        let simplified = simplify_graph(&graph).unwrap();
        assert_eq!(simplified.node_count(), 4);
        assert_eq!(simplified.edges_between(&key(0.0, 0.0), &key(20.0, 0.0)).len(), 2);
    }

    #[test]
    fn test_loop_returns_to_endpoint() {
        let mut graph = RoadGraph::new();
        road(&mut graph, (-10.0, 0.0), (0.0, 0.0), "stem");
        road(&mut graph, (0.0, 0.0), (10.0, 0.0), "ring");
        road(&mut graph, (10.0, 0.0), (10.0, 10.0), "ring");
        road(&mut graph, (10.0, 10.0), (0.0, 0.0), "ring");

        let simplified = simplify_graph(&graph).unwrap();
        assert_eq!(simplified.node_count(), 2);
        let ring = simplified.edges_between(&key(0.0, 0.0), &key(0.0, 0.0));
        assert_eq!(ring.len(), 1);
        let edge = simplified.edge(ring[0]).unwrap();
        assert!((edge.length - (20.0 + 200f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn test_essential_nodes() {
        let mut graph = RoadGraph::new();
        road(&mut graph, (0.0, 0.0), (10.0, 0.0), "a");
        road(&mut graph, (10.0, 0.0), (20.0, 0.0), "a");
        road(&mut graph, (10.0, 0.0), (10.0, 10.0), "b");
        road(&mut graph, (20.0, 0.0), (30.0, 0.0), "a");
        let essential = essential_nodes(&graph);
        assert!(essential.contains(&key(0.0, 0.0)));
        assert!(essential.contains(&key(10.0, 0.0)));
        assert!(!essential.contains(&key(20.0, 0.0)));
        assert!(essential.contains(&key(10.0, 10.0)));
    }
}
