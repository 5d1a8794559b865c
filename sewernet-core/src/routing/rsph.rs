//! Repeated shortest path heuristic for the sewer tree
//!
//! Starting from the sinks, the tree grows one terminal at a time: in each
//! round the terminal closest to any tree node is linked along its shortest
//! path and the interior nodes of that path join the tree. The result is a
//! greedy approximation of the Steiner tree over all buildings.
//!
//! Shortest paths are computed once per terminal, so the cost grows with
//! `terminals x (E + V log V)`.

use std::borrow::Cow;

use hashbrown::HashSet;
use log::{info, warn};

use super::dijkstra::{ShortestPaths, dijkstra_paths};
use crate::model::{ConnectionGraph, NodeKey, SewerEdge, SewerGraph};
use crate::{Error, Result};

struct Candidate {
    terminal: usize,
    target: NodeKey,
    distance: f64,
}

/// Connects every building of `graph`, except those in `skip_nodes`, to a
/// tree grown from `sinks`.
///
/// The returned graph holds every node of `graph` and only the routed
/// edges. On a disconnected graph routing is restricted to the largest
/// component. Terminals that cannot reach the tree are skipped with a
/// warning; if terminals exist but none can be connected the result is
/// [`Error::NoViableTerminal`].
///
/// Terminals are processed in coordinate order and tree nodes in the order
/// they joined the tree, so ties resolve to the smallest terminal and the
/// oldest tree node.
pub fn rsph_tree(graph: &ConnectionGraph, sinks: &[NodeKey], skip_nodes: &[NodeKey]) -> Result<SewerGraph> {
    for sink in sinks {
        if !graph.contains(sink) {
            return Err(Error::SinkNotFound(*sink));
        }
    }

    let mut sewer: SewerGraph = graph.empty_copy();
    let skip: HashSet<NodeKey> = skip_nodes.iter().copied().collect();
    let mut terminals: Vec<NodeKey> = graph
        .buildings()
        .into_iter()
        .filter(|key| !skip.contains(key))
        .collect();

    let components = graph.weakly_connected_components();
    let routing: Cow<'_, ConnectionGraph> = if components.len() > 1 {
        warn!(
            "Connection graph has {} components, routing on the largest with {} nodes",
            components.len(),
            components[0].len()
        );
        Cow::Owned(graph.subgraph(&components[0]))
    } else {
        Cow::Borrowed(graph)
    };
    let routing = routing.as_ref();

    let before = terminals.len();
    terminals.retain(|key| routing.contains(key));
    if terminals.len() < before {
        warn!(
            "Dropped {} terminals outside the largest component",
            before - terminals.len()
        );
    }

    let mut tree_nodes: Vec<NodeKey> = Vec::new();
    for sink in sinks {
        if routing.contains(sink) && !tree_nodes.contains(sink) {
            tree_nodes.push(*sink);
        } else if !routing.contains(sink) {
            warn!("Sink {sink} lies outside the largest component");
        }
    }
    let mut in_tree: HashSet<NodeKey> = tree_nodes.iter().copied().collect();

    if terminals.is_empty() {
        warn!("No terminals to route");
        return Ok(sewer);
    }

    info!(
        "Routing {} terminals to {} sinks",
        terminals.len(),
        tree_nodes.len()
    );

    let paths: Vec<ShortestPaths> = terminals
        .iter()
        .map(|key| {
            let start = routing.index_of(key).ok_or(Error::NodeNotFound(*key))?;
            Ok(dijkstra_paths(routing, start, |edge| edge.weight))
        })
        .collect::<Result<_>>()?;
    let mut remaining: Vec<usize> = (0..terminals.len()).collect();
    let mut connected = 0usize;

    while !remaining.is_empty() {
        let mut best: Option<Candidate> = None;
        let mut unreachable: Vec<usize> = Vec::new();

        for &terminal in &remaining {
            let closest = tree_nodes
                .iter()
                .filter_map(|node| {
                    let idx = routing.index_of(node)?;
                    paths[terminal].distance(idx).map(|d| (*node, d))
                })
                .fold(None, |acc: Option<(NodeKey, f64)>, (node, d)| match acc {
                    Some((_, best_d)) if best_d <= d => acc,
                    _ => Some((node, d)),
                });
            match closest {
                Some((target, distance)) => {
                    if best.as_ref().is_none_or(|b| distance < b.distance) {
                        best = Some(Candidate {
                            terminal,
                            target,
                            distance,
                        });
                    }
                }
                None => unreachable.push(terminal),
            }
        }

        for terminal in &unreachable {
            warn!("Terminal {} has no path to the sewer tree, skipped", terminals[*terminal]);
        }
        remaining.retain(|t| !unreachable.contains(t));

        let Some(candidate) = best else {
            break;
        };
        let target = routing
            .index_of(&candidate.target)
            .ok_or(Error::NodeNotFound(candidate.target))?;
        let edges = paths[candidate.terminal]
            .edge_path(routing, target)
            .ok_or(Error::NodeNotFound(candidate.target))?;

        let path_len = edges.len();
        for (i, e) in edges.into_iter().enumerate() {
            let (from, to) = routing
                .edge_endpoints(e)
                .ok_or_else(|| Error::InvalidData("routed edge vanished".to_string()))?;
            if let Some(edge) = routing.edge(e) {
                sewer.set_edge(from, to, SewerEdge::from(edge));
            }
            // The terminal and the tree node reached are not interior.
            if i + 1 < path_len && in_tree.insert(to) {
                tree_nodes.push(to);
            }
        }

        remaining.retain(|t| *t != candidate.terminal);
        connected += 1;
    }

    if connected == 0 {
        return Err(Error::NoViableTerminal {
            tree_nodes: tree_nodes.len(),
            remaining: terminals.len(),
        });
    }
    info!(
        "Connected {connected} of {} terminals with {} sewer edges",
        terminals.len(),
        sewer.edge_count()
    );
    Ok(sewer)
}
