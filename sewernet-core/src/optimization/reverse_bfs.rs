//! Edge order of the hydraulic pass

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use petgraph::{
    Direction,
    graph::EdgeIndex,
    visit::{EdgeIndexable, EdgeRef, NodeIndexable},
};

use crate::model::{NodeKey, SewerGraph};

/// Edges draining into `sink`, ordered from the leaves towards the sink.
///
/// Edges are discovered breadth-first against their direction starting at
/// the sink, and the discovery order is reversed. On a tree this places
/// every edge after all edges feeding its upstream node. Incoming edges of
/// a node are visited in coordinate order of their source. With
/// `include_private_sewer` unset, private building links are left out.
pub fn reverse_bfs(graph: &SewerGraph, sink: &NodeKey, include_private_sewer: bool) -> Vec<EdgeIndex> {
    let Some(start) = graph.index_of(sink) else {
        return Vec::new();
    };
    let inner = &graph.graph;
    let mut seen_nodes = FixedBitSet::with_capacity(inner.node_bound());
    let mut seen_edges = FixedBitSet::with_capacity(inner.edge_bound());
    let mut queue = VecDeque::from([start]);
    let mut order = Vec::new();
    seen_nodes.insert(start.index());

    while let Some(node) = queue.pop_front() {
        let mut incoming: Vec<_> = inner
            .edges_directed(node, Direction::Incoming)
            .filter(|e| include_private_sewer || !e.weight().private_sewer)
            .collect();
        incoming.sort_by(|a, b| inner[a.source()].key.cmp(&inner[b.source()].key));

        for edge in incoming {
            if seen_edges.put(edge.id().index()) {
                continue;
            }
            order.push(edge.id());
            if !seen_nodes.put(edge.source().index()) {
                queue.push_back(edge.source());
            }
        }
    }

    order.reverse();
    order
}
