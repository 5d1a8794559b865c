use std::collections::BinaryHeap;

use hashbrown::HashMap;
use petgraph::{
    Directed,
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use super::state::State;
use crate::model::Network;

/// Shortest-path tree from one source node.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    start: NodeIndex,
    distances: HashMap<NodeIndex, f64>,
    /// Edge used to reach each node
    predecessors: HashMap<NodeIndex, EdgeIndex>,
}

impl ShortestPaths {
    pub fn distance(&self, node: NodeIndex) -> Option<f64> {
        self.distances.get(&node).copied()
    }

    pub fn reached(&self) -> usize {
        self.distances.len()
    }

    /// Edges from the source to `target` in travel order; empty for the
    /// source itself and `None` for an unreached node.
    pub fn edge_path<E>(&self, graph: &Network<E, Directed>, target: NodeIndex) -> Option<Vec<EdgeIndex>> {
        if !self.distances.contains_key(&target) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = target;
        while current != self.start {
            let edge = *self.predecessors.get(&current)?;
            path.push(edge);
            let (source, _) = graph.graph.edge_endpoints(edge)?;
            current = source;
        }
        path.reverse();
        Some(path)
    }
}

/// Dijkstra's algorithm over directed edges with costs from `weight`.
///
/// Among parallel edges the cheapest one is recorded; equal-cost
/// alternatives keep the first path found.
pub fn dijkstra_paths<E>(
    graph: &Network<E, Directed>,
    start: NodeIndex,
    weight: impl Fn(&E) -> f64,
) -> ShortestPaths {
    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, EdgeIndex> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        for edge in graph.graph.edges(node) {
            let next = edge.target();
            let next_cost = cost + weight(edge.weight());

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, edge.id());
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, edge.id());
                    }
                }
            }
        }
    }

    ShortestPaths {
        start,
        distances,
        predecessors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKey;

    type Weighted = Network<f64, Directed>;

    fn key(x: f64) -> NodeKey {
        NodeKey::new(x, 0.0).unwrap()
    }

    #[test]
    fn test_prefers_cheaper_route() {
        let mut graph = Weighted::new();
        graph.add_edge(key(0.0), key(1.0), 1.0);
        graph.add_edge(key(1.0), key(2.0), 1.0);
        graph.add_edge(key(0.0), key(2.0), 5.0);

        let start = graph.index_of(&key(0.0)).unwrap();
        let target = graph.index_of(&key(2.0)).unwrap();
        let paths = dijkstra_paths(&graph, start, |w| *w);
        assert_eq!(paths.distance(target), Some(2.0));
        assert_eq!(paths.edge_path(&graph, target).unwrap().len(), 2);
        assert_eq!(paths.edge_path(&graph, start), Some(Vec::new()));
    }

    #[test]
    fn test_picks_cheapest_parallel_edge() {
        let mut graph = Weighted::new();
        graph.add_edge(key(0.0), key(1.0), 7.0);
        let cheap = graph.add_edge(key(0.0), key(1.0), 3.0);
        let start = graph.index_of(&key(0.0)).unwrap();
        let target = graph.index_of(&key(1.0)).unwrap();
        let paths = dijkstra_paths(&graph, start, |w| *w);
        assert_eq!(paths.edge_path(&graph, target), Some(vec![cheap]));
    }

    #[test]
    fn test_respects_direction() {
        let mut graph = Weighted::new();
        graph.add_edge(key(1.0), key(0.0), 1.0);
        let start = graph.index_of(&key(0.0)).unwrap();
        let other = graph.index_of(&key(1.0)).unwrap();
        let paths = dijkstra_paths(&graph, start, |w| *w);
        assert_eq!(paths.distance(other), None);
        assert_eq!(paths.edge_path(&graph, other), None);
        assert_eq!(paths.reached(), 1);
    }
}
