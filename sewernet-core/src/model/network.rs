//! Keyed graph container shared by every pipeline stage

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{
    Directed, Direction, EdgeType, Undirected,
    stable_graph::{EdgeIndex, NodeIndex, StableGraph},
    unionfind::UnionFind,
    visit::{EdgeRef, IntoEdgeReferences, NodeIndexable},
};

use super::{ConnectionEdge, NodeKey, NodeType, RoadEdge, SewerEdge, SewerNode};

/// Graph whose nodes are identified by [`NodeKey`].
///
/// Wraps a `StableGraph` so that node and edge indices stay valid while
/// the building connector and simplifier mutate the graph.
#[derive(Debug, Clone)]
pub struct Network<E, Ty: EdgeType> {
    pub(crate) graph: StableGraph<SewerNode, E, Ty>,
    index: HashMap<NodeKey, NodeIndex>,
}

/// Undirected road graph, before and after simplification
pub type RoadGraph = Network<RoadEdge, Undirected>;
/// Directed multigraph consumed by the router
pub type ConnectionGraph = Network<ConnectionEdge, Directed>;
/// Routed tree annotated by the hydraulic pass
pub type SewerGraph = Network<SewerEdge, Directed>;

impl<E, Ty: EdgeType> Default for Network<E, Ty> {
    fn default() -> Self {
        Self {
            graph: StableGraph::default(),
            index: HashMap::new(),
        }
    }
}

impl<E, Ty: EdgeType> Network<E, Ty> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn index_of(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn key_of(&self, idx: NodeIndex) -> Option<NodeKey> {
        self.graph.node_weight(idx).map(|node| node.key)
    }

    /// Returns the index of `key`, adding a plain node if it is missing.
    pub fn ensure_node(&mut self, key: NodeKey) -> NodeIndex {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(SewerNode::new(key));
        self.index.insert(key, idx);
        idx
    }

    /// Inserts `node`, replacing the record of an existing node with the same key.
    pub fn insert_node(&mut self, node: SewerNode) -> NodeIndex {
        let key = node.key;
        match self.index.get(&key) {
            Some(&idx) => {
                self.graph[idx] = node;
                idx
            }
            None => {
                let idx = self.graph.add_node(node);
                self.index.insert(key, idx);
                idx
            }
        }
    }

    pub fn node(&self, key: &NodeKey) -> Option<&SewerNode> {
        self.index_of(key).and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn node_mut(&mut self, key: &NodeKey) -> Option<&mut SewerNode> {
        let idx = self.index_of(key)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SewerNode> {
        self.graph.node_weights()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SewerNode> {
        self.graph.node_weights_mut()
    }

    /// Node keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.graph.node_weights().map(|node| node.key)
    }

    /// Adds an edge, keeping any existing parallel edges.
    pub fn add_edge(&mut self, a: NodeKey, b: NodeKey, edge: E) -> EdgeIndex {
        let ia = self.ensure_node(a);
        let ib = self.ensure_node(b);
        self.graph.add_edge(ia, ib, edge)
    }

    /// Adds an edge or overwrites the record of the existing one.
    pub fn set_edge(&mut self, a: NodeKey, b: NodeKey, edge: E) -> EdgeIndex {
        let ia = self.ensure_node(a);
        let ib = self.ensure_node(b);
        self.graph.update_edge(ia, ib, edge)
    }

    pub fn edge(&self, e: EdgeIndex) -> Option<&E> {
        self.graph.edge_weight(e)
    }

    pub fn edge_mut(&mut self, e: EdgeIndex) -> Option<&mut E> {
        self.graph.edge_weight_mut(e)
    }

    pub fn edge_endpoints(&self, e: EdgeIndex) -> Option<(NodeKey, NodeKey)> {
        let (a, b) = self.graph.edge_endpoints(e)?;
        Some((self.key_of(a)?, self.key_of(b)?))
    }

    /// All edges as `(source, target, edge)` in index order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeKey, NodeKey, &E)> {
        self.graph.edge_indices().filter_map(move |e| {
            let (a, b) = self.edge_endpoints(e)?;
            Some((a, b, &self.graph[e]))
        })
    }

    pub fn edge_indices(&self) -> Vec<EdgeIndex> {
        self.graph.edge_indices().collect()
    }

    /// Edges leaving `a` towards `b`, in any orientation for undirected graphs.
    pub fn edges_between(&self, a: &NodeKey, b: &NodeKey) -> Vec<EdgeIndex> {
        match (self.index_of(a), self.index_of(b)) {
            (Some(ia), Some(ib)) => self.graph.edges_connecting(ia, ib).map(|e| e.id()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn remove_edge(&mut self, e: EdgeIndex) -> Option<E> {
        self.graph.remove_edge(e)
    }

    pub fn remove_edges_between(&mut self, a: &NodeKey, b: &NodeKey) -> Vec<E> {
        self.edges_between(a, b)
            .into_iter()
            .filter_map(|e| self.graph.remove_edge(e))
            .collect()
    }

    /// Removes a node together with all its incident edges.
    pub fn remove_node(&mut self, key: &NodeKey) -> Option<SewerNode> {
        let idx = self.index.remove(key)?;
        self.graph.remove_node(idx)
    }

    /// Number of incident edges.
    pub fn degree(&self, key: &NodeKey) -> usize {
        let Some(idx) = self.index_of(key) else {
            return 0;
        };
        let outgoing = self.graph.edges_directed(idx, Direction::Outgoing).count();
        if self.graph.is_directed() {
            outgoing + self.graph.edges_directed(idx, Direction::Incoming).count()
        } else {
            outgoing
        }
    }

    /// Adjacent nodes regardless of direction, without duplicates.
    pub fn neighbors(&self, key: &NodeKey) -> Vec<NodeKey> {
        let Some(idx) = self.index_of(key) else {
            return Vec::new();
        };
        let mut out: Vec<NodeKey> = Vec::new();
        for n in self.graph.neighbors_undirected(idx) {
            if let Some(k) = self.key_of(n)
                && !out.contains(&k)
            {
                out.push(k);
            }
        }
        out
    }

    /// Weakly connected components, largest first. Keys keep insertion order.
    pub fn weakly_connected_components(&self) -> Vec<Vec<NodeKey>> {
        let mut uf = UnionFind::<usize>::new(self.graph.node_bound());
        for e in (&self.graph).edge_references() {
            uf.union(e.source().index(), e.target().index());
        }

        let mut groups: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Vec<NodeKey>> = Vec::new();
        for idx in self.graph.node_indices() {
            let root = uf.find_mut(idx.index());
            let slot = *groups.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(self.graph[idx].key);
        }
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        components
    }

    /// Keys of all nodes with the given type, sorted.
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<NodeKey> {
        let mut keys: Vec<NodeKey> = self
            .nodes()
            .filter(|node| node.node_type == node_type)
            .map(|node| node.key)
            .collect();
        keys.sort();
        keys
    }

    pub fn buildings(&self) -> Vec<NodeKey> {
        self.nodes_of_type(NodeType::Building)
    }

    pub fn sinks(&self) -> Vec<NodeKey> {
        self.nodes_of_type(NodeType::Wwtp)
    }

    /// Nodes without any incident edge.
    pub fn isolated_nodes(&self) -> Vec<NodeKey> {
        self.keys().filter(|k| self.degree(k) == 0).collect()
    }

    /// Copy of all nodes without any edge.
    pub fn empty_copy<E2, Ty2: EdgeType>(&self) -> Network<E2, Ty2> {
        let mut out = Network::<E2, Ty2>::new();
        for node in self.nodes() {
            out.insert_node(node.clone());
        }
        out
    }

    /// Graph restricted to `keep` with all edges among kept nodes.
    pub fn subgraph(&self, keep: &[NodeKey]) -> Self
    where
        E: Clone,
    {
        let mut out = Self::new();
        for key in keep {
            if let Some(node) = self.node(key) {
                out.insert_node(node.clone());
            }
        }
        for (a, b, edge) in self.edges() {
            if out.contains(&a) && out.contains(&b) {
                out.add_edge(a, b, edge.clone());
            }
        }
        out
    }
}

impl<E> Network<E, Directed> {
    pub fn out_edges(&self, key: &NodeKey) -> Vec<EdgeIndex> {
        self.directed_edges(key, Direction::Outgoing)
    }

    pub fn in_edges(&self, key: &NodeKey) -> Vec<EdgeIndex> {
        self.directed_edges(key, Direction::Incoming)
    }

    pub fn out_degree(&self, key: &NodeKey) -> usize {
        self.out_edges(key).len()
    }

    pub fn in_degree(&self, key: &NodeKey) -> usize {
        self.in_edges(key).len()
    }

    fn directed_edges(&self, key: &NodeKey, dir: Direction) -> Vec<EdgeIndex> {
        match self.index_of(key) {
            Some(idx) => self.graph.edges_directed(idx, dir).map(|e| e.id()).collect(),
            None => Vec::new(),
        }
    }

    /// Nodes from which `start` can be reached, `start` included, in BFS order.
    pub fn upstream_nodes(&self, start: &NodeKey) -> Vec<NodeKey> {
        let Some(start_idx) = self.index_of(start) else {
            return Vec::new();
        };
        let mut visited = FixedBitSet::with_capacity(self.graph.node_bound());
        let mut queue = VecDeque::from([start_idx]);
        let mut order = Vec::new();
        visited.insert(start_idx.index());

        while let Some(node) = queue.pop_front() {
            order.push(self.graph[node].key);
            for prev in self.graph.neighbors_directed(node, Direction::Incoming) {
                if !visited.put(prev.index()) {
                    queue.push_back(prev);
                }
            }
        }
        order
    }

    /// Buildings without a directed path to any sink.
    pub fn unreached_terminals(&self) -> Vec<NodeKey> {
        let mut reached = FixedBitSet::with_capacity(self.graph.node_bound());
        for sink in self.sinks() {
            for key in self.upstream_nodes(&sink) {
                if let Some(idx) = self.index_of(&key) {
                    reached.insert(idx.index());
                }
            }
        }
        self.buildings()
            .into_iter()
            .filter(|key| {
                self.index_of(key)
                    .is_some_and(|idx| !reached.contains(idx.index()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use serde_json::Map;

    fn key(x: f64, y: f64) -> NodeKey {
        NodeKey::new(x, y).unwrap()
    }

    fn road(a: NodeKey, b: NodeKey) -> RoadEdge {
        RoadEdge::new(
            line_string![a.coord(), b.coord()],
            Map::new(),
        )
    }

    #[test]
    fn test_set_edge_is_idempotent() {
        let mut g = RoadGraph::new();
        let (a, b) = (key(0.0, 0.0), key(1.0, 0.0));
        g.set_edge(a, b, road(a, b));
        g.set_edge(b, a, road(b, a));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.degree(&a), 1);

        g.add_edge(a, b, road(a, b));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edges_between(&b, &a).len(), 2);
    }

    #[test]
    fn test_components_and_isolated() {
        let mut g = RoadGraph::new();
        let (a, b, c, d) = (key(0.0, 0.0), key(1.0, 0.0), key(5.0, 5.0), key(6.0, 5.0));
        g.set_edge(a, b, road(a, b));
        g.set_edge(c, d, road(c, d));
        let lonely = g.ensure_node(key(9.0, 9.0));
        assert_eq!(g.weakly_connected_components().len(), 3);
        assert_eq!(g.isolated_nodes(), vec![g.key_of(lonely).unwrap()]);

        g.set_edge(b, c, road(b, c));
        let comps = g.weakly_connected_components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].len(), 4);
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut g = RoadGraph::new();
        let (a, b, c) = (key(0.0, 0.0), key(1.0, 0.0), key(2.0, 0.0));
        g.set_edge(a, b, road(a, b));
        g.set_edge(b, c, road(b, c));
        g.remove_node(&b);
        assert_eq!(g.edge_count(), 0);
        assert!(!g.contains(&b));
        assert!(g.edges_between(&a, &b).is_empty());
    }

    #[test]
    fn test_remove_edges_between_drops_parallels() {
        let mut g = RoadGraph::new();
        let (a, b) = (key(0.0, 0.0), key(1.0, 0.0));
        g.add_edge(a, b, road(a, b));
        g.add_edge(b, a, road(b, a));
        assert_eq!(g.remove_edges_between(&a, &b).len(), 2);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.node_count(), 2);
    }
}
