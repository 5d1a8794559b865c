//! Data model of the sewer planning pipeline
//!
//! Nodes are keyed by their coordinates, edges carry one record type per
//! pipeline stage.

pub mod edges;
pub mod network;
pub mod node;

pub use edges::{ConnectionEdge, Profile, ProfilePoint, RoadEdge, SewerEdge};
pub use network::{ConnectionGraph, Network, RoadGraph, SewerGraph};
pub use node::{NodeHydraulics, NodeKey, NodeType, SewerNode};
