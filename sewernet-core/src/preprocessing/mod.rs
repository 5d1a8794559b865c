//! From input layers to the connection graph

pub mod clustering;
pub mod connect;
pub mod connection_graph;
pub mod crs;
pub mod domain;
pub mod roads;

pub use clustering::{AgglomerativeClusterer, BuildingClusterer};
pub use connect::{Building, BuildingConnector, connect_buildings};
pub use connection_graph::{apply_pump_penalty, generate_connection_graph};
pub use crs::{Crs, resolve_crs};
pub use domain::{BuildingLayer, ModelDomain, RoadLayer};
pub use roads::{RoadFeature, connect_subgraphs, create_unsimplified_graph};
