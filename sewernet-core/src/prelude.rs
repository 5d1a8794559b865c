pub use crate::{Error, Result};

// Inputs and configuration
pub use crate::config::{Clustering, Config, ExportConfig, OptimizationConfig, PreprocessingConfig};
pub use crate::elevation::{ElevationModel, FlatTerrain, GridElevation};
pub use crate::preprocessing::{Building, BuildingLayer, Crs, ModelDomain, RoadFeature, RoadLayer};

// Graphs shared by every stage
pub use crate::model::{
    ConnectionEdge, ConnectionGraph, NodeKey, NodeType, RoadEdge, RoadGraph, SewerEdge, SewerGraph,
    SewerNode,
};

// Routing and dimensioning
pub use crate::optimization::{calculate_hydraulic_parameters, estimate_peakflow};
pub use crate::routing::rsph_tree;

// Results
pub use crate::export::{SewerInfo, export_sewer_network, sewer_info, to_geojson};
