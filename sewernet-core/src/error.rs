use thiserror::Error;

use crate::model::NodeKey;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("CRS of input data does not match: {0}")]
    CrsMismatch(String),
    #[error("CRS EPSG:{0} is geographic, a projected CRS is required")]
    GeographicCrs(u32),
    #[error("Slope {0} > 0, slope must be given as elevation drop per unit length")]
    PositiveSlope(f64),
    #[error("Elevation unavailable at ({x}, {y})")]
    ElevationUnavailable { x: f64, y: f64 },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Node {0} not found in graph")]
    NodeNotFound(NodeKey),
    #[error("Sink {0} not found in the connection graph")]
    SinkNotFound(NodeKey),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File format {0} is not supported")]
    UnsupportedFormat(String),
    #[error("Unexpected simplify pattern near {0}")]
    MalformedTopology(NodeKey),
    #[error("No viable terminal found to connect to {tree_nodes} tree nodes ({remaining} terminals left)")]
    NoViableTerminal { tree_nodes: usize, remaining: usize },
    #[error("Maximum diameter {max_diameter} insufficient to reach target flow {flow}")]
    InsufficientDiameter { flow: f64, max_diameter: f64 },
    #[error("No diameter can carry {flow} m³/s on edge {from} -> {to}")]
    EdgeDiameterExhausted {
        from: NodeKey,
        to: NodeKey,
        flow: f64,
    },
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
