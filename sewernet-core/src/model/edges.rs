//! Per-stage edge records

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NodeKey;
use crate::geometry::coord_distance;

/// One sample of a profile along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Distance from the start of the edge in meters
    pub chainage: f64,
    /// Elevation or invert level in meters
    pub value: f64,
}

impl ProfilePoint {
    pub fn new(chainage: f64, value: f64) -> Self {
        Self { chainage, value }
    }
}

impl From<(f64, f64)> for ProfilePoint {
    fn from((chainage, value): (f64, f64)) -> Self {
        Self { chainage, value }
    }
}

pub type Profile = Vec<ProfilePoint>;

/// Edge of the unsimplified and simplified road graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub geometry: LineString<f64>,
    pub length: f64,
    /// Feature attributes copied from the input layer
    pub attributes: Map<String, Value>,
    /// Short link between a building and its splice point
    pub private_sewer: bool,
    /// Bridge between disjoint road components
    pub road_network: bool,
}

impl RoadEdge {
    pub fn new(geometry: LineString<f64>, attributes: Map<String, Value>) -> Self {
        let length = crate::geometry::path_length(&geometry);
        Self {
            geometry,
            length,
            attributes,
            private_sewer: false,
            road_network: false,
        }
    }

    pub fn private_sewer(geometry: LineString<f64>) -> Self {
        Self {
            private_sewer: true,
            ..Self::new(geometry, Map::new())
        }
    }

    /// Geometry oriented so that it starts at the end closest to `from`.
    pub fn oriented_from(&self, from: NodeKey) -> LineString<f64> {
        let origin = from.coord();
        let distance = |c: Option<&Coord<f64>>| c.map_or(f64::INFINITY, |c| coord_distance(*c, origin));
        let mut geometry = self.geometry.clone();
        if distance(geometry.0.last()) < distance(geometry.0.first()) {
            geometry.0.reverse();
        }
        geometry
    }
}

/// Directed edge of the connection graph consumed by routing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEdge {
    /// Full resolution path from source to target
    pub geometry: LineString<f64>,
    pub distance: f64,
    /// Ground elevation sampled along the geometry
    pub profile: Profile,
    pub needs_pump: bool,
    /// Routing cost
    pub weight: f64,
    pub private_sewer: bool,
    pub attributes: Map<String, Value>,
}

impl ConnectionEdge {
    /// Routing cost for an edge with the given distance.
    pub fn routing_weight(distance: f64, needs_pump: bool, pump_penalty: f64) -> f64 {
        if needs_pump {
            distance * pump_penalty
        } else {
            distance
        }
    }

    pub fn apply_pump_penalty(&mut self, pump_penalty: f64) {
        self.weight = Self::routing_weight(self.distance, self.needs_pump, pump_penalty);
    }
}

/// Edge of the routed sewer tree, annotated by the hydraulic pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SewerEdge {
    pub geometry: LineString<f64>,
    pub distance: f64,
    pub profile: Profile,
    pub needs_pump: bool,
    pub weight: f64,
    pub private_sewer: bool,
    pub attributes: Map<String, Value>,
    /// Downstream of a pump
    pub pressurized: bool,
    pub diameter: Option<f64>,
    pub peak_flow: Option<f64>,
    /// Pipe invert level along the edge; pressurized pipes run at the
    /// minimum trench depth below ground
    pub trench_depth_profile: Profile,
    pub mean_td: Option<f64>,
    /// Position in the hydraulic traversal
    pub edge_counter: Option<usize>,
}

impl From<&ConnectionEdge> for SewerEdge {
    fn from(edge: &ConnectionEdge) -> Self {
        Self {
            geometry: edge.geometry.clone(),
            distance: edge.distance,
            profile: edge.profile.clone(),
            needs_pump: edge.needs_pump,
            weight: edge.weight,
            private_sewer: edge.private_sewer,
            attributes: edge.attributes.clone(),
            pressurized: false,
            diameter: None,
            peak_flow: None,
            trench_depth_profile: Vec::new(),
            mean_td: None,
            edge_counter: None,
        }
    }
}
