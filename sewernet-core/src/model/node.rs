//! Graph nodes keyed by their coordinates

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Number of decimal places kept in node coordinates.
const KEY_SCALE: f64 = 1e6;

/// Coordinate pair used as node identity.
///
/// Construction rounds both ordinates to 1e-6 so that coordinates produced
/// by independent geometry operations compare equal when they describe the
/// same location. Equality is exact on the rounded values.
#[derive(Debug, Clone, Copy)]
pub struct NodeKey {
    x: f64,
    y: f64,
}

impl NodeKey {
    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidGeometry(format!(
                "non-finite coordinate ({x}, {y})"
            )));
        }
        // `+ 0.0` folds negative zero into positive zero
        Ok(Self {
            x: (x * KEY_SCALE).round() / KEY_SCALE + 0.0,
            y: (y * KEY_SCALE).round() / KEY_SCALE + 0.0,
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }

    /// Same key moved by the given offsets.
    pub fn shifted(&self, dx: f64, dy: f64) -> Result<Self> {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(&self, other: &NodeKey) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl TryFrom<Coord<f64>> for NodeKey {
    type Error = Error;

    fn try_from(coord: Coord<f64>) -> Result<Self> {
        Self::new(coord.x, coord.y)
    }
}

impl TryFrom<Point<f64>> for NodeKey {
    type Error = Error;

    fn try_from(point: Point<f64>) -> Result<Self> {
        Self::new(point.x(), point.y())
    }
}

impl PartialEq for NodeKey {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for NodeKey {}

impl Hash for NodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl Ord for NodeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl PartialOrd for NodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Role of a node in the sewer network. Plain road nodes carry no type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Plain,
    Building,
    ClusterCenter,
    Wwtp,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Plain => "",
            NodeType::Building => "building",
            NodeType::ClusterCenter => "cluster_center",
            NodeType::Wwtp => "wwtp",
        }
    }

    pub fn is_typed(&self) -> bool {
        *self != NodeType::Plain
    }
}

/// Node state written by peak-flow estimation and the hydraulic pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeHydraulics {
    pub pumping_station: bool,
    pub lifting_station: bool,
    pub onsite: bool,
    /// Outflow trench depths of every edge entering this node
    pub inflow_trench_depths: Vec<f64>,
    /// Diameters of every edge entering this node
    pub inflow_diameters: Vec<f64>,
    /// m³/s
    pub peak_flow: f64,
    /// m³/day
    pub average_daily_flow: f64,
    pub upstream_pe: f64,
}

impl NodeHydraulics {
    pub fn max_inflow_trench_depth(&self) -> f64 {
        self.inflow_trench_depths.iter().copied().fold(0.0, f64::max)
    }

    pub fn max_inflow_diameter(&self) -> f64 {
        self.inflow_diameters.iter().copied().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SewerNode {
    pub key: NodeKey,
    pub node_type: NodeType,
    /// Node belongs to the original road skeleton
    pub road_network: bool,
    /// Splice point inserted on an edge to attach a building
    pub connection_node: bool,
    /// Ground elevation in meters, set on the connection graph
    pub elevation: Option<f64>,
    /// Caller-provided attributes (e.g. building properties)
    pub attributes: Map<String, Value>,
    pub hydraulics: NodeHydraulics,
}

impl SewerNode {
    pub fn new(key: NodeKey) -> Self {
        Self {
            key,
            node_type: NodeType::Plain,
            road_network: false,
            connection_node: false,
            elevation: None,
            attributes: Map::new(),
            hydraulics: NodeHydraulics::default(),
        }
    }

    pub fn with_type(key: NodeKey, node_type: NodeType) -> Self {
        Self {
            node_type,
            ..Self::new(key)
        }
    }

    pub fn is_building(&self) -> bool {
        self.node_type == NodeType::Building
    }

    pub fn is_sink(&self) -> bool {
        self.node_type == NodeType::Wwtp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    #[test]
    fn test_key_rounding_merges_drift() {
        let a = NodeKey::new(10.000_000_1, 5.0).unwrap();
        let b = NodeKey::new(9.999_999_9, 5.000_000_000_1).unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_key_negative_zero() {
        let a = NodeKey::new(-0.0, 0.0).unwrap();
        let b = NodeKey::new(0.0, -0.000_000_01).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_rejects_nan() {
        assert!(NodeKey::new(f64::NAN, 1.0).is_err());
        assert!(NodeKey::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_key_ordering_is_lexicographic() {
        let mut keys = vec![
            NodeKey::new(1.0, 2.0).unwrap(),
            NodeKey::new(0.0, 5.0).unwrap(),
            NodeKey::new(1.0, -1.0).unwrap(),
        ];
        keys.sort();
        assert_eq!(keys[0], NodeKey::new(0.0, 5.0).unwrap());
        assert_eq!(keys[1], NodeKey::new(1.0, -1.0).unwrap());
        assert_eq!(keys[2].to_string(), "(1, 2)");
    }
}
