use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use petgraph::EdgeType;
use serde_json::{Map, Value, json};

use crate::model::{ConnectionEdge, Network, Profile, RoadEdge, SewerEdge, SewerNode};
use crate::{Error, Result};

/// Edge records that can be written as flat feature properties.
pub trait EdgeProperties {
    fn geometry(&self) -> &LineString<f64>;

    /// Scalar properties of the edge, profiles encoded as JSON strings.
    fn properties(&self) -> Map<String, Value>;
}

impl EdgeProperties for RoadEdge {
    fn geometry(&self) -> &LineString<f64> {
        &self.geometry
    }

    fn properties(&self) -> Map<String, Value> {
        let mut properties = flat_attributes(&self.attributes);
        properties.insert("length".to_string(), json!(self.length));
        properties.insert("private_sewer".to_string(), json!(self.private_sewer));
        properties.insert("road_network".to_string(), json!(self.road_network));
        properties
    }
}

impl EdgeProperties for ConnectionEdge {
    fn geometry(&self) -> &LineString<f64> {
        &self.geometry
    }

    fn properties(&self) -> Map<String, Value> {
        let mut properties = flat_attributes(&self.attributes);
        properties.insert("distance".to_string(), json!(self.distance));
        properties.insert("weight".to_string(), json!(self.weight));
        properties.insert("needs_pump".to_string(), json!(self.needs_pump));
        properties.insert("private_sewer".to_string(), json!(self.private_sewer));
        properties.insert("profile".to_string(), json!(profile_string(&self.profile)));
        properties
    }
}

impl EdgeProperties for SewerEdge {
    fn geometry(&self) -> &LineString<f64> {
        &self.geometry
    }

    fn properties(&self) -> Map<String, Value> {
        let mut properties = flat_attributes(&self.attributes);
        let values = [
            ("distance", json!(self.distance)),
            ("weight", json!(self.weight)),
            ("needs_pump", json!(self.needs_pump)),
            ("private_sewer", json!(self.private_sewer)),
            ("pressurized", json!(self.pressurized)),
            ("diameter", json!(self.diameter)),
            ("peak_flow", json!(self.peak_flow)),
            ("mean_td", json!(self.mean_td)),
            ("edge_counter", json!(self.edge_counter)),
            ("profile", json!(profile_string(&self.profile))),
            (
                "trench_depth_profile",
                json!(profile_string(&self.trench_depth_profile)),
            ),
        ];
        for (key, value) in values {
            properties.insert(key.to_string(), value);
        }
        properties
    }
}

/// `[[chainage, value], ...]` as a JSON string.
pub fn profile_string(profile: &Profile) -> String {
    let pairs: Vec<[f64; 2]> = profile.iter().map(|p| [p.chainage, p.value]).collect();
    json!(pairs).to_string()
}

/// Attributes with every array or object value encoded as a JSON string.
fn flat_attributes(attributes: &Map<String, Value>) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(key, value)| {
            let flat = match value {
                Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
                scalar => scalar.clone(),
            };
            (key.clone(), flat)
        })
        .collect()
}

fn node_properties(node: &SewerNode) -> Map<String, Value> {
    let mut properties = flat_attributes(&node.attributes);
    let hydraulics = &node.hydraulics;
    let values = [
        ("node_type", json!(node.node_type.as_str())),
        ("road_network", json!(node.road_network)),
        ("connection_node", json!(node.connection_node)),
        ("elevation", json!(node.elevation)),
        ("pumping_station", json!(hydraulics.pumping_station)),
        ("lifting_station", json!(hydraulics.lifting_station)),
        ("onsite", json!(hydraulics.onsite)),
        ("peak_flow", json!(hydraulics.peak_flow)),
        ("average_daily_flow", json!(hydraulics.average_daily_flow)),
        ("upstream_pe", json!(hydraulics.upstream_pe)),
        (
            "max_inflow_trench_depth",
            json!(hydraulics.max_inflow_trench_depth()),
        ),
        ("max_inflow_diameter", json!(hydraulics.max_inflow_diameter())),
    ];
    for (key, value) in values {
        properties.insert(key.to_string(), value);
    }
    properties
}

/// Edges as `LineString` features.
pub fn to_geojson<E: EdgeProperties, Ty: EdgeType>(graph: &Network<E, Ty>) -> Result<FeatureCollection> {
    let features = graph
        .edges()
        .map(|(from, to, edge)| {
            let geometry = Geometry::new(GeometryValue::from(edge.geometry()));
            let mut properties = edge.properties();
            properties.insert("from".to_string(), json!(from.to_string()));
            properties.insert("to".to_string(), json!(to.to_string()));

            Feature {
                geometry: Some(geometry),
                properties: Some(properties),
                ..Default::default()
            }
        })
        .collect();

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

pub fn to_geojson_string<E: EdgeProperties, Ty: EdgeType>(graph: &Network<E, Ty>) -> Result<String> {
    serde_json::to_string(&to_geojson(graph)?).map_err(|e| Error::GeoJsonError(e.to_string()))
}

/// Nodes as `Point` features.
pub fn nodes_to_geojson<E, Ty: EdgeType>(graph: &Network<E, Ty>) -> Result<FeatureCollection> {
    let features = graph
        .nodes()
        .map(|node| {
            let geometry = Geometry::new(GeometryValue::from(&node.key.point()));
            Feature {
                geometry: Some(geometry),
                properties: Some(node_properties(node)),
                ..Default::default()
            }
        })
        .collect();

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKey, NodeType, ProfilePoint, SewerGraph};

    fn sewer() -> SewerGraph {
        let a = NodeKey::new(0.0, 0.0).unwrap();
        let b = NodeKey::new(10.0, 0.0).unwrap();
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!(["main", "side"]));
        let mut edge = SewerEdge::from(&ConnectionEdge {
            geometry: LineString::new(vec![a.coord(), b.coord()]),
            distance: 10.0,
            profile: vec![ProfilePoint::new(0.0, 5.0), ProfilePoint::new(10.0, 4.5)],
            needs_pump: false,
            weight: 10.0,
            private_sewer: false,
            attributes,
        });
        edge.diameter = Some(0.2);
        let mut graph = SewerGraph::new();
        graph.add_edge(a, b, edge);
        graph.node_mut(&a).unwrap().node_type = NodeType::Building;
        graph
    }

    #[test]
    fn test_edges_as_flat_features() {
        let collection = to_geojson(&sewer()).unwrap();
        assert_eq!(collection.features.len(), 1);
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["diameter"], json!(0.2));
        assert_eq!(properties["profile"], json!("[[0.0,5.0],[10.0,4.5]]"));
        assert_eq!(properties["name"], json!(r#"["main","side"]"#));
        assert_eq!(properties["from"], json!("(0, 0)"));
        assert_eq!(properties["mean_td"], Value::Null);

        let geometry = collection.features[0].geometry.as_ref().unwrap();
        assert!(matches!(
            &geometry.value,
            GeometryValue::LineString { coordinates } if coordinates.len() == 2
        ));
    }

    #[test]
    fn test_nodes_as_points() {
        let collection = nodes_to_geojson(&sewer()).unwrap();
        assert_eq!(collection.features.len(), 2);
        let types: Vec<_> = collection
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["node_type"].clone())
            .collect();
        assert_eq!(types, vec![json!("building"), json!("")]);
    }

    #[test]
    fn test_geojson_string_parses_back() {
        let text = to_geojson_string(&sewer()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert_eq!(value["features"][0]["type"], json!("Feature"));
        assert_eq!(value["features"][0]["geometry"]["type"], json!("LineString"));
        assert_eq!(value["features"][0]["properties"]["diameter"], json!(0.2));
    }
}
