use std::collections::BTreeSet;
use std::io::Write;

use petgraph::EdgeType;
use serde_json::Value;
use wkt::ToWkt;

use super::to_geojson::EdgeProperties;
use crate::Result;
use crate::model::Network;

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes one row per edge: `from`, `to`, every property seen on any edge
/// in name order, and the geometry as WKT.
pub fn write_edges_csv<E: EdgeProperties, Ty: EdgeType, W: Write>(
    graph: &Network<E, Ty>,
    writer: W,
) -> Result<()> {
    let rows: Vec<_> = graph
        .edges()
        .map(|(from, to, edge)| (from, to, edge.properties(), edge.geometry().to_wkt().to_string()))
        .collect();
    let columns: BTreeSet<String> = rows
        .iter()
        .flat_map(|(_, _, properties, _)| properties.keys().cloned())
        .collect();

    let mut writer = csv::Writer::from_writer(writer);
    let mut header = vec!["from".to_string(), "to".to_string()];
    header.extend(columns.iter().cloned());
    header.push("geometry".to_string());
    writer.write_record(&header)?;

    for (from, to, properties, geometry) in rows {
        let mut record = vec![from.to_string(), to.to_string()];
        record.extend(columns.iter().map(|column| cell(properties.get(column))));
        record.push(geometry);
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKey, RoadEdge, RoadGraph};
    use geo::line_string;
    use serde_json::{Map, json};

    #[test]
    fn test_rows_share_the_union_of_columns() {
        let a = NodeKey::new(0.0, 0.0).unwrap();
        let b = NodeKey::new(10.0, 0.0).unwrap();
        let c = NodeKey::new(10.0, 10.0).unwrap();
        let mut named = Map::new();
        named.insert("name".to_string(), json!("Main St"));

        let mut graph = RoadGraph::new();
        graph.add_edge(a, b, RoadEdge::new(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)], named));
        graph.add_edge(b, c, RoadEdge::new(line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0)], Map::new()));

        let mut buffer = Vec::new();
        write_edges_csv(&graph, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "from,to,length,name,private_sewer,road_network,geometry");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Main St"));
        assert!(lines[1].ends_with("\"LINESTRING(0 0,10 0)\""));
        assert!(lines[2].contains(",,false,"));
    }
}
