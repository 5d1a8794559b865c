use geo::{Coord, Geometry, LineString, Point};
use serde_json::Map;
use sewernet_core::export::{export_sewer_network, sewer_info};
use sewernet_core::prelude::*;

const SPACING: f64 = 100.0;

fn line(coords: &[(f64, f64)]) -> Geometry<f64> {
    LineString::from(coords.to_vec()).into()
}

/// 3 x 3 blocks of streets plus a loose stub north of the grid.
fn roads() -> RoadLayer {
    let mut features = Vec::new();
    let stops: Vec<f64> = (0..4).map(|i| i as f64 * SPACING).collect();
    for &at in &stops {
        let horizontal: Vec<_> = stops.iter().map(|&x| (x, at)).collect();
        let vertical: Vec<_> = stops.iter().map(|&y| (at, y)).collect();
        features.push(RoadFeature::new(line(&horizontal), Map::new()));
        features.push(RoadFeature::new(line(&vertical), Map::new()));
    }
    features.push(RoadFeature::new(line(&[(20.0, 320.0), (80.0, 320.0)]), Map::new()));
    RoadLayer {
        crs: None,
        features,
    }
}

fn buildings() -> BuildingLayer {
    let points = [
        (50.0, 15.0),
        (250.0, 115.0),
        (120.0, 285.0),
        (280.0, -15.0),
        (50.0, 185.0),
        // Remote pair, grouped around a shared connection point
        (40.0, 50.0),
        (50.0, 50.0),
    ];
    BuildingLayer {
        crs: None,
        buildings: points
            .iter()
            .map(|&(x, y)| Building::new(Point::new(x, y).into(), Map::new()))
            .collect(),
    }
}

/// Terrain rising gently to the east with a 12 m ridge at x = 150.
fn terrain() -> GridElevation {
    let (rows, cols) = (45, 45);
    let origin_x = -50.0;
    let values = (0..rows)
        .flat_map(|_| {
            (0..cols).map(move |col| {
                let x = origin_x + col as f64 * 10.0;
                let ridge = if (150.0..160.0).contains(&x) { 12.0 } else { 0.0 };
                20.0 + 0.02 * x + ridge
            })
        })
        .collect();
    GridElevation::new(origin_x, 390.0, 10.0, rows, cols, values)
        .unwrap()
        .with_crs(Crs::projected(25833))
}

fn domain() -> ModelDomain<GridElevation> {
    ModelDomain::new(terrain(), &roads(), &buildings(), Config::default()).unwrap()
}

#[test]
fn test_road_graph_is_connected() {
    let domain = domain();
    let graph = domain.road_graph();
    assert_eq!(graph.weakly_connected_components().len(), 1);
    assert_eq!(domain.buildings().len(), 7);
    assert_eq!(domain.crs(), Some(Crs::projected(25833)));
}

#[test]
fn test_connection_weights_follow_pump_rule() {
    let mut domain = domain();
    domain.add_sink(Coord { x: -10.0, y: 150.0 }).unwrap();
    let penalty = domain.config().preprocessing.pump_penalty;
    let graph = domain.generate_connection_graph().unwrap();

    let mut pumped = 0;
    for (_, _, edge) in graph.edges() {
        let expected = ConnectionEdge::routing_weight(edge.distance, edge.needs_pump, penalty);
        assert!((edge.weight - expected).abs() < 1e-9);
        if edge.needs_pump {
            pumped += 1;
        }
    }
    assert!(pumped > 0, "the ridge should force pumps");
}

#[test]
fn test_full_pipeline() {
    let mut domain = domain();
    let sink = domain.add_sink(Coord { x: -10.0, y: 150.0 }).unwrap();
    let connection = domain.generate_connection_graph().unwrap();
    let mut sewer = rsph_tree(&connection, &[sink], &[]).unwrap();

    // Every building drains to the sink along a tree.
    assert!(sewer.unreached_terminals().is_empty());
    let upstream = sewer.upstream_nodes(&sink);
    for building in sewer.buildings() {
        assert!(upstream.contains(&building));
    }
    assert!(sewer.keys().all(|key| sewer.out_degree(&key) <= 1));
    assert_eq!(sewer.out_degree(&sink), 0);

    let config = domain.config().optimization.clone();
    estimate_peakflow(&mut sewer, &config);
    calculate_hydraulic_parameters(&mut sewer, &[sink], &config, true).unwrap();

    let sink_node = sewer.node(&sink).unwrap();
    assert!((sink_node.hydraulics.upstream_pe - 7.0 * config.inhabitants_dwelling).abs() < 1e-9);

    for e in sewer.edge_indices() {
        let (from, _) = sewer.edge_endpoints(e).unwrap();
        let edge = sewer.edge(e).unwrap();
        let diameter = edge.diameter.unwrap();
        assert!(edge.edge_counter.is_some());
        for inflow in sewer.in_edges(&from) {
            assert!(diameter >= sewer.edge(inflow).unwrap().diameter.unwrap());
        }
    }

    let info = sewer_info(&sewer);
    assert_eq!(info.total_buildings, 7);
    assert!(info.pressurized_length > 0.0);
    assert!(info.gravity_length > 0.0);
    assert!(info.pumping_stations + info.private_pumps > 0);

    let path = std::env::temp_dir().join(format!("sewernet_pipeline_{}.csv", std::process::id()));
    export_sewer_network(&sewer, &path, "csv").unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(text.starts_with("from,to,"));
    assert_eq!(text.lines().count(), sewer.edge_count() + 1);
}

#[test]
fn test_lowest_sink_on_flat_side() {
    let mut domain = domain();
    let sink = domain.set_sink_lowest(None).unwrap().unwrap();
    // Lowest non-building node lies on the western street.
    assert_eq!(sink.x(), 1.0);
    assert_eq!(domain.sinks(), vec![sink]);
}
