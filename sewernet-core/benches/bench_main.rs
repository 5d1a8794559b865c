use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::{Coord, LineString, Point};
use serde_json::Map;
use sewernet_core::prelude::*;

const SPACING: f64 = 100.0;

/// Street grid of `blocks` x `blocks` with a building in front of every
/// block and terrain rising to the north-east.
fn fixture(blocks: usize) -> (ModelDomain<GridElevation>, NodeKey) {
    let stops: Vec<f64> = (0..=blocks).map(|i| i as f64 * SPACING).collect();
    let mut features = Vec::new();
    for &at in &stops {
        let horizontal: Vec<_> = stops.iter().map(|&x| (x, at)).collect();
        let vertical: Vec<_> = stops.iter().map(|&y| (at, y)).collect();
        features.push(RoadFeature::new(LineString::from(horizontal).into(), Map::new()));
        features.push(RoadFeature::new(LineString::from(vertical).into(), Map::new()));
    }

    let mut buildings = Vec::new();
    for i in 0..blocks {
        for j in 0..blocks {
            let x = i as f64 * SPACING + 50.0;
            let y = j as f64 * SPACING + 15.0;
            buildings.push(Building::new(Point::new(x, y).into(), Map::new()));
        }
    }

    let extent = stops.last().copied().unwrap_or_default();
    let cells = (extent / 10.0) as usize + 10;
    let values = (0..cells)
        .flat_map(|row| (0..cells).map(move |col| 50.0 + 0.01 * col as f64 * 10.0 - 0.01 * row as f64 * 10.0))
        .collect();
    let dem = GridElevation::new(-50.0, extent + 50.0, 10.0, cells, cells, values).unwrap();

    let mut domain = ModelDomain::new(
        dem,
        &RoadLayer {
            crs: None,
            features,
        },
        &BuildingLayer { crs: None, buildings },
        Config::default(),
    )
    .unwrap();
    let sink = domain.add_sink(Coord { x: -10.0, y: 0.0 }).unwrap();
    (domain, sink)
}

fn bench_connection_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("connection_graph");
    for blocks in [5, 10] {
        let (mut domain, _) = fixture(blocks);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| black_box(domain.generate_connection_graph().unwrap()));
        });
    }
    group.finish();
}

fn bench_rsph(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsph_tree");
    group.sample_size(20);
    for blocks in [5, 10] {
        let (mut domain, sink) = fixture(blocks);
        let graph = domain.generate_connection_graph().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &graph, |b, graph| {
            b.iter(|| black_box(rsph_tree(graph, &[sink], &[]).unwrap()));
        });
    }
    group.finish();
}

fn bench_hydraulics(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydraulic_pass");
    for blocks in [5, 10] {
        let (mut domain, sink) = fixture(blocks);
        let graph = domain.generate_connection_graph().unwrap();
        let tree = rsph_tree(&graph, &[sink], &[]).unwrap();
        let config = domain.config().optimization.clone();
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &tree, |b, tree| {
            b.iter(|| {
                let mut sewer = tree.clone();
                estimate_peakflow(&mut sewer, &config);
                calculate_hydraulic_parameters(&mut sewer, &[sink], &config, true).unwrap();
                black_box(sewer)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_connection_graph, bench_rsph, bench_hydraulics);
criterion_main!(benches);
