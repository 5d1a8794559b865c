//! Design flows from the number of upstream buildings

use log::info;

use crate::config::OptimizationConfig;
use crate::model::SewerGraph;

/// Peak flow in m³/s produced by `buildings` dwellings.
pub fn peak_flow(buildings: usize, config: &OptimizationConfig) -> f64 {
    let hourly = buildings as f64 * config.inhabitants_dwelling * config.daily_wastewater_person / 24.0;
    hourly * config.peak_factor / 3600.0
}

/// Sets peak flow, average daily flow and population equivalent of every
/// node from the buildings draining through it, the node itself included.
pub fn estimate_peakflow(graph: &mut SewerGraph, config: &OptimizationConfig) {
    let counts: Vec<_> = graph
        .keys()
        .map(|key| {
            let upstream = graph
                .upstream_nodes(&key)
                .iter()
                .filter(|k| graph.node(k).is_some_and(|node| node.is_building()))
                .count();
            (key, upstream)
        })
        .collect();

    let mut largest = 0.0f64;
    for (key, buildings) in counts {
        if let Some(node) = graph.node_mut(&key) {
            let hydraulics = &mut node.hydraulics;
            hydraulics.peak_flow = peak_flow(buildings, config);
            hydraulics.upstream_pe = buildings as f64 * config.inhabitants_dwelling;
            hydraulics.average_daily_flow = hydraulics.upstream_pe * config.daily_wastewater_person;
            largest = largest.max(hydraulics.peak_flow);
        }
    }
    info!("Estimated peak flows, largest {largest:.5} m³/s");
}
