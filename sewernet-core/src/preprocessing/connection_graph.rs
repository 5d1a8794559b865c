//! Directed, elevation-annotated graph consumed by the router

use log::info;

use crate::config::{OptimizationConfig, PreprocessingConfig};
use crate::elevation::ElevationModel;
use crate::geometry::path_length;
use crate::model::{ConnectionEdge, ConnectionGraph, RoadGraph};
use crate::optimization::trench::{TrenchLimits, needs_pump};
use crate::Result;

/// Turns every edge of the simplified graph into a pair of opposite
/// directed edges with distance, ground profile, pump flag and weight.
/// Self-loops are dropped and every node gets its ground elevation.
pub fn generate_connection_graph(
    simplified: &RoadGraph,
    dem: &dyn ElevationModel,
    preprocessing: &PreprocessingConfig,
    optimization: &OptimizationConfig,
) -> Result<ConnectionGraph> {
    let limits = TrenchLimits::from(optimization);
    let mut graph: ConnectionGraph = simplified.empty_copy();
    let mut self_loops = 0;

    for (a, b, edge) in simplified.edges() {
        if a == b {
            self_loops += 1;
            continue;
        }
        for (from, to) in [(a, b), (b, a)] {
            let geometry = edge.oriented_from(from);
            let distance = path_length(&geometry);
            let profile = dem.profile_along(&geometry, preprocessing.dx)?;
            let check = needs_pump(&profile, &limits, optimization.inflow_trench_depth)?;
            graph.add_edge(
                from,
                to,
                ConnectionEdge {
                    weight: ConnectionEdge::routing_weight(
                        distance,
                        check.needs_pump,
                        preprocessing.pump_penalty,
                    ),
                    geometry,
                    distance,
                    profile,
                    needs_pump: check.needs_pump,
                    private_sewer: edge.private_sewer,
                    attributes: edge.attributes.clone(),
                },
            );
        }
    }

    for node in graph.nodes_mut() {
        node.elevation = Some(dem.elevation_at(node.key.point())?);
    }

    info!(
        "Generated connection graph with {} nodes and {} directed edges ({} self-loops dropped)",
        graph.node_count(),
        graph.edge_count(),
        self_loops
    );
    Ok(graph)
}

/// Recomputes every edge weight for a new pump penalty.
pub fn apply_pump_penalty(graph: &mut ConnectionGraph, pump_penalty: f64) {
    for e in graph.edge_indices() {
        if let Some(edge) = graph.edge_mut(e) {
            edge.apply_pump_penalty(pump_penalty);
        }
    }
}
