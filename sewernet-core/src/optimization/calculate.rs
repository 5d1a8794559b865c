//! Trench depths, pumps and diameters along the routed sewer tree

use log::{info, warn};

use super::hydraulics::select_diameter;
use super::reverse_bfs::reverse_bfs;
use super::trench::{TrenchLimits, mean_trench_depth, needs_pump};
use crate::config::{OptimizationConfig, depth_or_tmin};
use crate::model::{NodeKey, NodeType, ProfilePoint, SewerGraph};
use crate::{Error, Result};

/// Mean slope of an invert profile over the pipe length, falling back to
/// `min_slope` for degenerate pipes.
fn mean_slope(invert: &[ProfilePoint], distance: f64, min_slope: f64) -> f64 {
    match (invert.first(), invert.last()) {
        (Some(first), Some(last)) if distance > 0.0 => {
            let slope = (last.value - first.value) / distance;
            if slope < 0.0 { slope } else { min_slope }
        }
        _ => min_slope,
    }
}

/// Runs the hydraulic pass over every edge draining into `sinks`.
///
/// Edges are visited from the leaves towards each sink. An edge that
/// cannot run by gravity from the minimum trench depth gets a pump at its
/// upstream node and becomes a pressurized pipe. An edge that only fails
/// from the deepest inflow at its upstream node gets a lifting station
/// there and restarts at the minimum depth. Gravity pipes get the
/// smallest catalog diameter carrying the upstream peak flow; no pipe is
/// smaller than the largest pipe feeding it.
///
/// Peak flows must be estimated beforehand. Sinks missing from the graph
/// are skipped with a warning.
pub fn calculate_hydraulic_parameters(
    graph: &mut SewerGraph,
    sinks: &[NodeKey],
    config: &OptimizationConfig,
    include_private_sewer: bool,
) -> Result<()> {
    let limits = TrenchLimits::from(config);
    let min_depth = depth_or_tmin(config.min_trench_depth, config.tmin);

    let isolated = graph.isolated_nodes();
    for node in graph.nodes_mut() {
        let hydraulics = &mut node.hydraulics;
        hydraulics.inflow_trench_depths.clear();
        hydraulics.inflow_diameters.clear();
        hydraulics.pumping_station = false;
        hydraulics.lifting_station = false;
        hydraulics.onsite = node.node_type == NodeType::Building && isolated.contains(&node.key);
    }
    for e in graph.edge_indices() {
        if let Some(edge) = graph.edge_mut(e) {
            edge.pressurized = false;
        }
    }

    let mut edge_counter = 0usize;
    for sink in sinks {
        if !graph.contains(sink) {
            warn!("Sink {sink} is not part of the sewer graph, skipped");
            continue;
        }

        for e in reverse_bfs(graph, sink, include_private_sewer) {
            let (from, to) = graph
                .edge_endpoints(e)
                .ok_or_else(|| Error::InvalidData("edge removed during hydraulic pass".to_string()))?;
            let upstream = graph.node(&from).ok_or(Error::NodeNotFound(from))?;
            let max_inflow_depth = upstream.hydraulics.max_inflow_trench_depth();
            let max_inflow_diameter = upstream.hydraulics.max_inflow_diameter();
            let flow = upstream.hydraulics.peak_flow;
            let edge = graph
                .edge(e)
                .ok_or_else(|| Error::InvalidData(format!("edge {from} -> {to} not found")))?;
            let profile = edge.profile.clone();
            let distance = edge.distance;

            let at_min_depth = needs_pump(&profile, &limits, min_depth)?;
            let (pressurized, check, pumping, lifting) = if at_min_depth.needs_pump {
                (true, at_min_depth, true, false)
            } else {
                let at_inflow_depth = needs_pump(&profile, &limits, max_inflow_depth)?;
                if at_inflow_depth.needs_pump {
                    (false, at_min_depth, false, true)
                } else {
                    (false, at_inflow_depth, false, false)
                }
            };

            let (diameter, mean_td, outflow_depth, invert) = if pressurized {
                // Pressure mains follow the terrain at the minimum depth.
                let invert = profile
                    .iter()
                    .map(|p| ProfilePoint::new(p.chainage, p.value - min_depth))
                    .collect();
                (
                    config.pressurized_diameter.max(max_inflow_diameter),
                    min_depth,
                    min_depth,
                    invert,
                )
            } else {
                let slope = mean_slope(&check.invert_profile, distance, config.min_slope);
                let selected = select_diameter(flow, &config.diameters, config.roughness, slope)
                    .map_err(|err| match err {
                        Error::InsufficientDiameter { flow, .. } => {
                            Error::EdgeDiameterExhausted { from, to, flow }
                        }
                        other => other,
                    })?;
                (
                    selected.max(max_inflow_diameter),
                    mean_trench_depth(&profile, &check.invert_profile),
                    check.outflow_trench_depth,
                    check.invert_profile,
                )
            };

            if let Some(node) = graph.node_mut(&from) {
                node.hydraulics.pumping_station |= pumping;
                node.hydraulics.lifting_station |= lifting;
            }
            if let Some(edge) = graph.edge_mut(e) {
                edge.pressurized = pressurized;
                edge.diameter = Some(diameter);
                edge.peak_flow = Some(flow);
                edge.trench_depth_profile = invert;
                edge.mean_td = Some(mean_td);
                edge.edge_counter = Some(edge_counter);
            }
            if let Some(node) = graph.node_mut(&to) {
                node.hydraulics.inflow_trench_depths.push(outflow_depth);
                node.hydraulics.inflow_diameters.push(diameter);
            }
            edge_counter += 1;
        }
    }

    info!("Hydraulic parameters set on {edge_counter} edges");
    Ok(())
}
