use serde::Serialize;

use crate::model::SewerGraph;

/// Summary figures of a dimensioned sewer network.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SewerInfo {
    pub total_buildings: usize,
    /// Meters of pressurized pipe
    pub pressurized_length: f64,
    /// Meters of gravity pipe
    pub gravity_length: f64,
    pub lifting_stations: usize,
    /// Pumping stations on the public network
    pub pumping_stations: usize,
    /// Pumps located at buildings
    pub private_pumps: usize,
}

pub fn sewer_info(graph: &SewerGraph) -> SewerInfo {
    let (pressurized, gravity) = graph
        .edges()
        .fold((0.0, 0.0), |(pressurized, gravity), (_, _, edge)| {
            if edge.pressurized {
                (pressurized + edge.distance, gravity)
            } else {
                (pressurized, gravity + edge.distance)
            }
        });

    let mut info = SewerInfo {
        pressurized_length: f64::round(pressurized),
        gravity_length: f64::round(gravity),
        ..SewerInfo::default()
    };
    for node in graph.nodes() {
        let hydraulics = &node.hydraulics;
        if node.is_building() {
            info.total_buildings += 1;
            if hydraulics.pumping_station {
                info.private_pumps += 1;
            }
        } else if hydraulics.pumping_station {
            info.pumping_stations += 1;
        }
        if hydraulics.lifting_station {
            info.lifting_stations += 1;
        }
    }
    info
}
