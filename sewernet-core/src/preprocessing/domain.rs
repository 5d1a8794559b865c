//! Planning domain: terrain, roads, buildings and sinks

use geo::Coord;
use log::{debug, info, warn};
use serde_json::Map;

use super::clustering::{AgglomerativeClusterer, BuildingClusterer};
use super::connect::{Building, BuildingConnector, connect_buildings};
use super::connection_graph::generate_connection_graph;
use super::crs::{Crs, resolve_crs};
use super::roads::{RoadFeature, connect_subgraphs, create_unsimplified_graph};
use crate::algo::simplify_graph;
use crate::config::Config;
use crate::elevation::ElevationModel;
use crate::model::{ConnectionGraph, NodeKey, NodeType, RoadGraph};
use crate::{Error, Result};

/// Road lines with the CRS they are declared in.
#[derive(Debug, Clone, Default)]
pub struct RoadLayer {
    pub crs: Option<Crs>,
    pub features: Vec<RoadFeature>,
}

/// Building points or footprints with the CRS they are declared in.
#[derive(Debug, Clone, Default)]
pub struct BuildingLayer {
    pub crs: Option<Crs>,
    pub buildings: Vec<Building>,
}

/// Road graph with connected buildings and sinks, ready to produce the
/// connection graph for routing.
pub struct ModelDomain<D = Box<dyn ElevationModel + Send + Sync>> {
    dem: D,
    config: Config,
    crs: Option<Crs>,
    graph: RoadGraph,
    junction_graph: Option<RoadGraph>,
}

impl<D: ElevationModel> ModelDomain<D> {
    pub fn new(dem: D, roads: &RoadLayer, buildings: &BuildingLayer, config: Config) -> Result<Self> {
        Self::with_clusterer(dem, roads, buildings, config, &AgglomerativeClusterer::default())
    }

    /// Builds the domain with a custom grouping of remote buildings.
    pub fn with_clusterer(
        dem: D,
        roads: &RoadLayer,
        buildings: &BuildingLayer,
        config: Config,
        clusterer: &dyn BuildingClusterer,
    ) -> Result<Self> {
        config.validate()?;
        let crs = resolve_crs(dem.crs(), roads.crs, buildings.crs)?;

        let mut graph = create_unsimplified_graph(&roads.features)?;
        connect_subgraphs(&mut graph);
        if config.preprocessing.connect_buildings {
            connect_buildings(
                &mut graph,
                &buildings.buildings,
                &config.preprocessing,
                clusterer,
            )?;
        }

        Ok(Self {
            dem,
            config,
            crs,
            graph,
            junction_graph: None,
        })
    }

    /// Adds a treatment plant at `point`, spliced into the closest road edge.
    pub fn add_sink(&mut self, point: Coord<f64>) -> Result<NodeKey> {
        let mut connector =
            BuildingConnector::new(&mut self.graph, self.config.preprocessing.add_private_sewer);
        let key = connector
            .attach_to_roads(point, NodeType::Wwtp, Map::new())?
            .ok_or_else(|| Error::InvalidData("no road edge to attach the sink to".to_string()))?;
        info!("Added sink at {key}");
        Ok(key)
    }

    /// Turns every sink back into a plain node.
    pub fn reset_sinks(&mut self) {
        for node in self.graph.nodes_mut().filter(|node| node.is_sink()) {
            node.node_type = NodeType::Plain;
        }
    }

    /// Adds a sink next to the lowest non-building node.
    ///
    /// With `candidates` the search is limited to those nodes. Nodes
    /// without terrain data are ignored; ties go to the smallest key. The
    /// sink is placed one meter east of the chosen node. Returns `None`
    /// when no node qualifies.
    pub fn set_sink_lowest(&mut self, candidates: Option<&[NodeKey]>) -> Result<Option<NodeKey>> {
        let keys: Vec<NodeKey> = match candidates {
            Some(keys) => keys.to_vec(),
            None => self.graph.keys().collect(),
        };

        let mut lowest: Option<(f64, NodeKey)> = None;
        for key in keys {
            let Some(node) = self.graph.node(&key) else {
                warn!("Sink candidate {key} is not in the graph");
                continue;
            };
            if node.is_building() {
                continue;
            }
            let elevation = match self.dem.elevation_at(key.point()) {
                Ok(elevation) => elevation,
                Err(e) => {
                    debug!("Ignored sink candidate {key}: {e}");
                    continue;
                }
            };
            let better = lowest.is_none_or(|(best, best_key)| {
                elevation < best || (elevation == best && key < best_key)
            });
            if better {
                lowest = Some((elevation, key));
            }
        }

        let Some((elevation, key)) = lowest else {
            warn!("No node qualifies as the lowest sink location");
            return Ok(None);
        };
        info!("Lowest node {key} at {elevation} m");
        self.add_sink(key.shifted(1.0, 0.0)?.coord()).map(Some)
    }

    pub fn sinks(&self) -> Vec<NodeKey> {
        self.graph.sinks()
    }

    pub fn buildings(&self) -> Vec<NodeKey> {
        self.graph.buildings()
    }

    pub fn set_pump_penalty(&mut self, pump_penalty: f64) -> Result<()> {
        if !(pump_penalty > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pump_penalty must be positive, got {pump_penalty}"
            )));
        }
        self.config.preprocessing.pump_penalty = pump_penalty;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    /// Unsimplified road graph with buildings and sinks attached.
    pub fn road_graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// Simplified graph of the last connection graph generation.
    pub fn junction_graph(&self) -> Option<&RoadGraph> {
        self.junction_graph.as_ref()
    }

    /// Simplifies the road graph and derives the directed connection graph.
    pub fn generate_connection_graph(&mut self) -> Result<ConnectionGraph> {
        let simplified = simplify_graph(&self.graph)?;
        let graph = generate_connection_graph(
            &simplified,
            &self.dem,
            &self.config.preprocessing,
            &self.config.optimization,
        )?;
        self.junction_graph = Some(simplified);
        Ok(graph)
    }
}
