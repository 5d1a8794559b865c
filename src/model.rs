use geo::Coord;
use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};
use serde_json::Map;

use sewernet_core::export::to_geojson_string;
use sewernet_core::geometry::parse_wkt;
use sewernet_core::preprocessing::apply_pump_penalty;
use sewernet_core::prelude::*;

use crate::{key_tuple, node_key, runtime_error};

/// Defaults overridden by the keys of `config_json`.
pub(crate) fn parse_config(config_json: Option<&str>) -> PyResult<Config> {
    match config_json {
        Some(json) => Config::from_json_str(json).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid settings: {e}"))
        }),
        None => Ok(Config::default()),
    }
}

fn layer_crs(epsg: Option<u32>, geographic: bool) -> Option<Crs> {
    epsg.map(|epsg| {
        if geographic {
            Crs::geographic(epsg)
        } else {
            Crs::projected(epsg)
        }
    })
}

/// ElevationGrid
///
/// North-up raster of ground elevations in meters. `origin_x`/`origin_y`
/// is the upper-left corner, `values` are given row by row from the top.
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "ElevationGrid")]
#[derive(Clone)]
pub struct PyElevationGrid {
    pub(crate) inner: GridElevation,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyElevationGrid {
    #[new]
    #[pyo3(signature = (origin_x, origin_y, cell_size, rows, cols, values, nodata=None, epsg=None, geographic=false))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        cell_size: f64,
        rows: usize,
        cols: usize,
        values: Vec<f64>,
        nodata: Option<f64>,
        epsg: Option<u32>,
        geographic: bool,
    ) -> PyResult<Self> {
        let mut inner = GridElevation::new(origin_x, origin_y, cell_size, rows, cols, values)
            .map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid raster: {e}"))
            })?;
        inner.nodata = nodata;
        inner.crs = layer_crs(epsg, geographic);
        Ok(Self { inner })
    }

    pub fn elevation_at(&self, x: f64, y: f64) -> PyResult<f64> {
        self.inner
            .elevation_at(geo::Point::new(x, y))
            .map_err(|e| runtime_error("Elevation lookup failed", e))
    }

    pub fn fill_nodata(&mut self, value: f64) {
        self.inner.fill_nodata(value);
    }

    fn __repr__(&self) -> String {
        format!(
            "ElevationGrid({}x{} cells of {} m)",
            self.inner.rows, self.inner.cols, self.inner.cell_size
        )
    }
}

/// ModelDomain
///
/// Road network with connected buildings and sinks. Roads and buildings
/// are given as WKT; building footprints are reduced to their centroid.
/// Without an elevation grid the terrain is flat.
///
/// Example:
///
/// .. code-block:: python
///
///     domain = ModelDomain(roads, buildings, elevation=grid, crs=25833)
///     sink = domain.set_sink_lowest()
///     tree = rsph_tree(domain.generate_connection_graph(), [sink])
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "ModelDomain")]
pub struct PyModelDomain {
    pub(crate) inner: ModelDomain,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyModelDomain {
    #[new]
    #[pyo3(signature = (roads_wkt, buildings_wkt, elevation=None, crs=None, geographic=false, config_json=None))]
    pub fn new(
        py: Python<'_>,
        roads_wkt: Vec<String>,
        buildings_wkt: Vec<String>,
        elevation: Option<PyRef<'_, PyElevationGrid>>,
        crs: Option<u32>,
        geographic: bool,
        config_json: Option<&str>,
    ) -> PyResult<Self> {
        let config = parse_config(config_json)?;
        let crs = layer_crs(crs, geographic);
        let grid = elevation.map(|grid| grid.inner.clone());

        py.detach(|| {
            let parse = |wkt: &String| {
                parse_wkt(wkt).map_err(|e| {
                    PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid WKT: {e}"))
                })
            };
            let roads = RoadLayer {
                crs,
                features: roads_wkt
                    .iter()
                    .map(|wkt| Ok(RoadFeature::new(parse(wkt)?, Map::new())))
                    .collect::<PyResult<_>>()?,
            };
            let buildings = BuildingLayer {
                crs,
                buildings: buildings_wkt
                    .iter()
                    .map(|wkt| Ok(Building::new(parse(wkt)?, Map::new())))
                    .collect::<PyResult<_>>()?,
            };

            let dem: Box<dyn ElevationModel + Send + Sync> = match grid {
                Some(grid) => Box::new(grid),
                None => Box::new(FlatTerrain { crs }),
            };
            let inner = ModelDomain::new(dem, &roads, &buildings, config)
                .map_err(|e| runtime_error("Failed to create model domain", e))?;
            Ok(Self { inner })
        })
    }

    /// Adds a treatment plant at `(x, y)` and returns its node.
    pub fn add_sink(&mut self, x: f64, y: f64) -> PyResult<(f64, f64)> {
        self.inner
            .add_sink(Coord { x, y })
            .map(key_tuple)
            .map_err(|e| runtime_error("Failed to add sink", e))
    }

    /// Adds a sink next to the lowest non-building node, optionally
    /// restricted to `candidates`. Returns `None` when nothing qualifies.
    #[pyo3(signature = (candidates=None))]
    pub fn set_sink_lowest(&mut self, candidates: Option<Vec<(f64, f64)>>) -> PyResult<Option<(f64, f64)>> {
        let candidates = candidates
            .map(|points| points.into_iter().map(node_key).collect::<PyResult<Vec<_>>>())
            .transpose()?;
        self.inner
            .set_sink_lowest(candidates.as_deref())
            .map(|key| key.map(key_tuple))
            .map_err(|e| runtime_error("Failed to place sink", e))
    }

    pub fn reset_sinks(&mut self) {
        self.inner.reset_sinks();
    }

    pub fn sinks(&self) -> Vec<(f64, f64)> {
        self.inner.sinks().into_iter().map(key_tuple).collect()
    }

    pub fn buildings(&self) -> Vec<(f64, f64)> {
        self.inner.buildings().into_iter().map(key_tuple).collect()
    }

    pub fn set_pump_penalty(&mut self, pump_penalty: f64) -> PyResult<()> {
        self.inner
            .set_pump_penalty(pump_penalty)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{e}")))
    }

    /// Current settings as JSON.
    pub fn settings(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.config())
            .map_err(|e| runtime_error("Failed to encode settings", e.into()))
    }

    /// Simplifies the road graph and builds the directed graph used for
    /// routing, with terrain profiles and pump-aware weights.
    pub fn generate_connection_graph(&mut self, py: Python<'_>) -> PyResult<PyConnectionGraph> {
        py.detach(|| {
            self.inner
                .generate_connection_graph()
                .map(|inner| PyConnectionGraph { inner })
                .map_err(|e| runtime_error("Failed to generate connection graph", e))
        })
    }

    /// Road graph edges as a GeoJSON feature collection.
    pub fn road_graph_geojson(&self) -> PyResult<String> {
        to_geojson_string(self.inner.road_graph()).map_err(|e| runtime_error("GeoJSON export failed", e))
    }

    fn __repr__(&self) -> String {
        let graph = self.inner.road_graph();
        format!(
            "ModelDomain with {} nodes, {} edges, {} buildings and {} sinks",
            graph.node_count(),
            graph.edge_count(),
            self.inner.buildings().len(),
            self.inner.sinks().len()
        )
    }
}

/// Directed graph of candidate sewer edges between road junctions,
/// buildings and sinks.
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "ConnectionGraph")]
pub struct PyConnectionGraph {
    pub(crate) inner: ConnectionGraph,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyConnectionGraph {
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Re-weights every edge with a new pump penalty.
    pub fn apply_pump_penalty(&mut self, pump_penalty: f64) -> PyResult<()> {
        if !(pump_penalty > 0.0) {
            return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "pump_penalty must be positive, got {pump_penalty}"
            )));
        }
        apply_pump_penalty(&mut self.inner, pump_penalty);
        Ok(())
    }

    pub fn to_geojson(&self) -> PyResult<String> {
        to_geojson_string(&self.inner).map_err(|e| runtime_error("GeoJSON export failed", e))
    }

    fn __repr__(&self) -> String {
        format!(
            "ConnectionGraph with {} nodes and {} edges",
            self.inner.node_count(),
            self.inner.edge_count()
        )
    }
}
