use pyo3::prelude::*;
use pyo3::types::PyDict;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};
use wkt::ToWkt;

use sewernet_core::export::{nodes_to_geojson, to_geojson_string};
use sewernet_core::prelude::*;

use crate::model::{PyConnectionGraph, parse_config};
use crate::{key_tuple, node_key, runtime_error};

/// SewerGraph
///
/// Routed sewer tree draining every connected building into the sinks.
/// Hydraulic attributes are filled in by `estimate_peakflow` followed by
/// `calculate_hydraulic_parameters`.
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "SewerGraph")]
pub struct PySewerGraph {
    pub(crate) inner: SewerGraph,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PySewerGraph {
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Sets peak flow, average daily flow and population equivalents on
    /// every node from the buildings upstream of it.
    #[pyo3(signature = (config_json=None))]
    pub fn estimate_peakflow(&mut self, config_json: Option<&str>) -> PyResult<()> {
        let config = parse_config(config_json)?;
        estimate_peakflow(&mut self.inner, &config.optimization);
        Ok(())
    }

    /// Places pumps and lifting stations and sizes every pipe draining
    /// into `sinks`.
    #[pyo3(signature = (sinks, config_json=None, include_private_sewer=true))]
    pub fn calculate_hydraulic_parameters(
        &mut self,
        py: Python<'_>,
        sinks: Vec<(f64, f64)>,
        config_json: Option<&str>,
        include_private_sewer: bool,
    ) -> PyResult<()> {
        let config = parse_config(config_json)?;
        let sinks = sinks.into_iter().map(node_key).collect::<PyResult<Vec<_>>>()?;
        py.detach(|| {
            calculate_hydraulic_parameters(&mut self.inner, &sinks, &config.optimization, include_private_sewer)
                .map_err(|e| runtime_error("Hydraulic calculation failed", e))
        })
    }

    /// Summary of buildings, pipe lengths and pumps.
    pub fn info<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let info = sewer_info(&self.inner);
        let dict = PyDict::new(py);
        dict.set_item("total_buildings", info.total_buildings)?;
        dict.set_item("pressurized_length", info.pressurized_length)?;
        dict.set_item("gravity_length", info.gravity_length)?;
        dict.set_item("lifting_stations", info.lifting_stations)?;
        dict.set_item("pumping_stations", info.pumping_stations)?;
        dict.set_item("private_pumps", info.private_pumps)?;
        Ok(dict)
    }

    pub fn to_geojson(&self) -> PyResult<String> {
        to_geojson_string(&self.inner).map_err(|e| runtime_error("GeoJSON export failed", e))
    }

    pub fn nodes_to_geojson(&self) -> PyResult<String> {
        let collection =
            nodes_to_geojson(&self.inner).map_err(|e| runtime_error("GeoJSON export failed", e))?;
        serde_json::to_string(&collection).map_err(|e| runtime_error("GeoJSON export failed", e.into()))
    }

    /// Edge geometries as WKT, in edge order.
    pub fn edges_wkt(&self) -> Vec<String> {
        self.inner
            .edges()
            .map(|(_, _, edge)| edge.geometry.to_wkt().to_string())
            .collect()
    }

    /// Writes the edges to `path` as `"geojson"` or `"csv"`.
    #[pyo3(signature = (path, file_format="geojson"))]
    pub fn export(&self, path: &str, file_format: &str) -> PyResult<()> {
        export_sewer_network(&self.inner, path, file_format).map_err(|e| runtime_error("Export failed", e))
    }

    /// Nodes without any pipe.
    pub fn isolated_nodes(&self) -> Vec<(f64, f64)> {
        self.inner.isolated_nodes().into_iter().map(key_tuple).collect()
    }

    /// Buildings without a path to any sink.
    pub fn unreached_terminals(&self) -> Vec<(f64, f64)> {
        self.inner.unreached_terminals().into_iter().map(key_tuple).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "SewerGraph with {} nodes and {} edges",
            self.inner.node_count(),
            self.inner.edge_count()
        )
    }
}

/// Connects every building of the connection graph to a tree grown from
/// `sinks`, skipping the buildings in `skip_nodes`.
///
/// Parameters
/// ----------
/// connection_graph : ConnectionGraph
///     Graph produced by `ModelDomain.generate_connection_graph`
/// sinks : list[tuple[float, float]]
///     Treatment plant nodes
/// skip_nodes : list[tuple[float, float]], optional
///     Buildings left out of the routing
///
/// Raises
/// ------
/// RuntimeError
///     If a sink is missing or no building can be connected
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (connection_graph, sinks, skip_nodes=Vec::new()))]
pub fn rsph_tree(
    py: Python<'_>,
    connection_graph: &PyConnectionGraph,
    sinks: Vec<(f64, f64)>,
    skip_nodes: Vec<(f64, f64)>,
) -> PyResult<PySewerGraph> {
    let sinks = sinks.into_iter().map(node_key).collect::<PyResult<Vec<_>>>()?;
    let skip_nodes = skip_nodes.into_iter().map(node_key).collect::<PyResult<Vec<_>>>()?;
    py.detach(|| {
        sewernet_core::routing::rsph_tree(&connection_graph.inner, &sinks, &skip_nodes)
            .map(|inner| PySewerGraph { inner })
            .map_err(|e| runtime_error("Routing failed", e))
    })
}
