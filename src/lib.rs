use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::define_stub_info_gatherer;

use model::{PyConnectionGraph, PyElevationGrid, PyModelDomain};
use optimization::{default_settings, mannings_equation, needs_pump, select_diameter};
use routing::{PySewerGraph, rsph_tree};

pub mod model;
pub mod optimization;
pub mod routing;

/// Maps a pipeline error to a Python `RuntimeError` with some context.
pub(crate) fn runtime_error(context: &str, e: sewernet_core::Error) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{context}: {e}"))
}

/// Parses a `(x, y)` pair into a node key.
pub(crate) fn node_key((x, y): (f64, f64)) -> PyResult<sewernet_core::model::NodeKey> {
    sewernet_core::model::NodeKey::new(x, y)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid node: {e}")))
}

pub(crate) fn key_tuple(key: sewernet_core::model::NodeKey) -> (f64, f64) {
    (key.x(), key.y())
}

/// Sewer network planning implemented in Rust.
#[pymodule]
fn sewernet(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyElevationGrid>()?;
    m.add_class::<PyModelDomain>()?;
    m.add_class::<PyConnectionGraph>()?;

    m.add_class::<PySewerGraph>()?;
    m.add_function(wrap_pyfunction!(rsph_tree, m)?)?;

    m.add_function(wrap_pyfunction!(needs_pump, m)?)?;
    m.add_function(wrap_pyfunction!(mannings_equation, m)?)?;
    m.add_function(wrap_pyfunction!(select_diameter, m)?)?;
    m.add_function(wrap_pyfunction!(default_settings, m)?)?;
    Ok(())
}

#[cfg(feature = "stubgen")]
define_stub_info_gatherer!(stub_info);
