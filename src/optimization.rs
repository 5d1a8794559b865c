use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::gen_stub_pyfunction;

use sewernet_core::model::ProfilePoint;
use sewernet_core::optimization::{self, TrenchLimits};
use sewernet_core::prelude::*;

fn value_error(e: Error) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{e}"))
}

/// Checks whether gravity flow along an elevation profile stays within
/// the trench depth bounds.
///
/// Parameters
/// ----------
/// profile : list[tuple[float, float]]
///     `(chainage, elevation)` pairs
/// min_slope : float
///     Minimum slope as drop per meter, must not be positive
/// tmax, tmin : float
///     Maximum and minimum trench depth in meters
/// inflow_trench_depth : float
///     Trench depth at the first point, 0 means `tmin`
///
/// Returns
/// -------
/// tuple[bool, float, list[tuple[float, float]]]
///     Pump flag, outflow trench depth and invert profile
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (profile, min_slope=-0.01, tmax=8.0, tmin=0.25, inflow_trench_depth=0.0))]
pub fn needs_pump(
    profile: Vec<(f64, f64)>,
    min_slope: f64,
    tmax: f64,
    tmin: f64,
    inflow_trench_depth: f64,
) -> PyResult<(bool, f64, Vec<(f64, f64)>)> {
    let profile: Vec<ProfilePoint> = profile.into_iter().map(ProfilePoint::from).collect();
    let limits = TrenchLimits {
        min_slope,
        tmax,
        tmin,
    };
    let check = optimization::needs_pump(&profile, &limits, inflow_trench_depth).map_err(value_error)?;
    Ok((
        check.needs_pump,
        check.outflow_trench_depth,
        check
            .invert_profile
            .iter()
            .map(|p| (p.chainage, p.value))
            .collect(),
    ))
}

/// Capacity in m³/s of a half-full circular pipe.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (diameter, roughness=0.013, slope=-0.01))]
pub fn mannings_equation(diameter: f64, roughness: f64, slope: f64) -> PyResult<f64> {
    optimization::mannings_equation(diameter, roughness, slope).map_err(value_error)
}

/// Smallest diameter of `diameters` carrying more than `flow`.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
#[pyo3(signature = (flow, diameters, roughness=0.013, slope=-0.01))]
pub fn select_diameter(flow: f64, diameters: Vec<f64>, roughness: f64, slope: f64) -> PyResult<f64> {
    optimization::select_diameter(flow, &diameters, roughness, slope).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("Diameter selection failed: {e}"))
    })
}

/// Default settings as `(section_key, json_value)` pairs.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction]
pub fn default_settings() -> PyResult<Vec<(String, String)>> {
    let items = Config::default()
        .flatten()
        .map_err(|e| crate::runtime_error("Failed to encode settings", e))?;
    Ok(items
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect())
}
