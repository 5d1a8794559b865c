//! Planning parameters
//!
//! Every stage receives the section it needs by reference. Partial JSON
//! documents override the defaults key by key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clustering {
    /// Far-away buildings are attached through cluster centers
    #[default]
    Centers,
    /// Every building is attached to the road network directly
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Profile sampling step in meters
    pub dx: f64,
    /// Weight multiplier for edges that need a pump
    pub pump_penalty: f64,
    /// Buildings farther than this from any road are clustered
    pub max_connection_length: f64,
    pub clustering: Clustering,
    pub connect_buildings: bool,
    pub add_private_sewer: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            dx: 10.0,
            pump_penalty: 1000.0,
            max_connection_length: 30.0,
            clustering: Clustering::Centers,
            connect_buildings: true,
            add_private_sewer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub inhabitants_dwelling: f64,
    /// m³ per person and day
    pub daily_wastewater_person: f64,
    pub peak_factor: f64,
    /// Minimum pipe slope as elevation drop per meter (negative)
    pub min_slope: f64,
    /// Maximum trench depth in meters
    pub tmax: f64,
    /// Minimum trench depth in meters
    pub tmin: f64,
    /// Inflow trench depth for the pump check, 0 means `tmin`
    pub inflow_trench_depth: f64,
    /// Trench depth after a pump or lifting station, 0 means `tmin`
    pub min_trench_depth: f64,
    /// Available pipe diameters in meters, ascending
    pub diameters: Vec<f64>,
    /// Manning roughness coefficient
    pub roughness: f64,
    pub pressurized_diameter: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            inhabitants_dwelling: 3.0,
            daily_wastewater_person: 0.162,
            peak_factor: 2.3,
            min_slope: -0.01,
            tmax: 8.0,
            tmin: 0.25,
            inflow_trench_depth: 0.0,
            min_trench_depth: 0.0,
            diameters: vec![0.2, 0.3, 0.4, 0.5, 0.6, 0.8, 1.0],
            roughness: 0.013,
            pressurized_diameter: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_format: "geojson".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preprocessing: PreprocessingConfig,
    pub optimization: OptimizationConfig,
    pub export: ExportConfig,
}

impl Config {
    /// Defaults overridden by the keys present in `json`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let pre = &self.preprocessing;
        let opt = &self.optimization;
        let fail = |msg: String| Err(Error::InvalidConfig(msg));

        if !(pre.dx > 0.0) {
            return fail(format!("dx must be positive, got {}", pre.dx));
        }
        if !(pre.pump_penalty > 0.0) {
            return fail(format!("pump_penalty must be positive, got {}", pre.pump_penalty));
        }
        if opt.min_slope > 0.0 {
            return Err(Error::PositiveSlope(opt.min_slope));
        }
        if opt.tmin < 0.0 || opt.tmin > opt.tmax {
            return fail(format!(
                "trench depth bounds must satisfy 0 <= tmin <= tmax, got tmin={} tmax={}",
                opt.tmin, opt.tmax
            ));
        }
        if opt.diameters.is_empty() {
            return fail("diameter catalog is empty".to_string());
        }
        if opt.diameters.windows(2).any(|w| w[0] >= w[1]) {
            return fail(format!("diameters must be ascending, got {:?}", opt.diameters));
        }
        if !(opt.roughness > 0.0) {
            return fail(format!("roughness must be positive, got {}", opt.roughness));
        }
        Ok(())
    }

    /// Settings as `section_key` / value pairs.
    pub fn flatten(&self) -> Result<Vec<(String, Value)>> {
        let mut items = Vec::new();
        flatten_into(&serde_json::to_value(self)?, "", &mut items);
        Ok(items)
    }
}

fn flatten_into(value: &Value, prefix: &str, items: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}_{key}")
                };
                flatten_into(inner, &name, items);
            }
        }
        other => items.push((prefix.to_string(), other.clone())),
    }
}

/// Treats a zero depth as "use the minimum trench depth".
pub(crate) fn depth_or_tmin(depth: f64, tmin: f64) -> f64 {
    if depth == 0.0 { tmin } else { depth }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = Config::from_json_str(r#"{"optimization": {"tmax": 3.5}}"#).unwrap();
        assert_eq!(config.optimization.tmax, 3.5);
        assert_eq!(config.optimization.tmin, 0.25);
        assert_eq!(config.preprocessing.pump_penalty, 1000.0);
        assert_eq!(config.export.file_format, "geojson");
    }

    #[test]
    fn test_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(matches!(
            Config::from_json_str(r#"{"optimization": {"min_slope": 0.02}}"#),
            Err(Error::PositiveSlope(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"optimization": {"diameters": [0.3, 0.2]}}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"preprocessing": {"clustering": "none", "dx": 0}}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_flatten_names() {
        let items = Config::default().flatten().unwrap();
        let names: Vec<&str> = items.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"preprocessing_dx"));
        assert!(names.contains(&"optimization_diameters"));
        assert!(names.contains(&"export_file_format"));
    }
}
