//! Coordinate reference system checks for the input layers

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    /// Linear units (projected) as opposed to degrees (geographic)
    pub projected: bool,
}

impl Crs {
    pub fn projected(epsg: u32) -> Self {
        Self {
            epsg,
            projected: true,
        }
    }

    pub fn geographic(epsg: u32) -> Self {
        Self {
            epsg,
            projected: false,
        }
    }
}

/// Resolves the shared CRS of the elevation model, roads and buildings.
///
/// Layers without a CRS adopt the elevation model's. All declared codes
/// must be identical and projected.
pub fn resolve_crs(
    dem: Option<Crs>,
    roads: Option<Crs>,
    buildings: Option<Crs>,
) -> Result<Option<Crs>> {
    let roads = roads.or(dem);
    let buildings = buildings.or(dem);

    let declared: Vec<Crs> = [dem, roads, buildings].into_iter().flatten().collect();
    let Some(first) = declared.first().copied() else {
        log::warn!("No CRS declared on any input layer, skipping CRS checks");
        return Ok(None);
    };

    if declared.iter().any(|crs| crs.epsg != first.epsg) {
        let describe = |crs: Option<Crs>| {
            crs.map_or_else(|| "none".to_string(), |c| format!("EPSG:{}", c.epsg))
        };
        return Err(Error::CrsMismatch(format!(
            "dem {}, roads {}, buildings {}",
            describe(dem),
            describe(roads),
            describe(buildings)
        )));
    }
    if let Some(crs) = declared.iter().find(|crs| !crs.projected) {
        return Err(Error::GeographicCrs(crs.epsg));
    }
    Ok(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_adopt_dem_crs() {
        let crs = resolve_crs(Some(Crs::projected(25832)), None, None).unwrap();
        assert_eq!(crs, Some(Crs::projected(25832)));
    }

    #[test]
    fn test_mismatch_rejected() {
        let result = resolve_crs(
            Some(Crs::projected(25832)),
            Some(Crs::projected(25833)),
            None,
        );
        assert!(matches!(result, Err(Error::CrsMismatch(_))));
    }

    #[test]
    fn test_geographic_rejected() {
        let result = resolve_crs(None, Some(Crs::geographic(4326)), Some(Crs::geographic(4326)));
        assert!(matches!(result, Err(Error::GeographicCrs(4326))));
    }

    #[test]
    fn test_no_crs_is_allowed() {
        assert_eq!(resolve_crs(None, None, None).unwrap(), None);
    }
}
