//! Pipe capacity and diameter selection

use std::f64::consts::PI;

use crate::{Error, Result};

/// Capacity in m³/s of a half-full circular pipe after Manning's equation.
///
/// `slope` uses the drop convention and must not be positive; its
/// magnitude is the hydraulic gradient.
pub fn mannings_equation(diameter: f64, roughness: f64, slope: f64) -> Result<f64> {
    if slope > 0.0 {
        return Err(Error::PositiveSlope(slope));
    }
    if !(roughness > 0.0) {
        return Err(Error::InvalidData(format!(
            "roughness must be positive, got {roughness}"
        )));
    }
    let area = 0.5 * PI * (diameter / 2.0).powi(2);
    let wetted_perimeter = 0.5 * PI * diameter;
    if wetted_perimeter <= 0.0 {
        return Ok(0.0);
    }
    let hydraulic_radius = area / wetted_perimeter;
    let velocity = hydraulic_radius.powf(2.0 / 3.0) * slope.abs().sqrt() / roughness;
    Ok(velocity * area)
}

/// Smallest catalog diameter whose capacity is strictly greater than
/// `target_flow`. The catalog must be sorted ascending.
pub fn select_diameter(
    target_flow: f64,
    diameters: &[f64],
    roughness: f64,
    slope: f64,
) -> Result<f64> {
    for &diameter in diameters {
        if mannings_equation(diameter, roughness, slope)? > target_flow {
            return Ok(diameter);
        }
    }
    Err(Error::InsufficientDiameter {
        flow: target_flow,
        max_diameter: diameters.last().copied().unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: [f64; 7] = [0.2, 0.3, 0.4, 0.5, 0.6, 0.8, 1.0];

    #[test]
    fn test_mannings_half_meter_pipe() {
        let q = mannings_equation(0.5, 0.012, -0.01).unwrap();
        assert_eq!((q * 1000.0).round() / 1000.0, 0.205);
    }

    #[test]
    fn test_mannings_rejects_positive_slope() {
        assert!(matches!(
            mannings_equation(0.5, 0.012, 0.01),
            Err(Error::PositiveSlope(_))
        ));
    }

    #[test]
    fn test_select_smallest_sufficient_diameter() {
        let slope = -0.01;
        for target in [0.0, 0.01, 0.05, 0.1, 0.2, 0.5] {
            let d = select_diameter(target, &CATALOG, 0.013, slope).unwrap();
            assert!(mannings_equation(d, 0.013, slope).unwrap() >= target);
            let smaller = CATALOG.iter().take_while(|c| **c < d);
            for c in smaller {
                assert!(mannings_equation(*c, 0.013, slope).unwrap() <= target);
            }
        }
    }

    #[test]
    fn test_select_exhausted_catalog() {
        let result = select_diameter(100.0, &CATALOG, 0.013, -0.01);
        assert!(matches!(
            result,
            Err(Error::InsufficientDiameter { max_diameter, .. }) if max_diameter == 1.0
        ));
    }
}
