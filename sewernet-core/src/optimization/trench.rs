//! Trench-depth feasibility of gravity flow along a ground profile

use crate::config::{OptimizationConfig, depth_or_tmin};
use crate::model::{Profile, ProfilePoint};
use crate::{Error, Result};

/// Slope and depth bounds of a gravity trench.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrenchLimits {
    /// Minimum slope as drop per unit length, never positive
    pub min_slope: f64,
    pub tmax: f64,
    pub tmin: f64,
}

impl From<&OptimizationConfig> for TrenchLimits {
    fn from(config: &OptimizationConfig) -> Self {
        Self {
            min_slope: config.min_slope,
            tmax: config.tmax,
            tmin: config.tmin,
        }
    }
}

/// Result of [`needs_pump`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrenchCheck {
    pub needs_pump: bool,
    /// Trench depth below ground at the last profile point
    pub outflow_trench_depth: f64,
    /// Pipe invert level at every profile point
    pub invert_profile: Profile,
}

/// Checks whether a gravity pipe laid along `profile` stays within the
/// trench depth bounds.
///
/// The pipe starts `inflow_trench_depth` below ground (zero means `tmin`)
/// and drops at least `min_slope` per meter; wherever that leaves it
/// shallower than `tmin` it is lowered to `tmin`. As soon as keeping the
/// slope needs a trench deeper than `tmax` the edge needs a pump, and the
/// invert profile collapses to a flat line at `tmin`.
pub fn needs_pump(
    profile: &[ProfilePoint],
    limits: &TrenchLimits,
    inflow_trench_depth: f64,
) -> Result<TrenchCheck> {
    if limits.min_slope > 0.0 {
        return Err(Error::PositiveSlope(limits.min_slope));
    }
    let (Some(first), Some(last)) = (profile.first(), profile.last()) else {
        return Err(Error::InvalidData("empty elevation profile".to_string()));
    };

    let inflow = depth_or_tmin(inflow_trench_depth, limits.tmin);
    let mut invert = Vec::with_capacity(profile.len());
    invert.push(ProfilePoint::new(first.chainage, first.value - inflow));

    for pair in profile.windows(2) {
        let (prev, ground) = (pair[0], pair[1]);
        let current = invert.last().map_or(ground.value, |p| p.value);
        let next = (ground.chainage - prev.chainage) * limits.min_slope + current;

        if next < ground.value - limits.tmax {
            return Ok(TrenchCheck {
                needs_pump: true,
                outflow_trench_depth: limits.tmin,
                invert_profile: vec![
                    ProfilePoint::new(0.0, limits.tmin),
                    ProfilePoint::new(last.chainage, limits.tmin),
                ],
            });
        }
        let level = if next < ground.value - limits.tmin {
            next
        } else {
            ground.value - limits.tmin
        };
        invert.push(ProfilePoint::new(ground.chainage, level));
    }

    let outflow = invert.last().map_or(inflow, |p| last.value - p.value);
    Ok(TrenchCheck {
        needs_pump: false,
        outflow_trench_depth: outflow,
        invert_profile: invert,
    })
}

/// Mean depth of `invert` below `ground`, paired by position.
pub fn mean_trench_depth(ground: &[ProfilePoint], invert: &[ProfilePoint]) -> f64 {
    let depths: Vec<f64> = ground
        .iter()
        .zip(invert)
        .map(|(g, i)| g.value - i.value)
        .collect();
    if depths.is_empty() {
        return 0.0;
    }
    depths.iter().sum::<f64>() / depths.len() as f64
}
