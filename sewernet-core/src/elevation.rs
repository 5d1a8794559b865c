//! Terrain sampling
//!
//! The pipeline only needs point samples and profiles along edge
//! geometries, so any raster source can be plugged in through
//! [`ElevationModel`].

use geo::{LineString, Point};

use crate::geometry::{interpolate, path_length, sample_chainages};
use crate::model::{Profile, ProfilePoint};
use crate::preprocessing::crs::Crs;
use crate::{Error, Result};

pub trait ElevationModel {
    /// Ground elevation in meters at `point`.
    fn elevation_at(&self, point: Point<f64>) -> Result<f64>;

    fn crs(&self) -> Option<Crs>;

    /// Elevation sampled every `dx` meters along `line` plus the exact end.
    fn profile_along(&self, line: &LineString<f64>, dx: f64) -> Result<Profile> {
        let length = path_length(line);
        sample_chainages(length, dx)
            .into_iter()
            .map(|chainage| {
                let point = interpolate(line, chainage).ok_or_else(|| {
                    Error::InvalidGeometry("cannot sample an empty line".to_string())
                })?;
                Ok(ProfilePoint::new(chainage, self.elevation_at(point)?))
            })
            .collect()
    }
}

impl<T: ElevationModel + ?Sized> ElevationModel for Box<T> {
    fn elevation_at(&self, point: Point<f64>) -> Result<f64> {
        (**self).elevation_at(point)
    }

    fn crs(&self) -> Option<Crs> {
        (**self).crs()
    }

    fn profile_along(&self, line: &LineString<f64>, dx: f64) -> Result<Profile> {
        (**self).profile_along(line, dx)
    }
}

/// Surface at elevation zero, used when running without terrain data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub crs: Option<Crs>,
}

impl ElevationModel for FlatTerrain {
    fn elevation_at(&self, _point: Point<f64>) -> Result<f64> {
        Ok(0.0)
    }

    fn crs(&self) -> Option<Crs> {
        self.crs
    }
}

/// North-up raster held in memory.
#[derive(Debug, Clone)]
pub struct GridElevation {
    /// x of the left edge of the first column
    pub origin_x: f64,
    /// y of the top edge of the first row
    pub origin_y: f64,
    pub cell_size: f64,
    pub rows: usize,
    pub cols: usize,
    /// Row-major cell values
    pub values: Vec<f64>,
    pub nodata: Option<f64>,
    pub crs: Option<Crs>,
}

impl GridElevation {
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        cell_size: f64,
        rows: usize,
        cols: usize,
        values: Vec<f64>,
    ) -> Result<Self> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Err(Error::InvalidData(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }
        if values.len() != rows * cols {
            return Err(Error::InvalidData(format!(
                "expected {} raster values for {rows}x{cols}, got {}",
                rows * cols,
                values.len()
            )));
        }
        Ok(Self {
            origin_x,
            origin_y,
            cell_size,
            rows,
            cols,
            values,
            nodata: None,
            crs: None,
        })
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Replaces every nodata cell with `fill`; afterwards every cell is valid.
    pub fn fill_nodata(&mut self, fill: f64) {
        if let Some(nodata) = self.nodata {
            let mut filled = 0usize;
            for value in self.values.iter_mut().filter(|v| is_nodata(**v, nodata)) {
                *value = fill;
                filled += 1;
            }
            log::debug!("Filled {filled} nodata cells with {fill}");
        }
        self.nodata = None;
    }

    fn cell(&self, point: Point<f64>) -> Option<usize> {
        let col = ((point.x() - self.origin_x) / self.cell_size).floor();
        let row = ((self.origin_y - point.y()) / self.cell_size).floor();
        if !(0.0..self.cols as f64).contains(&col) || !(0.0..self.rows as f64).contains(&row) {
            return None;
        }
        Some(row as usize * self.cols + col as usize)
    }
}

fn is_nodata(value: f64, nodata: f64) -> bool {
    value.is_nan() || value == nodata
}

impl ElevationModel for GridElevation {
    fn elevation_at(&self, point: Point<f64>) -> Result<f64> {
        let unavailable = || Error::ElevationUnavailable {
            x: point.x(),
            y: point.y(),
        };
        let value = self
            .cell(point)
            .and_then(|idx| self.values.get(idx).copied())
            .ok_or_else(unavailable)?;
        let rounded = (value * 100.0).round() / 100.0;
        if value.is_nan() || self.nodata.is_some_and(|nodata| rounded == nodata) {
            return Err(unavailable());
        }
        Ok(rounded)
    }

    fn crs(&self) -> Option<Crs> {
        self.crs
    }
}
