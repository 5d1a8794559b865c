//! Parsing of input geometries into planar `geo` types
//!
//! WKT input may carry Z or M ordinates; parsing keeps x and y only.

use geo::{Centroid, Geometry, LineString, Point};
use wkt::TryFromWkt;

use crate::{Error, Result};

/// Parses WKT into a 2-D geometry, dropping any third or fourth ordinate.
pub fn parse_wkt(wkt: &str) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from_wkt_str(wkt)
        .map_err(|e| Error::InvalidGeometry(format!("Failed to parse WKT: {e}")))
}

pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Linear parts of a road geometry. Any non-linear member is rejected.
pub fn line_parts(geometry: &Geometry<f64>) -> Result<Vec<LineString<f64>>> {
    match geometry {
        Geometry::Line(line) => Ok(vec![LineString::from(vec![line.start, line.end])]),
        Geometry::LineString(line) => Ok(vec![line.clone()]),
        Geometry::MultiLineString(lines) => Ok(lines.0.clone()),
        Geometry::GeometryCollection(collection) => {
            let mut parts = Vec::new();
            for member in &collection.0 {
                parts.extend(line_parts(member)?);
            }
            Ok(parts)
        }
        other => Err(Error::InvalidGeometry(format!(
            "expected LineString or MultiLineString, found {}",
            geometry_kind(other)
        ))),
    }
}

/// Point standing in for a building: the point itself, the first member
/// of a multipoint or a footprint centroid.
///
/// Geometry kinds other than points and polygons are `InvalidGeometry`.
/// Empty geometries and non-finite coordinates yield `None`.
pub fn representative_point(geometry: &Geometry<f64>) -> Result<Option<Point<f64>>> {
    let point = match geometry {
        Geometry::Point(point) => Some(*point),
        Geometry::MultiPoint(points) => points.0.first().copied(),
        Geometry::Polygon(polygon) => polygon.centroid(),
        Geometry::MultiPolygon(polygons) => polygons.centroid(),
        other => {
            return Err(Error::InvalidGeometry(format!(
                "expected Point or Polygon, found {}",
                geometry_kind(other)
            )));
        }
    };
    Ok(point.filter(|p| p.x().is_finite() && p.y().is_finite()))
}
