//! Planar geometry helpers shared by the preprocessing stages

pub mod dims;
pub mod nearest;

pub use dims::{geometry_kind, line_parts, parse_wkt, representative_point};
pub use nearest::{SegmentHit, SegmentIndex, nearest_between};

use geo::{Coord, Euclidean, InterpolateLine, Length, LineString, Point};

/// Planar length of a polyline.
pub fn path_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}

/// Point at `distance` along `line`, clamped to its ends.
pub fn interpolate(line: &LineString<f64>, distance: f64) -> Option<Point<f64>> {
    Euclidean.point_at_distance_from_start(line, distance)
}

/// Chainages `0, dx, 2dx, ...` strictly below `length`, closed by `length` itself.
pub fn sample_chainages(length: f64, dx: f64) -> Vec<f64> {
    let mut chainages = Vec::new();
    if dx > 0.0 {
        let mut step = 0usize;
        loop {
            let chainage = step as f64 * dx;
            if chainage >= length {
                break;
            }
            chainages.push(chainage);
            step += 1;
        }
    }
    chainages.push(length);
    chainages
}

/// Perpendicular foot of `p` on segment `a`-`b`, clamped to the segment.
pub fn project_on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    let ab = b - a;
    let len2 = ab.x * ab.x + ab.y * ab.y;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len2).clamp(0.0, 1.0);
    Coord {
        x: a.x + t * ab.x,
        y: a.y + t * ab.y,
    }
}

/// Splits `line` at `at`, which must lie on it, cutting the segment closest to `at`.
pub fn split_line_at(line: &LineString<f64>, at: Coord<f64>) -> (LineString<f64>, LineString<f64>) {
    let coords = &line.0;
    let cut = line
        .lines()
        .enumerate()
        .map(|(i, segment)| {
            let foot = project_on_segment(at, segment.start, segment.end);
            (i, coord_distance(foot, at))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(i, _)| i);

    let mut head: Vec<Coord<f64>> = coords.iter().take(cut + 1).copied().collect();
    head.push(at);
    let mut tail = vec![at];
    tail.extend(coords.iter().skip(cut + 1).copied());
    (LineString::new(head), LineString::new(tail))
}

pub fn coord_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

pub fn is_finite(coord: Coord<f64>) -> bool {
    coord.x.is_finite() && coord.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn test_sample_chainages_closes_at_length() {
        assert_eq!(sample_chainages(15.0, 10.0), vec![0.0, 10.0, 15.0]);
        assert_eq!(sample_chainages(15.0, 15.0), vec![0.0, 15.0]);
        assert_eq!(sample_chainages(20.0, 10.0), vec![0.0, 10.0, 20.0]);
        assert_eq!(sample_chainages(0.0, 10.0), vec![0.0]);
    }

    #[test]
    fn test_projection_clamps_to_segment() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 10.0, y: 0.0 };
        assert_eq!(project_on_segment(Coord { x: 4.0, y: 3.0 }, a, b), Coord { x: 4.0, y: 0.0 });
        assert_eq!(project_on_segment(Coord { x: -4.0, y: 3.0 }, a, b), a);
        assert_eq!(project_on_segment(Coord { x: 14.0, y: -3.0 }, a, b), b);
    }

    #[test]
    fn test_split_line_at_inner_segment() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)];
        let (head, tail) = split_line_at(&line, Coord { x: 10.0, y: 4.0 });
        assert_eq!(head.0.len(), 3);
        assert_eq!(tail.0, vec![Coord { x: 10.0, y: 4.0 }, Coord { x: 10.0, y: 10.0 }]);
        assert!((path_length(&head) + path_length(&tail) - path_length(&line)).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_along_polyline() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0)];
        assert_eq!(path_length(&line), 20.0);
        let p = interpolate(&line, 15.0).unwrap();
        assert!((p.x() - 5.0).abs() < 1e-9);
        assert!((p.y() - 10.0).abs() < 1e-9);
    }
}
