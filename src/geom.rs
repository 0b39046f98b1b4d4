//! Shared geometry utilities.

use kurbo::{Point, Vec2};

/// Chords and tangents shorter than this are treated as zero-length.
pub const GEOMETRY_EPSILON: f64 = 1e-12;

/// Signed area of a closed polyline via the shoelace formula.
///
/// Positive = counter-clockwise, negative = clockwise.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            points[i].x * points[j].y - points[j].x * points[i].y
        })
        .sum::<f64>()
        / 2.0
}

/// Cumulative arc length at every vertex, starting at 0.
///
/// With `closed`, one extra entry holds the full perimeter
/// (including the edge from the last point back to the first).
pub fn cumulative_length(points: &[Point], closed: bool) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len() + 1);
    let mut total = 0.0;
    lengths.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        lengths.push(total);
    }
    if closed {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            total += last.distance(*first);
            lengths.push(total);
        }
    }
    lengths
}

/// Right-hand normal of a tangent: (ty, -tx), normalized.
///
/// For a counter-clockwise outline this points away from the enclosed region.
/// Returns `None` when the tangent is too short to define a direction.
pub fn right_normal(tangent: Vec2) -> Option<Vec2> {
    let len = tangent.hypot();
    if !len.is_finite() || len <= GEOMETRY_EPSILON {
        return None;
    }
    Some(Vec2::new(tangent.y / len, -tangent.x / len))
}

pub fn all_finite(points: &[Point]) -> bool {
    points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
}

pub fn to_points(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}
