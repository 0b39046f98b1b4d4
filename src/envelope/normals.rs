//! Per-point unit normals of an open polyline.

use kurbo::{Point, Vec2};

use crate::error::CurveError;
use crate::geom::right_normal;

/// Unit normals plus a count of points whose own tangent was too short.
#[derive(Debug, Clone, PartialEq)]
pub struct Normals {
    pub vectors: Vec<Vec2>,
    /// Points that took their normal from the nearest well-defined neighbor.
    pub borrowed: usize,
}

/// Estimate the right-hand unit normal at every point.
///
/// Tangents use central differences inside and one-sided differences at the
/// two ends. A point whose tangent vanishes (repeated coordinates) reuses the
/// normal of the nearest point that has one. Fails only when no point has a
/// usable tangent.
pub fn estimate(points: &[Point]) -> Result<Normals, CurveError> {
    let n = points.len();
    if n < 2 {
        return Err(CurveError::DegenerateGeometry(format!(
            "normals need at least 2 points, got {}",
            n
        )));
    }

    let own: Vec<Option<Vec2>> = (0..n)
        .map(|i| {
            let prev = points[i.saturating_sub(1)];
            let next = points[(i + 1).min(n - 1)];
            right_normal(next - prev)
        })
        .collect();

    if own.iter().all(Option::is_none) {
        return Err(CurveError::DegenerateGeometry(
            "normal is undefined at every point".to_string(),
        ));
    }

    let mut borrowed = 0;
    let vectors = (0..n)
        .map(|i| match own[i] {
            Some(v) => v,
            None => {
                borrowed += 1;
                nearest_defined(&own, i)
            }
        })
        .collect();

    Ok(Normals { vectors, borrowed })
}

fn nearest_defined(own: &[Option<Vec2>], i: usize) -> Vec2 {
    for d in 1..own.len() {
        let candidates = [i.checked_sub(d), Some(i + d).filter(|&j| j < own.len())];
        for j in candidates.into_iter().flatten() {
            if let Some(v) = own[j] {
                return v;
            }
        }
    }
    Vec2::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn straight_line_normals_point_right() {
        let pts: Vec<Point> = (0..5).map(|i| Point::new(i as f64, 0.0)).collect();
        let normals = estimate(&pts).unwrap();
        assert_eq!(normals.borrowed, 0);
        for v in &normals.vectors {
            assert_abs_diff_eq!(v.x, 0.0);
            assert_abs_diff_eq!(v.y, -1.0);
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let pts: Vec<Point> = (0..30)
            .map(|i| {
                let a = i as f64 * 0.1;
                Point::new(a.cos() * 7.0, a.sin() * 3.0)
            })
            .collect();
        for v in estimate(&pts).unwrap().vectors {
            assert_abs_diff_eq!(v.hypot(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn repeated_points_borrow_a_neighbor() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        let normals = estimate(&pts).unwrap();
        assert_eq!(normals.borrowed, 1);
        assert_abs_diff_eq!(normals.vectors[3].y, -1.0);
    }

    #[test]
    fn all_identical_points_are_degenerate() {
        let pts = vec![Point::new(4.0, 4.0); 6];
        assert!(estimate(&pts).unwrap_err().is_degenerate());
    }
}
