//! Closed outline traces.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use kurbo::Point;

use crate::error::CurveError;
use crate::geom::{all_finite, cumulative_length, signed_area, to_points};

/// An ordered, closed sequence of 2-D points in pixel coordinates
/// (x = column, y = row).
///
/// There is no explicit closing point: the last point connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    points: Vec<Point>,
}

impl Trace {
    /// Build a trace from ordered points.
    ///
    /// A trailing point equal to the first is dropped. Requires at least
    /// three finite points. Repeated consecutive points, as mask contours
    /// produce, are kept.
    pub fn new(mut points: Vec<Point>) -> Result<Self, CurveError> {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(CurveError::InvalidConfiguration(format!(
                "trace needs at least 3 points, got {}",
                points.len()
            )));
        }
        if !all_finite(&points) {
            return Err(CurveError::DegenerateGeometry(
                "trace contains non-finite coordinates".to_string(),
            ));
        }
        Ok(Self { points })
    }

    pub fn from_coords(coords: &[(f64, f64)]) -> Result<Self, CurveError> {
        Self::new(to_points(coords))
    }

    /// Trace the largest outer boundary of a binary mask.
    ///
    /// Non-zero pixels are foreground. Boundary points are pixel centers,
    /// so they index straight into the source image.
    pub fn from_mask(mask: &GrayImage) -> Result<Self, CurveError> {
        let largest = find_contours::<i32>(mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.points.len() >= 3)
            .map(|contour| {
                contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x as f64, p.y as f64))
                    .collect::<Vec<_>>()
            })
            .max_by(|a, b| signed_area(a).abs().total_cmp(&signed_area(b).abs()))
            .ok_or(CurveError::NoContours)?;

        Self::new(largest)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area; positive for counter-clockwise traces.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.points)
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() >= 0.0
    }

    /// Closed perimeter length.
    pub fn perimeter(&self) -> f64 {
        cumulative_length(&self.points, true)
            .last()
            .copied()
            .unwrap_or(0.0)
    }

    /// The same outline with counter-clockwise point order.
    ///
    /// The start point is kept; only the direction of travel flips.
    pub fn oriented_ccw(&self) -> Self {
        if self.is_counter_clockwise() {
            return self.clone();
        }
        let mut points = Vec::with_capacity(self.points.len());
        points.push(self.points[0]);
        points.extend(self.points[1..].iter().rev());
        Self { points }
    }

    /// Resample to `n` points evenly spaced by arc length around the closed outline.
    ///
    /// The first point is kept in place.
    pub fn resample(&self, n: usize) -> Result<Self, CurveError> {
        if n < 3 {
            return Err(CurveError::InvalidConfiguration(format!(
                "cannot resample a trace to {} points",
                n
            )));
        }
        let lengths = cumulative_length(&self.points, true);
        let perimeter = lengths[lengths.len() - 1];
        if perimeter <= crate::geom::GEOMETRY_EPSILON {
            return Err(CurveError::DegenerateGeometry(
                "trace has zero perimeter".to_string(),
            ));
        }

        let count = self.points.len();
        let step = perimeter / n as f64;
        let mut out = Vec::with_capacity(n);
        let mut edge = 0;
        for k in 0..n {
            let target = k as f64 * step;
            while edge + 1 < lengths.len() - 1 && lengths[edge + 1] < target {
                edge += 1;
            }
            let a = self.points[edge];
            let b = self.points[(edge + 1) % count];
            let span = lengths[edge + 1] - lengths[edge];
            let t = if span > 0.0 { (target - lengths[edge]) / span } else { 0.0 };
            out.push(a.lerp(b, t.clamp(0.0, 1.0)));
        }
        Self::new(out)
    }
}
