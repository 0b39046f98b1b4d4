//! Frame normalizer: per-segment canonical frames.
//!
//! The frame of a segment is anchored at the midpoint `M` of its start/end
//! chord. Its 2x2 matrix `F` rotates the chord onto +x; the translation
//! `Z = -F·M` moves the midpoint to the origin, so the start point lands on
//! `(-h, 0)` and the end point on `(h, 0)` with `h` half the chord length.
//!
//! Normalized: `P = F·X + Z`. Raw: `X = F⁻¹·(P - Z)`.

use kurbo::{Affine, Point, Vec2};

use crate::error::CurveError;
use crate::geom::{all_finite, GEOMETRY_EPSILON};
use crate::segment::Segment;

/// Determinants below this make a frame non-invertible.
const MIN_DETERMINANT: f64 = 1e-12;

/// Canonical frame of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    forward: Affine,
    inverse: Affine,
    midpoint: Point,
}

impl Frame {
    /// Build the frame from a segment's start and end point.
    ///
    /// Fails with `DegenerateGeometry` when the chord has zero length.
    pub fn from_endpoints(start: Point, end: Point) -> Result<Self, CurveError> {
        if !all_finite(&[start, end]) {
            return Err(CurveError::DegenerateGeometry(
                "segment endpoints are not finite".to_string(),
            ));
        }
        let chord = end - start;
        let len = chord.hypot();
        if len <= GEOMETRY_EPSILON {
            return Err(CurveError::DegenerateGeometry(format!(
                "zero-length chord at ({:.3}, {:.3})",
                start.x, start.y
            )));
        }
        let tangent = chord / len;
        Self::from_axes(start.midpoint(end), tangent)
    }

    /// Rebuild a frame from its Z-vector (see [`Frame::z_vector`]).
    ///
    /// Only the midpoint and tangent are read; the normal is implied.
    pub fn from_z_vector(z: &[f64; 6]) -> Result<Self, CurveError> {
        let tangent = Vec2::new(z[2], z[3]);
        let len = tangent.hypot();
        if !len.is_finite() || len <= GEOMETRY_EPSILON {
            return Err(CurveError::DegenerateGeometry(
                "Z-vector tangent has zero length".to_string(),
            ));
        }
        Self::from_axes(Point::new(z[0], z[1]), tangent / len)
    }

    fn from_axes(midpoint: Point, tangent: Vec2) -> Result<Self, CurveError> {
        // Rows of F: the chord direction, then its left-hand perpendicular.
        let rotation = Affine::new([tangent.x, -tangent.y, tangent.y, tangent.x, 0.0, 0.0]);
        let z = -(rotation * midpoint).to_vec2();
        let forward = Affine::new([tangent.x, -tangent.y, tangent.y, tangent.x, z.x, z.y]);

        let det = forward.determinant();
        if !det.is_finite() || det.abs() < MIN_DETERMINANT {
            return Err(CurveError::DegenerateGeometry(format!(
                "frame is not invertible (det = {:e})",
                det
            )));
        }
        Ok(Self {
            forward,
            inverse: forward.inverse(),
            midpoint,
        })
    }

    pub fn midpoint(&self) -> Point {
        self.midpoint
    }

    /// The 2x2 matrix `F`, row-major.
    pub fn matrix(&self) -> [[f64; 2]; 2] {
        let [a, b, c, d, _, _] = self.forward.as_coeffs();
        [[a, c], [b, d]]
    }

    /// The translation `Z = -F·M`.
    pub fn translation(&self) -> Vec2 {
        self.forward.translation()
    }

    /// Homogeneous 3x3 form `[F, Z; 0 0 1]`.
    pub fn homogeneous(&self) -> [[f64; 3]; 3] {
        let [[a, c], [b, d]] = self.matrix();
        let z = self.translation();
        [[a, c, z.x], [b, d, z.y], [0.0, 0.0, 1.0]]
    }

    /// Unit chord direction in raw coordinates.
    pub fn tangent(&self) -> Vec2 {
        let [[a, c], _] = self.matrix();
        Vec2::new(a, c)
    }

    /// Unit direction of the frame's +y axis in raw coordinates.
    pub fn normal(&self) -> Vec2 {
        let t = self.tangent();
        Vec2::new(-t.y, t.x)
    }

    /// Compact frame encoding: `[M.x, M.y, T.x, T.y, N.x, N.y]`.
    pub fn z_vector(&self) -> [f64; 6] {
        let t = self.tangent();
        let n = self.normal();
        [self.midpoint.x, self.midpoint.y, t.x, t.y, n.x, n.y]
    }

    pub fn to_frame(&self, p: Point) -> Point {
        self.forward * p
    }

    pub fn to_raw(&self, p: Point) -> Point {
        self.inverse * p
    }
}

/// Express a segment in its own canonical frame.
pub fn normalize(segment: &Segment) -> Result<(Vec<Point>, Frame), CurveError> {
    let frame = Frame::from_endpoints(segment.endpoints.0, segment.endpoints.1)?;
    if !all_finite(&segment.points) {
        return Err(CurveError::DegenerateGeometry(
            "segment contains non-finite coordinates".to_string(),
        ));
    }
    let normalized = segment.points.iter().map(|&p| frame.to_frame(p)).collect();
    Ok((normalized, frame))
}

/// Map in-frame coordinates back to raw coordinates.
pub fn denormalize(normalized: &[Point], frame: &Frame) -> Vec<Point> {
    normalized.iter().map(|&p| frame.to_raw(p)).collect()
}
