//! Envelope synthesis: offset bounds and corridors around a normalized segment.
//!
//! 1. Unit normals from finite-difference tangents
//! 2. Outer bound at `+scale * normal`, inner bound at `-scale * normal`
//! 3. Uniformity check of the per-point offsets
//! 4. Linear corridors from the segment to each bound
//!
//! For a counter-clockwise trace the outer bound lies outside the outline.

pub mod corridor;
pub mod normals;

use kurbo::{Point, Vec2};

use crate::config::CurveConfig;
use crate::error::CurveError;
use crate::geom::GEOMETRY_EPSILON;

pub use corridor::corridor;

/// Relative offset spread that always counts as uniform. Unit normals
/// scaled by one constant only differ by rounding.
const UNIFORMITY_FLOOR: f64 = GEOMETRY_EPSILON;

/// Outer and inner bound curves with the displacement that produced each point.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub outer: Vec<Point>,
    pub inner: Vec<Point>,
    /// `outer[i] - segment[i]`: the unit normal scaled by `+scale`, so a
    /// corridor built from it ends exactly on the bound.
    pub outer_dist: Vec<Vec2>,
    /// `inner[i] - segment[i]`: the unit normal scaled by `-scale`.
    pub inner_dist: Vec<Vec2>,
    /// Points whose normal came from a neighbor.
    pub borrowed_normals: usize,
}

/// Spread of per-point offset lengths to one bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniformity {
    pub mean: f64,
    /// Largest `|len - mean| / mean` over all points.
    pub max_deviation: f64,
}

impl Uniformity {
    pub fn of(displacement: &[Vec2]) -> Self {
        if displacement.is_empty() {
            return Self { mean: 0.0, max_deviation: 0.0 };
        }
        let lengths: Vec<f64> = displacement.iter().map(|d| d.hypot()).collect();
        let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
        let max_deviation = if mean > 0.0 {
            lengths
                .iter()
                .map(|l| (l - mean).abs() / mean)
                .fold(0.0, f64::max)
        } else {
            0.0
        };
        Self { mean, max_deviation }
    }
}

/// A segment's full envelope in its canonical frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub bounds: Bounds,
    /// Segment (index 0) to outer bound (last index).
    pub outer_corridor: Vec<Vec<Point>>,
    /// Segment (index 0) to inner bound (last index).
    pub inner_corridor: Vec<Vec<Point>>,
    pub outer_uniformity: Uniformity,
    pub inner_uniformity: Uniformity,
    /// Whether either side exceeded the uniformity tolerance.
    pub non_uniform: bool,
}

impl Envelope {
    pub fn iterations(&self) -> usize {
        self.outer_corridor.len().saturating_sub(1)
    }

    /// The curve at index 0 of both corridors.
    pub fn segment(&self) -> &[Point] {
        &self.outer_corridor[0]
    }

    /// Every curve of the envelope, farthest outer first:
    /// outer `K..=1`, the segment, inner `1..=K`. `2K + 1` curves.
    pub fn bundle(&self) -> Vec<&[Point]> {
        let mut curves: Vec<&[Point]> = Vec::with_capacity(2 * self.iterations() + 1);
        curves.extend(self.outer_corridor.iter().rev().map(Vec::as_slice));
        curves.extend(self.inner_corridor.iter().skip(1).map(Vec::as_slice));
        curves
    }
}

/// Outer and inner bounds at distance `scale` along the local normals.
pub fn bounds(normalized: &[Point], scale: f64) -> Result<Bounds, CurveError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(CurveError::InvalidConfiguration(format!(
            "envelope scale must be positive, got {}",
            scale
        )));
    }
    let normals = normals::estimate(normalized)?;

    let outer_dist: Vec<Vec2> = normals.vectors.iter().map(|&n| n * scale).collect();
    let inner_dist: Vec<Vec2> = normals.vectors.iter().map(|&n| n * -scale).collect();
    let outer = offset(normalized, &outer_dist);
    let inner = offset(normalized, &inner_dist);

    Ok(Bounds {
        outer,
        inner,
        outer_dist,
        inner_dist,
        borrowed_normals: normals.borrowed,
    })
}

fn offset(points: &[Point], displacement: &[Vec2]) -> Vec<Point> {
    points.iter().zip(displacement).map(|(&p, &d)| p + d).collect()
}

/// Bounds, uniformity check and both corridors for one normalized segment.
///
/// Non-uniform offsets are logged and flagged, or rejected with
/// `DegenerateGeometry` when `config.strict_uniformity` is set.
pub fn synthesize(normalized: &[Point], config: &CurveConfig) -> Result<Envelope, CurveError> {
    let bounds = bounds(normalized, config.envelope_scale)?;

    let outer_uniformity = Uniformity::of(&bounds.outer_dist);
    let inner_uniformity = Uniformity::of(&bounds.inner_dist);
    let worst = outer_uniformity.max_deviation.max(inner_uniformity.max_deviation);
    let tolerance = config.uniformity_tolerance.max(UNIFORMITY_FLOOR);
    let non_uniform = worst > tolerance;
    if non_uniform {
        if config.strict_uniformity {
            return Err(CurveError::DegenerateGeometry(format!(
                "envelope offsets vary by {:.3e} (tolerance {:.3e})",
                worst, tolerance
            )));
        }
        log::warn!(
            "envelope offsets vary by {:.3e} (tolerance {:.3e})",
            worst,
            tolerance
        );
    }

    let outer_corridor = corridor(normalized, &bounds.outer_dist, config.envelope_iterations)?;
    let inner_corridor = corridor(normalized, &bounds.inner_dist, config.envelope_iterations)?;

    Ok(Envelope {
        bounds,
        outer_corridor,
        inner_corridor,
        outer_uniformity,
        inner_uniformity,
        non_uniform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bump(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let x = i as f64 - (n - 1) as f64 / 2.0;
                Point::new(x, -(x * 0.3).cos() * 5.0)
            })
            .collect()
    }

    #[test]
    fn bounds_sit_at_scale_on_opposite_sides() {
        let seg = bump(21);
        let b = bounds(&seg, 4.0).unwrap();
        for i in 0..seg.len() {
            assert_abs_diff_eq!(b.outer[i].distance(seg[i]), 4.0, epsilon = 1e-12);
            assert_abs_diff_eq!(b.inner[i].distance(seg[i]), 4.0, epsilon = 1e-12);
            assert_abs_diff_eq!(b.outer[i].distance(b.inner[i]), 8.0, epsilon = 1e-12);
            let sum = b.outer_dist[i] + b.inner_dist[i];
            assert_abs_diff_eq!(sum.hypot(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn synthesis_is_idempotent() {
        let seg = bump(15);
        let config = CurveConfig { envelope_iterations: 6, ..Default::default() };
        let a = synthesize(&seg, &config).unwrap();
        let b = synthesize(&seg, &config).unwrap();
        assert_eq!(a, b);
        assert!(!a.non_uniform);
        assert_abs_diff_eq!(a.outer_uniformity.mean, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn corridor_ends_match_segment_and_bounds() {
        let seg = bump(15);
        let config = CurveConfig { envelope_iterations: 4, ..Default::default() };
        let env = synthesize(&seg, &config).unwrap();
        assert_eq!(env.iterations(), 4);
        assert_eq!(env.outer_corridor[0], seg);
        assert_eq!(env.inner_corridor[0], seg);
        assert_eq!(env.outer_corridor[4], env.bounds.outer);
        assert_eq!(env.inner_corridor[4], env.bounds.inner);
    }

    #[test]
    fn bundle_runs_outer_to_inner() {
        let seg = bump(9);
        let config = CurveConfig { envelope_iterations: 3, ..Default::default() };
        let env = synthesize(&seg, &config).unwrap();
        let bundle = env.bundle();
        assert_eq!(bundle.len(), 7);
        assert_eq!(bundle[0], env.bounds.outer.as_slice());
        assert_eq!(bundle[3], seg.as_slice());
        assert_eq!(bundle[6], env.bounds.inner.as_slice());
        assert_eq!(env.segment(), seg.as_slice());
    }

    #[test]
    fn uniformity_flags_uneven_offsets() {
        let even = [Vec2::new(0.0, 2.0), Vec2::new(2.0, 0.0)];
        assert_abs_diff_eq!(Uniformity::of(&even).max_deviation, 0.0);
        let uneven = [Vec2::new(0.0, 1.0), Vec2::new(3.0, 0.0)];
        let u = Uniformity::of(&uneven);
        assert_abs_diff_eq!(u.mean, 2.0);
        assert_abs_diff_eq!(u.max_deviation, 0.5);
    }

    #[test]
    fn zero_tolerance_ignores_rounding_noise() {
        let seg = bump(31);
        let config = CurveConfig {
            envelope_scale: 3.7,
            envelope_iterations: 2,
            uniformity_tolerance: 0.0,
            strict_uniformity: true,
            ..Default::default()
        };
        let env = synthesize(&seg, &config).unwrap();
        assert!(!env.non_uniform);
        assert!(env.outer_uniformity.max_deviation <= UNIFORMITY_FLOOR);
    }

    #[test]
    fn rejects_bad_scale_and_flat_segments() {
        let seg = bump(5);
        assert!(bounds(&seg, 0.0).unwrap_err().is_invalid_configuration());
        let flat = vec![Point::new(1.0, 1.0); 5];
        assert!(bounds(&flat, 1.0).unwrap_err().is_degenerate());
    }
}
