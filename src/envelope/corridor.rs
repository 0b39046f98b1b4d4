//! Corridor interpolation between a segment and one envelope bound.

use kurbo::{Point, Vec2};

use crate::error::CurveError;

/// Interpolation fraction of every corridor curve, `i / iterations` for `i = 0..=iterations`.
pub fn fractions(iterations: usize) -> Vec<f64> {
    (0..=iterations)
        .map(|i| i as f64 / iterations as f64)
        .collect()
}

/// Curves from the segment (index 0) to its bound (index `iterations`).
///
/// `curve[i] = segment + (i / iterations) * displacement`. The last curve is
/// bit-identical to `segment + displacement`, which is how bounds are built.
pub fn corridor(
    segment: &[Point],
    displacement: &[Vec2],
    iterations: usize,
) -> Result<Vec<Vec<Point>>, CurveError> {
    if iterations == 0 {
        return Err(CurveError::InvalidConfiguration(
            "corridor needs at least one iteration".to_string(),
        ));
    }
    if segment.len() != displacement.len() {
        return Err(CurveError::InvalidConfiguration(format!(
            "segment has {} points but {} displacements",
            segment.len(),
            displacement.len()
        )));
    }

    Ok(fractions(iterations)
        .into_iter()
        .map(|t| {
            segment
                .iter()
                .zip(displacement)
                .map(|(&p, &d)| p + d * t)
                .collect()
        })
        .collect())
}
