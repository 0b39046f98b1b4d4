//! Segmenter: fixed-length windows over a closed trace.

use kurbo::Point;

use crate::error::CurveError;

/// One fixed-length window of a trace, in raw pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Position of this segment in the curve's segment bank.
    pub index: usize,
    /// Index of the first window point in the trace it was cut from
    /// (`Curve::trace` for segments owned by a curve).
    pub offset: usize,
    /// Raw coordinates, `length` points.
    pub points: Vec<Point>,
    /// First and last point, recorded before any frame transform or smoothing.
    pub endpoints: (Point, Point),
}

impl Segment {
    fn new(index: usize, offset: usize, points: Vec<Point>) -> Self {
        let endpoints = (points[0], points[points.len() - 1]);
        Self {
            index,
            offset,
            points,
            endpoints,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Midpoint of the start-to-end chord (not the centroid).
    pub fn midpoint(&self) -> Point {
        self.endpoints.0.midpoint(self.endpoints.1)
    }
}

/// Number of linear windows: `floor((T - L) / S) + 1`, or `None` when `L > T`.
pub fn segment_count(trace_len: usize, length: usize, step: usize) -> Option<usize> {
    if length > trace_len || step == 0 {
        return None;
    }
    Some((trace_len - length) / step + 1)
}

/// Slice a trace into windows of `length` points starting at `0, step, 2*step, ...`,
/// stopping before a window would run past the last point.
pub fn segment(trace: &[Point], length: usize, step: usize) -> Result<Vec<Segment>, CurveError> {
    check_window(trace.len(), length, step)?;
    let count = segment_count(trace.len(), length, step).ok_or_else(|| too_long(trace.len(), length))?;

    Ok((0..count)
        .map(|index| {
            let offset = index * step;
            Segment::new(index, offset, trace[offset..offset + length].to_vec())
        })
        .collect())
}

/// Cyclic variant of [`segment`]: windows start at every `step` offset below
/// the trace length and wrap past the last point back to the first.
///
/// Yields `ceil(T / S)` segments.
pub fn segment_wrapped(
    trace: &[Point],
    length: usize,
    step: usize,
) -> Result<Vec<Segment>, CurveError> {
    check_window(trace.len(), length, step)?;
    let n = trace.len();

    Ok((0..n)
        .step_by(step)
        .enumerate()
        .map(|(index, offset)| {
            let points = (0..length).map(|k| trace[(offset + k) % n]).collect();
            Segment::new(index, offset, points)
        })
        .collect())
}

fn check_window(trace_len: usize, length: usize, step: usize) -> Result<(), CurveError> {
    if length < 2 {
        return Err(CurveError::InvalidConfiguration(format!(
            "segment length must be at least 2, got {}",
            length
        )));
    }
    if step == 0 {
        return Err(CurveError::InvalidConfiguration(
            "segment step must be positive".to_string(),
        ));
    }
    if length > trace_len {
        return Err(too_long(trace_len, length));
    }
    Ok(())
}

fn too_long(trace_len: usize, length: usize) -> CurveError {
    CurveError::InvalidConfiguration(format!(
        "segment length {} exceeds trace length {}",
        length, trace_len
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn count_matches_formula() {
        for (t, l, s) in [(360, 30, 30), (100, 10, 7), (50, 50, 3), (301, 300, 30), (17, 3, 1)] {
            let segments = segment(&line(t), l, s).unwrap();
            assert_eq!(segments.len(), (t - l) / s + 1, "T={} L={} S={}", t, l, s);
            assert_eq!(Some(segments.len()), segment_count(t, l, s));
        }
    }

    #[test]
    fn windows_are_contiguous_slices() {
        let trace = line(20);
        let segments = segment(&trace, 5, 4).unwrap();
        assert_eq!(segments.len(), 4);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(seg.offset, i * 4);
            assert_eq!(seg.points, trace[i * 4..i * 4 + 5].to_vec());
            assert_eq!(seg.endpoints, (trace[i * 4], trace[i * 4 + 4]));
        }
        assert_eq!(segments[1].midpoint(), Point::new(6.0, 0.0));
    }

    #[test]
    fn too_long_segment_is_invalid() {
        let err = segment(&line(10), 11, 1).unwrap_err();
        assert!(err.is_invalid_configuration());
        assert_eq!(segment_count(10, 11, 1), None);
    }

    #[test]
    fn zero_step_is_invalid() {
        assert!(segment(&line(10), 3, 0).unwrap_err().is_invalid_configuration());
    }

    #[test]
    fn wrapped_windows_cover_every_offset() {
        let trace = line(10);
        let segments = segment_wrapped(&trace, 4, 3).unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3].offset, 9);
        assert_eq!(
            segments[3].points,
            vec![trace[9], trace[0], trace[1], trace[2]]
        );
    }
}
