use crate::error::CurveError;

/// All segment, envelope, smoothing and patch parameters in one struct.
///
/// Changing any field invalidates every derived array of a [`Curve`](crate::Curve);
/// use [`Curve::set_config`](crate::Curve::set_config) to rebuild them together.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveConfig {
    // -- Segmenter --
    /// Points per segment. Must be at least 3.
    pub segment_size: usize,
    /// Offset between the first points of neighboring segments.
    pub segment_steps: usize,
    /// Window the closed trace cyclically instead of stopping at its last point.
    pub wrap_segments: bool,
    /// Reverse clockwise traces so the outer envelope lies outside the outline.
    pub orient_trace: bool,

    // -- Envelope --
    /// Distance from a normalized segment to each envelope bound.
    pub envelope_scale: f64,
    /// Number of corridor curves between a segment and each bound.
    pub envelope_iterations: usize,
    /// Relative spread of per-point bound offsets that passes without a warning.
    /// Values below `1e-12` act as `1e-12`; rounding noise never counts.
    pub uniformity_tolerance: f64,
    /// Fail with `DegenerateGeometry` instead of warning on non-uniform bounds.
    pub strict_uniformity: bool,

    // -- Smoother --
    /// Smooth normalized segments while building the curve.
    pub smooth: bool,
    /// Fraction of the segment used by each local window, in (0, 1].
    pub smooth_span: f64,
    /// Local regression variant.
    pub smooth_method: SmoothMethod,

    // -- Patch --
    /// Gaussian sigma (in patch cells) for the final blur. 0 = no blur.
    pub gaussian_sigma: f64,
}

/// Local regression variant used by the smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothMethod {
    /// Unweighted centered moving average.
    Moving,
    /// Tricube-weighted local linear regression.
    #[default]
    Lowess,
    /// Tricube-weighted local quadratic regression.
    Loess,
    /// Lowess with bisquare robustness iterations.
    RLowess,
    /// Loess with bisquare robustness iterations.
    RLoess,
}

impl SmoothMethod {
    /// Degree of the local polynomial, or `None` for the moving average.
    pub fn degree(self) -> Option<usize> {
        match self {
            SmoothMethod::Moving => None,
            SmoothMethod::Lowess | SmoothMethod::RLowess => Some(1),
            SmoothMethod::Loess | SmoothMethod::RLoess => Some(2),
        }
    }

    pub fn is_robust(self) -> bool {
        matches!(self, SmoothMethod::RLowess | SmoothMethod::RLoess)
    }
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            segment_size: 300,
            segment_steps: 30,
            wrap_segments: false,
            orient_trace: true,
            envelope_scale: 4.0,
            envelope_iterations: 25,
            uniformity_tolerance: 1e-6,
            strict_uniformity: false,
            smooth: false,
            smooth_span: 0.25,
            smooth_method: SmoothMethod::Lowess,
            gaussian_sigma: 3.0,
        }
    }
}

impl CurveConfig {
    /// Check every field that does not depend on the trace.
    ///
    /// Trace-dependent checks (segment size vs. trace length) happen in the segmenter.
    pub fn validate(&self) -> Result<(), CurveError> {
        if self.segment_size < 3 {
            return Err(invalid(format!(
                "segment size must be at least 3, got {}",
                self.segment_size
            )));
        }
        if self.segment_steps == 0 {
            return Err(invalid("segment step must be positive".to_string()));
        }
        if !(self.envelope_scale.is_finite() && self.envelope_scale > 0.0) {
            return Err(invalid(format!(
                "envelope scale must be positive, got {}",
                self.envelope_scale
            )));
        }
        if self.envelope_iterations == 0 {
            return Err(invalid("envelope iterations must be positive".to_string()));
        }
        if !(self.uniformity_tolerance.is_finite() && self.uniformity_tolerance >= 0.0) {
            return Err(invalid(format!(
                "uniformity tolerance must be non-negative, got {}",
                self.uniformity_tolerance
            )));
        }
        check_span(self.smooth_span)?;
        if !(self.gaussian_sigma.is_finite() && self.gaussian_sigma >= 0.0) {
            return Err(invalid(format!(
                "gaussian sigma must be non-negative, got {}",
                self.gaussian_sigma
            )));
        }
        Ok(())
    }

    /// Number of curves in one segment's full envelope bundle.
    pub fn bundle_len(&self) -> usize {
        2 * self.envelope_iterations + 1
    }
}

pub(crate) fn check_span(span: f64) -> Result<(), CurveError> {
    if span.is_finite() && span > 0.0 && span <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("smoothing span must be in (0, 1], got {}", span)))
    }
}

fn invalid(msg: String) -> CurveError {
    CurveError::InvalidConfiguration(msg)
}
