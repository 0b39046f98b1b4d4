//! The `Curve`: owner of every segment-level array derived from one trace.
//!
//! All per-segment data lives in flat vectors indexed by segment position.
//! Any change to the trace or configuration rebuilds every array together;
//! patches are dropped until [`Curve::map_patches`] runs again.

use std::ops::AddAssign;
use std::time::Instant;

use kurbo::Point;
use rayon::prelude::*;

use crate::config::{CurveConfig, SmoothMethod};
use crate::envelope::{self, Envelope};
use crate::error::CurveError;
use crate::frame::{self, Frame};
use crate::patch::{self, Patch, Raster};
use crate::segment::{self, Segment};
use crate::smooth;
use crate::trace::Trace;

/// Counts of numerical issues that were tolerated rather than raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Points whose envelope normal was taken from a neighbor.
    pub borrowed_normals: usize,
    /// Segments whose bound offsets exceeded the uniformity tolerance.
    pub non_uniform_envelopes: usize,
    /// Patch samples clamped into the image.
    pub clamped_samples: usize,
}

impl AddAssign for Diagnostics {
    fn add_assign(&mut self, other: Self) {
        self.borrowed_normals += other.borrowed_normals;
        self.non_uniform_envelopes += other.non_uniform_envelopes;
        self.clamped_samples += other.clamped_samples;
    }
}

/// Segment bank, frames, envelopes and patches for one closed trace.
#[derive(Debug, Clone)]
pub struct Curve {
    /// The trace as supplied by the caller.
    source: Trace,
    /// The trace the segments were cut from; `Segment::offset` indexes it.
    trace: Trace,
    config: CurveConfig,
    segments: Vec<Segment>,
    frames: Vec<Frame>,
    /// Current in-frame coordinates (smoothed when smoothing ran).
    normalized: Vec<Vec<Point>>,
    envelopes: Vec<Envelope>,
    patches: Vec<Patch>,
    smoothed: bool,
    diagnostics: Diagnostics,
}

impl Curve {
    /// Segment, normalize, optionally smooth, and synthesize envelopes.
    pub fn new(trace: Trace, config: CurveConfig) -> Result<Self, CurveError> {
        let mut curve = Self {
            trace: trace.clone(),
            source: trace,
            config,
            segments: Vec::new(),
            frames: Vec::new(),
            normalized: Vec::new(),
            envelopes: Vec::new(),
            patches: Vec::new(),
            smoothed: false,
            diagnostics: Diagnostics::default(),
        };
        curve.rebuild()?;
        Ok(curve)
    }

    /// Replace the configuration and rebuild everything.
    ///
    /// On error the curve keeps its previous state.
    pub fn set_config(&mut self, config: CurveConfig) -> Result<(), CurveError> {
        let rebuilt = Curve::new(self.source.clone(), config)?;
        *self = rebuilt;
        Ok(())
    }

    /// Replace the trace and rebuild everything.
    ///
    /// On error the curve keeps its previous state.
    pub fn set_trace(&mut self, trace: Trace) -> Result<(), CurveError> {
        let rebuilt = Curve::new(trace, self.config.clone())?;
        *self = rebuilt;
        Ok(())
    }

    fn rebuild(&mut self) -> Result<(), CurveError> {
        let t_start = Instant::now();
        self.config.validate()?;

        self.trace = if self.config.orient_trace {
            self.source.oriented_ccw()
        } else {
            self.source.clone()
        };
        let trace = &self.trace;

        let size = self.config.segment_size;
        let step = self.config.segment_steps;
        let segments = if self.config.wrap_segments {
            segment::segment_wrapped(trace.points(), size, step)?
        } else {
            segment::segment(trace.points(), size, step)?
        };
        log::info!(
            "  Segment     {} points \u{2192} {} segments (size {}, step {})",
            trace.len(),
            segments.len(),
            size,
            step,
        );

        let normalized: Vec<(Vec<Point>, Frame)> = segments
            .par_iter()
            .map(|seg| frame::normalize(seg).map_err(|e| e.at_segment(seg.index)))
            .collect::<Result<_, _>>()?;
        let (normalized, frames): (Vec<_>, Vec<_>) = normalized.into_iter().unzip();

        self.segments = segments;
        self.frames = frames;
        self.normalized = normalized;
        self.smoothed = false;

        if self.config.smooth {
            self.smooth_in_place(self.config.smooth_span, self.config.smooth_method)?;
        } else {
            self.synthesize_envelopes()?;
        }

        log::info!(
            "  Envelope    {} corridors \u{00d7} {} curves, scale {}  ({}ms)",
            self.envelopes.len(),
            self.config.bundle_len(),
            self.config.envelope_scale,
            t_start.elapsed().as_millis(),
        );
        Ok(())
    }

    /// Regenerate every envelope from the current in-frame coordinates.
    /// Drops patches, which depend on the envelopes.
    fn synthesize_envelopes(&mut self) -> Result<(), CurveError> {
        let config = &self.config;
        let envelopes: Vec<Envelope> = self
            .normalized
            .par_iter()
            .enumerate()
            .map(|(i, norm)| envelope::synthesize(norm, config).map_err(|e| e.at_segment(i)))
            .collect::<Result<_, _>>()?;

        let mut diagnostics = Diagnostics::default();
        for env in &envelopes {
            diagnostics += Diagnostics {
                borrowed_normals: env.bounds.borrowed_normals,
                non_uniform_envelopes: env.non_uniform as usize,
                clamped_samples: 0,
            };
        }
        if diagnostics.borrowed_normals > 0 || diagnostics.non_uniform_envelopes > 0 {
            log::warn!(
                "envelopes: {} borrowed normals, {} non-uniform segments",
                diagnostics.borrowed_normals,
                diagnostics.non_uniform_envelopes,
            );
        }

        self.envelopes = envelopes;
        self.patches.clear();
        self.diagnostics = diagnostics;
        Ok(())
    }

    /// Smooth every normalized segment, then rebuild envelopes.
    ///
    /// Frames are untouched. Smoothing always starts from the unsmoothed
    /// segments, so calling this twice does not compound.
    pub fn smooth(&mut self, span: f64, method: SmoothMethod) -> Result<(), CurveError> {
        let mut config = self.config.clone();
        config.smooth = true;
        config.smooth_span = span;
        config.smooth_method = method;
        self.set_config(config)
    }

    fn smooth_in_place(&mut self, span: f64, method: SmoothMethod) -> Result<(), CurveError> {
        let smoothed: Vec<Vec<Point>> = self
            .normalized
            .par_iter()
            .enumerate()
            .map(|(i, norm)| smooth::smooth(norm, span, method).map_err(|e| e.at_segment(i)))
            .collect::<Result<_, _>>()?;
        log::debug!("smoothed {} segments ({:?}, span {})", smoothed.len(), method, span);

        self.normalized = smoothed;
        self.smoothed = true;
        self.synthesize_envelopes()
    }

    /// Build one patch per segment from `image`.
    ///
    /// Replaces any earlier patches. Aborts on the first failing segment.
    pub fn map_patches<R: Raster + ?Sized>(&mut self, image: &R) -> Result<&[Patch], CurveError> {
        let t_start = Instant::now();
        let sigma = self.config.gaussian_sigma;
        let patches: Vec<Patch> = self
            .envelopes
            .par_iter()
            .zip(self.frames.par_iter())
            .enumerate()
            .map(|(i, (env, frame))| {
                patch::map_patch(&env.bundle(), image, frame, sigma).map_err(|e| e.at_segment(i))
            })
            .collect::<Result<_, _>>()?;

        let clamped: usize = patches.iter().map(|p| p.clamped_samples).sum();
        if clamped > 0 {
            log::debug!("{} patch samples clamped into the image", clamped);
        }
        self.diagnostics.clamped_samples = clamped;
        self.patches = patches;

        let (rows, cols) = self.patches.first().map_or((0, 0), Patch::shape);
        log::info!(
            "  Patch       {} patches of {}\u{00d7}{}, sigma {}  ({}ms)",
            self.patches.len(),
            rows,
            cols,
            sigma,
            t_start.elapsed().as_millis(),
        );
        Ok(&self.patches)
    }

    /// The trace the segments were cut from: the supplied trace, reordered
    /// counter-clockwise when `orient_trace` is set. `Segment::offset`
    /// indexes into its points.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The trace exactly as supplied to [`Curve::new`] or [`Curve::set_trace`].
    pub fn original_trace(&self) -> &Trace {
        &self.source
    }

    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_smoothed(&self) -> bool {
        self.smoothed
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// In-frame coordinates of every segment (smoothed if smoothing ran).
    pub fn normalized_segments(&self) -> &[Vec<Point>] {
        &self.normalized
    }

    pub fn envelopes(&self) -> &[Envelope] {
        &self.envelopes
    }

    /// Empty until [`Curve::map_patches`] has run for the current configuration.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn envelope(&self, index: usize) -> Option<&Envelope> {
        self.envelopes.get(index)
    }

    pub fn patch(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    /// Current in-frame coordinates of a segment mapped back to pixel space.
    ///
    /// Equals the raw segment unless smoothing ran.
    pub fn raw_segment(&self, index: usize) -> Option<Vec<Point>> {
        let norm = self.normalized.get(index)?;
        let frame = self.frames.get(index)?;
        Some(frame::denormalize(norm, frame))
    }

    /// Envelope curves of a segment in pixel space, in bundle order.
    pub fn raw_bundle(&self, index: usize) -> Option<Vec<Vec<Point>>> {
        let env = self.envelopes.get(index)?;
        let frame = self.frames.get(index)?;
        Some(
            env.bundle()
                .into_iter()
                .map(|curve| frame::denormalize(curve, frame))
                .collect(),
        )
    }

    /// One Z-vector per segment (see [`Frame::z_vector`]).
    pub fn z_vectors(&self) -> Vec<[f64; 6]> {
        self.frames.iter().map(Frame::z_vector).collect()
    }

    /// One row per segment: all in-frame x coordinates, then all y coordinates.
    pub fn flattened_segments(&self) -> Vec<Vec<f64>> {
        self.normalized
            .iter()
            .map(|norm| {
                norm.iter()
                    .map(|p| p.x)
                    .chain(norm.iter().map(|p| p.y))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::{GrayImage, Luma};

    fn circle(n: usize, radius: f64, center: Point) -> Trace {
        let pts = (0..n)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / n as f64;
                Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect();
        Trace::new(pts).unwrap()
    }

    fn clockwise(trace: &Trace) -> Trace {
        let mut pts = trace.points().to_vec();
        pts.reverse();
        Trace::new(pts).unwrap()
    }

    fn small_config() -> CurveConfig {
        CurveConfig {
            segment_size: 20,
            segment_steps: 10,
            envelope_scale: 3.0,
            envelope_iterations: 4,
            gaussian_sigma: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn offsets_index_the_segmented_trace() {
        let cw = clockwise(&circle(100, 30.0, Point::new(50.0, 50.0)));
        let curve = Curve::new(cw.clone(), small_config()).unwrap();
        assert_eq!(curve.original_trace(), &cw);
        assert!(curve.trace().is_counter_clockwise());
        for seg in curve.segments() {
            assert_eq!(curve.trace().points()[seg.offset], seg.points[0]);
        }

        let config = CurveConfig { orient_trace: false, ..small_config() };
        let curve = Curve::new(cw.clone(), config).unwrap();
        assert_eq!(curve.trace(), &cw);
        for seg in curve.segments() {
            assert_eq!(curve.trace().points()[seg.offset], seg.points[0]);
        }
    }

    #[test]
    fn repeated_points_surface_as_borrowed_normals() {
        let mut pts = circle(100, 30.0, Point::new(50.0, 50.0)).points().to_vec();
        pts.insert(11, pts[10]);
        let curve = Curve::new(Trace::new(pts).unwrap(), small_config()).unwrap();

        assert_eq!(curve.len(), 9);
        assert_eq!(curve.envelope(1).unwrap().bounds.borrowed_normals, 1);
        assert_eq!(curve.diagnostics().borrowed_normals, 1);
        assert_eq!(curve.diagnostics().non_uniform_envelopes, 0);
    }

    #[test]
    fn arrays_share_segment_indexing() {
        let curve = Curve::new(circle(100, 30.0, Point::new(50.0, 50.0)), small_config()).unwrap();
        assert_eq!(curve.len(), 9);
        assert_eq!(curve.frames().len(), 9);
        assert_eq!(curve.normalized_segments().len(), 9);
        assert_eq!(curve.envelopes().len(), 9);
        assert!(curve.patches().is_empty());
        for (i, seg) in curve.segments().iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(curve.frame(i).unwrap().midpoint(), seg.midpoint());
        }
        assert_eq!(curve.diagnostics(), Diagnostics::default());
    }

    #[test]
    fn patches_have_identical_shape() {
        let image = GrayImage::from_fn(100, 100, |x, y| Luma([((x + y) % 256) as u8]));
        let mut curve =
            Curve::new(circle(100, 30.0, Point::new(50.0, 50.0)), small_config()).unwrap();
        let patches = curve.map_patches(&image).unwrap();
        assert_eq!(patches.len(), 9);
        for p in patches {
            assert_eq!(p.shape(), (20, 9));
        }
        assert_eq!(curve.diagnostics().clamped_samples, 0);
    }

    #[test]
    fn reconfiguring_invalidates_patches() {
        let image = GrayImage::from_pixel(100, 100, Luma([10]));
        let mut curve =
            Curve::new(circle(100, 30.0, Point::new(50.0, 50.0)), small_config()).unwrap();
        curve.map_patches(&image).unwrap();
        assert_eq!(curve.patches().len(), 9);

        let config = CurveConfig { segment_steps: 20, ..small_config() };
        curve.set_config(config).unwrap();
        assert!(curve.patches().is_empty());
        assert_eq!(curve.len(), 5);
        assert_eq!(curve.envelopes().len(), 5);
    }

    #[test]
    fn failed_reconfiguration_keeps_previous_state() {
        let mut curve =
            Curve::new(circle(100, 30.0, Point::new(50.0, 50.0)), small_config()).unwrap();
        let config = CurveConfig { segment_size: 500, ..small_config() };
        assert!(curve.set_config(config).unwrap_err().is_invalid_configuration());
        assert_eq!(curve.len(), 9);
        assert_eq!(curve.config().segment_size, 20);
    }

    #[test]
    fn smoothing_keeps_frames_and_refreshes_envelopes() {
        let noisy: Vec<Point> = (0..120)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / 120.0;
                let r = 40.0 + if i % 2 == 0 { 0.8 } else { -0.8 };
                Point::new(60.0 + r * a.cos(), 60.0 + r * a.sin())
            })
            .collect();
        let mut curve = Curve::new(Trace::new(noisy).unwrap(), small_config()).unwrap();
        let frames_before = curve.frames().to_vec();
        let envelopes_before = curve.envelopes().to_vec();

        curve.smooth(0.5, SmoothMethod::Lowess).unwrap();
        assert!(curve.is_smoothed());
        assert_eq!(curve.frames(), frames_before.as_slice());
        assert_ne!(curve.envelopes(), envelopes_before.as_slice());
        for (env, norm) in curve.envelopes().iter().zip(curve.normalized_segments()) {
            assert_eq!(env.segment(), norm.as_slice());
        }
    }

    #[test]
    fn degenerate_segment_reports_its_index() {
        // Points 10..=19 collapse onto one spot, so segment 1 has a zero chord.
        let mut pts: Vec<Point> = (0..40).map(|i| Point::new(i as f64, (i * i) as f64 * 0.01)).collect();
        for p in pts.iter_mut().skip(10).take(10) {
            *p = Point::new(10.0, 1.0);
        }
        let config = CurveConfig {
            segment_size: 10,
            segment_steps: 10,
            orient_trace: false,
            ..small_config()
        };
        let err = Curve::new(Trace::new(pts).unwrap(), config).unwrap_err();
        assert!(err.is_degenerate());
        assert_eq!(err.segment_index(), Some(1));
    }

    #[test]
    fn vectorized_outputs_line_up() {
        let curve = Curve::new(circle(100, 30.0, Point::new(50.0, 50.0)), small_config()).unwrap();
        let z = curve.z_vectors();
        let flat = curve.flattened_segments();
        assert_eq!(z.len(), curve.len());
        assert_eq!(flat.len(), curve.len());
        assert_eq!(flat[0].len(), 40);
        let m = curve.segment(3).unwrap().midpoint();
        assert_abs_diff_eq!(z[3][0], m.x, epsilon = 1e-12);
        assert_abs_diff_eq!(z[3][1], m.y, epsilon = 1e-12);

        let raw = curve.raw_segment(3).unwrap();
        for (a, b) in raw.iter().zip(&curve.segment(3).unwrap().points) {
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
        }
        assert_eq!(curve.raw_bundle(3).unwrap().len(), 9);
    }
}
