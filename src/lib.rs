//! hypocurve: closed contour → normalized segments, envelopes and image patches.
//!
//! Cuts a closed hypocotyl outline into fixed-length overlapping segments,
//! expresses each in a canonical frame centered on its chord midpoint, builds
//! a corridor of offset curves around it, and samples the source image along
//! that corridor into one blurred intensity patch per segment.
//!
//! # Example
//!
//! ```no_run
//! use hypocurve::{process, CurveConfig, Trace};
//! use std::path::Path;
//!
//! let image = hypocurve::bitmap::load_grayscale(Path::new("frame_0001.png"))?;
//! let mask = hypocurve::bitmap::load_grayscale(Path::new("mask_0001.png"))?;
//! let trace = Trace::from_mask(&mask)?.resample(800)?;
//! let curve = process(trace, &image, &CurveConfig::default())?;
//! // curve.patches()[i] belongs to curve.segments()[i]
//! # Ok::<(), hypocurve::CurveError>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod curve;
mod geom;

pub mod bitmap;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod patch;
pub mod segment;
pub mod smooth;
pub mod trace;

// Re-export kurbo so downstream users get the same Point/Vec2 types.
pub use kurbo;

pub use config::{CurveConfig, SmoothMethod};
pub use curve::{Curve, Diagnostics};
pub use envelope::Envelope;
pub use error::CurveError;
pub use frame::Frame;
pub use patch::{Patch, Raster};
pub use segment::Segment;
pub use trace::Trace;

use std::time::Instant;

/// Full pipeline: trace + image → segments, frames, envelopes and patches.
///
/// Any segment that fails aborts the run; the error carries its index.
pub fn process<R: Raster + ?Sized>(
    trace: Trace,
    image: &R,
    config: &CurveConfig,
) -> Result<Curve, CurveError> {
    let t_start = Instant::now();
    let (w, h) = image.dimensions();
    log::info!(
        "  Load        {} trace points, {}x{} px image",
        trace.len(),
        w,
        h
    );

    let mut curve = Curve::new(trace, config.clone())?;
    curve.map_patches(image)?;

    let diag = curve.diagnostics();
    log::info!(
        "  Result      {} segments \u{00b7} {} borrowed normals \u{00b7} {} non-uniform \u{00b7} {} clamped  ({}ms)",
        curve.len(),
        diag.borrowed_normals,
        diag.non_uniform_envelopes,
        diag.clamped_samples,
        t_start.elapsed().as_millis(),
    );
    Ok(curve)
}
