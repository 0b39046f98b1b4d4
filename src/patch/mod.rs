//! Image patch mapping: envelope curves → stacked intensity profiles.
//!
//! Each curve of a segment's envelope bundle is mapped from the canonical
//! frame back to pixel coordinates, sampled bilinearly, and written as one
//! column of the patch. The assembled matrix is Gaussian-blurred.

pub mod blur;
pub mod sample;

use image::{ImageBuffer, Luma};
use kurbo::Point;

use crate::error::CurveError;
use crate::frame::Frame;

pub use sample::Raster;

/// Intensity matrix for one segment: one row per curve point, one column per
/// envelope curve (farthest outer on the left, farthest inner on the right).
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    rows: usize,
    cols: usize,
    /// Row-major values.
    data: Vec<f64>,
    /// Samples whose pixel position fell outside the image and was clamped.
    pub clamped_samples: usize,
}

impl Patch {
    /// (rows, columns) = (points per curve, curves per bundle).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The profile of one curve.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Single-channel float image, `cols` wide and `rows` tall.
    pub fn to_image(&self) -> ImageBuffer<Luma<f32>, Vec<f32>> {
        ImageBuffer::from_fn(self.cols as u32, self.rows as u32, |x, y| {
            Luma([self.get(y as usize, x as usize) as f32])
        })
    }
}

/// Sample `image` along every curve of `bundle` and blur the result.
///
/// Curves are in `frame` coordinates; all must have the same length.
pub fn map_patch<R: Raster + ?Sized>(
    bundle: &[&[Point]],
    image: &R,
    frame: &Frame,
    sigma: f64,
) -> Result<Patch, CurveError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(CurveError::InvalidConfiguration(
            "image has zero area".to_string(),
        ));
    }
    let cols = bundle.len();
    let rows = bundle.first().map_or(0, |c| c.len());
    if cols == 0 || rows == 0 {
        return Err(CurveError::InvalidConfiguration(
            "empty envelope bundle".to_string(),
        ));
    }
    if let Some(bad) = bundle.iter().find(|c| c.len() != rows) {
        return Err(CurveError::InvalidConfiguration(format!(
            "envelope curves differ in length ({} vs {})",
            bad.len(),
            rows
        )));
    }

    let mut data = vec![0.0; rows * cols];
    let mut clamped_samples = 0;
    for (col, curve) in bundle.iter().enumerate() {
        for (row, &p) in curve.iter().enumerate() {
            let s = sample::bilinear(image, frame.to_raw(p));
            clamped_samples += s.clamped as usize;
            data[row * cols + col] = s.value;
        }
    }

    blur::gaussian_blur(&mut data, cols, rows, sigma);

    Ok(Patch {
        rows,
        cols,
        data,
        clamped_samples,
    })
}
