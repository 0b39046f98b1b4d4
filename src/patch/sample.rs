//! Sub-pixel sampling of single-channel rasters.
//!
//! Coordinates are pixel centers: `(0, 0)` is the center of the top-left
//! pixel, `x` runs along columns and `y` along rows. Points outside the image
//! are clamped to the nearest valid position rather than rejected.

use std::ops::Deref;

use image::{ImageBuffer, Luma, Primitive};
use kurbo::Point;

/// Read-only single-channel image.
pub trait Raster: Sync {
    /// (width, height) in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Intensity at an in-bounds pixel.
    fn intensity(&self, x: u32, y: u32) -> f64;
}

impl<T, C> Raster for ImageBuffer<Luma<T>, C>
where
    T: Primitive + Into<f64> + Sync,
    C: Deref<Target = [T]> + Sync,
{
    fn dimensions(&self) -> (u32, u32) {
        ImageBuffer::dimensions(self)
    }

    fn intensity(&self, x: u32, y: u32) -> f64 {
        self.get_pixel(x, y).0[0].into()
    }
}

/// One bilinear sample and whether its position had to be clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub clamped: bool,
}

/// Bilinear interpolation over the 2x2 neighborhood at `p`.
///
/// The image must have non-zero area.
pub fn bilinear<R: Raster + ?Sized>(image: &R, p: Point) -> Sample {
    let (w, h) = image.dimensions();
    let max_x = (w - 1) as f64;
    let max_y = (h - 1) as f64;

    let (x, cx) = clamp_axis(p.x, max_x);
    let (y, cy) = clamp_axis(p.y, max_y);

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);

    let top = lerp(image.intensity(x0, y0), image.intensity(x1, y0), fx);
    let bottom = lerp(image.intensity(x0, y1), image.intensity(x1, y1), fx);

    Sample {
        value: lerp(top, bottom, fy),
        clamped: cx || cy,
    }
}

/// Clamp one coordinate into `[0, max]`. Non-finite values go to 0.
fn clamp_axis(v: f64, max: f64) -> (f64, bool) {
    if !v.is_finite() {
        return (0.0, true);
    }
    if v < 0.0 {
        (0.0, true)
    } else if v > max {
        (max, true)
    } else {
        (v, false)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
