use std::path::Path;

use image::{GrayImage, ImageReader};

use crate::error::CurveError;

/// Load an image from disk as an 8-bit single-channel raster.
///
/// Color images are converted to luma. The result is read-only for the rest
/// of the pipeline and can be shared across worker threads.
pub fn load_grayscale(path: &Path) -> Result<GrayImage, CurveError> {
    let img = ImageReader::open(path)
        .map_err(|e| CurveError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| CurveError::ImageLoad(e.to_string()))?
        .into_luma8();

    if img.width() == 0 || img.height() == 0 {
        return Err(CurveError::ImageLoad(format!(
            "{} has zero area",
            path.display()
        )));
    }
    log::debug!("loaded {} ({}x{})", path.display(), img.width(), img.height());

    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_image_load_error() {
        let err = load_grayscale(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, CurveError::ImageLoad(_)));
    }

    #[test]
    fn round_trips_through_png() {
        let dir = std::env::temp_dir().join("hypocurve-bitmap-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gradient.png");
        let img = GrayImage::from_fn(8, 4, |x, _| image::Luma([(x * 30) as u8]));
        img.save(&path).unwrap();

        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded.dimensions(), (8, 4));
        assert_eq!(loaded.get_pixel(3, 2).0[0], 90);
    }
}
