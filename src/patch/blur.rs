//! Separable Gaussian blur over a row-major `f64` matrix with edge clamping.

/// Kernel radius in multiples of sigma.
const KERNEL_SIGMAS: f64 = 3.0;

/// Normalized 1-D Gaussian kernel of odd length.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (KERNEL_SIGMAS * sigma).ceil().max(1.0) as i64;
    let variance = sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-(x * x) as f64 / (2.0 * variance)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    kernel
}

/// Blur `data` (`height` rows of `width` values) in place.
///
/// Out-of-range taps reuse the nearest edge value, so a constant matrix
/// stays constant. `sigma <= 0` leaves the data untouched.
pub fn gaussian_blur(data: &mut [f64], width: usize, height: usize, sigma: f64) {
    if sigma <= 0.0 || width == 0 || height == 0 {
        return;
    }
    debug_assert_eq!(data.len(), width * height);
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;

    // Horizontal pass
    let source = data.to_vec();
    for y in 0..height {
        let row = &source[y * width..(y + 1) * width];
        for x in 0..width {
            data[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let sx = (x as i64 + i as i64 - radius).clamp(0, width as i64 - 1) as usize;
                    row[sx] * w
                })
                .sum();
        }
    }

    // Vertical pass
    let source = data.to_vec();
    for y in 0..height {
        for x in 0..width {
            data[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let sy = (y as i64 + i as i64 - radius).clamp(0, height as i64 - 1) as usize;
                    source[sy * width + x] * w
                })
                .sum();
        }
    }
}
