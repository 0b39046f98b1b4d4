//! Local regression smoothing of normalized segments.
//!
//! Each coordinate channel is smoothed independently as a function of the
//! point index. Smoothing never touches the canonical frame: the smoothed
//! in-frame coordinates map back to raw space through the same inverse.

use kurbo::Point;

use crate::config::{check_span, SmoothMethod};
use crate::error::CurveError;

/// Bisquare robustness passes for the robust variants.
const ROBUST_ITERATIONS: usize = 5;

/// Smooth in-frame segment coordinates.
///
/// `span` is the fraction of points in each local window, in (0, 1].
pub fn smooth(
    normalized: &[Point],
    span: f64,
    method: SmoothMethod,
) -> Result<Vec<Point>, CurveError> {
    check_span(span)?;
    let xs: Vec<f64> = normalized.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = normalized.iter().map(|p| p.y).collect();

    let sx = smooth_channel(&xs, span, method);
    let sy = smooth_channel(&ys, span, method);

    Ok(sx.into_iter().zip(sy).map(|(x, y)| Point::new(x, y)).collect())
}

/// Smooth one channel sampled at indices `0..n`.
pub fn smooth_channel(values: &[f64], span: f64, method: SmoothMethod) -> Vec<f64> {
    let n = values.len();
    let window = window_size(n, span);
    if n < 3 || window < 2 {
        return values.to_vec();
    }

    let Some(degree) = method.degree() else {
        return moving_average(values, window);
    };

    let unit = vec![1.0; n];
    let mut fitted = local_regression(values, window, degree, &unit);
    if method.is_robust() {
        for _ in 0..ROBUST_ITERATIONS {
            let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(v, f)| v - f).collect();
            let Some(robust) = bisquare_weights(&residuals) else {
                break;
            };
            fitted = local_regression(values, window, degree, &robust);
        }
    }
    fitted
}

/// Points per local window for a span fraction.
fn window_size(n: usize, span: f64) -> usize {
    ((span * n as f64).ceil() as usize).min(n)
}

/// Centered moving average; the window shrinks symmetrically near the ends.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let half = window.saturating_sub(1) / 2;
    (0..n)
        .map(|i| {
            let h = half.min(i).min(n - 1 - i);
            let slice = &values[i - h..=i + h];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Tricube-weighted local polynomial fit evaluated at every index.
fn local_regression(values: &[f64], window: usize, degree: usize, robust: &[f64]) -> Vec<f64> {
    let n = values.len();
    // Need one more point than coefficients for a non-trivial fit.
    let window = window.max(degree + 2).min(n);

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(window / 2).min(n - window);
            let end = start + window;
            let reach = (i - start).max(end - 1 - i) as f64;
            // Farthest neighbor keeps a small positive weight.
            let radius = reach * 1.0001 + f64::EPSILON;

            let mut moments = [0.0f64; 5];
            let mut rhs = [0.0f64; 3];
            for j in start..end {
                let u = j as f64 - i as f64;
                let w = tricube(u / radius) * robust[j];
                if w <= 0.0 {
                    continue;
                }
                let mut up = 1.0;
                for m in moments.iter_mut() {
                    *m += w * up;
                    up *= u;
                }
                let mut up = 1.0;
                for r in rhs.iter_mut().take(degree + 1) {
                    *r += w * up * values[j];
                    up *= u;
                }
            }
            fit_at_center(&moments, &rhs, degree).unwrap_or(values[i])
        })
        .collect()
}

/// Solve the weighted normal equations and return the intercept.
///
/// The abscissa is centered on the evaluated index, so the intercept is the
/// fitted value. Falls back to lower degrees when the system is singular.
fn fit_at_center(moments: &[f64; 5], rhs: &[f64; 3], degree: usize) -> Option<f64> {
    for d in (0..=degree).rev() {
        let size = d + 1;
        let mut a = [[0.0f64; 4]; 3];
        for (r, row) in a.iter_mut().enumerate().take(size) {
            for (c, cell) in row.iter_mut().enumerate().take(size) {
                *cell = moments[r + c];
            }
            row[3] = rhs[r];
        }
        if let Some(beta) = solve(&mut a, size) {
            return Some(beta);
        }
    }
    None
}

/// Gaussian elimination with partial pivoting on an augmented `size x (size+1)` system.
/// Returns the first unknown.
fn solve(a: &mut [[f64; 4]; 3], size: usize) -> Option<f64> {
    let scale = (0..size).map(|r| a[r][r].abs()).fold(0.0, f64::max);
    if scale <= 0.0 {
        return None;
    }
    for col in 0..size {
        let pivot = (col..size).max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))?;
        if a[pivot][col].abs() <= scale * 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        for row in col + 1..size {
            let f = a[row][col] / a[col][col];
            for k in col..=3 {
                a[row][k] -= f * a[col][k];
            }
        }
    }
    let mut x = [0.0f64; 3];
    for row in (0..size).rev() {
        let mut acc = a[row][3];
        for k in row + 1..size {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    x[0].is_finite().then_some(x[0])
}

fn tricube(u: f64) -> f64 {
    let u = u.abs();
    if u >= 1.0 {
        0.0
    } else {
        let t = 1.0 - u * u * u;
        t * t * t
    }
}

/// Bisquare weights from residuals, scaled by six median absolute deviations.
///
/// When most residuals are exactly zero the median collapses, so the mean
/// absolute residual stands in. `None` when the fit is already exact.
fn bisquare_weights(residuals: &[f64]) -> Option<Vec<f64>> {
    let mut abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    abs.sort_by(f64::total_cmp);
    let largest = abs[abs.len() - 1];
    let tiny = f64::EPSILON * largest.max(1.0);
    let mid = abs.len() / 2;
    let mut mad = if abs.len() % 2 == 0 {
        (abs[mid - 1] + abs[mid]) / 2.0
    } else {
        abs[mid]
    };
    if mad <= tiny {
        mad = abs.iter().sum::<f64>() / abs.len() as f64;
    }
    if mad <= tiny {
        return None;
    }
    Some(
        residuals
            .iter()
            .map(|r| {
                let u = r / (6.0 * mad);
                if u.abs() < 1.0 {
                    (1.0 - u * u).powi(2)
                } else {
                    0.0
                }
            })
            .collect(),
    )
}
