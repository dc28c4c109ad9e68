//! Objective functions of the built-in problem catalog.
//!
//! All are minimization problems with their global minimum at the origin
//! (`f = 0`), except the linear slope whose minimum sits on the lower corner
//! of the box.

use ndarray::Array1;
use std::f64::consts::{E, PI};

/// Sphere function - N-dimensional unimodal
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
/// Bounds: x_i in [-5, 5]
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

/// Separable ellipsoid with condition number 1e6.
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn ellipsoid(x: &Array1<f64>) -> f64 {
    let n = x.len();
    if n < 2 {
        return sphere(x);
    }
    x.iter()
        .enumerate()
        .map(|(i, &xi)| 10f64.powf(6.0 * i as f64 / (n - 1) as f64) * xi * xi)
        .sum()
}

/// Rastrigin function - N-dimensional multimodal
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    10.0 * n
        + x.iter()
            .map(|&xi| xi * xi - 10.0 * (2.0 * PI * xi).cos())
            .sum::<f64>()
}

/// Rosenbrock function shifted so that its minimum is at the origin.
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    x.iter()
        .zip(x.iter().skip(1))
        .map(|(&a, &b)| {
            let (a, b) = (a + 1.0, b + 1.0);
            100.0 * (b - a * a).powi(2) + (1.0 - a).powi(2)
        })
        .sum()
}

/// Ackley function - N-dimensional multimodal
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn ackley(x: &Array1<f64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let sum_sq: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    let sum_cos: f64 = x.iter().map(|&xi| (2.0 * PI * xi).cos()).sum();
    let y = -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp() + 20.0 + E;
    // exp rounding leaves ~4e-16 at the origin
    y.max(0.0)
}

/// Lower corner of the box used by [`linear_slope`].
pub const SLOPE_CORNER: f64 = -5.0;

/// Linear slope rising along every axis, clipped to the box `[-5, 5]^n`.
/// Global minimum: f(x) = 0 at x = (-5, -5, ..., -5)
pub fn linear_slope(x: &Array1<f64>) -> f64 {
    let n = x.len();
    x.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let s = if n > 1 {
                10f64.powf(i as f64 / (n - 1) as f64)
            } else {
                1.0
            };
            s * (xi.clamp(SLOPE_CORNER, -SLOPE_CORNER) - SLOPE_CORNER)
        })
        .sum()
}
