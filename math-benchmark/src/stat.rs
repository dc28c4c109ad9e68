//! Statistics over attainment data collected by the EAF, EAH and ECDF loggers.
//!
//! Every aggregator exposes a 2D histogram of counts indexed by
//! `(error bucket, evaluation bucket)`. The distribution is its 2D prefix sum
//! and the volume under the curve is the normalized total of the
//! distribution, in `[0, 1]`.

use crate::scale::Scale;
use ndarray::Array2;

/// Anything that can be summarized as an error x evaluations histogram.
pub trait AttainmentSummary {
    /// Total number of recorded attainments.
    fn sum(&self) -> u64;

    /// Counts summed over every tracked run.
    fn histogram(&self) -> Array2<u64>;
}

/// Cell of an `(error, evaluations)` grid for an attainment.
///
/// A quality below the error minimum is counted in bucket 0. A quality above
/// the error maximum is not attained yet, and an evaluation count outside the
/// evaluation scale is not recorded; both return `None`.
pub fn attainment_cell(error: &Scale, evals: &Scale, quality: f64, time: usize) -> Option<(usize, usize)> {
    if quality.is_nan() || quality > error.max() {
        return None;
    }
    let t = time as f64;
    if t < evals.min() || t > evals.max() {
        return None;
    }
    Some((error.index(quality.max(error.min())), evals.index(t)))
}

pub fn sum(summary: &impl AttainmentSummary) -> u64 {
    summary.sum()
}

pub fn histogram(summary: &impl AttainmentSummary) -> Array2<u64> {
    summary.histogram()
}

/// 2D prefix sum: `d[i][j]` counts attainments with error bucket `<= i`
/// and evaluation bucket `<= j`.
pub fn distribution(summary: &impl AttainmentSummary) -> Array2<u64> {
    prefix_sum(&summary.histogram())
}

pub fn prefix_sum(histogram: &Array2<u64>) -> Array2<u64> {
    let (rows, cols) = histogram.dim();
    let mut d = Array2::<u64>::zeros((rows, cols));
    for i in 0..rows {
        for j in 0..cols {
            let up = if i > 0 { d[[i - 1, j]] } else { 0 };
            let left = if j > 0 { d[[i, j - 1]] } else { 0 };
            let diag = if i > 0 && j > 0 { d[[i - 1, j - 1]] } else { 0 };
            d[[i, j]] = histogram[[i, j]] + up + left - diag;
        }
    }
    d
}

pub mod under_curve {
    use super::{AttainmentSummary, prefix_sum};
    use ndarray::Array2;

    /// Normalized volume under the attainment distribution, in `[0, 1]`.
    ///
    /// Zero when nothing was recorded.
    pub fn volume(summary: &impl AttainmentSummary) -> f64 {
        volume_of(&summary.histogram())
    }

    pub fn volume_of(histogram: &Array2<u64>) -> f64 {
        let total: u64 = histogram.sum();
        let (rows, cols) = histogram.dim();
        if total == 0 || rows == 0 || cols == 0 {
            return 0.0;
        }
        let covered = prefix_sum(histogram).iter().map(|&v| v as f64).sum::<f64>();
        covered / (rows as f64 * cols as f64 * total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Fixed(Array2<u64>);

    impl AttainmentSummary for Fixed {
        fn sum(&self) -> u64 {
            self.0.sum()
        }

        fn histogram(&self) -> Array2<u64> {
            self.0.clone()
        }
    }

    #[test]
    fn test_distribution_is_prefix_sum() {
        let h = Fixed(array![[1, 0, 2], [0, 3, 0], [4, 0, 1]]);
        let d = distribution(&h);
        for i in 0..3 {
            for j in 0..3 {
                let expected: u64 = h.0.slice(ndarray::s![..=i, ..=j]).sum();
                assert_eq!(d[[i, j]], expected);
            }
        }
        assert_eq!(d[[2, 2]], sum(&h));
    }

    #[test]
    fn test_volume_bounds() {
        assert_eq!(under_curve::volume(&Fixed(Array2::zeros((4, 4)))), 0.0);
        // everything attained at once fills the whole grid
        let mut all_first = Array2::zeros((4, 5));
        all_first[[0, 0]] = 7;
        assert_relative_eq!(under_curve::volume(&Fixed(all_first)), 1.0);
        // attained only in the last cell covers one cell of twenty
        let mut all_last = Array2::zeros((4, 5));
        all_last[[3, 4]] = 7;
        assert_relative_eq!(under_curve::volume(&Fixed(all_last)), 1.0 / 20.0);
    }

    #[test]
    fn test_attainment_cell_policy() {
        let error = Scale::linear(0.0, 10.0, 10).unwrap();
        let evals = Scale::linear(1.0, 100.0, 10).unwrap();
        assert_eq!(attainment_cell(&error, &evals, -3.0, 1), Some((0, 0)));
        assert_eq!(attainment_cell(&error, &evals, 10.0, 100), Some((9, 9)));
        assert_eq!(attainment_cell(&error, &evals, 10.5, 50), None);
        assert_eq!(attainment_cell(&error, &evals, 5.0, 101), None);
        assert_eq!(attainment_cell(&error, &evals, f64::NAN, 5), None);
    }
}
