//! Discretization of a continuous axis into indexed buckets.
//!
//! A [`Scale`] splits `[min, max]` into `size` half-open buckets `[lo, hi)`.
//! The last bucket is closed on the right so that `max` itself belongs to it.
//! A value sitting exactly on an inner edge belongs to the higher bucket, for
//! linear and logarithmic scales alike.
//!
//! Logarithmic scales remap `v` to `log(v - min + 1)` before binning, which
//! keeps the mapping monotonic and sends `min` to bucket 0 even when
//! `min == 0`.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};

/// Binning strategy of a [`Scale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    /// Equal-width buckets
    #[default]
    Linear,
    /// Equal-width buckets in `log2(v - min + 1)`
    Log2,
    /// Equal-width buckets in `log10(v - min + 1)`
    Log10,
}

impl ScaleKind {
    fn forward(self, offset: f64) -> f64 {
        match self {
            ScaleKind::Linear => offset,
            ScaleKind::Log2 => (offset + 1.0).log2(),
            ScaleKind::Log10 => (offset + 1.0).log10(),
        }
    }

    fn inverse(self, t: f64) -> f64 {
        match self {
            ScaleKind::Linear => t,
            ScaleKind::Log2 => t.exp2() - 1.0,
            ScaleKind::Log10 => 10f64.powf(t) - 1.0,
        }
    }
}

/// Maps values of `[min, max]` to bucket indices in `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScaleParts", into = "ScaleParts")]
pub struct Scale {
    min: f64,
    max: f64,
    size: usize,
    kind: ScaleKind,
    /// Length of the range after the kind's remapping
    span: f64,
}

#[derive(Serialize, Deserialize)]
struct ScaleParts {
    min: f64,
    max: f64,
    size: usize,
    #[serde(default)]
    kind: ScaleKind,
}

impl TryFrom<ScaleParts> for Scale {
    type Error = BenchError;

    fn try_from(parts: ScaleParts) -> Result<Self> {
        Scale::new(parts.min, parts.max, parts.size, parts.kind)
    }
}

impl From<Scale> for ScaleParts {
    fn from(scale: Scale) -> Self {
        ScaleParts {
            min: scale.min,
            max: scale.max,
            size: scale.size,
            kind: scale.kind,
        }
    }
}

impl Scale {
    /// Creates a scale over `[min, max]` with `size` buckets.
    ///
    /// # Errors
    ///
    /// Returns `BenchError::InvalidScale` if the bounds are not finite,
    /// `min >= max`, or `size == 0`.
    pub fn new(min: f64, max: f64, size: usize, kind: ScaleKind) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max || size == 0 {
            return Err(BenchError::InvalidScale { min, max, size });
        }
        Ok(Self {
            min,
            max,
            size,
            kind,
            span: kind.forward(max - min),
        })
    }

    pub fn linear(min: f64, max: f64, size: usize) -> Result<Self> {
        Self::new(min, max, size, ScaleKind::Linear)
    }

    pub fn log2(min: f64, max: f64, size: usize) -> Result<Self> {
        Self::new(min, max, size, ScaleKind::Log2)
    }

    pub fn log10(min: f64, max: f64, size: usize) -> Result<Self> {
        Self::new(min, max, size, ScaleKind::Log10)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Width of the covered range, `max - min`.
    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    /// Number of buckets.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    /// Returns `true` if `value` lies in the closed range `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Bucket holding `value`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `value` is outside `[min, max]`. Release
    /// builds clamp the value into range instead.
    pub fn index(&self, value: f64) -> usize {
        debug_assert!(
            self.contains(value),
            "value {} outside scale [{}, {}]",
            value,
            self.min,
            self.max
        );
        let v = value.clamp(self.min, self.max);
        if v >= self.max {
            return self.size - 1;
        }

        let t = self.kind.forward(v - self.min) / self.span * self.size as f64;
        let mut i = if t.is_finite() && t > 0.0 {
            (t.floor() as usize).min(self.size - 1)
        } else {
            0
        };

        // Rounding in the remapping may land one bucket off; settle against
        // the edges reported by bounds() so both always agree.
        while i > 0 && v < self.lower_edge(i) {
            i -= 1;
        }
        while i + 1 < self.size && v >= self.lower_edge(i + 1) {
            i += 1;
        }
        i
    }

    /// Bucket holding an evaluation count.
    pub fn index_count(&self, count: usize) -> usize {
        self.index(count as f64)
    }

    /// Interval `[lo, hi)` covered by bucket `i`; the last bucket ends at `max`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= size`.
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        assert!(
            i < self.size,
            "bucket {} out of range for a scale of {} buckets",
            i,
            self.size
        );
        (self.lower_edge(i), self.lower_edge(i + 1))
    }

    /// All `size + 1` bucket edges, from `min` to `max`.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.size).map(|i| self.lower_edge(i)).collect()
    }

    fn lower_edge(&self, i: usize) -> f64 {
        if i == 0 {
            return self.min;
        }
        if i >= self.size {
            return self.max;
        }
        let edge = self.min + self.kind.inverse(self.span * i as f64 / self.size as f64);
        edge.clamp(self.min, self.max)
    }
}
