//! Named scalar extractors applied to logging snapshots.
//!
//! A [`Property`] turns an [`Info`] into an optional value. `None` means the
//! property does not apply to the evaluation (no known optimum, no
//! constraints, objective skipped by a hard constraint) and loggers record it
//! as missing.

use crate::error::{BenchError, Result};
use crate::info::Info;
use std::fmt;
use std::sync::{Arc, Mutex};

pub type PropertyFn = Arc<dyn Fn(&Info<'_>) -> Option<f64> + Send + Sync>;

/// Names accepted by [`Property::by_name`], besides `x<i>` and `violation<i>`.
pub const BUILTIN_NAMES: &[&str] = &[
    "evaluations",
    "raw_y",
    "raw_y_best",
    "transformed_y",
    "transformed_y_best",
    "y",
    "y_best",
    "violation",
    "penalty",
    "error",
    "error_best",
];

/// A value owned by the algorithm under test and recorded like any property.
///
/// Clones share the same cell, so the algorithm keeps one handle and the
/// logger holds another.
#[derive(Debug, Clone, Default)]
pub struct TrackedValue(Arc<Mutex<Option<f64>>>);

impl TrackedValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: f64) {
        *self.lock() = Some(value);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn get(&self) -> Option<f64> {
        *self.lock()
    }

    // A poisoned cell still holds a plain f64, so keep using it.
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<f64>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone)]
enum Source {
    Evaluations,
    RawY,
    RawYBest,
    TransformedY,
    TransformedYBest,
    Y,
    YBest,
    Violation,
    Penalty,
    Error,
    ErrorBest,
    X(usize),
    ViolationAt(usize),
    Closure(PropertyFn),
    Tracked(TrackedValue),
}

/// A named extractor from [`Info`] to an optional scalar.
#[derive(Clone)]
pub struct Property {
    name: String,
    source: Source,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("name", &self.name).finish()
    }
}

/// NaN and the infinite sentinels of a best value not reached yet are missing.
fn finite_or_none(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

impl Property {
    fn builtin(name: &str, source: Source) -> Self {
        Self {
            name: name.to_string(),
            source,
        }
    }

    /// Resolves a built-in property: one of [`BUILTIN_NAMES`], `x<i>` or
    /// `violation<i>`.
    pub fn by_name(name: &str) -> Result<Self> {
        let source = match name {
            "evaluations" => Source::Evaluations,
            "raw_y" => Source::RawY,
            "raw_y_best" => Source::RawYBest,
            "transformed_y" => Source::TransformedY,
            "transformed_y_best" => Source::TransformedYBest,
            "y" => Source::Y,
            "y_best" => Source::YBest,
            "violation" => Source::Violation,
            "penalty" => Source::Penalty,
            "error" => Source::Error,
            "error_best" => Source::ErrorBest,
            _ => {
                if let Some(i) = name.strip_prefix("violation").and_then(|s| s.parse().ok()) {
                    Source::ViolationAt(i)
                } else if let Some(i) = name.strip_prefix('x').and_then(|s| s.parse().ok()) {
                    Source::X(i)
                } else {
                    return Err(BenchError::InvalidConfig {
                        reason: format!("unknown property '{}'", name),
                    });
                }
            }
        };
        Ok(Self::builtin(name, source))
    }

    pub fn evaluations() -> Self {
        Self::builtin("evaluations", Source::Evaluations)
    }

    pub fn raw_y() -> Self {
        Self::builtin("raw_y", Source::RawY)
    }

    pub fn raw_y_best() -> Self {
        Self::builtin("raw_y_best", Source::RawYBest)
    }

    pub fn transformed_y() -> Self {
        Self::builtin("transformed_y", Source::TransformedY)
    }

    pub fn transformed_y_best() -> Self {
        Self::builtin("transformed_y_best", Source::TransformedYBest)
    }

    pub fn y() -> Self {
        Self::builtin("y", Source::Y)
    }

    pub fn y_best() -> Self {
        Self::builtin("y_best", Source::YBest)
    }

    pub fn violation() -> Self {
        Self::builtin("violation", Source::Violation)
    }

    pub fn penalty() -> Self {
        Self::builtin("penalty", Source::Penalty)
    }

    pub fn error() -> Self {
        Self::builtin("error", Source::Error)
    }

    pub fn error_best() -> Self {
        Self::builtin("error_best", Source::ErrorBest)
    }

    /// Component `i` of the evaluated point.
    pub fn x(i: usize) -> Self {
        Self {
            name: format!("x{}", i),
            source: Source::X(i),
        }
    }

    /// One property per component of an `n`-dimensional point.
    pub fn positions(n: usize) -> Vec<Self> {
        (0..n).map(Self::x).collect()
    }

    /// Violation of the `i`-th constraint.
    pub fn violation_at(i: usize) -> Self {
        Self {
            name: format!("violation{}", i),
            source: Source::ViolationAt(i),
        }
    }

    pub fn closure<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Info<'_>) -> Option<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source: Source::Closure(Arc::new(f)),
        }
    }

    pub fn tracked(name: impl Into<String>, value: &TrackedValue) -> Self {
        Self {
            name: name.into(),
            source: Source::Tracked(value.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compute(&self, info: &Info<'_>) -> Option<f64> {
        match &self.source {
            Source::Evaluations => Some(info.evaluations as f64),
            Source::RawY => finite_or_none(info.raw_y),
            Source::RawYBest => finite_or_none(info.raw_y_best),
            Source::TransformedY => finite_or_none(info.transformed_y),
            Source::TransformedYBest => finite_or_none(info.transformed_y_best),
            Source::Y => finite_or_none(info.y),
            Source::YBest => finite_or_none(info.y_best),
            Source::Violation if info.violations.is_empty() => None,
            Source::Violation => Some(info.total_violation()),
            Source::Penalty if info.penalties.is_empty() => None,
            Source::Penalty => Some(info.total_penalty()),
            Source::Error => info.error().and_then(finite_or_none),
            Source::ErrorBest => info.error_best().and_then(finite_or_none),
            Source::X(i) => info.x.get(*i).copied(),
            Source::ViolationAt(i) => info.violations.get(*i).copied(),
            Source::Closure(f) => f(info),
            Source::Tracked(v) => v.get(),
        }
    }
}
