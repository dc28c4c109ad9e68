//! Constraints and how their penalties are folded into the objective value.
//!
//! Every constraint turns a point into a non-negative violation (0 when
//! feasible) and a penalty `weight * violation^exponent`. How the penalty
//! reaches the objective value depends on [`Enforced`]:
//!
//! - `NotEnforced`: never computed, reports 0.
//! - `Hidden`: computed and reported to loggers, never changes `y`.
//! - `Soft`: the penalty is added to `y` in the worsening direction.
//! - `Hard`: checked before the objective; when violated the objective is
//!   not evaluated at all and `y` is the penalty alone.
//! - `Override`: the objective is evaluated, but when violated `y` is
//!   replaced by the penalty alone.

use crate::error::{BenchError, Result};
use crate::types::OptimizationType;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Fallible constraint function; an `Err` aborts the evaluation.
pub type ConstraintFn = Arc<dyn Fn(&Array1<f64>) -> std::result::Result<f64, String> + Send + Sync>;

fn infallible<F>(f: F) -> ConstraintFn
where
    F: Fn(&Array1<f64>) -> f64 + Send + Sync + 'static,
{
    Arc::new(move |x: &Array1<f64>| -> std::result::Result<f64, String> { Ok(f(x)) })
}

/// Enforcement policy of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforced {
    NotEnforced,
    Hidden,
    #[default]
    Soft,
    Hard,
    Override,
}

/// Shape of a constraint.
#[derive(Clone)]
pub enum ConstraintKind {
    /// Feasible when `g(x) <= 0`
    Inequality(ConstraintFn),
    /// Feasible when `|h(x)| <= tolerance`
    Equality {
        fun: ConstraintFn,
        tolerance: f64,
    },
    /// Feasible when `lower <= x <= upper` component-wise
    Bounds {
        lower: Array1<f64>,
        upper: Array1<f64>,
    },
}

impl fmt::Debug for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Inequality(_) => write!(f, "Inequality"),
            ConstraintKind::Equality { tolerance, .. } => {
                write!(f, "Equality(tolerance={})", tolerance)
            }
            ConstraintKind::Bounds { lower, .. } => write!(f, "Bounds(len={})", lower.len()),
        }
    }
}

/// A named constraint with its enforcement policy and penalty shape.
#[derive(Debug, Clone)]
pub struct Constraint {
    name: String,
    kind: ConstraintKind,
    /// How the penalty is applied to the objective
    pub enforced: Enforced,
    /// Multiplier of the penalty
    pub weight: f64,
    /// Power applied to the violation
    pub exponent: f64,
    violation: f64,
    penalty: f64,
}

impl Constraint {
    fn with_kind(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enforced: Enforced::default(),
            weight: 1.0,
            exponent: 1.0,
            violation: 0.0,
            penalty: 0.0,
        }
    }

    /// Inequality constraint `g(x) <= 0`.
    pub fn inequality<F>(name: impl Into<String>, g: F) -> Self
    where
        F: Fn(&Array1<f64>) -> f64 + Send + Sync + 'static,
    {
        Self::with_kind(name, ConstraintKind::Inequality(infallible(g)))
    }

    /// Inequality constraint whose function may fail.
    pub fn try_inequality<F>(name: impl Into<String>, g: F) -> Self
    where
        F: Fn(&Array1<f64>) -> std::result::Result<f64, String> + Send + Sync + 'static,
    {
        Self::with_kind(name, ConstraintKind::Inequality(Arc::new(g)))
    }

    /// Equality constraint `|h(x)| <= tolerance`.
    pub fn equality<F>(name: impl Into<String>, h: F, tolerance: f64) -> Self
    where
        F: Fn(&Array1<f64>) -> f64 + Send + Sync + 'static,
    {
        Self::with_kind(
            name,
            ConstraintKind::Equality {
                fun: infallible(h),
                tolerance,
            },
        )
    }

    /// Box constraint; the violation is the summed distance outside the box.
    pub fn bounds(name: impl Into<String>, lower: Array1<f64>, upper: Array1<f64>) -> Self {
        Self::with_kind(name, ConstraintKind::Bounds { lower, upper })
    }

    pub fn with_enforced(mut self, enforced: Enforced) -> Self {
        self.enforced = enforced;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Violation measured at the last committed evaluation.
    pub fn violation(&self) -> f64 {
        self.violation
    }

    /// Penalty measured at the last committed evaluation.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn is_violated(&self) -> bool {
        self.violation > 0.0
    }

    /// Computes the violation at `x` without recording it.
    pub fn compute_violation(&self, x: &Array1<f64>) -> Result<f64> {
        if self.enforced == Enforced::NotEnforced {
            return Ok(0.0);
        }
        let call = |fun: &ConstraintFn| {
            fun(x).map_err(|reason| BenchError::ConstraintFailed {
                constraint: self.name.clone(),
                reason,
            })
        };
        let violation = match &self.kind {
            // f64::max would swallow a NaN
            ConstraintKind::Inequality(g) => {
                let g = call(g)?;
                if g > 0.0 || g.is_nan() { g } else { 0.0 }
            }
            ConstraintKind::Equality { fun, tolerance } => {
                let h = call(fun)?.abs();
                if h <= *tolerance { 0.0 } else { h }
            }
            ConstraintKind::Bounds { lower, upper } => x
                .iter()
                .zip(lower.iter().zip(upper.iter()))
                .map(|(&xi, (&lo, &hi))| (lo - xi).max(0.0) + (xi - hi).max(0.0))
                .sum(),
        };
        if violation.is_nan() {
            return Err(BenchError::ConstraintFailed {
                constraint: self.name.clone(),
                reason: "violation is NaN".to_string(),
            });
        }
        Ok(violation)
    }

    /// Penalty for a given violation.
    pub fn penalty_for(&self, violation: f64) -> f64 {
        if self.enforced == Enforced::NotEnforced || violation <= 0.0 {
            0.0
        } else {
            self.weight * violation.powf(self.exponent)
        }
    }
}

/// Per-constraint results of one evaluation, not yet committed anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintEvaluation {
    pub violations: Vec<f64>,
    pub penalties: Vec<f64>,
    hard: Option<f64>,
    overriding: Option<f64>,
    soft: f64,
}

impl ConstraintEvaluation {
    /// `true` when a violated HARD constraint forbids evaluating the objective.
    pub fn skips_objective(&self) -> bool {
        self.hard.is_some()
    }

    pub fn is_feasible(&self) -> bool {
        self.violations.iter().all(|&v| v <= 0.0)
    }

    /// Final objective value once penalties are applied to `y`.
    pub fn apply(&self, y: f64, optimization_type: OptimizationType) -> f64 {
        if let Some(p) = self.hard.or(self.overriding) {
            return optimization_type.penalty_sign() * p;
        }
        if self.soft > 0.0 {
            optimization_type.worsen(y, self.soft)
        } else {
            y
        }
    }
}

/// The constraints attached to one problem.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }

    /// Evaluates every constraint at `x`. Nothing is recorded on failure.
    pub fn evaluate(&self, x: &Array1<f64>) -> Result<ConstraintEvaluation> {
        let mut eval = ConstraintEvaluation {
            violations: Vec::with_capacity(self.constraints.len()),
            penalties: Vec::with_capacity(self.constraints.len()),
            ..Default::default()
        };
        for c in &self.constraints {
            let violation = c.compute_violation(x)?;
            let penalty = c.penalty_for(violation);
            if violation > 0.0 {
                match c.enforced {
                    Enforced::Hard => *eval.hard.get_or_insert(0.0) += penalty,
                    Enforced::Override => *eval.overriding.get_or_insert(0.0) += penalty,
                    Enforced::Soft => eval.soft += penalty,
                    Enforced::Hidden | Enforced::NotEnforced => {}
                }
            }
            eval.violations.push(violation);
            eval.penalties.push(penalty);
        }
        Ok(eval)
    }

    /// Records an evaluation so `violation()`/`penalty()` reflect it.
    pub fn commit(&mut self, eval: &ConstraintEvaluation) {
        for (c, (&v, &p)) in self
            .constraints
            .iter_mut()
            .zip(eval.violations.iter().zip(eval.penalties.iter()))
        {
            c.violation = v;
            c.penalty = p;
        }
    }

    pub(crate) fn clear(&mut self) {
        for c in &mut self.constraints {
            c.violation = 0.0;
            c.penalty = 0.0;
        }
    }
}
