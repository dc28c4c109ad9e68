//! Problem identity and point/value pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationType {
    /// Lower is better
    #[default]
    Min,
    /// Higher is better
    Max,
}

impl OptimizationType {
    /// Returns `true` if `candidate` is strictly better than `reference`.
    ///
    /// NaN is never better than anything, and nothing is better than NaN
    /// except a number.
    pub fn is_better(self, candidate: f64, reference: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        if reference.is_nan() {
            return true;
        }
        match self {
            OptimizationType::Min => candidate < reference,
            OptimizationType::Max => candidate > reference,
        }
    }

    /// The worst possible value, used as the initial best-so-far.
    pub fn worst(self) -> f64 {
        match self {
            OptimizationType::Min => f64::INFINITY,
            OptimizationType::Max => f64::NEG_INFINITY,
        }
    }

    /// Moves `y` by `amount` in the worsening direction.
    pub fn worsen(self, y: f64, amount: f64) -> f64 {
        match self {
            OptimizationType::Min => y + amount,
            OptimizationType::Max => y - amount,
        }
    }

    /// Sign applied to a penalty that replaces the objective value.
    pub fn penalty_sign(self) -> f64 {
        match self {
            OptimizationType::Min => 1.0,
            OptimizationType::Max => -1.0,
        }
    }

    /// How much `value` improves on `reference` (positive when better).
    pub fn improvement(self, value: f64, reference: f64) -> f64 {
        match self {
            OptimizationType::Min => reference - value,
            OptimizationType::Max => value - reference,
        }
    }

    pub fn is_maximization(self) -> bool {
        self == OptimizationType::Max
    }
}

impl fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationType::Min => write!(f, "min"),
            OptimizationType::Max => write!(f, "max"),
        }
    }
}

/// Static identity of a problem instance. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaData {
    /// Numeric id of the problem inside its catalog
    pub problem_id: u32,
    /// Instance number, also the seed of instance transformations
    pub instance: u32,
    /// Human readable problem name
    pub name: String,
    /// Number of decision variables
    pub n_variables: usize,
    /// Direction of optimization
    pub optimization_type: OptimizationType,
}

impl MetaData {
    pub fn new(
        problem_id: u32,
        instance: u32,
        name: impl Into<String>,
        n_variables: usize,
        optimization_type: OptimizationType,
    ) -> Self {
        Self {
            problem_id,
            instance,
            name: name.into(),
            n_variables,
            optimization_type,
        }
    }
}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "f{}:{} (instance {}, {}D, {})",
            self.problem_id, self.name, self.instance, self.n_variables, self.optimization_type
        )
    }
}

/// A point and its objective value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution<X = f64, Y = f64> {
    pub x: Vec<X>,
    pub y: Y,
}

impl<X, Y> Solution<X, Y> {
    pub fn new(x: Vec<X>, y: Y) -> Self {
        Self { x, y }
    }
}

impl Solution<f64, f64> {
    /// An empty point carrying the worst value for `optimization_type`.
    pub fn sentinel(n_variables: usize, optimization_type: OptimizationType) -> Self {
        Self {
            x: vec![f64::NAN; n_variables],
            y: optimization_type.worst(),
        }
    }
}
