//! Variable and objective transformation stages of a problem.
//!
//! A problem applies at most one variable stage and one objective stage, in
//! that order: `x -> variable_transform(x) -> f -> objective_transform(y)`.

use crate::types::Solution;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maps the point given by the solver to the point the objective sees.
pub type VariableTransform = Box<dyn Fn(&Array1<f64>) -> Array1<f64> + Send + Sync>;
/// Maps the raw objective value to the reported value.
pub type ObjectiveTransform = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Instance-specific shift of the search space and affine map `a*f + b`.
///
/// Instances 0 and 1 are the untransformed problem. Any other instance
/// number seeds the draw, so the same instance always yields the same
/// transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceTransform {
    /// Subtracted from `x` before evaluation
    pub shift: Array1<f64>,
    /// `a` in `a*f + b`, always positive
    pub scale: f64,
    /// `b` in `a*f + b`
    pub offset: f64,
}

impl InstanceTransform {
    pub fn identity(n_variables: usize) -> Self {
        Self {
            shift: Array1::zeros(n_variables),
            scale: 1.0,
            offset: 0.0,
        }
    }

    pub fn from_instance(instance: u32, n_variables: usize) -> Self {
        if instance <= 1 {
            return Self::identity(n_variables);
        }
        let mut rng = StdRng::seed_from_u64(instance as u64);
        let shift = Array1::from_shape_fn(n_variables, |_| rng.random_range(-4.0..4.0));
        let scale = 10f64.powf(rng.random_range(-0.7..0.7));
        let offset = rng.random_range(-1000.0..1000.0);
        Self {
            shift,
            scale,
            offset,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0 && self.shift.iter().all(|&s| s == 0.0)
    }

    pub fn transform_variables(&self, x: &Array1<f64>) -> Array1<f64> {
        x - &self.shift
    }

    pub fn transform_objective(&self, y: f64) -> f64 {
        self.scale * y + self.offset
    }

    /// Moves an optimum of the raw problem into the transformed problem.
    pub fn transform_optimum(&self, optimum: &Solution) -> Solution {
        let x = optimum
            .x
            .iter()
            .zip(self.shift.iter())
            .map(|(xi, si)| xi + si)
            .collect();
        Solution::new(x, self.transform_objective(optimum.y))
    }

    pub fn variable_stage(&self) -> VariableTransform {
        let shift = self.shift.clone();
        Box::new(move |x: &Array1<f64>| x - &shift)
    }

    pub fn objective_stage(&self) -> ObjectiveTransform {
        let (scale, offset) = (self.scale, self.offset);
        Box::new(move |y: f64| scale * y + offset)
    }
}
