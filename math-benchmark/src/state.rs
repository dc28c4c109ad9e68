//! Per-instance evaluation state, updated once per evaluation call.

use crate::types::{OptimizationType, Solution};

/// Default distance to the optimum under which the final target counts as hit.
pub const DEFAULT_FINAL_TARGET: f64 = 1e-8;

/// Coarse lifecycle of a problem instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No evaluation yet
    Fresh,
    /// Evaluating, target not hit yet
    Active,
    /// Final target hit; evaluations may continue and the flag stays set
    OptimumFound,
}

/// Values produced by one evaluation, ready to be folded into a [`State`].
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Point given by the solver
    pub x: Vec<f64>,
    /// Point after the variable transformation
    pub x_internal: Vec<f64>,
    /// Objective value before the objective transformation
    pub raw_y: f64,
    /// Objective value after transformation, before constraint penalties
    pub y_unconstrained: f64,
    /// Value returned to the solver
    pub y: f64,
}

/// Mutable record of one problem instance.
///
/// `current_best` only ever moves in the improving direction of the
/// optimization type, and only on strict improvement: on ties the first
/// point seen is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Number of evaluation calls since construction or the last reset
    pub evaluations: usize,
    /// Last point with its final value
    pub current: Solution,
    /// Last point after the variable transformation with its unconstrained value
    pub current_internal: Solution,
    /// Best point with its final value
    pub current_best: Solution,
    /// Internal counterpart of `current_best`
    pub current_best_internal: Solution,
    /// Last objective value before the objective transformation
    pub raw_y: f64,
    /// Best raw objective value seen
    pub raw_y_best: f64,
    /// Last value before constraint penalties
    pub y_unconstrained: f64,
    /// Best value before constraint penalties seen
    pub y_unconstrained_best: f64,
    /// Whether the last call strictly improved `current_best`
    pub has_improved: bool,
    /// Whether the best value reached the known optimum
    pub optimum_found: bool,
    /// Whether the best value came within the final target tolerance
    pub final_target_found: bool,
    initial: Solution,
    optimization_type: OptimizationType,
}

impl State {
    /// Creates a state whose best-so-far starts at `initial`.
    pub fn new(initial: Solution, optimization_type: OptimizationType) -> Self {
        let worst = optimization_type.worst();
        Self {
            evaluations: 0,
            current: initial.clone(),
            current_internal: initial.clone(),
            current_best: initial.clone(),
            current_best_internal: initial.clone(),
            raw_y: worst,
            raw_y_best: worst,
            y_unconstrained: worst,
            y_unconstrained_best: worst,
            has_improved: false,
            optimum_found: false,
            final_target_found: false,
            initial,
            optimization_type,
        }
    }

    /// State of a fresh problem with `n_variables` variables.
    pub fn fresh(n_variables: usize, optimization_type: OptimizationType) -> Self {
        Self::new(
            Solution::sentinel(n_variables, optimization_type),
            optimization_type,
        )
    }

    pub fn optimization_type(&self) -> OptimizationType {
        self.optimization_type
    }

    /// The sentinel `current_best` returns to on reset.
    pub fn initial(&self) -> &Solution {
        &self.initial
    }

    pub fn phase(&self) -> Phase {
        if self.final_target_found {
            Phase::OptimumFound
        } else if self.evaluations == 0 {
            Phase::Fresh
        } else {
            Phase::Active
        }
    }

    /// Back to the construction-time values.
    pub fn reset(&mut self) {
        *self = Self::new(self.initial.clone(), self.optimization_type);
    }

    /// Counts one evaluation call. Done before anything that can fail.
    pub(crate) fn count_evaluation(&mut self) {
        self.evaluations += 1;
    }

    /// Folds a completed evaluation into the state.
    ///
    /// `optimum` is the known best solution, if any; `tolerance` is the
    /// final target distance.
    pub fn update(&mut self, evaluation: Evaluation, optimum: Option<&Solution>, tolerance: f64) {
        let opt = self.optimization_type;

        self.raw_y = evaluation.raw_y;
        if opt.is_better(evaluation.raw_y, self.raw_y_best) {
            self.raw_y_best = evaluation.raw_y;
        }
        self.y_unconstrained = evaluation.y_unconstrained;
        if opt.is_better(evaluation.y_unconstrained, self.y_unconstrained_best) {
            self.y_unconstrained_best = evaluation.y_unconstrained;
        }

        self.current = Solution::new(evaluation.x, evaluation.y);
        self.current_internal = Solution::new(evaluation.x_internal, evaluation.y_unconstrained);

        self.has_improved = opt.is_better(self.current.y, self.current_best.y);
        if self.has_improved {
            self.current_best = self.current.clone();
            self.current_best_internal = self.current_internal.clone();
        }

        if let Some(optimum) = optimum {
            let best = self.current_best.y;
            if !opt.is_better(optimum.y, best) && !best.is_nan() {
                self.optimum_found = true;
            }
            if opt.improvement(best, optimum.y) >= -tolerance {
                self.final_target_found = true;
            }
        }
    }
}
