//! Read-only snapshot handed to loggers after each evaluation.
//!
//! An [`Info`] borrows from the problem that produced it, so it cannot
//! outlive the evaluation call. Loggers that need history copy the scalars
//! they care about.

use crate::types::{MetaData, Solution};

#[derive(Debug, Clone, Copy)]
pub struct Info<'a> {
    /// Identity of the evaluated problem
    pub meta: &'a MetaData,
    pub evaluations: usize,
    pub raw_y: f64,
    pub raw_y_best: f64,
    pub transformed_y: f64,
    pub transformed_y_best: f64,
    /// Value returned to the solver, constraint penalties included
    pub y: f64,
    pub y_best: f64,
    /// The evaluated point, as given by the solver
    pub x: &'a [f64],
    pub violations: &'a [f64],
    pub penalties: &'a [f64],
    /// Known best solution, if the problem has one
    pub optimum: Option<&'a Solution>,
    pub has_improved: bool,
}

impl Info<'_> {
    /// Distance of the current value to the optimum.
    pub fn error(&self) -> Option<f64> {
        self.optimum.map(|o| (self.y - o.y).abs())
    }

    /// Distance of the best-so-far value to the optimum.
    pub fn error_best(&self) -> Option<f64> {
        self.optimum.map(|o| (self.y_best - o.y).abs())
    }

    pub fn total_violation(&self) -> f64 {
        self.violations.iter().sum()
    }

    pub fn total_penalty(&self) -> f64 {
        self.penalties.iter().sum()
    }

    pub fn is_violated(&self) -> bool {
        self.violations.iter().any(|&v| v > 0.0)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::types::OptimizationType;

    /// Owns everything an [`Info`] borrows, for trigger and property tests.
    pub struct Snapshot {
        pub meta: MetaData,
        pub x: Vec<f64>,
        pub violations: Vec<f64>,
        pub penalties: Vec<f64>,
        pub optimum: Option<Solution>,
        pub evaluations: usize,
        pub y: f64,
        pub y_best: f64,
        pub has_improved: bool,
    }

    impl Snapshot {
        pub fn new(evaluations: usize, y: f64, y_best: f64, has_improved: bool) -> Self {
            Self {
                meta: MetaData::new(1, 1, "sphere", 2, OptimizationType::Min),
                x: vec![0.5, -0.5],
                violations: vec![],
                penalties: vec![],
                optimum: Some(Solution::new(vec![0.0, 0.0], 0.0)),
                evaluations,
                y,
                y_best,
                has_improved,
            }
        }

        pub fn info(&self) -> Info<'_> {
            Info {
                meta: &self.meta,
                evaluations: self.evaluations,
                raw_y: self.y,
                raw_y_best: self.y_best,
                transformed_y: self.y,
                transformed_y_best: self.y_best,
                y: self.y,
                y_best: self.y_best,
                x: &self.x,
                violations: &self.violations,
                penalties: &self.penalties,
                optimum: self.optimum.as_ref(),
                has_improved: self.has_improved,
            }
        }
    }
}
