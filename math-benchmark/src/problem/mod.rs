//! Benchmark problems: an objective wrapped with state, constraints,
//! transformations and attached loggers.
//!
//! Each call to [`Problem::evaluate`] runs the whole pipeline synchronously:
//! dimension check, evaluation counter, constraints, variable transform,
//! objective, objective transform, penalties, state update, then logger
//! dispatch.

pub mod functions;
pub mod registry;

pub use registry::{ProblemFactory, ProblemRegistry};

use crate::constraint::{Constraint, ConstraintSet};
use crate::error::{BenchError, Result};
use crate::info::Info;
use crate::logger::{self, SharedLogger};
use crate::state::{DEFAULT_FINAL_TARGET, Evaluation, State};
use crate::transform::{InstanceTransform, ObjectiveTransform, VariableTransform};
use crate::types::{MetaData, OptimizationType, Solution};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

/// Objective function of a problem, evaluated on the transformed point.
pub type ObjectiveFn = Arc<dyn Fn(&Array1<f64>) -> f64 + Send + Sync>;

/// A single-objective, real-valued benchmark problem instance.
pub struct Problem {
    meta: MetaData,
    objective: ObjectiveFn,
    bounds: Vec<(f64, f64)>,
    optimum: Option<Solution>,
    constraints: ConstraintSet,
    variable_transform: Option<VariableTransform>,
    objective_transform: Option<ObjectiveTransform>,
    final_target_tolerance: f64,
    state: State,
    loggers: Vec<SharedLogger>,
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("meta", &self.meta)
            .field("optimum", &self.optimum)
            .field("constraints", &self.constraints.len())
            .field("evaluations", &self.state.evaluations)
            .field("loggers", &self.loggers.len())
            .finish()
    }
}

impl Problem {
    /// Creates a problem from its identity and objective. Variables default
    /// to the box `[-5, 5]^n`.
    pub fn new<F>(meta: MetaData, objective: F) -> Self
    where
        F: Fn(&Array1<f64>) -> f64 + Send + Sync + 'static,
    {
        let state = State::fresh(meta.n_variables, meta.optimization_type);
        Self {
            bounds: vec![(-5.0, 5.0); meta.n_variables],
            meta,
            objective: Arc::new(objective),
            optimum: None,
            constraints: ConstraintSet::default(),
            variable_transform: None,
            objective_transform: None,
            final_target_tolerance: DEFAULT_FINAL_TARGET,
            state,
            loggers: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Known best solution, in the coordinates the solver sees.
    pub fn with_optimum(mut self, optimum: Solution) -> Self {
        self.optimum = Some(optimum);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_variable_transform(mut self, transform: VariableTransform) -> Self {
        self.variable_transform = Some(transform);
        self
    }

    pub fn with_objective_transform(mut self, transform: ObjectiveTransform) -> Self {
        self.objective_transform = Some(transform);
        self
    }

    /// Applies the transformation seeded by the problem's instance number and
    /// moves the known optimum with it. Replaces both transform stages.
    pub fn with_instance_transform(mut self) -> Self {
        let transform = InstanceTransform::from_instance(self.meta.instance, self.meta.n_variables);
        if transform.is_identity() {
            return self;
        }
        self.optimum = self.optimum.map(|o| transform.transform_optimum(&o));
        self.variable_transform = Some(transform.variable_stage());
        self.objective_transform = Some(transform.objective_stage());
        self
    }

    pub fn with_final_target_tolerance(mut self, tolerance: f64) -> Self {
        self.final_target_tolerance = tolerance;
        self
    }

    pub fn meta_data(&self) -> &MetaData {
        &self.meta
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn optimum(&self) -> Option<&Solution> {
        self.optimum.as_ref()
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn n_variables(&self) -> usize {
        self.meta.n_variables
    }

    pub fn optimization_type(&self) -> OptimizationType {
        self.meta.optimization_type
    }

    pub fn final_target_tolerance(&self) -> f64 {
        self.final_target_tolerance
    }

    /// Evaluates `x` and forwards the result to every attached logger.
    ///
    /// A point of the wrong dimension is rejected before anything is counted.
    /// If a constraint function fails, the evaluation counter has moved but
    /// nothing else has and no logger is called. If loggers fail, the state
    /// is already updated and the value is available in
    /// `state().current.y`; the error lists each failing logger.
    pub fn evaluate(&mut self, x: &Array1<f64>) -> Result<f64> {
        if x.len() != self.meta.n_variables {
            return Err(BenchError::DimensionMismatch {
                problem: self.meta.name.clone(),
                expected: self.meta.n_variables,
                got: x.len(),
            });
        }
        self.state.count_evaluation();

        let constraint_eval = self.constraints.evaluate(x)?;

        let x_internal = match &self.variable_transform {
            Some(t) => t(x),
            None => x.clone(),
        };
        let (raw_y, transformed_y) = if constraint_eval.skips_objective() {
            (f64::NAN, f64::NAN)
        } else {
            let raw_y = (self.objective)(&x_internal);
            let transformed_y = match &self.objective_transform {
                Some(t) => t(raw_y),
                None => raw_y,
            };
            (raw_y, transformed_y)
        };
        let y = constraint_eval.apply(transformed_y, self.meta.optimization_type);

        self.state.update(
            Evaluation {
                x: x.to_vec(),
                x_internal: x_internal.to_vec(),
                raw_y,
                y_unconstrained: transformed_y,
                y,
            },
            self.optimum.as_ref(),
            self.final_target_tolerance,
        );
        self.constraints.commit(&constraint_eval);

        let info = Info {
            meta: &self.meta,
            evaluations: self.state.evaluations,
            raw_y: self.state.raw_y,
            raw_y_best: self.state.raw_y_best,
            transformed_y: self.state.y_unconstrained,
            transformed_y_best: self.state.y_unconstrained_best,
            y: self.state.current.y,
            y_best: self.state.current_best.y,
            x: &self.state.current.x,
            violations: &constraint_eval.violations,
            penalties: &constraint_eval.penalties,
            optimum: self.optimum.as_ref(),
            has_improved: self.state.has_improved,
        };

        let mut failures = Vec::new();
        for (i, shared) in self.loggers.iter().enumerate() {
            if let Err(e) = logger::lock(shared).and_then(|mut l| l.log(&info)) {
                log::error!("logger #{} failed on {}: {}", i, self.meta, e);
                failures.push((i, e));
            }
        }
        BenchError::combine(failures)?;
        Ok(y)
    }

    /// Attaches a logger; it opens a new run for this problem right away.
    pub fn attach_logger(&mut self, logger: SharedLogger) -> Result<()> {
        logger::lock(&logger)?.attach_problem(&self.meta)?;
        self.loggers.push(logger);
        Ok(())
    }

    /// Detaches a logger and closes its current run. Unknown loggers are ignored.
    pub fn detach_logger(&mut self, logger: &SharedLogger) -> Result<()> {
        let before = self.loggers.len();
        self.loggers.retain(|l| !Arc::ptr_eq(l, logger));
        if self.loggers.len() < before {
            logger::lock(logger)?.reset()?;
        }
        Ok(())
    }

    pub fn loggers(&self) -> &[SharedLogger] {
        &self.loggers
    }

    /// Returns the state to its construction-time values and starts a new
    /// run in every attached logger.
    pub fn reset(&mut self) -> Result<()> {
        self.state.reset();
        self.constraints.clear();
        let mut failures = Vec::new();
        for (i, shared) in self.loggers.iter().enumerate() {
            let outcome = logger::lock(shared).and_then(|mut l| {
                l.reset()?;
                l.attach_problem(&self.meta)
            });
            if let Err(e) = outcome {
                log::error!("logger #{} failed to reset on {}: {}", i, self.meta, e);
                failures.push((i, e));
            }
        }
        BenchError::combine(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Enforced;
    use crate::logger::{Logger, shared};
    use ndarray::array;

    /// Records `(run, evaluations, y)` of every logged call.
    #[derive(Default)]
    struct Recorder {
        runs: usize,
        rows: Vec<(usize, usize, f64)>,
        resets: usize,
    }

    impl Logger for Recorder {
        fn attach_problem(&mut self, _meta: &MetaData) -> Result<()> {
            self.runs += 1;
            Ok(())
        }

        fn log(&mut self, info: &Info<'_>) -> Result<()> {
            self.rows.push((self.runs - 1, info.evaluations, info.y));
            Ok(())
        }

        fn reset(&mut self) -> Result<()> {
            self.resets += 1;
            Ok(())
        }
    }

    fn sphere(n: usize) -> Problem {
        Problem::new(
            MetaData::new(1, 1, "sphere", n, OptimizationType::Min),
            functions::sphere,
        )
        .with_optimum(Solution::new(vec![0.0; n], 0.0))
    }

    #[test]
    fn test_wrong_dimension_is_not_counted() {
        let mut p = sphere(2);
        let err = p.evaluate(&array![1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.is_precondition_error());
        assert_eq!(p.state().evaluations, 0);
    }

    #[test]
    fn test_best_so_far_through_evaluate() {
        let mut p = Problem::new(
            MetaData::new(9, 1, "identity", 1, OptimizationType::Min),
            |x: &Array1<f64>| x[0],
        );
        let mut best = Vec::new();
        for y in [5.0, 3.0, 3.0, 4.0, 2.0] {
            assert_eq!(p.evaluate(&array![y]).unwrap(), y);
            best.push(p.state().current_best.y);
        }
        assert_eq!(best, vec![5.0, 3.0, 3.0, 3.0, 2.0]);
        assert_eq!(p.state().evaluations, 5);
    }

    #[test]
    fn test_reset_starts_new_logger_run() {
        let recorder = shared(Recorder::default());
        let mut p = sphere(1);
        p.attach_logger(recorder.clone()).unwrap();
        p.evaluate(&array![2.0]).unwrap();
        p.evaluate(&array![1.0]).unwrap();
        p.reset().unwrap();
        assert_eq!(p.state().evaluations, 0);
        assert_eq!(p.state().current_best.y, f64::INFINITY);
        p.evaluate(&array![3.0]).unwrap();

        let r = recorder.lock().unwrap();
        assert_eq!(r.rows, vec![(0, 1, 4.0), (0, 2, 1.0), (1, 1, 9.0)]);
        assert_eq!(r.resets, 1);
    }

    #[test]
    fn test_detach_closes_the_run() {
        let recorder = shared(Recorder::default());
        let as_shared: SharedLogger = recorder.clone();
        let mut p = sphere(1);
        p.attach_logger(as_shared.clone()).unwrap();
        p.evaluate(&array![1.0]).unwrap();
        p.detach_logger(&as_shared).unwrap();
        p.evaluate(&array![1.0]).unwrap();
        assert!(p.loggers().is_empty());
        let r = recorder.lock().unwrap();
        assert_eq!(r.rows.len(), 1);
        assert_eq!(r.resets, 1);
    }

    #[test]
    fn test_failing_constraint_only_moves_the_counter() {
        let recorder = shared(Recorder::default());
        let mut p = sphere(1).with_constraint(Constraint::try_inequality("fragile", |x| {
            if x[0] > 0.0 {
                Ok(-1.0)
            } else {
                Err("negative input".to_string())
            }
        }));
        p.attach_logger(recorder.clone()).unwrap();
        p.evaluate(&array![1.0]).unwrap();
        let before = p.state().clone();

        let err = p.evaluate(&array![-1.0]).unwrap_err();
        assert!(matches!(err, BenchError::ConstraintFailed { .. }));
        assert_eq!(p.state().evaluations, before.evaluations + 1);
        assert_eq!(p.state().current, before.current);
        assert_eq!(p.state().current_best, before.current_best);
        assert_eq!(recorder.lock().unwrap().rows.len(), 1);
    }

    #[test]
    fn test_hard_constraint_skips_objective() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let mut p = Problem::new(
            MetaData::new(1, 1, "counted", 1, OptimizationType::Min),
            move |x: &Array1<f64>| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                x[0] * x[0]
            },
        )
        .with_constraint(
            Constraint::inequality("x below one", |x| x[0] - 1.0)
                .with_enforced(Enforced::Hard)
                .with_weight(10.0),
        );
        assert_eq!(p.evaluate(&array![0.5]).unwrap(), 0.25);
        assert_eq!(p.evaluate(&array![3.0]).unwrap(), 20.0);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(p.state().raw_y.is_nan());
        assert_eq!(p.constraints().iter().next().map(|c| c.violation()), Some(2.0));
    }

    #[test]
    fn test_instance_transform_moves_optimum() {
        let mut p = Problem::new(
            MetaData::new(1, 5, "sphere", 3, OptimizationType::Min),
            functions::sphere,
        )
        .with_optimum(Solution::new(vec![0.0; 3], 0.0))
        .with_instance_transform();
        let optimum = p.optimum().cloned().unwrap();
        let y = p.evaluate(&Array1::from_vec(optimum.x.clone())).unwrap();
        approx::assert_relative_eq!(y, optimum.y, epsilon = 1e-9);
        assert!(p.state().final_target_found);
    }
}
