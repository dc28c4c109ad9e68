//! Predicates deciding whether an evaluation gets recorded.
//!
//! Triggers see every [`Info`] in evaluation order. Stateful triggers keep a
//! small memory of their own (a best value, a last boundary). Loggers give
//! every run of every problem its own fresh copy of their triggers.

use crate::error::{BenchError, Result};
use crate::info::Info;
use std::collections::BTreeSet;

/// Decides, for one evaluation, whether a logger records it.
///
/// Loggers keep one copy of their triggers per problem, so a trigger must be
/// cloneable; any `Clone` trigger gets [`TriggerClone`] for free.
pub trait Trigger: Send + TriggerClone {
    fn fire(&mut self, info: &Info<'_>) -> bool;

    /// Forgets any memory accumulated during the current run.
    fn reset(&mut self) {}
}

pub type BoxedTrigger = Box<dyn Trigger>;

pub trait TriggerClone {
    fn box_clone(&self) -> BoxedTrigger;
}

impl<T: Trigger + Clone + 'static> TriggerClone for T {
    fn box_clone(&self) -> BoxedTrigger {
        Box::new(self.clone())
    }
}

impl Clone for BoxedTrigger {
    fn clone(&self) -> Self {
        (**self).box_clone()
    }
}

/// Fires on every evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Trigger for Always {
    fn fire(&mut self, _info: &Info<'_>) -> bool {
        true
    }
}

/// Fires when the evaluation improved the best-so-far value.
///
/// By default this follows the problem's own `has_improved` flag. The
/// tracking form instead remembers the best `y` it has seen and fires when
/// the current `y` is strictly better; its first call always fires.
#[derive(Debug, Clone, Default)]
pub struct OnImprovement {
    tracking: bool,
    best: Option<f64>,
}

impl OnImprovement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracking() -> Self {
        Self {
            tracking: true,
            best: None,
        }
    }
}

impl Trigger for OnImprovement {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        if !self.tracking {
            return info.has_improved;
        }
        let better = match self.best {
            None => true,
            Some(best) => info.meta.optimization_type.is_better(info.y, best),
        };
        if better {
            self.best = Some(info.y);
        }
        better
    }

    fn reset(&mut self) {
        self.best = None;
    }
}

/// Fires when the best-so-far value moved by more than `delta` since the
/// last time this trigger fired. The first call always fires.
#[derive(Debug, Clone)]
pub struct OnDeltaImprovement {
    delta: f64,
    best: Option<f64>,
}

impl OnDeltaImprovement {
    pub fn new(delta: f64) -> Result<Self> {
        if !(delta >= 0.0) {
            return Err(BenchError::InvalidTrigger {
                reason: format!("delta must be a non-negative number, got {}", delta),
            });
        }
        Ok(Self { delta, best: None })
    }
}

impl Trigger for OnDeltaImprovement {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        let fired = match self.best {
            None => !info.y_best.is_nan(),
            Some(best) => info.meta.optimization_type.improvement(info.y_best, best) > self.delta,
        };
        if fired {
            self.best = Some(info.y_best);
        }
        fired
    }

    fn reset(&mut self) {
        self.best = None;
    }
}

/// Fires when any constraint is violated.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnViolation;

impl Trigger for OnViolation {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        info.is_violated()
    }
}

/// Fires at fixed evaluation counts.
#[derive(Debug, Clone, Default)]
pub struct At {
    time_points: BTreeSet<usize>,
}

impl At {
    pub fn new(time_points: impl IntoIterator<Item = usize>) -> Self {
        Self {
            time_points: time_points.into_iter().collect(),
        }
    }
}

impl Trigger for At {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        self.time_points.contains(&info.evaluations)
    }
}

/// Fires every `interval` evaluations, starting at `starting_at`.
#[derive(Debug, Clone)]
pub struct Each {
    interval: usize,
    starting_at: usize,
}

impl Each {
    pub fn new(interval: usize) -> Result<Self> {
        Self::starting_at(interval, 0)
    }

    pub fn starting_at(interval: usize, starting_at: usize) -> Result<Self> {
        if interval == 0 {
            return Err(BenchError::InvalidTrigger {
                reason: "interval must be at least 1".to_string(),
            });
        }
        Ok(Self {
            interval,
            starting_at,
        })
    }
}

impl Trigger for Each {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        info.evaluations >= self.starting_at
            && (info.evaluations - self.starting_at) % self.interval == 0
    }
}

/// Fires while the evaluation count is inside any closed range `[lo, hi]`.
#[derive(Debug, Clone, Default)]
pub struct During {
    time_ranges: Vec<(usize, usize)>,
}

impl During {
    pub fn new(time_ranges: impl IntoIterator<Item = (usize, usize)>) -> Result<Self> {
        let time_ranges: Vec<_> = time_ranges.into_iter().collect();
        if let Some(&(lo, hi)) = time_ranges.iter().find(|(lo, hi)| lo > hi) {
            return Err(BenchError::InvalidTrigger {
                reason: format!("empty range [{}, {}]", lo, hi),
            });
        }
        Ok(Self { time_ranges })
    }
}

impl Trigger for During {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        self.time_ranges
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&info.evaluations))
    }
}

/// Fires if any member fires. Every member is evaluated on every call so
/// stateful members stay in step; an empty set never fires.
#[derive(Clone, Default)]
pub struct AnyOf {
    triggers: Vec<BoxedTrigger>,
}

impl AnyOf {
    pub fn new(triggers: Vec<BoxedTrigger>) -> Self {
        Self { triggers }
    }

    pub fn push(&mut self, trigger: BoxedTrigger) {
        self.triggers.push(trigger);
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl Trigger for AnyOf {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        self.triggers
            .iter_mut()
            .fold(false, |fired, t| t.fire(info) | fired)
    }

    fn reset(&mut self) {
        self.triggers.iter_mut().for_each(|t| t.reset());
    }
}

/// Fires if every member fires; an empty set always fires.
#[derive(Clone, Default)]
pub struct AllOf {
    triggers: Vec<BoxedTrigger>,
}

impl AllOf {
    pub fn new(triggers: Vec<BoxedTrigger>) -> Self {
        Self { triggers }
    }
}

impl Trigger for AllOf {
    fn fire(&mut self, info: &Info<'_>) -> bool {
        self.triggers
            .iter_mut()
            .fold(true, |fired, t| t.fire(info) & fired)
    }

    fn reset(&mut self) {
        self.triggers.iter_mut().for_each(|t| t.reset());
    }
}

pub fn always() -> BoxedTrigger {
    Box::new(Always)
}

pub fn on_improvement() -> BoxedTrigger {
    Box::new(OnImprovement::new())
}

pub fn on_violation() -> BoxedTrigger {
    Box::new(OnViolation)
}

pub fn at(time_points: impl IntoIterator<Item = usize>) -> BoxedTrigger {
    Box::new(At::new(time_points))
}

pub fn each(interval: usize) -> Result<BoxedTrigger> {
    Ok(Box::new(Each::new(interval)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::fixtures::Snapshot;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fired_at(trigger: &mut dyn Trigger, counts: std::ops::RangeInclusive<usize>) -> Vec<usize> {
        counts
            .filter(|&n| trigger.fire(&Snapshot::new(n, 1.0, 1.0, false).info()))
            .collect()
    }

    /// Replays `ys` as a minimization run and returns which calls fired.
    fn replay(trigger: &mut dyn Trigger, ys: &[f64]) -> Vec<bool> {
        let mut best = f64::INFINITY;
        ys.iter()
            .enumerate()
            .map(|(i, &y)| {
                let improved = y < best;
                if improved {
                    best = y;
                }
                trigger.fire(&Snapshot::new(i + 1, y, best, improved).info())
            })
            .collect()
    }

    #[test]
    fn test_on_improvement_follows_state() {
        let ys = [5.0, 3.0, 3.0, 4.0, 2.0];
        assert_eq!(
            replay(&mut OnImprovement::new(), &ys),
            vec![true, true, false, false, true]
        );
        assert_eq!(
            replay(&mut OnImprovement::tracking(), &ys),
            vec![true, true, false, false, true]
        );
    }

    #[test]
    fn test_tracking_improvement_forgets_on_reset() {
        let mut t = OnImprovement::tracking();
        assert_eq!(replay(&mut t, &[1.0, 2.0]), vec![true, false]);
        t.reset();
        assert_eq!(replay(&mut t, &[2.0]), vec![true]);
    }

    #[test]
    fn test_each_interval() {
        let mut t = Each::new(3).unwrap();
        assert_eq!(fired_at(&mut t, 1..=12), vec![3, 6, 9, 12]);
        let mut t = Each::starting_at(3, 2).unwrap();
        assert_eq!(fired_at(&mut t, 1..=9), vec![2, 5, 8]);
        assert!(Each::new(0).is_err());
    }

    #[test]
    fn test_at_fixed_points() {
        let mut t = At::new([1, 5]);
        assert_eq!(fired_at(&mut t, 1..=10), vec![1, 5]);
    }

    #[test]
    fn test_during_closed_ranges() {
        let mut t = During::new([(2, 3), (7, 7)]).unwrap();
        assert_eq!(fired_at(&mut t, 1..=10), vec![2, 3, 7]);
        assert!(During::new([(4, 1)]).is_err());
    }

    #[test]
    fn test_delta_improvement() {
        let mut t = OnDeltaImprovement::new(1.0).unwrap();
        let fired = replay(&mut t, &[10.0, 9.5, 9.2, 8.9, 8.0, 6.5]);
        assert_eq!(fired, vec![true, false, false, true, false, true]);
        assert!(OnDeltaImprovement::new(-1.0).is_err());
        assert!(OnDeltaImprovement::new(f64::NAN).is_err());
    }

    #[test]
    fn test_on_violation() {
        let mut t = OnViolation;
        let mut snap = Snapshot::new(1, 1.0, 1.0, false);
        assert!(!t.fire(&snap.info()));
        snap.violations = vec![0.0, 0.1];
        assert!(t.fire(&snap.info()));
    }

    #[derive(Clone)]
    struct Counting(Arc<AtomicUsize>);

    impl Trigger for Counting {
        fn fire(&mut self, _info: &Info<'_>) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    #[test]
    fn test_any_of_keeps_every_member_in_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut any = AnyOf::new(vec![always(), Box::new(Counting(calls.clone()))]);
        assert_eq!(replay(&mut any, &[3.0, 2.8, 2.4, 2.3]), vec![true; 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let mut all = AllOf::new(vec![Box::new(Counting(calls.clone())), always()]);
        assert_eq!(replay(&mut all, &[1.0, 0.5]), vec![false; 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_empty_sets() {
        assert!(!AnyOf::default().fire(&Snapshot::new(1, 1.0, 1.0, true).info()));
        assert!(AllOf::default().fire(&Snapshot::new(1, 1.0, 1.0, true).info()));
    }

    #[test]
    fn test_all_of() {
        let mut t = AllOf::new(vec![each(2).unwrap(), at([4, 5])]);
        assert_eq!(fired_at(&mut t, 1..=8), vec![4]);
    }
}
