//! Empirical attainment function logger, keeping raw attainment points.

use super::{Logger, ProblemKey, RunCursor, RunTracker, RunTriggers};
use crate::error::Result;
use crate::info::Info;
use crate::property::Property;
use crate::scale::Scale;
use crate::stat::{self, AttainmentSummary};
use crate::trigger::{self, BoxedTrigger};
use crate::types::MetaData;
use ndarray::Array2;
use std::collections::BTreeMap;

/// A quality reached by a run at a given evaluation count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPoint {
    pub quality: f64,
    pub time: usize,
    pub run: usize,
}

/// Quality recorded by attainment loggers unless configured otherwise: the
/// best distance to the optimum, or the best value when no optimum is known.
pub fn default_quality() -> Property {
    Property::closure("quality", |info| {
        info.error_best().or(Some(info.y_best)).filter(|q| q.is_finite())
    })
}

/// Records a [`RunPoint`] every time a trigger fires.
pub struct Eaf {
    triggers: RunTriggers,
    quality: Property,
    tracker: RunTracker,
    data: BTreeMap<ProblemKey, Vec<RunPoint>>,
}

impl Default for Eaf {
    fn default() -> Self {
        Self::new()
    }
}

impl Eaf {
    /// Records the default quality on every improvement.
    pub fn new() -> Self {
        Self::with_triggers(vec![trigger::on_improvement()])
    }

    pub fn with_triggers(triggers: Vec<BoxedTrigger>) -> Self {
        Self {
            triggers: RunTriggers::new(triggers),
            quality: default_quality(),
            tracker: RunTracker::new(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_quality(mut self, quality: Property) -> Self {
        self.quality = quality;
        self
    }

    pub fn data(&self) -> &BTreeMap<ProblemKey, Vec<RunPoint>> {
        &self.data
    }

    /// Points of every run of `key`. Empty when untracked.
    pub fn points(&self, key: &ProblemKey) -> &[RunPoint] {
        self.data.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Points of a single run. Empty when untracked.
    pub fn at(&self, cursor: &RunCursor) -> Vec<RunPoint> {
        self.points(&cursor.key)
            .iter()
            .filter(|p| p.run == cursor.run)
            .copied()
            .collect()
    }

    /// Total number of points recorded.
    pub fn len(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size(&self) -> (usize, usize, usize, usize) {
        self.tracker.size()
    }

    /// Bins every point on an error x evaluations grid.
    pub fn binned(&self, error: Scale, evals: Scale) -> BinnedEaf<'_> {
        BinnedEaf {
            eaf: self,
            error,
            evals,
        }
    }
}

impl Logger for Eaf {
    fn attach_suite(&mut self, suite_name: &str) {
        self.tracker.set_suite(suite_name);
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.tracker.open_run(meta);
        Ok(())
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        let cursor = self.tracker.cursor(info.meta);
        if !self.triggers.fire(&cursor, info) {
            return Ok(());
        }
        if let Some(quality) = self.quality.compute(info) {
            self.data.entry(cursor.key).or_default().push(RunPoint {
                quality,
                time: info.evaluations,
                run: cursor.run,
            });
        }
        Ok(())
    }
}

/// An [`Eaf`] seen through a pair of scales. Points outside the grid, per
/// [`stat::attainment_cell`], are left out.
pub struct BinnedEaf<'a> {
    eaf: &'a Eaf,
    error: Scale,
    evals: Scale,
}

impl AttainmentSummary for BinnedEaf<'_> {
    fn sum(&self) -> u64 {
        self.histogram().sum()
    }

    fn histogram(&self) -> Array2<u64> {
        let mut counts = Array2::zeros((self.error.size(), self.evals.size()));
        for point in self.eaf.data.values().flatten() {
            if let Some(cell) = stat::attainment_cell(&self.error, &self.evals, point.quality, point.time) {
                counts[cell] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::fixtures::Snapshot;
    use crate::logger::UNKNOWN_SUITE;

    fn feed(eaf: &mut Eaf, ys: &[f64]) {
        let mut best = f64::INFINITY;
        for (i, &y) in ys.iter().enumerate() {
            let improved = y < best;
            best = best.min(y);
            eaf.log(&Snapshot::new(i + 1, y, best, improved).info()).unwrap();
        }
    }

    #[test]
    fn test_points_on_improvement() {
        let mut eaf = Eaf::new();
        let meta = Snapshot::new(1, 0.0, 0.0, false).meta;
        eaf.attach_problem(&meta).unwrap();
        feed(&mut eaf, &[5.0, 3.0, 3.0, 4.0, 2.0]);
        eaf.reset().unwrap();
        eaf.attach_problem(&meta).unwrap();
        feed(&mut eaf, &[1.0]);

        let run0 = eaf.at(&RunCursor::new(UNKNOWN_SUITE, 1, 2, 1, 0));
        let times: Vec<_> = run0.iter().map(|p| (p.time, p.quality)).collect();
        assert_eq!(times, vec![(1, 5.0), (2, 3.0), (5, 2.0)]);
        assert_eq!(eaf.len(), 4);
        assert_eq!(eaf.size(), (1, 1, 1, 2));
        assert!(eaf.at(&RunCursor::new("other", 1, 2, 1, 0)).is_empty());
    }

    #[test]
    fn test_binned_view() {
        let mut eaf = Eaf::with_triggers(vec![trigger::always()]);
        let meta = Snapshot::new(1, 0.0, 0.0, false).meta;
        eaf.attach_problem(&meta).unwrap();
        feed(&mut eaf, &[9.0, 4.0, 20.0, 0.5]);
        let view = eaf.binned(
            Scale::linear(0.0, 10.0, 2).unwrap(),
            Scale::linear(1.0, 4.0, 2).unwrap(),
        );
        // best-so-far qualities 9, 4, 4, 0.5 at times 1..=4
        let h = view.histogram();
        assert_eq!(h[[1, 0]], 1);
        assert_eq!(h[[0, 0]], 1);
        assert_eq!(h[[0, 1]], 2);
        assert_eq!(stat::sum(&view), 4);
    }
}
