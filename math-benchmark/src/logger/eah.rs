//! Pre-binned attainment loggers.
//!
//! [`Eah`] counts, per run, how many fired evaluations fell in each
//! `(error bucket, evaluation bucket)` cell. [`Ecdf`] keeps, per run, a 0/1
//! matrix of which error levels were attained by which evaluation bucket.

use super::eaf::default_quality;
use super::{Logger, RunCursor, RunTracker, RunTriggers};
use crate::error::Result;
use crate::info::Info;
use crate::property::Property;
use crate::scale::Scale;
use crate::stat::{self, AttainmentSummary};
use crate::trigger::{self, BoxedTrigger};
use crate::types::MetaData;
use ndarray::{Array2, s};
use std::collections::BTreeMap;

/// Per-run matrices shared by both loggers.
struct Grid {
    triggers: RunTriggers,
    quality: Property,
    tracker: RunTracker,
    error: Scale,
    evals: Scale,
    data: BTreeMap<RunCursor, Array2<u64>>,
}

impl Grid {
    fn new(error: Scale, evals: Scale) -> Self {
        Self {
            triggers: RunTriggers::new(vec![trigger::always()]),
            quality: default_quality(),
            tracker: RunTracker::new(),
            error,
            evals,
            data: BTreeMap::new(),
        }
    }

    fn zeros(&self) -> Array2<u64> {
        Array2::zeros((self.error.size(), self.evals.size()))
    }

    /// The run matrix and cell to update for `info`, if any. The matrix of a
    /// run exists from its first logged evaluation on.
    fn target(&mut self, info: &Info<'_>) -> Option<(&mut Array2<u64>, (usize, usize))> {
        let cursor = self.tracker.cursor(info.meta);
        let fired = self.triggers.fire(&cursor, info);
        let zeros = self.zeros();
        let matrix = self.data.entry(cursor).or_insert(zeros);
        if !fired {
            return None;
        }
        let quality = self.quality.compute(info)?;
        let cell = stat::attainment_cell(&self.error, &self.evals, quality, info.evaluations)?;
        Some((matrix, cell))
    }

    fn at(&self, cursor: &RunCursor) -> Array2<u64> {
        self.data.get(cursor).cloned().unwrap_or_else(|| self.zeros())
    }

    fn histogram(&self) -> Array2<u64> {
        self.data.values().fold(self.zeros(), |acc, m| acc + m)
    }
}

macro_rules! grid_logger_api {
    ($ty:ident) => {
        impl $ty {
            /// Linear error and evaluation scales.
            pub fn new(
                error_min: f64,
                error_max: f64,
                error_buckets: usize,
                evals_min: usize,
                evals_max: usize,
                evals_buckets: usize,
            ) -> Result<Self> {
                Ok(Self::with_scales(
                    Scale::linear(error_min, error_max, error_buckets)?,
                    Scale::linear(evals_min as f64, evals_max as f64, evals_buckets)?,
                ))
            }

            /// Records on every evaluation unless other triggers are given.
            pub fn with_scales(error: Scale, evals: Scale) -> Self {
                Self {
                    grid: Grid::new(error, evals),
                }
            }

            pub fn with_triggers(mut self, triggers: Vec<BoxedTrigger>) -> Self {
                self.grid.triggers = RunTriggers::new(triggers);
                self
            }

            pub fn with_quality(mut self, quality: Property) -> Self {
                self.grid.quality = quality;
                self
            }

            pub fn error_scale(&self) -> &Scale {
                &self.grid.error
            }

            pub fn eval_scale(&self) -> &Scale {
                &self.grid.evals
            }

            pub fn data(&self) -> &BTreeMap<RunCursor, Array2<u64>> {
                &self.grid.data
            }

            /// Matrix of one run; zeros when the run is untracked.
            pub fn at(&self, cursor: &RunCursor) -> Array2<u64> {
                self.grid.at(cursor)
            }

            pub fn size(&self) -> (usize, usize, usize, usize) {
                self.grid.tracker.size()
            }
        }

        impl AttainmentSummary for $ty {
            fn sum(&self) -> u64 {
                self.grid.data.values().map(|m| m.sum()).sum()
            }

            fn histogram(&self) -> Array2<u64> {
                self.grid.histogram()
            }
        }
    };
}

/// Empirical attainment histogram.
pub struct Eah {
    grid: Grid,
}

grid_logger_api!(Eah);

impl Logger for Eah {
    fn attach_suite(&mut self, suite_name: &str) {
        self.grid.tracker.set_suite(suite_name);
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.grid.tracker.open_run(meta);
        Ok(())
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        if let Some((matrix, cell)) = self.grid.target(info) {
            matrix[cell] += 1;
        }
        Ok(())
    }
}

/// Empirical cumulative attainment: a cell is 1 once its error level was
/// reached at or before its evaluation bucket.
pub struct Ecdf {
    grid: Grid,
}

grid_logger_api!(Ecdf);

impl Logger for Ecdf {
    fn attach_suite(&mut self, suite_name: &str) {
        self.grid.tracker.set_suite(suite_name);
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.grid.tracker.open_run(meta);
        Ok(())
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        if let Some((matrix, (i, j))) = self.grid.target(info) {
            // a quality also attains every coarser level, from then on
            matrix.slice_mut(s![i.., j..]).fill(1);
        }
        Ok(())
    }
}
