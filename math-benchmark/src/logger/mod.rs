//! Loggers record the performance of a solver on the problems they watch.
//!
//! A logger is attached to problems (directly or through a suite) and
//! receives an [`Info`] after every evaluation. It decides with its triggers
//! whether the evaluation is worth keeping, extracts its properties and
//! writes the row to its sink.
//!
//! Runs are grouped per `(suite, problem, dimension, instance)`: every time a
//! problem is attached or reset, the logger opens the next run for that key.
//! A run only shows up in a logger's output once something was logged to it.

pub mod analyzer;
pub mod combine;
pub mod eaf;
pub mod eah;
pub mod flatfile;
pub mod store;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use combine::Combine;
pub use eaf::{Eaf, RunPoint};
pub use eah::{Ecdf, Eah};
pub use flatfile::{FlatFile, FlatFileBuilder};
pub use store::Store;

use crate::error::{BenchError, Result};
use crate::info::Info;
use crate::property::Property;
use crate::trigger::{AnyOf, BoxedTrigger, Trigger};
use crate::types::MetaData;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Suite name used for problems attached outside of any suite.
pub const UNKNOWN_SUITE: &str = "unknown_suite";

/// Receives evaluation snapshots and persists what its triggers select.
pub trait Logger: Send {
    /// Called once when the logger is attached to a suite, before its problems.
    fn attach_suite(&mut self, _suite_name: &str) {}

    /// Called when a problem is attached or reset. Opens the next run for
    /// the problem's key.
    fn attach_problem(&mut self, meta: &MetaData) -> Result<()>;

    /// Called after every evaluation of an attached problem.
    fn log(&mut self, info: &Info<'_>) -> Result<()>;

    /// Closes the current run and finalizes per-run buffers. Trigger memory
    /// starts over with the next run of each problem.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Makes everything recorded so far durable.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    fn attach_suite(&mut self, suite_name: &str) {
        (**self).attach_suite(suite_name)
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        (**self).attach_problem(meta)
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        (**self).log(info)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// A logger that can be attached to several problems at once.
pub type SharedLogger = Arc<Mutex<dyn Logger>>;

/// Wraps a logger for attachment, keeping its concrete type so the caller can
/// still read it back, e.g. `store.lock()?.data()`.
pub fn shared<L: Logger + 'static>(logger: L) -> Arc<Mutex<L>> {
    Arc::new(Mutex::new(logger))
}

pub(crate) fn lock(logger: &SharedLogger) -> Result<MutexGuard<'_, dyn Logger + 'static>> {
    logger.lock().map_err(|_| BenchError::LoggerPoisoned)
}

/// Identifies the runs that belong together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemKey {
    pub suite: String,
    pub problem: u32,
    pub dimension: usize,
    pub instance: u32,
}

impl fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/f{}/{}D/i{}",
            self.suite, self.problem, self.dimension, self.instance
        )
    }
}

/// A single run of a problem key. Runs are numbered from 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunCursor {
    pub key: ProblemKey,
    pub run: usize,
}

impl RunCursor {
    pub fn new(suite: impl Into<String>, problem: u32, dimension: usize, instance: u32, run: usize) -> Self {
        Self {
            key: ProblemKey {
                suite: suite.into(),
                problem,
                dimension,
                instance,
            },
            run,
        }
    }
}

/// Numbers runs per problem key. Shared by every concrete logger.
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    suite: Option<String>,
    runs: HashMap<ProblemKey, usize>,
    logged: HashSet<RunCursor>,
    current: Option<RunCursor>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_suite(&mut self, name: &str) {
        self.suite = Some(name.to_string());
    }

    pub fn suite_name(&self) -> &str {
        self.suite.as_deref().unwrap_or(UNKNOWN_SUITE)
    }

    pub fn key(&self, meta: &MetaData) -> ProblemKey {
        ProblemKey {
            suite: self.suite_name().to_string(),
            problem: meta.problem_id,
            dimension: meta.n_variables,
            instance: meta.instance,
        }
    }

    /// Opens the next run for `meta` and makes it current.
    pub fn open_run(&mut self, meta: &MetaData) -> RunCursor {
        let key = self.key(meta);
        let count = self.runs.entry(key.clone()).or_insert(0);
        let cursor = RunCursor { key, run: *count };
        *count += 1;
        log::debug!("opening run {} of {}", cursor.run, cursor.key);
        self.current = Some(cursor.clone());
        cursor
    }

    /// The run an evaluation of `meta` logs to: the latest one, or run 0 if
    /// the problem was never attached. The run counts as used from then on.
    pub fn cursor(&mut self, meta: &MetaData) -> RunCursor {
        let key = self.key(meta);
        let cursor = match self.runs.get(&key) {
            Some(&count) if count > 0 => {
                let cursor = RunCursor {
                    key,
                    run: count - 1,
                };
                self.current = Some(cursor.clone());
                cursor
            }
            _ => self.open_run(meta),
        };
        self.logged.insert(cursor.clone());
        cursor
    }

    /// The run most recently opened or logged to.
    pub fn current(&self) -> Option<&RunCursor> {
        self.current.as_ref()
    }

    /// Number of runs opened for `key`.
    pub fn runs(&self, key: &ProblemKey) -> usize {
        self.runs.get(key).copied().unwrap_or(0)
    }

    /// Whether anything was logged to `cursor`.
    pub fn is_logged(&self, cursor: &RunCursor) -> bool {
        self.logged.contains(cursor)
    }

    /// Distinct problems, dimensions and instances logged to, and the
    /// largest number of used runs of any key. Runs opened by a reset that
    /// was never followed by an evaluation are not counted.
    pub fn size(&self) -> (usize, usize, usize, usize) {
        let keys: BTreeSet<_> = self.logged.iter().map(|c| &c.key).collect();
        let problems: BTreeSet<_> = keys.iter().map(|k| (&k.suite, k.problem)).collect();
        let dimensions: BTreeSet<_> = keys.iter().map(|k| k.dimension).collect();
        let instances: BTreeSet<_> = keys.iter().map(|k| k.instance).collect();
        let runs = keys
            .iter()
            .map(|&k| self.logged.iter().filter(|c| &c.key == k).count())
            .max()
            .unwrap_or(0);
        (problems.len(), dimensions.len(), instances.len(), runs)
    }
}

/// A trigger set whose memory is kept apart for every problem key and
/// starts over with each run, so one problem's best value never decides
/// whether another problem's evaluation is recorded.
#[derive(Clone, Default)]
pub struct RunTriggers {
    template: AnyOf,
    live: HashMap<ProblemKey, (usize, AnyOf)>,
}

impl RunTriggers {
    pub fn new(triggers: Vec<BoxedTrigger>) -> Self {
        Self {
            template: AnyOf::new(triggers),
            live: HashMap::new(),
        }
    }

    pub fn fire(&mut self, cursor: &RunCursor, info: &Info<'_>) -> bool {
        let template = &self.template;
        let (run, triggers) = self
            .live
            .entry(cursor.key.clone())
            .or_insert_with(|| (cursor.run, template.clone()));
        if *run != cursor.run {
            *run = cursor.run;
            *triggers = template.clone();
        }
        triggers.fire(info)
    }
}

/// Triggers plus the properties recorded when any of them fires.
pub struct Watcher {
    triggers: RunTriggers,
    properties: Vec<Property>,
}

impl Watcher {
    pub fn new(triggers: Vec<BoxedTrigger>, properties: Vec<Property>) -> Self {
        Self {
            triggers: RunTriggers::new(triggers),
            properties,
        }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Property values for `info` logged to `cursor`, or `None` when no
    /// trigger fired.
    pub fn watch(&mut self, cursor: &RunCursor, info: &Info<'_>) -> Option<Vec<Option<f64>>> {
        if !self.triggers.fire(cursor, info) {
            return None;
        }
        Some(self.properties.iter().map(|p| p.compute(info)).collect())
    }
}
