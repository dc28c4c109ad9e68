//! In-memory logger keeping every fired row in nested ordered maps.

use super::{Logger, RunCursor, RunTracker, Watcher};
use crate::error::Result;
use crate::info::Info;
use crate::property::Property;
use crate::trigger::{self, BoxedTrigger};
use crate::types::MetaData;
use std::collections::BTreeMap;

/// Property values of one fired evaluation. Missing properties are absent.
pub type Attributes = BTreeMap<String, f64>;
/// Fired evaluations of one run, by evaluation count.
pub type RunData = BTreeMap<usize, Attributes>;
/// suite -> problem -> dimension -> instance -> run -> evaluations -> attributes
pub type StoreData =
    BTreeMap<String, BTreeMap<u32, BTreeMap<usize, BTreeMap<u32, BTreeMap<usize, RunData>>>>>;

/// Keeps the watched properties of every fired evaluation in memory.
pub struct Store {
    watcher: Watcher,
    tracker: RunTracker,
    data: StoreData,
}

impl Store {
    /// Without triggers, every evaluation is stored.
    pub fn new(mut triggers: Vec<BoxedTrigger>, properties: Vec<Property>) -> Self {
        if triggers.is_empty() {
            triggers.push(trigger::always());
        }
        Self {
            watcher: Watcher::new(triggers, properties),
            tracker: RunTracker::new(),
            data: StoreData::new(),
        }
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// All fired evaluations of a run, if it exists.
    pub fn run(&self, cursor: &RunCursor) -> Option<&RunData> {
        self.data
            .get(&cursor.key.suite)?
            .get(&cursor.key.problem)?
            .get(&cursor.key.dimension)?
            .get(&cursor.key.instance)?
            .get(&cursor.run)
    }

    /// Attributes stored for one evaluation of a run.
    pub fn at(&self, cursor: &RunCursor, evaluations: usize) -> Option<&Attributes> {
        self.run(cursor)?.get(&evaluations)
    }

    pub fn size(&self) -> (usize, usize, usize, usize) {
        self.tracker.size()
    }

    fn run_mut(&mut self, cursor: &RunCursor) -> &mut RunData {
        self.data
            .entry(cursor.key.suite.clone())
            .or_default()
            .entry(cursor.key.problem)
            .or_default()
            .entry(cursor.key.dimension)
            .or_default()
            .entry(cursor.key.instance)
            .or_default()
            .entry(cursor.run)
            .or_default()
    }
}

impl Logger for Store {
    fn attach_suite(&mut self, suite_name: &str) {
        self.tracker.set_suite(suite_name);
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.tracker.open_run(meta);
        Ok(())
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        let cursor = self.tracker.cursor(info.meta);
        // a run shows up once it is logged to, even if nothing fires
        self.run_mut(&cursor);
        let Some(values) = self.watcher.watch(&cursor, info) else {
            return Ok(());
        };
        let attributes: Attributes = self
            .watcher
            .properties()
            .iter()
            .zip(values)
            .filter_map(|(p, v)| v.map(|v| (p.name().to_string(), v)))
            .collect();
        self.run_mut(&cursor).insert(info.evaluations, attributes);
        Ok(())
    }
}
