//! Fan-out logger forwarding every call to several loggers.

use super::Logger;
use crate::error::{BenchError, Result};
use crate::info::Info;
use crate::types::MetaData;

/// Forwards to each member in order. A failing member does not stop the
/// others; failures are reported together as [`BenchError::Combined`].
#[derive(Default)]
pub struct Combine {
    loggers: Vec<Box<dyn Logger>>,
}

impl Combine {
    pub fn new(loggers: Vec<Box<dyn Logger>>) -> Self {
        Self { loggers }
    }

    pub fn push(&mut self, logger: Box<dyn Logger>) {
        self.loggers.push(logger);
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }

    fn for_each<F>(&mut self, what: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&mut dyn Logger) -> Result<()>,
    {
        let mut failures = Vec::new();
        for (i, logger) in self.loggers.iter_mut().enumerate() {
            if let Err(e) = f(logger.as_mut()) {
                log::error!("combined logger #{} failed to {}: {}", i, what, e);
                failures.push((i, e));
            }
        }
        BenchError::combine(failures)
    }
}

impl Logger for Combine {
    fn attach_suite(&mut self, suite_name: &str) {
        for logger in &mut self.loggers {
            logger.attach_suite(suite_name);
        }
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.for_each("attach", |l| l.attach_problem(meta))
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        self.for_each("log", |l| l.log(info))
    }

    fn reset(&mut self) -> Result<()> {
        self.for_each("reset", |l| l.reset())
    }

    fn flush(&mut self) -> Result<()> {
        self.for_each("flush", |l| l.flush())
    }
}
