//! Single-file tabular logger.
//!
//! Every fired evaluation becomes one row:
//!
//! ```text
//! suite problem dim instance run evaluations <property>... [x0 ... x{n-1}]
//! ```
//!
//! Missing property values are written as `None`. Floats use the shortest
//! representation that parses back to the same value. When positions are
//! stored and a problem of another dimension fires, a new header with the
//! matching `x` columns precedes its rows.

use super::{Logger, RunTracker, Watcher};
use crate::error::{BenchError, Result};
use crate::info::Info;
use crate::property::Property;
use crate::trigger::{self, BoxedTrigger};
use crate::types::MetaData;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Columns written before the configured properties.
pub const COMMON_COLUMNS: [&str; 6] = ["suite", "problem", "dim", "instance", "run", "evaluations"];

/// Marker written for a property that does not apply.
pub const MISSING: &str = "None";

/// Builder for [`FlatFile`].
pub struct FlatFileBuilder {
    path: PathBuf,
    triggers: Vec<BoxedTrigger>,
    properties: Vec<Property>,
    separator: String,
    repeat_header: bool,
    store_positions: bool,
}

impl FlatFileBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            triggers: Vec::new(),
            properties: Vec::new(),
            separator: " ".to_string(),
            repeat_header: false,
            store_positions: false,
        }
    }

    /// Adds a trigger. Without any, every evaluation is written.
    pub fn trigger(mut self, trigger: BoxedTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn triggers(mut self, triggers: Vec<BoxedTrigger>) -> Self {
        self.triggers.extend(triggers);
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: Vec<Property>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Writes the header again at the start of every run.
    pub fn repeat_header(mut self, repeat: bool) -> Self {
        self.repeat_header = repeat;
        self
    }

    /// Appends the evaluated point as `x0 .. x{n-1}`.
    pub fn store_positions(mut self, store: bool) -> Self {
        self.store_positions = store;
        self
    }

    pub fn build(mut self) -> FlatFile {
        if self.triggers.is_empty() {
            self.triggers.push(trigger::always());
        }
        FlatFile {
            path: self.path,
            watcher: Watcher::new(self.triggers, self.properties),
            separator: self.separator,
            repeat_header: self.repeat_header,
            store_positions: self.store_positions,
            tracker: RunTracker::new(),
            writer: None,
            header_pending: true,
            header_dimension: None,
            rows: 0,
        }
    }
}

/// Writes fired evaluations of every attached problem to one file.
pub struct FlatFile {
    path: PathBuf,
    watcher: Watcher,
    separator: String,
    repeat_header: bool,
    store_positions: bool,
    tracker: RunTracker,
    writer: Option<BufWriter<File>>,
    header_pending: bool,
    header_dimension: Option<usize>,
    rows: usize,
}

impl FlatFile {
    pub fn builder(path: impl Into<PathBuf>) -> FlatFileBuilder {
        FlatFileBuilder::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn header(&self, n_variables: usize) -> String {
        let mut columns: Vec<String> = COMMON_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(self.watcher.properties().iter().map(|p| p.name().to_string()));
        if self.store_positions {
            columns.extend((0..n_variables).map(|i| format!("x{}", i)));
        }
        columns.join(&self.separator)
    }

    fn open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
        let file = File::create(&self.path).map_err(|e| BenchError::io(&self.path, e))?;
        log::info!("writing flat-file log to {}", self.path.display());
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.open()?;
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line).map_err(|e| BenchError::io(&self.path, e))?;
        }
        Ok(())
    }
}

impl Logger for FlatFile {
    fn attach_suite(&mut self, suite_name: &str) {
        self.tracker.set_suite(suite_name);
    }

    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.open()?;
        self.tracker.open_run(meta);
        if self.repeat_header {
            self.header_pending = true;
        }
        Ok(())
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        let cursor = self.tracker.cursor(info.meta);
        let Some(values) = self.watcher.watch(&cursor, info) else {
            return Ok(());
        };
        let n = info.meta.n_variables;
        if self.header_pending || (self.store_positions && self.header_dimension != Some(n)) {
            let header = self.header(n);
            self.write_line(&header)?;
            self.header_pending = false;
            self.header_dimension = Some(n);
        }

        let sep = self.separator.as_str();
        let mut line = String::new();
        // writing into a String cannot fail
        let _ = write!(
            line,
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            cursor.key.suite,
            cursor.key.problem,
            cursor.key.dimension,
            cursor.key.instance,
            cursor.run,
            info.evaluations
        );
        for value in values {
            line.push_str(sep);
            match value {
                Some(v) => {
                    let _ = write!(line, "{}", v);
                }
                None => line.push_str(MISSING),
            }
        }
        if self.store_positions {
            for xi in info.x {
                let _ = write!(line, "{sep}{}", xi);
            }
        }
        self.write_line(&line)?;
        self.rows += 1;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| BenchError::io(&self.path, e))?;
        }
        Ok(())
    }
}

impl Drop for FlatFile {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("failed to flush {} on drop: {}", self.path.display(), e);
        }
    }
}
