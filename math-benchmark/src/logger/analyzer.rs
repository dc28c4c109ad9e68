//! Default logger producing `.info`/`.dat` files for post-processing tools.
//!
//! Layout under the output folder:
//!
//! ```text
//! <prefix>_f<id>_<name>.info
//! data_f<id>_<name>/<prefix>_f<id>_DIM<n>.dat
//! ```
//!
//! A `.dat` file holds one block per run, each block starting with the
//! quoted header. A `.info` file holds, for every dimension of the problem,
//! a description line, a `%` line and a line listing the `.dat` file with
//! one `<instance>:<run>|<best y>` entry per run. `.info` files are
//! rewritten on every flush.

use super::{Logger, RunCursor, RunTracker, RunTriggers};
use crate::error::{BenchError, Result};
use crate::info::Info;
use crate::property::Property;
use crate::trigger::{self, BoxedTrigger};
use crate::types::MetaData;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header of a `.dat` block, before extra properties and positions.
pub const DAT_HEADER: &str =
    "\"function evaluation\" \"current f(x)\" \"best-so-far f(x)\" \"current af(x)+b\" \"best af(x)+b\"";

/// Default output root, in the user cache directory.
pub fn default_root() -> PathBuf {
    ProjectDirs::from("org", "spinorama", "math-audio")
        .map(|dirs| dirs.cache_dir().join("benchmarks"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// First of `name`, `name-1`, `name-2`, ... that does not exist under `root`.
fn unique_folder(root: &Path, name: &str) -> PathBuf {
    let mut candidate = root.join(name);
    let mut i = 1;
    while candidate.exists() {
        candidate = root.join(format!("{}-{}", name, i));
        i += 1;
    }
    candidate
}

/// Builder for [`Analyzer`].
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    folder_name: String,
    algorithm_name: String,
    algorithm_info: String,
    prefix: String,
    triggers: Vec<BoxedTrigger>,
    properties: Vec<Property>,
    store_positions: bool,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self {
            root: None,
            folder_name: "bench_data".to_string(),
            algorithm_name: "algorithm".to_string(),
            algorithm_info: String::new(),
            prefix: "bench".to_string(),
            triggers: Vec::new(),
            properties: Vec::new(),
            store_positions: false,
        }
    }
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory the output folder is created in. Defaults to [`default_root`].
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn folder_name(mut self, name: &str) -> Self {
        self.folder_name = name.to_string();
        self
    }

    pub fn algorithm_name(mut self, name: &str) -> Self {
        self.algorithm_name = name.to_string();
        self
    }

    pub fn algorithm_info(mut self, info: &str) -> Self {
        self.algorithm_info = info.to_string();
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Adds a trigger. Without any, improvements are written.
    pub fn trigger(mut self, trigger: BoxedTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn triggers(mut self, triggers: Vec<BoxedTrigger>) -> Self {
        self.triggers.extend(triggers);
        self
    }

    /// Extra column appended after the standard ones.
    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: Vec<Property>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn store_positions(mut self, store: bool) -> Self {
        self.store_positions = store;
        self
    }

    /// Creates the output folder, renamed with a numeric suffix if taken.
    pub fn build(mut self) -> Result<Analyzer> {
        let root = self.root.take().unwrap_or_else(default_root);
        fs::create_dir_all(&root).map_err(|e| BenchError::io(&root, e))?;
        let output = unique_folder(&root, &self.folder_name);
        fs::create_dir_all(&output).map_err(|e| BenchError::io(&output, e))?;
        log::info!("analyzer output in {}", output.display());

        if self.triggers.is_empty() {
            self.triggers.push(trigger::on_improvement());
        }
        Ok(Analyzer {
            output,
            algorithm_name: self.algorithm_name,
            algorithm_info: self.algorithm_info,
            prefix: self.prefix,
            triggers: RunTriggers::new(self.triggers),
            properties: self.properties,
            store_positions: self.store_positions,
            tracker: RunTracker::new(),
            dat: None,
            headers_written: Vec::new(),
            problems: BTreeMap::new(),
        })
    }
}

/// Summary of one run, as listed in `.info` files.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub instance: u32,
    pub run: usize,
    pub evaluations: usize,
    pub best_y: f64,
}

#[derive(Debug, Clone)]
struct ProblemRecord {
    meta: MetaData,
    suite: String,
    dimensions: BTreeMap<usize, Vec<RunSummary>>,
}

struct OpenDat {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Writes the `.info`/`.dat` tree read by performance analysis tools.
pub struct Analyzer {
    output: PathBuf,
    algorithm_name: String,
    algorithm_info: String,
    prefix: String,
    triggers: RunTriggers,
    properties: Vec<Property>,
    store_positions: bool,
    tracker: RunTracker,
    dat: Option<OpenDat>,
    headers_written: Vec<RunCursor>,
    problems: BTreeMap<(String, u32), ProblemRecord>,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// The folder actually written to.
    pub fn output_directory(&self) -> &Path {
        &self.output
    }

    pub fn info_path(&self, meta: &MetaData) -> PathBuf {
        self.output.join(format!(
            "{}_f{}_{}.info",
            self.prefix, meta.problem_id, meta.name
        ))
    }

    /// Path of the `.dat` file relative to the output folder.
    pub fn dat_relative_path(&self, meta: &MetaData) -> PathBuf {
        Path::new(&format!("data_f{}_{}", meta.problem_id, meta.name)).join(format!(
            "{}_f{}_DIM{}.dat",
            self.prefix, meta.problem_id, meta.n_variables
        ))
    }

    pub fn dat_path(&self, meta: &MetaData) -> PathBuf {
        self.output.join(self.dat_relative_path(meta))
    }

    /// Run summaries recorded for `meta`'s problem and dimension.
    pub fn runs(&self, meta: &MetaData) -> &[RunSummary] {
        self.problems
            .get(&(self.tracker.suite_name().to_string(), meta.problem_id))
            .and_then(|p| p.dimensions.get(&meta.n_variables))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn record_mut(&mut self, meta: &MetaData) -> &mut ProblemRecord {
        let suite = self.tracker.suite_name().to_string();
        self.problems
            .entry((suite.clone(), meta.problem_id))
            .or_insert_with(|| ProblemRecord {
                meta: meta.clone(),
                suite,
                dimensions: BTreeMap::new(),
            })
    }

    /// Makes the `.dat` file of `meta` the open one, closing any other.
    fn select_dat(&mut self, meta: &MetaData) -> Result<()> {
        let path = self.dat_path(meta);
        if self.dat.as_ref().is_some_and(|d| d.path == path) {
            return Ok(());
        }
        if let Some(mut old) = self.dat.take() {
            old.writer
                .flush()
                .map_err(|e| BenchError::io(&old.path, e))?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BenchError::io(&path, e))?;
        log::debug!("appending to {}", path.display());
        self.dat = Some(OpenDat {
            path,
            writer: BufWriter::new(file),
        });
        Ok(())
    }

    fn write_dat_line(&mut self, line: &str) -> Result<()> {
        if let Some(dat) = self.dat.as_mut() {
            writeln!(dat.writer, "{}", line).map_err(|e| BenchError::io(&dat.path, e))?;
        }
        Ok(())
    }

    fn header(&self, n_variables: usize) -> String {
        let mut header = DAT_HEADER.to_string();
        for p in &self.properties {
            header.push_str(&format!(" \"{}\"", p.name()));
        }
        if self.store_positions {
            for i in 0..n_variables {
                header.push_str(&format!(" \"x{}\"", i));
            }
        }
        header
    }

    fn row(&self, info: &Info<'_>) -> String {
        let standard = [
            Property::raw_y(),
            Property::raw_y_best(),
            Property::transformed_y(),
            Property::transformed_y_best(),
        ];
        let mut row = info.evaluations.to_string();
        for value in standard
            .iter()
            .chain(self.properties.iter())
            .map(|p| p.compute(info))
        {
            row.push(' ');
            match value {
                Some(v) => row.push_str(&v.to_string()),
                None => row.push_str("None"),
            }
        }
        if self.store_positions {
            for xi in info.x {
                row.push(' ');
                row.push_str(&xi.to_string());
            }
        }
        row
    }

    fn info_contents(&self, record: &ProblemRecord) -> String {
        let mut out = String::new();
        for (dim, runs) in &record.dimensions {
            let meta = MetaData {
                n_variables: *dim,
                ..record.meta.clone()
            };
            out.push_str(&format!(
                "suite = \"{}\", funcId = {}, funcName = \"{}\", DIM = {}, maximization = \"{}\", algId = \"{}\", algInfo = \"{}\"\n",
                record.suite,
                meta.problem_id,
                meta.name,
                dim,
                if meta.optimization_type.is_maximization() { "T" } else { "F" },
                self.algorithm_name,
                self.algorithm_info
            ));
            out.push_str("%\n");
            out.push_str(&self.dat_relative_path(&meta).to_string_lossy().replace('\\', "/"));
            for r in runs {
                out.push_str(&format!(", {}:{}|{}", r.instance, r.run, r.best_y));
            }
            out.push('\n');
        }
        out
    }

    fn write_info_files(&self) -> Result<()> {
        for record in self.problems.values() {
            let path = self.info_path(&record.meta);
            fs::write(&path, self.info_contents(record)).map_err(|e| BenchError::io(&path, e))?;
        }
        Ok(())
    }
}

impl Logger for Analyzer {
    fn attach_suite(&mut self, suite_name: &str) {
        self.tracker.set_suite(suite_name);
    }

    /// Runs are listed in `.info` from their first logged evaluation on.
    fn attach_problem(&mut self, meta: &MetaData) -> Result<()> {
        self.tracker.open_run(meta);
        Ok(())
    }

    fn log(&mut self, info: &Info<'_>) -> Result<()> {
        let cursor = self.tracker.cursor(info.meta);
        let record = self.record_mut(info.meta);
        let runs = record.dimensions.entry(info.meta.n_variables).or_default();
        let index = match runs
            .iter()
            .rposition(|r| r.instance == cursor.key.instance && r.run == cursor.run)
        {
            Some(index) => index,
            None => {
                runs.push(RunSummary {
                    instance: cursor.key.instance,
                    run: cursor.run,
                    evaluations: 0,
                    best_y: info.meta.optimization_type.worst(),
                });
                runs.len() - 1
            }
        };
        runs[index].evaluations = info.evaluations;
        runs[index].best_y = info.y_best;

        if !self.triggers.fire(&cursor, info) {
            return Ok(());
        }
        self.select_dat(info.meta)?;
        if !self.headers_written.contains(&cursor) {
            let header = self.header(info.meta.n_variables);
            self.write_dat_line(&header)?;
            self.headers_written.push(cursor);
        }
        let row = self.row(info);
        self.write_dat_line(&row)
    }

    fn reset(&mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(dat) = self.dat.as_mut() {
            dat.writer
                .flush()
                .map_err(|e| BenchError::io(&dat.path, e))?;
        }
        self.write_info_files()
    }
}

impl Drop for Analyzer {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("failed to flush analyzer output {}: {}", self.output.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::fixtures::Snapshot;

    #[test]
    fn test_unique_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let a = Analyzer::builder().root(dir.path()).folder_name("run").build().unwrap();
        let b = Analyzer::builder().root(dir.path()).folder_name("run").build().unwrap();
        let c = Analyzer::builder().root(dir.path()).folder_name("run").build().unwrap();
        assert_eq!(a.output_directory(), dir.path().join("run"));
        assert_eq!(b.output_directory(), dir.path().join("run-1"));
        assert_eq!(c.output_directory(), dir.path().join("run-2"));
    }

    #[test]
    fn test_paths() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::builder().root(dir.path()).prefix("p").build().unwrap();
        let snap = Snapshot::new(1, 1.0, 1.0, true);
        assert_eq!(
            analyzer.dat_relative_path(&snap.meta),
            Path::new("data_f1_sphere").join("p_f1_DIM2.dat")
        );
        assert_eq!(
            analyzer.info_path(&snap.meta),
            analyzer.output_directory().join("p_f1_sphere.info")
        );
    }

    #[test]
    fn test_dat_block_and_info_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = Analyzer::builder()
            .root(dir.path())
            .algorithm_name("rs")
            .algorithm_info("seed 1")
            .trigger(trigger::always())
            .build()
            .unwrap();
        analyzer.attach_suite("toy");
        let first = Snapshot::new(1, 4.0, 4.0, true);
        let second = Snapshot::new(2, 6.0, 4.0, false);
        analyzer.attach_problem(&first.meta).unwrap();
        analyzer.log(&first.info()).unwrap();
        analyzer.log(&second.info()).unwrap();
        analyzer.flush().unwrap();

        let dat = fs::read_to_string(analyzer.dat_path(&first.meta)).unwrap();
        assert_eq!(
            dat.lines().collect::<Vec<_>>(),
            vec![DAT_HEADER, "1 4 4 4 4", "2 6 4 6 4"]
        );
        let info = fs::read_to_string(analyzer.info_path(&first.meta)).unwrap();
        assert_eq!(
            info.lines().collect::<Vec<_>>(),
            vec![
                "suite = \"toy\", funcId = 1, funcName = \"sphere\", DIM = 2, maximization = \"F\", algId = \"rs\", algInfo = \"seed 1\"",
                "%",
                "data_f1_sphere/bench_f1_DIM2.dat, 1:0|4",
            ]
        );
    }

    #[test]
    fn test_reset_after_every_run_lists_only_used_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = Analyzer::builder().root(dir.path()).build().unwrap();
        let snap = Snapshot::new(1, 2.0, 2.0, true);
        analyzer.attach_problem(&snap.meta).unwrap();
        for _ in 0..3 {
            analyzer.log(&snap.info()).unwrap();
            analyzer.reset().unwrap();
            analyzer.attach_problem(&snap.meta).unwrap();
        }
        analyzer.flush().unwrap();

        let info = fs::read_to_string(analyzer.info_path(&snap.meta)).unwrap();
        assert_eq!(
            info.lines().nth(2),
            Some("data_f1_sphere/bench_f1_DIM2.dat, 1:0|2, 1:1|2, 1:2|2")
        );
        assert_eq!(analyzer.runs(&snap.meta).len(), 3);
    }

    #[test]
    fn test_problem_never_evaluated_writes_no_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = Analyzer::builder().root(dir.path()).build().unwrap();
        let snap = Snapshot::new(1, 2.0, 2.0, true);
        analyzer.attach_problem(&snap.meta).unwrap();
        analyzer.flush().unwrap();
        assert!(!analyzer.info_path(&snap.meta).exists());
        assert!(analyzer.runs(&snap.meta).is_empty());
    }
}
