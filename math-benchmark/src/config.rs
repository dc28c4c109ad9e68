//! JSON configuration of loggers, triggers and suites.
//!
//! ```json
//! {
//!   "type": "combine",
//!   "loggers": [
//!     { "type": "analyzer", "root": "/tmp/out", "algorithm_name": "random_search" },
//!     { "type": "eah",
//!       "error": { "min": 0.0, "max": 100.0, "size": 20, "kind": "log10" },
//!       "evals": { "min": 1.0, "max": 1000.0, "size": 20 } }
//!   ]
//! }
//! ```

use crate::error::{BenchError, Result};
use crate::logger::{
    Analyzer, Combine, Eaf, Eah, Ecdf, FlatFile, Logger, SharedLogger, Store,
};
use crate::problem::ProblemRegistry;
use crate::property::Property;
use crate::scale::Scale;
use crate::suite::Suite;
use crate::trigger::{
    AllOf, AnyOf, At, BoxedTrigger, During, Each, OnDeltaImprovement, OnImprovement, always,
    on_violation,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Trigger description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    Always,
    OnImprovement {
        #[serde(default)]
        tracking: bool,
    },
    OnDeltaImprovement {
        delta: f64,
    },
    OnViolation,
    At {
        time_points: Vec<usize>,
    },
    Each {
        interval: usize,
        #[serde(default)]
        starting_at: usize,
    },
    During {
        time_ranges: Vec<(usize, usize)>,
    },
    AnyOf {
        triggers: Vec<TriggerConfig>,
    },
    AllOf {
        triggers: Vec<TriggerConfig>,
    },
}

impl TriggerConfig {
    pub fn build(&self) -> Result<BoxedTrigger> {
        let trigger: BoxedTrigger = match self {
            TriggerConfig::Always => always(),
            TriggerConfig::OnImprovement { tracking: false } => Box::new(OnImprovement::new()),
            TriggerConfig::OnImprovement { tracking: true } => Box::new(OnImprovement::tracking()),
            TriggerConfig::OnDeltaImprovement { delta } => Box::new(OnDeltaImprovement::new(*delta)?),
            TriggerConfig::OnViolation => on_violation(),
            TriggerConfig::At { time_points } => Box::new(At::new(time_points.iter().copied())),
            TriggerConfig::Each {
                interval,
                starting_at,
            } => Box::new(Each::starting_at(*interval, *starting_at)?),
            TriggerConfig::During { time_ranges } => {
                Box::new(During::new(time_ranges.iter().copied())?)
            }
            TriggerConfig::AnyOf { triggers } => Box::new(AnyOf::new(build_triggers(triggers)?)),
            TriggerConfig::AllOf { triggers } => Box::new(AllOf::new(build_triggers(triggers)?)),
        };
        Ok(trigger)
    }
}

fn build_triggers(configs: &[TriggerConfig]) -> Result<Vec<BoxedTrigger>> {
    configs.iter().map(TriggerConfig::build).collect()
}

fn build_properties(names: &[String]) -> Result<Vec<Property>> {
    names.iter().map(|n| Property::by_name(n)).collect()
}

fn default_separator() -> String {
    " ".to_string()
}

/// Logger description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoggerConfig {
    FlatFile {
        path: PathBuf,
        #[serde(default)]
        triggers: Vec<TriggerConfig>,
        /// Built-in property names
        #[serde(default)]
        properties: Vec<String>,
        #[serde(default = "default_separator")]
        separator: String,
        #[serde(default)]
        repeat_header: bool,
        #[serde(default)]
        store_positions: bool,
    },
    Analyzer {
        #[serde(default)]
        root: Option<PathBuf>,
        #[serde(default)]
        folder_name: Option<String>,
        #[serde(default)]
        algorithm_name: Option<String>,
        #[serde(default)]
        algorithm_info: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        triggers: Vec<TriggerConfig>,
        #[serde(default)]
        properties: Vec<String>,
        #[serde(default)]
        store_positions: bool,
    },
    Store {
        #[serde(default)]
        triggers: Vec<TriggerConfig>,
        #[serde(default)]
        properties: Vec<String>,
    },
    Eaf {
        #[serde(default)]
        triggers: Vec<TriggerConfig>,
    },
    Eah {
        error: Scale,
        evals: Scale,
        #[serde(default)]
        triggers: Vec<TriggerConfig>,
    },
    Ecdf {
        error: Scale,
        evals: Scale,
        #[serde(default)]
        triggers: Vec<TriggerConfig>,
    },
    Combine {
        loggers: Vec<LoggerConfig>,
    },
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the described logger. Analyzer output folders are created here.
    pub fn build(&self) -> Result<Box<dyn Logger>> {
        let logger: Box<dyn Logger> = match self {
            LoggerConfig::FlatFile {
                path,
                triggers,
                properties,
                separator,
                repeat_header,
                store_positions,
            } => Box::new(
                FlatFile::builder(path)
                    .triggers(build_triggers(triggers)?)
                    .properties(build_properties(properties)?)
                    .separator(separator)
                    .repeat_header(*repeat_header)
                    .store_positions(*store_positions)
                    .build(),
            ),
            LoggerConfig::Analyzer {
                root,
                folder_name,
                algorithm_name,
                algorithm_info,
                prefix,
                triggers,
                properties,
                store_positions,
            } => {
                let mut builder = Analyzer::builder()
                    .triggers(build_triggers(triggers)?)
                    .properties(build_properties(properties)?)
                    .store_positions(*store_positions);
                if let Some(root) = root {
                    builder = builder.root(root);
                }
                if let Some(name) = folder_name {
                    builder = builder.folder_name(name);
                }
                if let Some(name) = algorithm_name {
                    builder = builder.algorithm_name(name);
                }
                if let Some(info) = algorithm_info {
                    builder = builder.algorithm_info(info);
                }
                if let Some(prefix) = prefix {
                    builder = builder.prefix(prefix);
                }
                Box::new(builder.build()?)
            }
            LoggerConfig::Store {
                triggers,
                properties,
            } => Box::new(Store::new(
                build_triggers(triggers)?,
                build_properties(properties)?,
            )),
            LoggerConfig::Eaf { triggers } if triggers.is_empty() => Box::new(Eaf::new()),
            LoggerConfig::Eaf { triggers } => Box::new(Eaf::with_triggers(build_triggers(triggers)?)),
            LoggerConfig::Eah {
                error,
                evals,
                triggers,
            } => {
                let eah = Eah::with_scales(*error, *evals);
                if triggers.is_empty() {
                    Box::new(eah)
                } else {
                    Box::new(eah.with_triggers(build_triggers(triggers)?))
                }
            }
            LoggerConfig::Ecdf {
                error,
                evals,
                triggers,
            } => {
                let ecdf = Ecdf::with_scales(*error, *evals);
                if triggers.is_empty() {
                    Box::new(ecdf)
                } else {
                    Box::new(ecdf.with_triggers(build_triggers(triggers)?))
                }
            }
            LoggerConfig::Combine { loggers } => {
                if loggers.is_empty() {
                    return Err(BenchError::InvalidConfig {
                        reason: "combine needs at least one logger".to_string(),
                    });
                }
                Box::new(Combine::new(
                    loggers.iter().map(LoggerConfig::build).collect::<Result<_>>()?,
                ))
            }
        };
        Ok(logger)
    }

    /// Builds the logger ready for attachment to problems or suites.
    pub fn build_shared(&self) -> Result<SharedLogger> {
        let logger: SharedLogger = Arc::new(Mutex::new(self.build()?));
        Ok(logger)
    }
}

/// Suite description; problems are referenced by registered name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub name: String,
    pub problems: Vec<String>,
    pub instances: Vec<u32>,
    pub dimensions: Vec<usize>,
}

impl SuiteConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self, registry: &ProblemRegistry) -> Result<Suite> {
        let ids = self
            .problems
            .iter()
            .map(|name| {
                registry
                    .id_of(name)
                    .ok_or_else(|| BenchError::UnknownProblem { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;
        Suite::from_registry(&self.name, registry, &ids, &self.instances, &self.dimensions)
    }
}
