//! Performance logging and attainment statistics for black-box optimizer benchmarks
//!
//! A solver evaluates [`Problem`]s; every evaluation updates the problem's
//! [`State`] and hands an [`Info`] snapshot to the attached loggers. Loggers
//! decide with their triggers whether to record it, extract properties and
//! write them to their sink.
//!
//! # Features
//!
//! - **Problems**: best-so-far tracking, constraints with five enforcement
//!   policies, variable and objective transforms, an owned problem registry
//! - **Triggers**: always, on improvement, on delta improvement, on violation,
//!   at, each, during, and their `AnyOf`/`AllOf` compositions
//! - **Loggers**: flat file, analyzer (`.info`/`.dat`), in-memory store,
//!   EAF, EAH, ECDF and a failure-isolating `Combine`
//! - **Statistics**: sum, histogram, distribution and volume under the curve
//!
//! # Example
//!
//! ```no_run
//! use math_audio_benchmark::{ProblemRegistry, Suite, logger::{Eah, shared}, stat};
//! use ndarray::Array1;
//!
//! # fn main() -> math_audio_benchmark::Result<()> {
//! let registry = ProblemRegistry::with_defaults();
//! let mut suite = Suite::from_registry("toy", &registry, &[1, 3], &[1], &[5])?;
//! let eah = shared(Eah::new(0.0, 100.0, 20, 1, 1000, 20)?);
//! suite.attach_logger(eah.clone())?;
//!
//! for problem in &mut suite {
//!     for _ in 0..1000 {
//!         problem.evaluate(&Array1::zeros(problem.n_variables()))?;
//!     }
//! }
//! let eah = eah.lock().map_err(|_| math_audio_benchmark::BenchError::LoggerPoisoned)?;
//! println!("volume = {}", stat::under_curve::volume(&*eah));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constraint;
pub mod error;
pub mod info;
pub mod logger;
pub mod problem;
pub mod property;
pub mod scale;
pub mod stat;
pub mod state;
pub mod suite;
pub mod transform;
pub mod trigger;
pub mod types;

pub use config::{LoggerConfig, SuiteConfig, TriggerConfig};
pub use constraint::{Constraint, ConstraintSet, Enforced};
pub use error::{BenchError, Result};
pub use info::Info;
pub use logger::{Logger, RunCursor, SharedLogger};
pub use problem::{Problem, ProblemRegistry};
pub use property::{Property, TrackedValue};
pub use scale::{Scale, ScaleKind};
pub use stat::AttainmentSummary;
pub use state::{Phase, State};
pub use suite::Suite;
pub use trigger::Trigger;
pub use types::{MetaData, OptimizationType, Solution};
