//! Uniform random search over the built-in problems, logged three ways
//!
//! Writes an analyzer tree and a flat file under the given directory and
//! prints the EAH volume under the curve per run count.
//!
//! Usage:
//!     RUST_LOG=info cargo run --release --example random_search -- /tmp/bench

use math_audio_benchmark::logger::{Analyzer, Combine, Eah, FlatFile, Logger, shared};
use math_audio_benchmark::stat::{self, under_curve};
use math_audio_benchmark::{BenchError, ProblemRegistry, Property, Scale, Suite, trigger};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

const RUNS: usize = 5;
const BUDGET: usize = 1000;

fn main() -> Result<(), BenchError> {
    env_logger::init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(math_audio_benchmark::logger::analyzer::default_root);

    let registry = ProblemRegistry::with_defaults();
    let mut suite = Suite::from_registry(
        "toy",
        &registry,
        &registry.ids(),
        &[1, 2, 3],
        &[2, 5, 10],
    )?;
    println!(
        "random search on {} problems, {} runs of {} evaluations",
        suite.len(),
        RUNS,
        BUDGET
    );

    let files = shared(Combine::new(vec![
        Box::new(
            Analyzer::builder()
                .root(&root)
                .folder_name("random_search")
                .algorithm_name("random_search")
                .algorithm_info(&format!("uniform, budget {}", BUDGET))
                .build()?,
        ),
        Box::new(
            FlatFile::builder(root.join("random_search.txt"))
                .trigger(trigger::each(100)?)
                .properties(vec![Property::y_best(), Property::error_best()])
                .build(),
        ),
    ]));
    let eah = shared(Eah::with_scales(
        Scale::log10(0.0, 1e3, 30)?,
        Scale::log10(1.0, BUDGET as f64, 30)?,
    ));
    suite.attach_logger(files.clone())?;
    suite.attach_logger(eah.clone())?;

    let mut rng = StdRng::seed_from_u64(42);
    for run in 0..RUNS {
        if run > 0 {
            suite.reset()?;
        }
        for problem in &mut suite {
            let bounds = problem.bounds().to_vec();
            for _ in 0..BUDGET {
                let x = Array1::from_iter(bounds.iter().map(|&(lo, hi)| rng.random_range(lo..hi)));
                problem.evaluate(&x)?;
            }
        }
    }

    files
        .lock()
        .map_err(|_| BenchError::LoggerPoisoned)?
        .flush()?;
    let eah = eah.lock().map_err(|_| BenchError::LoggerPoisoned)?;
    println!("recorded evaluations: {}", stat::sum(&*eah));
    println!("volume under the curve: {:.4}", under_curve::volume(&*eah));
    Ok(())
}
