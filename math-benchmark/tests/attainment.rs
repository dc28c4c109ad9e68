//! Attainment loggers fed by seeded random search over a small suite.

use math_audio_benchmark::logger::{Eaf, Eah, Ecdf, Logger, shared};
use math_audio_benchmark::stat::{self, AttainmentSummary, under_curve};
use math_audio_benchmark::{ProblemRegistry, RunCursor, Scale, SharedLogger, Suite};
use ndarray::{Array1, array, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

const RUNS: usize = 3;
const BUDGET: usize = 50;

/// Uniform random search, `RUNS` runs of `BUDGET` evaluations per problem.
fn random_search(logger: SharedLogger, seed: u64) {
    let registry = ProblemRegistry::with_defaults();
    let mut suite = Suite::from_registry("toy", &registry, &[1, 5], &[1, 2], &[2]).unwrap();
    suite.attach_logger(logger).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    for problem in &mut suite {
        let bounds = problem.bounds().to_vec();
        for run in 0..RUNS {
            if run > 0 {
                problem.reset().unwrap();
            }
            for _ in 0..BUDGET {
                let x = Array1::from_iter(bounds.iter().map(|&(lo, hi)| rng.random_range(lo..hi)));
                problem.evaluate(&x).unwrap();
            }
        }
    }
}

fn eah() -> Arc<Mutex<Eah>> {
    shared(
        Eah::with_scales(
            Scale::linear(0.0, 1e4, 10).unwrap(),
            Scale::linear(1.0, BUDGET as f64, 10).unwrap(),
        ),
    )
}

#[test]
fn test_eah_counts_every_evaluation_when_the_grid_covers_it() {
    let logger = eah();
    random_search(logger.clone(), 42);
    let logger = logger.lock().unwrap();
    // 2 problems x 2 instances x 3 runs x 50 evaluations, all inside the grid
    assert_eq!(stat::sum(&*logger), (2 * 2 * RUNS * BUDGET) as u64);
    assert_eq!(logger.data().len(), 2 * 2 * RUNS);
    assert_eq!(logger.size(), (2, 1, 2, RUNS));
    for m in logger.data().values() {
        assert_eq!(m.sum(), BUDGET as u64);
    }
}

#[test]
fn test_eah_is_deterministic_for_a_seed() {
    let a = eah();
    let b = eah();
    random_search(a.clone(), 1234);
    random_search(b.clone(), 1234);
    let a = a.lock().unwrap();
    let b = b.lock().unwrap();
    assert_eq!(a.histogram(), b.histogram());
    assert_eq!(stat::distribution(&*a), stat::distribution(&*b));
    assert_eq!(under_curve::volume(&*a), under_curve::volume(&*b));
}

/// First coordinate of every evaluated point `(a, 0)`, one row per run. On
/// both sphere and ellipsoid the value is `a * a`.
const TRAJECTORIES: [[f64; 5]; 2] = [[3.0, 2.0, 2.5, 1.0, 0.5], [1.0, 3.0, 0.5, 0.5, 2.0]];

fn replay_trajectories(logger: SharedLogger) {
    let registry = ProblemRegistry::with_defaults();
    let mut suite = Suite::from_registry("toy", &registry, &[1, 2], &[1], &[2]).unwrap();
    suite.attach_logger(logger).unwrap();
    for problem in &mut suite {
        for (run, trajectory) in TRAJECTORIES.iter().enumerate() {
            if run > 0 {
                problem.reset().unwrap();
            }
            for &a in trajectory {
                problem.evaluate(&array![a, 0.0]).unwrap();
            }
        }
    }
}

fn baseline_scales() -> (Scale, Scale) {
    // error buckets [0,2) [2,4) [4,6) [6,8) [8,10], one bucket per evaluation
    (
        Scale::linear(0.0, 10.0, 5).unwrap(),
        Scale::linear(1.0, 5.0, 4).unwrap(),
    )
}

#[test]
fn test_recorded_baseline_eah() {
    let (error, evals) = baseline_scales();
    let logger = shared(Eah::with_scales(error, evals));
    replay_trajectories(logger.clone());
    let logger = logger.lock().unwrap();

    assert_eq!(stat::sum(&*logger), 20);
    assert_eq!(
        stat::histogram(&*logger),
        array![
            [2, 2, 2, 8],
            [0, 0, 0, 0],
            [0, 2, 2, 0],
            [0, 0, 0, 0],
            [2, 0, 0, 0],
        ]
    );
    assert_eq!(
        stat::distribution(&*logger),
        array![
            [2, 4, 6, 14],
            [2, 4, 6, 14],
            [2, 6, 10, 18],
            [2, 6, 10, 18],
            [4, 8, 12, 20],
        ]
    );
    assert_eq!(under_curve::volume(&*logger), 168.0 / 400.0);
    assert_eq!(
        logger.at(&RunCursor::new("toy", 2, 2, 1, 0)),
        array![
            [0, 0, 0, 2],
            [0, 0, 0, 0],
            [0, 1, 1, 0],
            [0, 0, 0, 0],
            [1, 0, 0, 0],
        ]
    );
}

#[test]
fn test_recorded_baseline_ecdf() {
    let (error, evals) = baseline_scales();
    let logger = shared(Ecdf::with_scales(error, evals));
    replay_trajectories(logger.clone());
    let logger = logger.lock().unwrap();

    assert_eq!(
        logger.at(&RunCursor::new("toy", 1, 2, 1, 0)),
        array![
            [0, 0, 0, 1],
            [0, 0, 0, 1],
            [0, 1, 1, 1],
            [0, 1, 1, 1],
            [1, 1, 1, 1],
        ]
    );
    // the second runs attain the lowest level from the first evaluation
    assert_eq!(logger.at(&RunCursor::new("toy", 1, 2, 1, 1)).sum(), 20);
    assert_eq!(stat::sum(&*logger), 64);
    assert_eq!(
        stat::histogram(&*logger),
        array![
            [2, 2, 2, 4],
            [2, 2, 2, 4],
            [2, 4, 4, 4],
            [2, 4, 4, 4],
            [4, 4, 4, 4],
        ]
    );
}

#[test]
fn test_recorded_baseline_eaf() {
    let logger = shared(Eaf::new());
    replay_trajectories(logger.clone());
    let logger = logger.lock().unwrap();

    // improvements at evaluations 1, 2, 4, 5 then 1, 3; equal values do not count
    assert_eq!(logger.len(), 12);
    let sphere = logger.at(&RunCursor::new("toy", 1, 2, 1, 0));
    let points: Vec<_> = sphere.iter().map(|p| (p.time, p.quality)).collect();
    assert_eq!(points, vec![(1, 9.0), (2, 4.0), (4, 1.0), (5, 0.25)]);
    let sphere = logger.at(&RunCursor::new("toy", 1, 2, 1, 1));
    let points: Vec<_> = sphere.iter().map(|p| (p.time, p.quality)).collect();
    assert_eq!(points, vec![(1, 1.0), (3, 0.25)]);

    let (error, evals) = baseline_scales();
    let binned = logger.binned(error, evals);
    assert_eq!(
        stat::histogram(&binned),
        array![
            [2, 0, 2, 4],
            [0, 0, 0, 0],
            [0, 2, 0, 0],
            [0, 0, 0, 0],
            [2, 0, 0, 0],
        ]
    );
}

#[test]
fn test_statistics_shapes_and_bounds() {
    let logger = shared(
        Eah::with_scales(
            Scale::log10(0.0, 100.0, 8).unwrap(),
            Scale::log10(1.0, BUDGET as f64, 8).unwrap(),
        ),
    );
    random_search(logger.clone(), 9);
    let logger = logger.lock().unwrap();

    let h = stat::histogram(&*logger);
    let d = stat::distribution(&*logger);
    assert_eq!(h.dim(), (8, 8));
    assert_eq!(d.dim(), (8, 8));
    for i in 0..8 {
        for j in 0..8 {
            assert_eq!(d[[i, j]], h.slice(s![..=i, ..=j]).sum());
        }
    }
    assert_eq!(d[[7, 7]], stat::sum(&*logger));
    let v = under_curve::volume(&*logger);
    assert!((0.0..=1.0).contains(&v), "volume {} out of range", v);
}

#[test]
fn test_ecdf_is_monotone_per_run() {
    let logger = shared(Ecdf::with_scales(
        Scale::log10(0.0, 1e4, 6).unwrap(),
        Scale::linear(1.0, BUDGET as f64, 5).unwrap(),
    ));
    random_search(logger.clone(), 3);
    let logger = logger.lock().unwrap();
    assert_eq!(logger.data().len(), 2 * 2 * RUNS);
    for m in logger.data().values() {
        let (rows, cols) = m.dim();
        for i in 0..rows {
            for j in 0..cols {
                assert!(m[[i, j]] <= 1);
                if i + 1 < rows {
                    assert!(m[[i, j]] <= m[[i + 1, j]]);
                }
                if j + 1 < cols {
                    assert!(m[[i, j]] <= m[[i, j + 1]]);
                }
            }
        }
        // the first evaluation already attains the coarsest level
        assert_eq!(m[[rows - 1, 0]], 1);
    }
    let v = under_curve::volume(&*logger);
    assert!((0.0..=1.0).contains(&v));
}

#[test]
fn test_eaf_points_follow_improvements() {
    let logger = shared(Eaf::new());
    random_search(logger.clone(), 11);
    let logger = logger.lock().unwrap();
    assert_eq!(logger.size(), (2, 1, 2, RUNS));
    for (key, points) in logger.data() {
        for run in 0..RUNS {
            let run_points: Vec<_> = points.iter().filter(|p| p.run == run).collect();
            assert!(!run_points.is_empty(), "{} run {} recorded nothing", key, run);
            assert_eq!(run_points[0].time, 1);
            for pair in run_points.windows(2) {
                assert!(pair[0].time < pair[1].time);
                assert!(pair[1].quality < pair[0].quality);
            }
        }
    }
    let binned = logger.binned(
        Scale::linear(0.0, 1e4, 10).unwrap(),
        Scale::linear(1.0, BUDGET as f64, 10).unwrap(),
    );
    assert_eq!(stat::sum(&binned) as usize, logger.len());
}

#[test]
fn test_untracked_queries_are_empty() {
    let logger = eah();
    let logger = logger.lock().unwrap();
    let m = logger.at(&RunCursor::new("toy", 1, 2, 1, 0));
    assert_eq!(m.dim(), (10, 10));
    assert_eq!(m.sum(), 0);
    assert_eq!(stat::sum(&*logger), 0);
    assert_eq!(under_curve::volume(&*logger), 0.0);
}

#[test]
fn test_loggers_attached_side_by_side() {
    let eah = eah();
    let eaf = shared(Eaf::new());
    let registry = ProblemRegistry::with_defaults();
    let mut p = registry.create("sphere", 1, 2).unwrap();
    p.attach_logger(eah.clone()).unwrap();
    p.attach_logger(eaf.clone()).unwrap();
    for x in [[1.0, 1.0], [0.5, 0.5], [2.0, 2.0]] {
        p.evaluate(&Array1::from_vec(x.to_vec())).unwrap();
    }
    assert_eq!(stat::sum(&*eah.lock().unwrap()), 3);
    assert_eq!(eaf.lock().unwrap().len(), 2);
    eaf.lock().unwrap().flush().unwrap();
}
