//! Owned registry mapping problem names and ids to factories.

use super::{Problem, functions};
use crate::error::{BenchError, Result};
use crate::types::{MetaData, OptimizationType, Solution};
use ndarray::Array1;
use std::collections::{BTreeMap, HashMap};

/// Builds an instance of a problem for a given instance number and dimension.
pub type ProblemFactory = fn(u32, usize) -> Problem;

#[derive(Debug, Clone)]
struct Entry {
    id: u32,
    name: String,
    factory: ProblemFactory,
}

/// Problem registry mapping names and ids to factories.
///
/// Built explicitly by the experiment setup and handed to the suites that
/// need it.
#[derive(Debug, Clone, Default)]
pub struct ProblemRegistry {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    by_id: BTreeMap<u32, usize>,
}

/// Minimization problem on `[-5, 5]^n` with the instance transformation applied.
fn catalog_problem(
    id: u32,
    name: &str,
    objective: fn(&Array1<f64>) -> f64,
    optimum_coordinate: f64,
    instance: u32,
    n_variables: usize,
) -> Problem {
    let meta = MetaData::new(id, instance, name, n_variables, OptimizationType::Min);
    Problem::new(meta, objective)
        .with_optimum(Solution::new(vec![optimum_coordinate; n_variables], 0.0))
        .with_instance_transform()
}

impl ProblemRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in catalog, ids 1 to 6.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults: [(u32, &str, ProblemFactory); 6] = [
            (1, "sphere", |i, n| {
                catalog_problem(1, "sphere", functions::sphere, 0.0, i, n)
            }),
            (2, "ellipsoid", |i, n| {
                catalog_problem(2, "ellipsoid", functions::ellipsoid, 0.0, i, n)
            }),
            (3, "rastrigin", |i, n| {
                catalog_problem(3, "rastrigin", functions::rastrigin, 0.0, i, n)
            }),
            (4, "rosenbrock", |i, n| {
                catalog_problem(4, "rosenbrock", functions::rosenbrock, 0.0, i, n)
            }),
            (5, "ackley", |i, n| {
                catalog_problem(5, "ackley", functions::ackley, 0.0, i, n)
            }),
            (6, "linear_slope", |i, n| {
                catalog_problem(
                    6,
                    "linear_slope",
                    functions::linear_slope,
                    functions::SLOPE_CORNER,
                    i,
                    n,
                )
            }),
        ];
        for (id, name, factory) in defaults {
            // names and ids above are distinct
            let _ = registry.register(id, name, factory);
        }
        registry
    }

    /// Registers a factory under a name and id, both of which must be new.
    pub fn register(&mut self, id: u32, name: &str, factory: ProblemFactory) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(BenchError::DuplicateProblem {
                name: name.to_string(),
            });
        }
        if self.by_id.contains_key(&id) {
            return Err(BenchError::DuplicateProblem {
                name: id.to_string(),
            });
        }
        let index = self.entries.len();
        self.entries.push(Entry {
            id,
            name: name.to_string(),
            factory,
        });
        self.by_name.insert(name.to_string(), index);
        self.by_id.insert(id, index);
        Ok(())
    }

    /// Instantiates the problem registered under `name`.
    pub fn create(&self, name: &str, instance: u32, n_variables: usize) -> Result<Problem> {
        let index = self
            .by_name
            .get(name)
            .ok_or_else(|| BenchError::UnknownProblem {
                name: name.to_string(),
            })?;
        Ok((self.entries[*index].factory)(instance, n_variables))
    }

    /// Instantiates the problem registered under `id`.
    pub fn create_by_id(&self, id: u32, instance: u32, n_variables: usize) -> Result<Problem> {
        let index = self
            .by_id
            .get(&id)
            .ok_or_else(|| BenchError::UnknownProblem {
                name: id.to_string(),
            })?;
        Ok((self.entries[*index].factory)(instance, n_variables))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Id registered under `name`.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).map(|&i| self.entries[i].id)
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.by_id.keys().copied().collect()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = ProblemRegistry::with_defaults();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.ids(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(registry.id_of("rastrigin"), Some(3));
        assert!(registry.contains("ackley"));

        let p = registry.create("rosenbrock", 1, 4).unwrap();
        assert_eq!(p.meta_data().problem_id, 4);
        assert_eq!(p.n_variables(), 4);
        let q = registry.create_by_id(4, 2, 4).unwrap();
        assert_eq!(q.meta_data().name, "rosenbrock");
        assert_eq!(q.meta_data().instance, 2);
    }

    #[test]
    fn test_unknown_and_duplicate() {
        let mut registry = ProblemRegistry::with_defaults();
        assert!(matches!(
            registry.create("nope", 1, 2),
            Err(BenchError::UnknownProblem { .. })
        ));
        assert!(registry.create_by_id(42, 1, 2).is_err());
        let dup = registry.register(7, "sphere", |i, n| {
            catalog_problem(7, "sphere", functions::sphere, 0.0, i, n)
        });
        assert!(matches!(dup, Err(BenchError::DuplicateProblem { .. })));
        assert!(registry.register(1, "other", |i, n| {
            catalog_problem(1, "other", functions::sphere, 0.0, i, n)
        })
        .is_err());
    }

    #[test]
    fn test_every_default_hits_its_optimum() {
        let registry = ProblemRegistry::with_defaults();
        for id in registry.ids() {
            for instance in [1, 3] {
                let mut p = registry.create_by_id(id, instance, 3).unwrap();
                let optimum = p.optimum().cloned().unwrap();
                let y = p.evaluate(&Array1::from_vec(optimum.x.clone())).unwrap();
                approx::assert_relative_eq!(y, optimum.y, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_independent_registries() {
        let mut a = ProblemRegistry::new();
        let b = ProblemRegistry::with_defaults();
        a.register(10, "custom", |i, n| {
            catalog_problem(10, "custom", functions::sphere, 0.0, i, n)
        })
        .unwrap();
        assert!(a.contains("custom"));
        assert!(!b.contains("custom"));
    }
}
