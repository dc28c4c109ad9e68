//! A suite is the cartesian product of problem ids, instances and dimensions.

use crate::error::{BenchError, Result};
use crate::logger::{self, SharedLogger};
use crate::problem::{Problem, ProblemRegistry};

/// An ordered collection of problems sharing loggers.
///
/// Problems are ordered by id, then instance, then dimension.
#[derive(Debug)]
pub struct Suite {
    name: String,
    problem_ids: Vec<u32>,
    instances: Vec<u32>,
    dimensions: Vec<usize>,
    problems: Vec<Problem>,
}

impl Suite {
    /// Builds every combination from `registry`.
    pub fn from_registry(
        name: &str,
        registry: &ProblemRegistry,
        problem_ids: &[u32],
        instances: &[u32],
        dimensions: &[usize],
    ) -> Result<Self> {
        if problem_ids.is_empty() || instances.is_empty() || dimensions.is_empty() {
            return Err(BenchError::InvalidConfig {
                reason: format!("suite {} needs at least one problem, instance and dimension", name),
            });
        }
        let mut problems = Vec::with_capacity(problem_ids.len() * instances.len() * dimensions.len());
        for &id in problem_ids {
            for &instance in instances {
                for &dim in dimensions {
                    problems.push(registry.create_by_id(id, instance, dim)?);
                }
            }
        }
        log::debug!("suite {} holds {} problems", name, problems.len());
        Ok(Self {
            name: name.to_string(),
            problem_ids: problem_ids.to_vec(),
            instances: instances.to_vec(),
            dimensions: dimensions.to_vec(),
            problems,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn problem_ids(&self) -> &[u32] {
        &self.problem_ids
    }

    pub fn instances(&self) -> &[u32] {
        &self.instances
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.problems.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Problem> {
        self.problems.iter_mut()
    }

    /// Attaches `logger` to every problem, announcing the suite first.
    pub fn attach_logger(&mut self, logger: SharedLogger) -> Result<()> {
        logger::lock(&logger)?.attach_suite(&self.name);
        for problem in &mut self.problems {
            problem.attach_logger(logger.clone())?;
        }
        Ok(())
    }

    pub fn detach_logger(&mut self, logger: &SharedLogger) -> Result<()> {
        for problem in &mut self.problems {
            problem.detach_logger(logger)?;
        }
        Ok(())
    }

    /// Resets every problem, opening a new run in each attached logger.
    pub fn reset(&mut self) -> Result<()> {
        for problem in &mut self.problems {
            problem.reset()?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a mut Suite {
    type Item = &'a mut Problem;
    type IntoIter = std::slice::IterMut<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter_mut()
    }
}

impl<'a> IntoIterator for &'a Suite {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_order() {
        let registry = ProblemRegistry::with_defaults();
        let suite = Suite::from_registry("toy", &registry, &[1, 3], &[1, 2], &[2, 5]).unwrap();
        assert_eq!(suite.len(), 8);
        let order: Vec<_> = suite
            .iter()
            .map(|p| {
                let m = p.meta_data();
                (m.problem_id, m.instance, m.n_variables)
            })
            .collect();
        assert_eq!(order[0], (1, 1, 2));
        assert_eq!(order[1], (1, 1, 5));
        assert_eq!(order[2], (1, 2, 2));
        assert_eq!(order[7], (3, 2, 5));
        assert_eq!(suite.name(), "toy");
        assert_eq!(suite.dimensions(), &[2, 5]);
    }

    #[test]
    fn test_rejects_empty_or_unknown() {
        let registry = ProblemRegistry::with_defaults();
        assert!(Suite::from_registry("empty", &registry, &[], &[1], &[2]).is_err());
        assert!(matches!(
            Suite::from_registry("bad", &registry, &[99], &[1], &[2]),
            Err(BenchError::UnknownProblem { .. })
        ));
    }
}
