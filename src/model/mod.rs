//! Integer-programming model of maximum stable matchings.
//!
//! The model borrows an [`Instance`] and is built on the first solve. Force,
//! avoid and avoid-matching requests are queued and added to the program on
//! the next solve, and stay in force for every later one.

pub mod config;
mod constraints;
pub mod program;
pub mod solver;

pub use config::{ModelConfig, StabilityFormulation};
pub use program::{Column, ColumnId, LinearProgram, Row, Sense};
pub use solver::{GoodLpSolver, IlpSolver, SolveStatus, SolverError};

use crate::AgentId;
use crate::instance::Instance;
use crate::matching::Matching;
use constraints::BuiltModel;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("left agent {left} and right agent {right} are not a compatible pair")]
    IncompatiblePair { left: AgentId, right: AgentId },
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Size of the program and time spent in the solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStatistics {
    pub columns: usize,
    pub rows: usize,
    pub solves: usize,
    pub solve_time: Duration,
}

#[derive(Debug, Clone)]
enum Pending {
    Force(AgentId, AgentId),
    Avoid(AgentId, AgentId),
    AvoidMatching(Matching),
}

pub struct StabilityModel<'a, S: IlpSolver = GoodLpSolver> {
    instance: &'a Instance,
    config: ModelConfig,
    solver: S,
    built: Option<BuiltModel>,
    pending: Vec<Pending>,
    solves: usize,
    solve_time: Duration,
}

impl<'a> StabilityModel<'a, GoodLpSolver> {
    pub fn new(instance: &'a Instance, config: ModelConfig) -> Self {
        Self::with_solver(instance, config, GoodLpSolver)
    }
}

impl<'a, S: IlpSolver> StabilityModel<'a, S> {
    pub fn with_solver(instance: &'a Instance, config: ModelConfig, solver: S) -> Self {
        Self {
            instance,
            config,
            solver,
            built: None,
            pending: Vec::new(),
            solves: 0,
            solve_time: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn check_pairs(&self, pairs: &[(AgentId, AgentId)]) -> Result<(), ModelError> {
        for &(left, right) in pairs {
            let compatible = self
                .instance
                .agent_left(left)
                .is_some_and(|agent| agent.is_compatible(right));
            if !compatible {
                return Err(ModelError::IncompatiblePair { left, right });
            }
        }
        Ok(())
    }

    /// Require every pair in every later solution.
    pub fn force(&mut self, pairs: &[(AgentId, AgentId)]) -> Result<(), ModelError> {
        self.check_pairs(pairs)?;
        self.pending
            .extend(pairs.iter().map(|&(l, r)| Pending::Force(l, r)));
        Ok(())
    }

    /// Forbid every pair in every later solution.
    pub fn avoid(&mut self, pairs: &[(AgentId, AgentId)]) -> Result<(), ModelError> {
        self.check_pairs(pairs)?;
        self.pending
            .extend(pairs.iter().map(|&(l, r)| Pending::Avoid(l, r)));
        Ok(())
    }

    /// Forbid later solutions from containing all of `matching`'s pairs.
    /// An empty matching is ignored.
    pub fn avoid_matching(&mut self, matching: &Matching) -> Result<(), ModelError> {
        if matching.is_empty() {
            return Ok(());
        }
        let pairs: Vec<(AgentId, AgentId)> = matching.iter().collect();
        self.check_pairs(&pairs)?;
        self.pending.push(Pending::AvoidMatching(matching.clone()));
        Ok(())
    }

    /// Solve for a maximum stable matching under all constraints so far.
    /// Returns an empty matching when none exists.
    pub fn solve(&mut self) -> Result<Matching, ModelError> {
        let instance = self.instance;
        let config = self.config;
        let built = self.built.get_or_insert_with(|| {
            let built = constraints::build(instance, &config);
            debug!(
                "Built {} model: {} columns, {} rows",
                config.formulation,
                built.program.num_columns(),
                built.program.num_rows()
            );
            built
        });

        for request in self.pending.drain(..) {
            match request {
                Pending::Force(l, r) => built.force(l, r),
                Pending::Avoid(l, r) => built.avoid(l, r),
                Pending::AvoidMatching(m) => built.avoid_matching(&m),
            }
        }

        let start = Instant::now();
        let status = self.solver.solve(&built.program);
        self.solve_time += start.elapsed();
        self.solves += 1;

        match status? {
            SolveStatus::Optimal { values, .. } => {
                let matching = built.matching_from(&values, config.epsilon);
                info!("Solve {}: matching of size {}", self.solves, matching.len());
                Ok(matching)
            }
            SolveStatus::Infeasible => {
                info!("Solve {}: infeasible", self.solves);
                Ok(Matching::new())
            }
        }
    }

    /// Lazily enumerate maximum-first stable matchings until none is left.
    pub fn stable_matchings(&mut self) -> StableMatchings<'_, 'a, S> {
        StableMatchings {
            model: self,
            done: false,
        }
    }

    pub fn find_all_stable_matchings(&mut self) -> Result<Vec<Matching>, ModelError> {
        self.stable_matchings().collect()
    }

    pub fn statistics(&self) -> ModelStatistics {
        let (columns, rows) = match &self.built {
            Some(built) => (built.program.num_columns(), built.program.num_rows()),
            None => (0, 0),
        };
        ModelStatistics {
            columns,
            rows,
            solves: self.solves,
            solve_time: self.solve_time,
        }
    }
}

/// Iterator returned by [`StabilityModel::stable_matchings`]. Each yielded
/// matching is excluded from later solves; iteration ends at the first solve
/// that finds nothing.
pub struct StableMatchings<'m, 'a, S: IlpSolver> {
    model: &'m mut StabilityModel<'a, S>,
    done: bool,
}

impl<S: IlpSolver> Iterator for StableMatchings<'_, '_, S> {
    type Item = Result<Matching, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let matching = match self.model.solve() {
            Ok(matching) => matching,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if matching.is_empty() {
            self.done = true;
            return None;
        }
        if let Err(e) = self.model.avoid_matching(&matching) {
            self.done = true;
            return Some(Err(e));
        }
        Some(Ok(matching))
    }
}
