//! Integer-programming backends

use super::program::{LinearProgram, Sense};
use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable, microlp, variable, variables,
};
use thiserror::Error;

/// Result of a successful solver call
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// Proven optimum, with one value per column
    Optimal { objective: f64, values: Vec<f64> },
    Infeasible,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("problem is unbounded")]
    Unbounded,
    #[error("solver failed: {0}")]
    Backend(String),
}

/// A backend that solves [`LinearProgram`]s to proven optimality
pub trait IlpSolver {
    fn solve(&mut self, program: &LinearProgram) -> Result<SolveStatus, SolverError>;
}

/// Branch-and-bound through `good_lp` with the pure-Rust microlp backend
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl IlpSolver for GoodLpSolver {
    fn solve(&mut self, program: &LinearProgram) -> Result<SolveStatus, SolverError> {
        let mut vars = variables!();
        let columns: Vec<Variable> = program
            .columns()
            .iter()
            .map(|column| {
                let definition = variable().min(column.lower).max(column.upper);
                if column.integer {
                    vars.add(definition.integer())
                } else {
                    vars.add(definition)
                }
            })
            .collect();

        let mut objective = Expression::with_capacity(program.objective().len());
        for &(column, coefficient) in program.objective() {
            objective.add_mul(coefficient, columns[column]);
        }

        let mut problem = match program.sense() {
            Sense::Maximise => vars.maximise(&objective).using(microlp),
            Sense::Minimise => vars.minimise(&objective).using(microlp),
        };

        for row in program.rows() {
            let mut expr = Expression::with_capacity(row.terms.len());
            for &(column, coefficient) in &row.terms {
                expr.add_mul(coefficient, columns[column]);
            }
            if row.is_equality() {
                problem = problem.with(expr.eq(row.lower));
                continue;
            }
            if row.lower.is_finite() {
                problem = problem.with(expr.clone().geq(row.lower));
            }
            if row.upper.is_finite() {
                problem = problem.with(expr.leq(row.upper));
            }
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = columns.iter().map(|&v| solution.value(v)).collect();
                let objective = program
                    .objective()
                    .iter()
                    .map(|&(column, coefficient)| coefficient * values[column])
                    .sum();
                Ok(SolveStatus::Optimal { objective, values })
            }
            Err(ResolutionError::Infeasible) => Ok(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}
