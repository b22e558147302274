//! Columns and rows of the stable-matching program

use super::config::{ModelConfig, StabilityFormulation};
use super::program::{ColumnId, LinearProgram, Sense};
use crate::AgentId;
use crate::instance::Instance;
use crate::matching::Matching;
use std::collections::BTreeMap;

/// The base program plus the pair-to-column map used to read solutions back
#[derive(Debug, Clone)]
pub(crate) struct BuiltModel {
    pub(crate) program: LinearProgram,
    pub(crate) pairs: BTreeMap<(AgentId, AgentId), ColumnId>,
}

impl BuiltModel {
    pub(crate) fn column(&self, left: AgentId, right: AgentId) -> Option<ColumnId> {
        self.pairs.get(&(left, right)).copied()
    }

    pub(crate) fn force(&mut self, left: AgentId, right: AgentId) {
        if let Some(column) = self.column(left, right) {
            self.program.add_equality([(column, 1.0)], 1.0);
        }
    }

    pub(crate) fn avoid(&mut self, left: AgentId, right: AgentId) {
        if let Some(column) = self.column(left, right) {
            self.program.add_equality([(column, 1.0)], 0.0);
        }
    }

    /// At most `|matching| - 1` of the matching's pairs may be chosen again.
    pub(crate) fn avoid_matching(&mut self, matching: &Matching) {
        let terms: Vec<(ColumnId, f64)> = matching
            .iter()
            .filter_map(|(l, r)| self.column(l, r))
            .map(|column| (column, 1.0))
            .collect();
        if !terms.is_empty() {
            self.program.add_at_most(terms, matching.len() as f64 - 1.0);
        }
    }

    /// Read the chosen pairs out of a column assignment.
    pub(crate) fn matching_from(&self, values: &[f64], epsilon: f64) -> Matching {
        self.pairs
            .iter()
            .filter(|&(_, &column)| values.get(column).is_some_and(|&v| v >= 1.0 - epsilon))
            .map(|(&pair, _)| pair)
            .collect()
    }
}

/// Build pair and unassigned columns, capacity rows, the objective and the
/// stability rows of the configured formulation.
pub(crate) fn build(instance: &Instance, config: &ModelConfig) -> BuiltModel {
    let mut program = LinearProgram::new(Sense::Maximise);
    let mut pairs = BTreeMap::new();

    for (&l, agent) in instance.left() {
        for &r in agent.prefs() {
            let column = program.add_binary(format!("x_{}_{}", l, r));
            pairs.insert((l, r), column);
        }
    }

    let mut built = BuiltModel { program, pairs };
    add_capacity_rows(instance, &mut built);
    built
        .program
        .set_objective(built.pairs.values().map(|&column| (column, 1.0)));

    match config.formulation {
        StabilityFormulation::Single => add_single_rows(instance, &mut built),
        StabilityFormulation::Merged => add_merged_rows(instance, &mut built),
    }
    built
}

/// Every agent is matched once or marked unassigned.
fn add_capacity_rows(instance: &Instance, built: &mut BuiltModel) {
    for (&l, agent) in instance.left() {
        let unassigned = built.program.add_binary(format!("u_left_{}", l));
        let mut terms: Vec<(ColumnId, f64)> = agent
            .prefs()
            .iter()
            .filter_map(|&r| built.column(l, r))
            .map(|column| (column, 1.0))
            .collect();
        terms.push((unassigned, 1.0));
        built.program.add_equality(terms, 1.0);
    }
    for (&r, agent) in instance.right() {
        let unassigned = built.program.add_binary(format!("u_right_{}", r));
        let mut terms: Vec<(ColumnId, f64)> = agent
            .prefs()
            .iter()
            .filter_map(|&l| built.column(l, r))
            .map(|column| (column, 1.0))
            .collect();
        terms.push((unassigned, 1.0));
        built.program.add_equality(terms, 1.0);
    }
}

/// For each compatible `(a, b)`: a has someone as good as b, or b has
/// someone as good as a.
fn add_single_rows(instance: &Instance, built: &mut BuiltModel) {
    for (&a, left) in instance.left() {
        for &b in left.prefs() {
            let Some(right) = instance.agent_right(b) else {
                continue;
            };
            let mine = left.as_good_as(b).into_iter().filter_map(|o| built.column(a, o));
            let theirs = right.as_good_as(a).into_iter().filter_map(|o| built.column(o, b));
            let terms: Vec<(ColumnId, f64)> = mine.chain(theirs).map(|c| (c, 1.0)).collect();
            built.program.add_at_least(terms, 1.0);
        }
    }
}

/// Add `filled[r]` indicators for one agent: `filled[r]` is 1 iff the agent is
/// matched at rank `r` or better.
fn add_indicators(
    built: &mut BuiltModel,
    prefix: &str,
    id: AgentId,
    groups: &[Vec<AgentId>],
    column_of: impl Fn(&BuiltModel, AgentId) -> Option<ColumnId>,
) -> Vec<ColumnId> {
    let mut filled: Vec<ColumnId> = Vec::with_capacity(groups.len());
    for (rank, group) in groups.iter().enumerate() {
        let indicator = built.program.add_binary(format!("f_{}_{}_{}", prefix, id, rank));
        let mut terms: Vec<(ColumnId, f64)> = group
            .iter()
            .filter_map(|&partner| column_of(built, partner))
            .map(|column| (column, 1.0))
            .collect();
        terms.push((indicator, -1.0));
        if let Some(&previous) = filled.last() {
            terms.push((previous, 1.0));
        }
        built.program.add_equality(terms, 0.0);
        filled.push(indicator);
    }
    filled
}

/// One row per (left agent, tie group):
/// `|g| * filled(a, r) + sum_{b in g} filled(b, rank_b(a)) >= |g|`.
fn add_merged_rows(instance: &Instance, built: &mut BuiltModel) {
    let mut left_filled: BTreeMap<AgentId, Vec<ColumnId>> = BTreeMap::new();
    for (&a, agent) in instance.left() {
        let filled = add_indicators(built, "left", a, agent.groups(), |m, r| m.column(a, r));
        left_filled.insert(a, filled);
    }
    let mut right_filled: BTreeMap<AgentId, Vec<ColumnId>> = BTreeMap::new();
    for (&b, agent) in instance.right() {
        let filled = add_indicators(built, "right", b, agent.groups(), |m, l| m.column(l, b));
        right_filled.insert(b, filled);
    }

    for (&a, agent) in instance.left() {
        for (rank, group) in agent.groups().iter().enumerate() {
            let size = group.len() as f64;
            let mut terms: Vec<(ColumnId, f64)> = Vec::with_capacity(group.len() + 1);
            if let Some(&own) = left_filled.get(&a).and_then(|f| f.get(rank)) {
                terms.push((own, size));
            }
            for &b in group {
                let other = instance
                    .agent_right(b)
                    .and_then(|right| right.rank_of(a).ok())
                    .and_then(|their_rank| right_filled.get(&b)?.get(their_rank).copied());
                if let Some(column) = other {
                    terms.push((column, 1.0));
                }
            }
            built.program.add_at_least(terms, size);
        }
    }
}
