//! Preference-list reduction that keeps every maximum stable matching.
//!
//! For an agent `a` and a rank `r`, build a bipartite graph whose sources are
//! the partners `a` ranks at `r` or better and whose targets are the agents
//! those partners like at least as much as `a`. If the sources cannot all be
//! matched, some partner of rank `<= r` must end up with `a`, so `a` is
//! matched at rank `<= r` in every maximum stable matching and everything
//! worse can go.

mod graph;

use crate::AgentId;
use crate::instance::{Instance, Side};
use crate::preferences::Agent;
use graph::FeasibilityGraph;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// How thorough the reduction is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreprocessMode {
    /// Never checks the last rank and tracks no must-allocate agents
    Quick,
    /// Also marks agents assigned in every maximum stable matching and uses
    /// them to strengthen later checks
    #[default]
    Complete,
}

impl fmt::Display for PreprocessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessMode::Quick => write!(f, "quick"),
            PreprocessMode::Complete => write!(f, "complete"),
        }
    }
}

impl std::str::FromStr for PreprocessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" | "q" => Ok(PreprocessMode::Quick),
            "complete" | "full" | "c" => Ok(PreprocessMode::Complete),
            _ => Err(format!(
                "Unknown preprocessing mode: '{}'. Valid options: quick, complete",
                s
            )),
        }
    }
}

/// Outcome of [`preprocess`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Number of left-then-right passes, including the final one that changed
    /// nothing
    pub passes: usize,
    /// Pairs removed while scanning left agents
    pub removed_left: usize,
    /// Pairs removed while scanning right agents
    pub removed_right: usize,
    /// Left agents matched in every maximum stable matching
    pub must_allocate_left: BTreeSet<AgentId>,
    /// Right agents matched in every maximum stable matching
    pub must_allocate_right: BTreeSet<AgentId>,
}

impl PreprocessReport {
    pub fn removed(&self) -> usize {
        self.removed_left + self.removed_right
    }
}

/// Shrink every list of `instance` in place until nothing changes.
pub fn preprocess(instance: &mut Instance, mode: PreprocessMode) -> PreprocessReport {
    let mut report = PreprocessReport::default();
    let before = instance.num_pairs();

    loop {
        report.passes += 1;
        let (removed_left, marked_left) = reduce_side(
            instance,
            Side::Left,
            mode,
            &mut report.must_allocate_left,
            &report.must_allocate_right,
        );
        let (removed_right, marked_right) = reduce_side(
            instance,
            Side::Right,
            mode,
            &mut report.must_allocate_right,
            &report.must_allocate_left,
        );
        report.removed_left += removed_left;
        report.removed_right += removed_right;
        debug!(
            "Pass {}: removed {} left / {} right, {} newly must-allocate",
            report.passes,
            removed_left,
            removed_right,
            marked_left + marked_right
        );
        if removed_left + removed_right == 0 && marked_left + marked_right == 0 {
            break;
        }
    }

    info!(
        "Preprocessing ({}) removed {} of {} pairs in {} passes",
        mode,
        report.removed(),
        before,
        report.passes
    );
    report
}

/// One scan over `side`. Returns the pairs removed and the number of agents
/// newly marked must-allocate.
fn reduce_side(
    instance: &mut Instance,
    side: Side,
    mode: PreprocessMode,
    must_allocate: &mut BTreeSet<AgentId>,
    other_must_allocate: &BTreeSet<AgentId>,
) -> (usize, usize) {
    let (agents, others) = instance.sides_mut(side);
    let ids: Vec<AgentId> = agents.keys().copied().collect();
    let mut removed_total = 0;
    let mut marked = 0;

    for id in ids {
        let Some(agent) = agents.get(&id) else {
            continue;
        };
        let Some(rank) = find_cut(
            agent,
            others,
            mode,
            must_allocate.contains(&id),
            other_must_allocate,
        ) else {
            continue;
        };

        if mode == PreprocessMode::Complete && must_allocate.insert(id) {
            marked += 1;
        }
        let removed = match agents.get_mut(&id) {
            Some(agent) => agent.remove_after(rank),
            None => Vec::new(),
        };
        for partner in &removed {
            if let Some(other) = others.get_mut(partner) {
                other.remove_preference(id);
            }
        }
        if !removed.is_empty() {
            debug!(
                "{} agent {} keeps ranks 0..={}, dropped {:?}",
                side, id, rank, removed
            );
        }
        removed_total += removed.len();
    }
    (removed_total, marked)
}

/// First rank at which `agent`'s feasibility check fails.
fn find_cut(
    agent: &Agent,
    others: &BTreeMap<AgentId, Agent>,
    mode: PreprocessMode,
    already_must_allocate: bool,
    other_must_allocate: &BTreeSet<AgentId>,
) -> Option<usize> {
    let last = agent.group_count().checked_sub(1)?;
    let mut graph = FeasibilityGraph::default();

    for (rank, group) in agent.groups().iter().enumerate() {
        if rank == last && (mode == PreprocessMode::Quick || already_must_allocate) {
            break;
        }

        for &partner in group {
            graph.add_source(partner);
            let Some(other) = others.get(&partner) else {
                continue;
            };
            for target in other.as_good_as(agent.id()) {
                if target != agent.id() {
                    graph.add_edge(partner, target);
                }
            }
        }

        // Fewer targets than sources: no matching can saturate
        let mut infeasible = graph.num_targets() < graph.num_sources();
        if !infeasible {
            for &partner in group {
                graph.augment(partner);
            }
            infeasible = !graph.is_saturated();
        }

        if rank == 0 && !infeasible && !other_must_allocate.is_empty() {
            for &forced in other_must_allocate {
                let Some(other) = others.get(&forced) else {
                    continue;
                };
                if other.is_compatible(agent.id()) {
                    continue;
                }
                graph.add_source(forced);
                for &target in other.prefs() {
                    graph.add_edge(forced, target);
                }
                graph.augment(forced);
            }
            infeasible = !graph.is_saturated();
        }

        if infeasible {
            return Some(rank);
        }
    }
    None
}
