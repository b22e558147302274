//! Two-sided matching instances

mod generate;
mod scores;
mod stability;

pub use generate::GeneratorConfig;
pub use scores::ScoreMatrix;

use crate::AgentId;
use crate::preferences::{Agent, PreferenceError};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Which side of the instance an agent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Errors raised while building or reshaping an instance
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstanceError {
    #[error("{side} agent {id} is defined more than once")]
    DuplicateAgent { side: Side, id: AgentId },
    #[error("{side} agent {agent} lists unknown partner {partner}")]
    UnknownPartner {
        side: Side,
        agent: AgentId,
        partner: AgentId,
    },
    #[error("left agent {left} and right agent {right} do not list each other both ways")]
    Asymmetric { left: AgentId, right: AgentId },
    #[error("cannot remove {requested} dummies, only {available} were added")]
    DummyUnderflow { requested: usize, available: usize },
    #[error("score matrix has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },
    #[error("score row {row} has {found} entries, at most {cols} allowed")]
    RowTooLong { row: usize, cols: usize, found: usize },
    #[error(transparent)]
    Preference(#[from] PreferenceError),
}

/// Left and right agents plus the stack of dummy ids added so far.
///
/// Compatibility is symmetric: a left agent lists a right agent iff the right
/// agent lists it back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Instance {
    left: BTreeMap<AgentId, Agent>,
    right: BTreeMap<AgentId, Agent>,
    dummies: Vec<AgentId>,
}

type AgentSpec = (AgentId, Vec<Vec<AgentId>>);

impl Instance {
    /// Build an instance from explicit tie groups for every agent.
    pub fn from_preferences(
        left: Vec<AgentSpec>,
        right: Vec<AgentSpec>,
    ) -> Result<Self, InstanceError> {
        let left = build_side(Side::Left, left)?;
        let right = build_side(Side::Right, right)?;

        for (side, agents, others) in [
            (Side::Left, &left, &right),
            (Side::Right, &right, &left),
        ] {
            for agent in agents.values() {
                for &partner in agent.prefs() {
                    let Some(other) = others.get(&partner) else {
                        return Err(InstanceError::UnknownPartner {
                            side,
                            agent: agent.id(),
                            partner,
                        });
                    };
                    if !other.is_compatible(agent.id()) {
                        let (l, r) = match side {
                            Side::Left => (agent.id(), partner),
                            Side::Right => (partner, agent.id()),
                        };
                        return Err(InstanceError::Asymmetric { left: l, right: r });
                    }
                }
            }
        }

        Ok(Self {
            left,
            right,
            dummies: Vec::new(),
        })
    }

    pub(crate) fn from_sides(left: BTreeMap<AgentId, Agent>, right: BTreeMap<AgentId, Agent>) -> Self {
        Self {
            left,
            right,
            dummies: Vec::new(),
        }
    }

    pub fn left(&self) -> &BTreeMap<AgentId, Agent> {
        &self.left
    }

    pub fn right(&self) -> &BTreeMap<AgentId, Agent> {
        &self.right
    }

    pub fn side(&self, side: Side) -> &BTreeMap<AgentId, Agent> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mutable access to one side together with the other, for in-place
    /// reductions that touch both.
    pub(crate) fn sides_mut(
        &mut self,
        side: Side,
    ) -> (&mut BTreeMap<AgentId, Agent>, &mut BTreeMap<AgentId, Agent>) {
        match side {
            Side::Left => (&mut self.left, &mut self.right),
            Side::Right => (&mut self.right, &mut self.left),
        }
    }

    pub fn agent_left(&self, id: AgentId) -> Option<&Agent> {
        self.left.get(&id)
    }

    pub fn agent_right(&self, id: AgentId) -> Option<&Agent> {
        self.right.get(&id)
    }

    pub fn num_left(&self) -> usize {
        self.left.len()
    }

    pub fn num_right(&self) -> usize {
        self.right.len()
    }

    pub fn num_dummies(&self) -> usize {
        self.dummies.len()
    }

    /// Dummy ids in the order they were added
    pub fn dummy_ids(&self) -> &[AgentId] {
        &self.dummies
    }

    /// Number of compatible `(left, right)` pairs
    pub fn num_pairs(&self) -> usize {
        self.left.values().map(Agent::len).sum()
    }

    /// Add `count` dummy agents to each side.
    ///
    /// The new ids follow the largest id on either side. Every agent, old or
    /// new, gets the new ids appended to its dummy group.
    pub fn add_dummy(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let max_id = self
            .left
            .keys()
            .chain(self.right.keys())
            .max()
            .copied()
            .unwrap_or(0);
        let start = max_id + 1;
        let end = max_id + count as AgentId;

        let left_ids: Vec<AgentId> = self.left.keys().copied().collect();
        let right_ids: Vec<AgentId> = self.right.keys().copied().collect();
        for id in start..=end {
            self.left
                .insert(id, Agent::from_unique_groups(id, vec![right_ids.clone()]));
            self.right
                .insert(id, Agent::from_unique_groups(id, vec![left_ids.clone()]));
        }
        for agent in self.left.values_mut().chain(self.right.values_mut()) {
            agent.add_dummy_range(start, end);
        }
        self.dummies.extend(start..=end);
        debug!("Added dummies {}..={}", start, end);
    }

    /// Remove the `count` most recently added dummies from both sides and
    /// from every remaining list.
    pub fn remove_dummy(&mut self, count: usize) -> Result<(), InstanceError> {
        if count > self.dummies.len() {
            return Err(InstanceError::DummyUnderflow {
                requested: count,
                available: self.dummies.len(),
            });
        }
        let removed = self.dummies.split_off(self.dummies.len() - count);
        for id in &removed {
            self.left.remove(id);
            self.right.remove(id);
        }
        for agent in self.left.values_mut().chain(self.right.values_mut()) {
            agent.remove_dummies(&removed);
        }
        debug!("Removed {} dummies", removed.len());
        Ok(())
    }

    /// Remove a compatible pair from both lists. No-op for unknown pairs.
    pub fn remove_pair(&mut self, left: AgentId, right: AgentId) {
        if let Some(agent) = self.left.get_mut(&left) {
            agent.remove_preference(right);
        }
        if let Some(agent) = self.right.get_mut(&right) {
            agent.remove_preference(left);
        }
    }
}

fn build_side(
    side: Side,
    specs: Vec<AgentSpec>,
) -> Result<BTreeMap<AgentId, Agent>, InstanceError> {
    let mut agents = BTreeMap::new();
    for (id, groups) in specs {
        if agents.contains_key(&id) {
            return Err(InstanceError::DuplicateAgent { side, id });
        }
        agents.insert(id, Agent::new(id, groups)?);
    }
    Ok(agents)
}
