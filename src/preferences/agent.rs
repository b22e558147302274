//! A single agent and its ranked, possibly tied, preference list

use crate::AgentId;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by preference queries and construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    /// The partner does not appear in the agent's list
    #[error("agent {agent} does not rank {partner}")]
    NotFound { agent: AgentId, partner: AgentId },
    /// The partner appears in more than one place
    #[error("agent {agent} lists {partner} more than once")]
    DuplicatePartner { agent: AgentId, partner: AgentId },
}

/// One agent of either side.
///
/// `groups[r]` holds the partners at rank `r` (0 is best). The flattened order
/// and the rank map are derived from the groups and updated on every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    groups: Vec<Vec<AgentId>>,
    in_order: Vec<AgentId>,
    ranks: HashMap<AgentId, usize>,
    dummy_group: Option<usize>,
}

impl Agent {
    /// Create an agent from explicit tie groups. Empty groups are skipped.
    pub fn new(id: AgentId, groups: Vec<Vec<AgentId>>) -> Result<Self, PreferenceError> {
        let mut seen = std::collections::HashSet::new();
        for &partner in groups.iter().flatten() {
            if !seen.insert(partner) {
                return Err(PreferenceError::DuplicatePartner { agent: id, partner });
            }
        }
        Ok(Self::from_unique_groups(id, groups))
    }

    /// Sample `pref_length` partners from `pool` and tie them at random.
    ///
    /// Asking for more partners than the pool holds takes the whole pool.
    pub fn random<R: Rng + ?Sized>(
        id: AgentId,
        pool: &[AgentId],
        pref_length: usize,
        tie_density: f64,
        rng: &mut R,
    ) -> Self {
        let amount = pref_length.min(pool.len());
        let chosen: Vec<AgentId> = rand::seq::index::sample(rng, pool.len(), amount)
            .into_iter()
            .map(|index| pool[index])
            .collect();
        Self::shuffled(id, chosen, tie_density, rng)
    }

    /// Shuffle an exact set of partners into random tie groups.
    ///
    /// Each partner after the first joins the current group with probability
    /// `tie_density`, otherwise it opens a new, strictly worse group. The
    /// density is clamped to `[0, 1]` and NaN means no ties.
    pub fn shuffled<R: Rng + ?Sized>(
        id: AgentId,
        mut partners: Vec<AgentId>,
        tie_density: f64,
        rng: &mut R,
    ) -> Self {
        partners.sort_unstable();
        partners.dedup();
        partners.shuffle(rng);
        let tie_density = if tie_density.is_nan() {
            0.0
        } else {
            tie_density.clamp(0.0, 1.0)
        };

        let mut groups: Vec<Vec<AgentId>> = Vec::new();
        for partner in partners {
            match groups.last_mut() {
                Some(group) if rng.random_bool(tie_density) => group.push(partner),
                _ => groups.push(vec![partner]),
            }
        }
        Self::from_unique_groups(id, groups)
    }

    /// Build from groups already known to hold each partner once
    pub(crate) fn from_unique_groups(id: AgentId, groups: Vec<Vec<AgentId>>) -> Self {
        let mut agent = Self {
            id,
            groups: groups.into_iter().filter(|g| !g.is_empty()).collect(),
            in_order: Vec::new(),
            ranks: HashMap::new(),
            dummy_group: None,
        };
        agent.rebuild_index();
        agent
    }

    fn rebuild_index(&mut self) {
        self.in_order = self.groups.iter().flatten().copied().collect();
        self.ranks = self
            .groups
            .iter()
            .enumerate()
            .flat_map(|(rank, group)| group.iter().map(move |&p| (p, rank)))
            .collect();
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Number of partners on the list
    pub fn len(&self) -> usize {
        self.in_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_order.is_empty()
    }

    /// Number of non-empty tie groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The tie groups, best first
    pub fn groups(&self) -> &[Vec<AgentId>] {
        &self.groups
    }

    /// The tie group at `rank`, if any
    pub fn group(&self, rank: usize) -> Option<&[AgentId]> {
        self.groups.get(rank).map(Vec::as_slice)
    }

    /// Partners in the stored flattened order; `prefs()[i]` is never worse
    /// than `prefs()[i + 1]`.
    pub fn prefs(&self) -> &[AgentId] {
        &self.in_order
    }

    /// Index of the group holding synthetic dummy partners
    pub fn dummy_group(&self) -> Option<usize> {
        self.dummy_group
    }

    pub fn is_compatible(&self, other: AgentId) -> bool {
        self.ranks.contains_key(&other)
    }

    pub fn rank_of(&self, partner: AgentId) -> Result<usize, PreferenceError> {
        self.ranks
            .get(&partner)
            .copied()
            .ok_or(PreferenceError::NotFound {
                agent: self.id,
                partner,
            })
    }

    /// 1-based position of `partner` in the flattened order
    pub fn position_of(&self, partner: AgentId) -> Option<usize> {
        self.in_order
            .iter()
            .position(|&p| p == partner)
            .map(|index| index + 1)
    }

    /// 1-based position of the first partner ranked strictly worse than
    /// `partner`, or `len() + 1` when `partner` sits in the last group.
    pub fn position_of_next_worse(&self, partner: AgentId) -> Option<usize> {
        let rank = self.ranks.get(&partner).copied()?;
        let up_to: usize = self.groups[..=rank].iter().map(Vec::len).sum();
        Some(up_to + 1)
    }

    /// Every partner ranked at least as well as `partner`, best group first.
    /// Empty when `partner` is not listed.
    pub fn as_good_as(&self, partner: AgentId) -> Vec<AgentId> {
        match self.ranks.get(&partner) {
            Some(&rank) => self.groups[..=rank].iter().flatten().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Drop every group strictly worse than `rank` and return the removed ids.
    pub fn remove_after(&mut self, rank: usize) -> Vec<AgentId> {
        if rank + 1 >= self.groups.len() {
            return Vec::new();
        }
        let removed: Vec<AgentId> = self.groups.drain(rank + 1..).flatten().collect();
        for partner in &removed {
            self.ranks.remove(partner);
        }
        self.in_order.truncate(self.in_order.len() - removed.len());
        if self.dummy_group.is_some_and(|d| d > rank) {
            self.dummy_group = None;
        }
        removed
    }

    /// Remove one partner. Groups left empty are dropped and worse ranks move up.
    pub fn remove_preference(&mut self, partner: AgentId) {
        let Some(rank) = self.ranks.remove(&partner) else {
            return;
        };
        self.groups[rank].retain(|&p| p != partner);
        self.in_order.retain(|&p| p != partner);
        if !self.groups[rank].is_empty() {
            return;
        }

        self.groups.remove(rank);
        for r in self.ranks.values_mut() {
            if *r > rank {
                *r -= 1;
            }
        }
        self.dummy_group = match self.dummy_group {
            Some(d) if d == rank => None,
            Some(d) if d > rank => Some(d - 1),
            other => other,
        };
    }

    /// Append ids `start..=end` to the tail dummy group, creating it if needed.
    pub fn add_dummy_range(&mut self, start: AgentId, end: AgentId) {
        let fresh: Vec<AgentId> = (start..=end).filter(|id| !self.is_compatible(*id)).collect();
        if fresh.is_empty() {
            return;
        }
        let rank = match self.dummy_group {
            Some(d) => d,
            None => {
                self.groups.push(Vec::new());
                let d = self.groups.len() - 1;
                self.dummy_group = Some(d);
                d
            }
        };
        for id in fresh {
            self.groups[rank].push(id);
            self.in_order.push(id);
            self.ranks.insert(id, rank);
        }
    }

    /// Remove the listed dummy partners and return the ones that were present.
    /// The dummy group is dropped once it is empty.
    pub fn remove_dummies(&mut self, ids: &[AgentId]) -> Vec<AgentId> {
        let present: Vec<AgentId> = ids.iter().copied().filter(|&id| self.is_compatible(id)).collect();
        for &id in &present {
            self.remove_preference(id);
        }
        present
    }
}
