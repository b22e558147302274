//! Matchings as sets of `(left, right)` pairs

use crate::AgentId;
use std::collections::BTreeSet;
use std::fmt;

/// A set of pairs in which each agent appears at most once per side
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Matching {
    pairs: BTreeSet<(AgentId, AgentId)>,
}

impl Matching {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair. Returns `false` and leaves the matching unchanged when
    /// either agent is already matched.
    pub fn insert(&mut self, left: AgentId, right: AgentId) -> bool {
        if self.partner_of_left(left).is_some() || self.partner_of_right(right).is_some() {
            return false;
        }
        self.pairs.insert((left, right))
    }

    pub fn contains(&self, left: AgentId, right: AgentId) -> bool {
        self.pairs.contains(&(left, right))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in ascending `(left, right)` order
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, AgentId)> + '_ {
        self.pairs.iter().copied()
    }

    pub fn partner_of_left(&self, left: AgentId) -> Option<AgentId> {
        self.pairs
            .range((left, AgentId::MIN)..=(left, AgentId::MAX))
            .next()
            .map(|&(_, right)| right)
    }

    pub fn partner_of_right(&self, right: AgentId) -> Option<AgentId> {
        self.pairs
            .iter()
            .find(|&&(_, r)| r == right)
            .map(|&(left, _)| left)
    }
}

impl FromIterator<(AgentId, AgentId)> for Matching {
    /// Conflicting pairs after the first are dropped.
    fn from_iter<I: IntoIterator<Item = (AgentId, AgentId)>>(iter: I) -> Self {
        let mut matching = Matching::new();
        for (left, right) in iter {
            matching.insert(left, right);
        }
        matching
    }
}

impl<'a> IntoIterator for &'a Matching {
    type Item = (AgentId, AgentId);
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, (AgentId, AgentId)>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter().copied()
    }
}

impl fmt::Display for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (left, right) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "({}, {})", left, right)?;
            first = false;
        }
        Ok(())
    }
}
