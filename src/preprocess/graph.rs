//! Bipartite feasibility graph with an incrementally grown maximum matching

use crate::AgentId;
use std::collections::HashMap;

/// Sources are added one at a time and matched with Kuhn's augmenting-path
/// search. Targets are shared between sources.
#[derive(Debug, Default)]
pub(crate) struct FeasibilityGraph {
    source_index: HashMap<AgentId, usize>,
    target_index: HashMap<AgentId, usize>,
    edges: Vec<Vec<usize>>,
    source_match: Vec<Option<usize>>,
    target_match: Vec<Option<usize>>,
    matched: usize,
}

impl FeasibilityGraph {
    pub(crate) fn add_source(&mut self, id: AgentId) -> usize {
        let next = self.edges.len();
        let index = *self.source_index.entry(id).or_insert(next);
        if index == next {
            self.edges.push(Vec::new());
            self.source_match.push(None);
        }
        index
    }

    pub(crate) fn add_target(&mut self, id: AgentId) -> usize {
        let next = self.target_match.len();
        let index = *self.target_index.entry(id).or_insert(next);
        if index == next {
            self.target_match.push(None);
        }
        index
    }

    /// Add an edge, creating either endpoint if needed.
    pub(crate) fn add_edge(&mut self, source: AgentId, target: AgentId) {
        let s = self.add_source(source);
        let t = self.add_target(target);
        if !self.edges[s].contains(&t) {
            self.edges[s].push(t);
        }
    }

    pub(crate) fn num_sources(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn num_targets(&self) -> usize {
        self.target_match.len()
    }

    /// Every source is matched
    pub(crate) fn is_saturated(&self) -> bool {
        self.matched == self.num_sources()
    }

    /// Try to match `source` along an augmenting path. Returns whether the
    /// matching grew.
    pub(crate) fn augment(&mut self, source: AgentId) -> bool {
        let Some(&s) = self.source_index.get(&source) else {
            return false;
        };
        if self.source_match[s].is_some() {
            return false;
        }
        let mut visited = vec![false; self.num_targets()];
        if self.try_match(s, &mut visited) {
            self.matched += 1;
            true
        } else {
            false
        }
    }

    fn try_match(&mut self, s: usize, visited: &mut [bool]) -> bool {
        for i in 0..self.edges[s].len() {
            let t = self.edges[s][i];
            if visited[t] {
                continue;
            }
            visited[t] = true;
            let free = match self.target_match[t] {
                None => true,
                Some(other) => self.try_match(other, visited),
            };
            if free {
                self.target_match[t] = Some(s);
                self.source_match[s] = Some(t);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_augmenting_path_reroutes() {
        let mut g = FeasibilityGraph::default();
        g.add_edge(1, 10);
        g.add_edge(1, 11);
        assert!(g.augment(1));

        // 2 can only use 10, so 1 must move to 11
        g.add_edge(2, 10);
        assert!(g.augment(2));
        assert!(g.is_saturated());
    }

    #[test]
    fn test_hall_violation_unsaturated() {
        let mut g = FeasibilityGraph::default();
        for source in [1, 2, 3] {
            g.add_edge(source, 10);
            g.add_edge(source, 11);
        }
        let grown = [1, 2, 3].into_iter().filter(|&s| g.augment(s)).count();
        assert_eq!(g.num_sources(), 3);
        assert_eq!(g.num_targets(), 2);
        assert_eq!(grown, 2);
        assert!(!g.is_saturated());
    }

    #[test]
    fn test_isolated_source() {
        let mut g = FeasibilityGraph::default();
        g.add_source(4);
        assert!(!g.augment(4));
        assert!(!g.augment(99));
        assert!(!g.is_saturated());
    }
}
