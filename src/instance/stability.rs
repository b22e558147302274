//! Blocking-pair detection

use super::Instance;
use crate::AgentId;
use crate::matching::Matching;
use crate::preferences::Agent;

/// Rank of the current partner, or `None` when unmatched (or matched to
/// someone the agent does not list).
fn current_rank(agent: &Agent, partner: Option<AgentId>) -> Option<usize> {
    partner.and_then(|p| agent.rank_of(p).ok())
}

fn strictly_prefers(candidate_rank: usize, current: Option<usize>) -> bool {
    match current {
        Some(rank) => candidate_rank < rank,
        None => true,
    }
}

impl Instance {
    /// Compatible pairs that would both rather be with each other than with
    /// their partners in `matching`.
    pub fn blocking_pairs(&self, matching: &Matching) -> Vec<(AgentId, AgentId)> {
        let mut blocking = Vec::new();
        for (&l, left) in &self.left {
            let left_current = current_rank(left, matching.partner_of_left(l));
            for &r in left.prefs() {
                if matching.contains(l, r) {
                    continue;
                }
                let (Ok(rank_of_r), Some(right)) = (left.rank_of(r), self.right.get(&r)) else {
                    continue;
                };
                if !strictly_prefers(rank_of_r, left_current) {
                    continue;
                }
                let Ok(rank_of_l) = right.rank_of(l) else {
                    continue;
                };
                let right_current = current_rank(right, matching.partner_of_right(r));
                if strictly_prefers(rank_of_l, right_current) {
                    blocking.push((l, r));
                }
            }
        }
        blocking
    }

    pub fn is_stable(&self, matching: &Matching) -> bool {
        self.blocking_pairs(matching).is_empty()
    }
}
