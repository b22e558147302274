//! Instances derived from a score matrix ("globally ranked pairs")

use super::{Instance, InstanceError};
use crate::AgentId;
use crate::preferences::Agent;
use std::collections::BTreeMap;
use tracing::warn;

/// Pair scores: rows are left agents `0..rows`, columns right agents
/// `0..cols`. A row may be shorter than `cols`; missing entries mean the pair
/// is not acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    cols: usize,
    scores: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    pub fn new(rows: usize, cols: usize, scores: Vec<Vec<f64>>) -> Result<Self, InstanceError> {
        if scores.len() != rows {
            return Err(InstanceError::RowCount {
                expected: rows,
                found: scores.len(),
            });
        }
        if let Some((row, entries)) = scores.iter().enumerate().find(|(_, r)| r.len() > cols) {
            return Err(InstanceError::RowTooLong {
                row,
                cols,
                found: entries.len(),
            });
        }
        Ok(Self { cols, scores })
    }

    pub fn rows(&self) -> usize {
        self.scores.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn score(&self, row: usize, col: usize) -> Option<f64> {
        self.scores.get(row)?.get(col).copied()
    }
}

/// Sort candidates by score, best first, and tie equal scores.
fn rank_by_score(mut candidates: Vec<(AgentId, f64)>, threshold: Option<f64>) -> Vec<Vec<AgentId>> {
    if let Some(threshold) = threshold {
        candidates.retain(|&(_, score)| score >= threshold);
    }
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut groups: Vec<Vec<AgentId>> = Vec::new();
    let mut last_score = None;
    for (id, score) in candidates {
        match groups.last_mut() {
            Some(group) if last_score == Some(score) => group.push(id),
            _ => groups.push(vec![id]),
        }
        last_score = Some(score);
    }
    groups
}

impl Instance {
    /// Build an instance from pair scores. Higher scores are preferred, equal
    /// scores tie, and pairs scoring below `threshold` are dropped.
    pub fn from_scores(matrix: &ScoreMatrix, threshold: Option<f64>) -> Self {
        let mut row_candidates: Vec<Vec<(AgentId, f64)>> = vec![Vec::new(); matrix.rows()];
        let mut col_candidates: Vec<Vec<(AgentId, f64)>> = vec![Vec::new(); matrix.cols()];
        for (row, entries) in matrix.scores.iter().enumerate() {
            for (col, &score) in entries.iter().enumerate() {
                row_candidates[row].push((col as AgentId, score));
                col_candidates[col].push((row as AgentId, score));
            }
        }

        let mut left = BTreeMap::new();
        for (row, candidates) in row_candidates.into_iter().enumerate() {
            let id = row as AgentId;
            let groups = rank_by_score(candidates, threshold);
            if groups.is_empty() {
                warn!("Score row {} has no acceptable partners", row);
            }
            left.insert(id, Agent::from_unique_groups(id, groups));
        }

        let mut right = BTreeMap::new();
        for (col, candidates) in col_candidates.into_iter().enumerate() {
            let id = col as AgentId;
            right.insert(id, Agent::from_unique_groups(id, rank_by_score(candidates, threshold)));
        }

        Self::from_sides(left, right)
    }
}
