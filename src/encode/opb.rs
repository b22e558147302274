//! Pseudo-Boolean (OPB) encoding

use super::{EncodeError, listed_right};
use crate::AgentId;
use crate::instance::Instance;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

#[derive(Default)]
struct OpbWriter {
    variables: usize,
    constraints: Vec<String>,
    comments: Vec<String>,
}

impl OpbWriter {
    fn new_var(&mut self, comment: impl FnOnce(usize) -> String) -> usize {
        self.variables += 1;
        self.comments.push(comment(self.variables));
        self.variables
    }

    fn constraint(&mut self, terms: &[(i64, usize)], relation: &str, rhs: i64) {
        let mut line = String::new();
        for (coefficient, var) in terms {
            let _ = write!(line, "{} x{} ", coefficient, var);
        }
        let _ = write!(line, "{} {};", relation, rhs);
        self.constraints.push(line);
    }
}

/// Encode as OPB. Pair and unassigned variables come first; `merged` adds one
/// "filled at rank r or better" indicator per agent and rank and states
/// stability through them.
pub fn encode_pbo(instance: &Instance, merged: bool) -> Result<String, EncodeError> {
    let mut opb = OpbWriter::default();

    let mut pairs: BTreeMap<(AgentId, AgentId), usize> = BTreeMap::new();
    for (&l, agent) in instance.left() {
        for &r in agent.prefs() {
            let var = opb.new_var(|v| format!("{} with {} is {}", l, r, v));
            pairs.insert((l, r), var);
        }
    }
    let mut unassigned_left = BTreeMap::new();
    for &l in instance.left().keys() {
        unassigned_left.insert(l, opb.new_var(|v| format!("left {} unassigned is {}", l, v)));
    }
    let mut unassigned_right = BTreeMap::new();
    for &r in instance.right().keys() {
        unassigned_right.insert(r, opb.new_var(|v| format!("right {} unassigned is {}", r, v)));
    }
    let pair = |l: AgentId, r: AgentId| pairs.get(&(l, r)).copied();

    for (&l, agent) in instance.left() {
        let mut terms: Vec<(i64, usize)> =
            agent.prefs().iter().filter_map(|&r| pair(l, r)).map(|v| (1, v)).collect();
        terms.extend(unassigned_left.get(&l).map(|&v| (1, v)));
        opb.constraint(&terms, "=", 1);
    }
    for (&r, agent) in instance.right() {
        let mut terms: Vec<(i64, usize)> =
            agent.prefs().iter().filter_map(|&l| pair(l, r)).map(|v| (1, v)).collect();
        terms.extend(unassigned_right.get(&r).map(|&v| (1, v)));
        opb.constraint(&terms, "=", 1);
    }

    if merged {
        let mut left_filled: BTreeMap<AgentId, Vec<usize>> = BTreeMap::new();
        for (&l, agent) in instance.left() {
            let mut filled = Vec::new();
            for (rank, group) in agent.groups().iter().enumerate() {
                let f = opb.new_var(|v| format!("left {} filled at {} is {}", l, rank, v));
                let mut terms = vec![(-1, f)];
                if let Some(&previous) = filled.last() {
                    terms.push((1, previous));
                }
                terms.extend(group.iter().filter_map(|&r| pair(l, r)).map(|v| (1, v)));
                opb.constraint(&terms, "=", 0);
                filled.push(f);
            }
            left_filled.insert(l, filled);
        }
        let mut right_filled: BTreeMap<AgentId, Vec<usize>> = BTreeMap::new();
        for (&r, agent) in instance.right() {
            let mut filled = Vec::new();
            for (rank, group) in agent.groups().iter().enumerate() {
                let f = opb.new_var(|v| format!("right {} filled at {} is {}", r, rank, v));
                let mut terms = vec![(-1, f)];
                if let Some(&previous) = filled.last() {
                    terms.push((1, previous));
                }
                terms.extend(group.iter().filter_map(|&l| pair(l, r)).map(|v| (1, v)));
                opb.constraint(&terms, "=", 0);
                filled.push(f);
            }
            right_filled.insert(r, filled);
        }

        for (&l, one) in instance.left() {
            for (rank, group) in one.groups().iter().enumerate() {
                for &r in group {
                    let two = listed_right(instance, r)?;
                    let their_rank = two.rank_of(l)?;
                    let mine = left_filled.get(&l).and_then(|f| f.get(rank));
                    let theirs = right_filled.get(&r).and_then(|f| f.get(their_rank));
                    if let (Some(&mine), Some(&theirs)) = (mine, theirs) {
                        opb.constraint(&[(1, mine), (1, theirs)], ">=", 1);
                    }
                }
            }
        }
    } else {
        for (&l, one) in instance.left() {
            for &r in one.prefs() {
                let two = listed_right(instance, r)?;
                let mut vars: BTreeSet<usize> = BTreeSet::new();
                vars.extend(one.as_good_as(r).into_iter().filter_map(|o| pair(l, o)));
                vars.extend(two.as_good_as(l).into_iter().filter_map(|o| pair(o, r)));
                let terms: Vec<(i64, usize)> = vars.into_iter().map(|v| (1, v)).collect();
                opb.constraint(&terms, ">=", 1);
            }
        }
    }

    // Both sides match the same number of agents
    let difference = instance.num_left() as i64 - instance.num_right() as i64;
    let sign = if difference >= 0 { 1 } else { -1 };
    let balance: Vec<(i64, usize)> = unassigned_left
        .values()
        .map(|&v| (sign, v))
        .chain(unassigned_right.values().map(|&v| (-sign, v)))
        .collect();
    opb.constraint(&balance, "=", difference.abs());

    let mut out = format!(
        "* #variable= {} #constraint= {}\n",
        opb.variables,
        opb.constraints.len()
    );
    for comment in &opb.comments {
        let _ = writeln!(out, "* {}", comment);
    }
    out.push_str("min:");
    for v in unassigned_left.values().chain(unassigned_right.values()) {
        let _ = write!(out, " 1 x{}", v);
    }
    out.push_str(" ;\n");
    for constraint in &opb.constraints {
        out.push_str(constraint);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::tests::crossed;

    fn header(text: &str) -> &str {
        text.lines().next().unwrap()
    }

    #[test]
    fn test_single_counts() {
        let text = encode_pbo(&crossed(), false).unwrap();
        // 4 pairs + 4 unassigned; 4 capacity + 4 stability + balance
        assert_eq!(header(&text), "* #variable= 8 #constraint= 9");
        assert!(text.contains("* 1 with 2 is 2\n"));
        assert!(text.contains("min: 1 x5 1 x6 1 x7 1 x8 ;\n"));
        assert!(text.contains("1 x1 1 x2 1 x5 = 1;\n"));
        assert!(text.ends_with("1 x5 1 x6 -1 x7 -1 x8 = 0;\n"));
    }

    #[test]
    fn test_merged_counts() {
        let text = encode_pbo(&crossed(), true).unwrap();
        // 8 + 8 indicators; 4 capacity + 8 definitions + 4 stability + balance
        assert_eq!(header(&text), "* #variable= 16 #constraint= 17");
        assert!(text.contains("* left 1 filled at 0 is 9\n"));
        // left 1 filled at 1 = filled at 0 + x(1, 2)
        assert!(text.contains("-1 x10 1 x9 1 x2 = 0;\n"));
    }

    #[test]
    fn test_unbalanced_sides() {
        let instance = Instance::from_preferences(
            vec![(1, vec![vec![1]])],
            vec![(1, vec![vec![1]]), (2, vec![])],
        )
        .unwrap();
        let text = encode_pbo(&instance, false).unwrap();
        assert!(text.ends_with("-1 x2 1 x3 1 x4 = 1;\n"));
    }
}
