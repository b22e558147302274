//! Positional CNF and weighted partial MaxSAT encodings.
//!
//! Each agent with `n` partners gets variables for positions `1..=n + 1`.
//! Position `i` is true when the agent is matched at its `i`-th partner or
//! worse, and position `n + 1` means unmatched.

use super::{EncodeError, listed_right};
use crate::AgentId;
use crate::instance::{Instance, Side};
use std::collections::BTreeMap;
use std::fmt::Write as _;

struct PositionalVars {
    left: BTreeMap<AgentId, i64>,
    right: BTreeMap<AgentId, i64>,
    count: i64,
}

impl PositionalVars {
    fn new(instance: &Instance) -> Self {
        let mut next = 1;
        let mut bases = [BTreeMap::new(), BTreeMap::new()];
        for (side, side_bases) in [Side::Left, Side::Right].into_iter().zip(bases.iter_mut()) {
            for (&id, agent) in instance.side(side) {
                side_bases.insert(id, next);
                next += agent.len() as i64 + 1;
            }
        }
        let [left, right] = bases;
        Self {
            left,
            right,
            count: next - 1,
        }
    }

    fn var(&self, side: Side, id: AgentId, position: usize) -> Result<i64, EncodeError> {
        let bases = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        let base = bases
            .get(&id)
            .copied()
            .ok_or(EncodeError::MissingAgent { side, id })?;
        Ok(base + position as i64 - 1)
    }
}

struct Clause {
    soft: bool,
    literals: Vec<i64>,
}

impl Clause {
    fn hard(literals: Vec<i64>) -> Self {
        Self {
            soft: false,
            literals,
        }
    }

    fn soft(literals: Vec<i64>) -> Self {
        Self {
            soft: true,
            literals,
        }
    }
}

fn clauses(instance: &Instance, vars: &PositionalVars) -> Result<Vec<Clause>, EncodeError> {
    let mut clauses = Vec::new();

    // Everyone is at least "at position 1"; nobody should end up unmatched.
    for side in [Side::Left, Side::Right] {
        for (&id, agent) in instance.side(side) {
            clauses.push(Clause::hard(vec![vars.var(side, id, 1)?]));
            clauses.push(Clause::soft(vec![-vars.var(side, id, agent.len() + 1)?]));
        }
    }

    // Monotone: worse-or-equal at i+1 implies worse-or-equal at i
    for side in [Side::Left, Side::Right] {
        for (&id, agent) in instance.side(side) {
            for position in 1..=agent.len() {
                let v = vars.var(side, id, position)?;
                clauses.push(Clause::hard(vec![v, -(v + 1)]));
            }
        }
    }

    for (&l, one) in instance.left() {
        for &r in one.prefs() {
            let two = listed_right(instance, r)?;
            let (Some(p), Some(q)) = (one.position_of(r), two.position_of(l)) else {
                continue;
            };
            let x = vars.var(Side::Left, l, p)?;
            let y = vars.var(Side::Right, r, q)?;

            // Exactly at p on one side means exactly at q on the other
            clauses.push(Clause::hard(vec![-x, x + 1, y]));
            clauses.push(Clause::hard(vec![-x, x + 1, -(y + 1)]));
            clauses.push(Clause::hard(vec![-y, y + 1, x]));
            clauses.push(Clause::hard(vec![-y, y + 1, -(x + 1)]));

            let (Some(p_worse), Some(q_worse)) =
                (one.position_of_next_worse(r), two.position_of_next_worse(l))
            else {
                continue;
            };
            clauses.push(Clause::hard(vec![
                -vars.var(Side::Left, l, p_worse)?,
                -vars.var(Side::Right, r, q_worse)?,
            ]));
        }
    }
    Ok(clauses)
}

fn write_literals(out: &mut String, literals: &[i64]) {
    for literal in literals {
        let _ = write!(out, "{} ", literal);
    }
    out.push_str("0\n");
}

/// DIMACS CNF satisfiable iff a stable matching covers every agent
pub fn encode_sat(instance: &Instance) -> Result<String, EncodeError> {
    let vars = PositionalVars::new(instance);
    let clauses = clauses(instance, &vars)?;

    let mut out = format!("p cnf {} {}\n", vars.count, clauses.len());
    for clause in &clauses {
        write_literals(&mut out, &clause.literals);
    }
    Ok(out)
}

/// Weighted partial MaxSAT: "matched" clauses are soft with weight 1, all
/// others hard.
pub fn encode_wpmaxsat(instance: &Instance) -> Result<String, EncodeError> {
    let vars = PositionalVars::new(instance);
    let clauses = clauses(instance, &vars)?;
    let top = clauses.iter().filter(|c| c.soft).count() + 1;

    let mut out = format!("p wcnf {} {} {}\n", vars.count, clauses.len(), top);
    for clause in &clauses {
        let weight = if clause.soft { 1 } else { top };
        let _ = write!(out, "{} ", weight);
        write_literals(&mut out, &clause.literals);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::tests::crossed;

    #[test]
    fn test_sat_counts() {
        let text = encode_sat(&crossed()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // 4 agents * 3 positions; 4 * (2 + 2) agent clauses + 4 pairs * 5
        assert_eq!(lines[0], "p cnf 12 36");
        assert_eq!(lines.len(), 37);
        assert_eq!(lines[1], "1 0");
        assert_eq!(lines[2], "-3 0");
        assert!(lines.contains(&"1 -2 0"));
    }

    #[test]
    fn test_sat_stability_clause() {
        let text = encode_sat(&crossed()).unwrap();
        // left 1 worse than right 1 and right 1 worse than left 1
        assert!(text.lines().any(|l| l == "-2 -8 0"));
    }

    #[test]
    fn test_wpmaxsat_weights() {
        let text = encode_wpmaxsat(&crossed()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "p wcnf 12 36 5");
        assert_eq!(lines[1], "5 1 0");
        assert_eq!(lines[2], "1 -3 0");
        assert_eq!(lines.iter().filter(|l| l.starts_with("1 ")).count(), 4);
    }

    #[test]
    fn test_empty_instance() {
        let empty = Instance::default();
        assert_eq!(encode_sat(&empty).unwrap(), "p cnf 0 0\n");
    }
}
