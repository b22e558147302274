//! MiniZinc model with one 0..1 variable per compatible pair

use super::{EncodeError, listed_right};
use crate::AgentId;
use crate::instance::Instance;
use std::fmt::Write as _;

fn var(left: AgentId, right: AgentId) -> String {
    format!("x{}_{}", left, right)
}

fn sum(vars: &[String]) -> String {
    if vars.is_empty() {
        "0".to_string()
    } else {
        vars.join(" + ")
    }
}

/// Encode as MiniZinc. Without `optimise` every left agent with a non-empty
/// list must be matched; with it the model maximises the matching size.
pub fn encode_minizinc(instance: &Instance, optimise: bool) -> Result<String, EncodeError> {
    let mut pairs: Vec<(AgentId, AgentId)> = Vec::new();
    for (&l, agent) in instance.left() {
        let mut partners = agent.prefs().to_vec();
        partners.sort_unstable();
        pairs.extend(partners.into_iter().map(|r| (l, r)));
    }

    let mut out = String::new();
    for &(l, r) in &pairs {
        let _ = writeln!(out, "var 0..1: {};", var(l, r));
    }

    let left_relation = if optimise { "<=" } else { "=" };
    for (&l, agent) in instance.left() {
        if agent.is_empty() {
            continue;
        }
        let vars: Vec<String> = agent.prefs().iter().map(|&r| var(l, r)).collect();
        let _ = writeln!(out, "constraint {} {} 1;", sum(&vars), left_relation);
    }
    for (&r, agent) in instance.right() {
        if agent.is_empty() {
            continue;
        }
        let vars: Vec<String> = agent.prefs().iter().map(|&l| var(l, r)).collect();
        let _ = writeln!(out, "constraint {} <= 1;", sum(&vars));
    }

    for &(l, r) in &pairs {
        let Some(one) = instance.agent_left(l) else {
            continue;
        };
        let two = listed_right(instance, r)?;
        let mine: Vec<String> = one.as_good_as(r).into_iter().map(|o| var(l, o)).collect();
        let theirs: Vec<String> = two.as_good_as(l).into_iter().map(|o| var(o, r)).collect();
        let _ = writeln!(
            out,
            "constraint 1 - ({}) <= ({});",
            sum(&mine),
            sum(&theirs)
        );
    }

    let all: Vec<String> = pairs.iter().map(|&(l, r)| var(l, r)).collect();
    if optimise {
        let _ = writeln!(out, "solve maximize {};", sum(&all));
    } else {
        out.push_str("solve satisfy;\n");
    }
    let shown: Vec<String> = pairs
        .iter()
        .map(|&(l, r)| {
            format!(
                "if fix({}) = 1 then \"({}, {}) \" else \"\" endif",
                var(l, r),
                l,
                r
            )
        })
        .collect();
    let _ = writeln!(out, "output [{}];", shown.join(", "));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::tests::crossed;

    #[test]
    fn test_satisfy_model() {
        let text = encode_minizinc(&crossed(), false).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..4], &[
            "var 0..1: x1_1;",
            "var 0..1: x1_2;",
            "var 0..1: x2_1;",
            "var 0..1: x2_2;",
        ]);
        assert!(lines.contains(&"constraint x1_1 + x1_2 = 1;"));
        assert!(lines.contains(&"constraint x1_1 + x2_1 <= 1;"));
        assert!(lines.contains(&"constraint 1 - (x1_1 + x1_2) <= (x2_2 + x1_2);"));
        assert!(lines.contains(&"solve satisfy;"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("constraint")).count(), 8);
    }

    #[test]
    fn test_optimise_model() {
        let text = encode_minizinc(&crossed(), true).unwrap();
        assert!(text.contains("constraint x1_1 + x1_2 <= 1;\n"));
        assert!(text.contains("solve maximize x1_1 + x1_2 + x2_1 + x2_2;\n"));
    }

    #[test]
    fn test_empty_lists_are_skipped() {
        let instance = Instance::from_preferences(vec![(1, vec![])], vec![(1, vec![])]).unwrap();
        let text = encode_minizinc(&instance, true).unwrap();
        assert_eq!(text, "solve maximize 0;\noutput [];\n");
    }
}
