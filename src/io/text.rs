//! Instance snapshot format.
//!
//! ```text
//! <num left>
//! <num right>
//! <id>: <p> [<p> <p>] <p>      one line per left agent
//! <id>: <p> <p>                one line per right agent
//! ```
//!
//! Tie groups use `[..]` or `(..)`, the `:` after the id is optional, blank
//! lines and `#` comments are skipped.

use super::{ParseError, TextStyle};
use crate::AgentId;
use crate::instance::Instance;
use crate::preferences::Agent;
use std::fmt;

type AgentSpec = (AgentId, Vec<Vec<AgentId>>);

/// Parse one agent line. Errors carry the 1-based column.
fn parse_agent_line(line: &str) -> Result<AgentSpec, (String, usize)> {
    let mut id: Option<AgentId> = None;
    let mut groups: Vec<Vec<AgentId>> = Vec::new();
    let mut open: Option<(usize, Vec<AgentId>)> = None;
    let mut separator_seen = false;

    let mut chars = line.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        let column = pos + 1;
        match c {
            c if c.is_whitespace() => {}
            '0'..='9' => {
                let mut end = pos + 1;
                while let Some(&(next, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = next + 1;
                    chars.next();
                }
                let value: AgentId = line[pos..end]
                    .parse()
                    .map_err(|_| (format!("id out of range: '{}'", &line[pos..end]), column))?;
                match (id, open.as_mut()) {
                    (None, _) => id = Some(value),
                    (Some(_), Some((_, group))) => group.push(value),
                    (Some(_), None) => groups.push(vec![value]),
                }
            }
            ':' if id.is_some() && groups.is_empty() && open.is_none() && !separator_seen => {
                separator_seen = true;
            }
            '[' | '(' => {
                if id.is_none() {
                    return Err(("expected an agent id before the first tie group".to_string(), column));
                }
                if open.is_some() {
                    return Err(("tie groups cannot be nested".to_string(), column));
                }
                open = Some((column, Vec::new()));
            }
            ']' | ')' => match open.take() {
                Some((_, group)) => {
                    if !group.is_empty() {
                        groups.push(group);
                    }
                }
                None => return Err((format!("unmatched '{}'", c), column)),
            },
            other => return Err((format!("unexpected character '{}'", other), column)),
        }
    }

    if let Some((column, _)) = open {
        return Err(("unclosed tie group".to_string(), column));
    }
    match id {
        Some(id) => Ok((id, groups)),
        None => Err(("missing agent id".to_string(), 1)),
    }
}

fn is_skipped(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse an instance snapshot
pub fn parse_instance(content: &str) -> Result<Instance, ParseError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !is_skipped(line));

    let mut counts = [0usize; 2];
    for (slot, what) in counts.iter_mut().zip(["left", "right"]) {
        let Some((line_number, line)) = lines.next() else {
            return Err(ParseError::input(format!("missing number of {} agents", what)));
        };
        *slot = line.trim().parse().map_err(|_| {
            ParseError::new(
                line_number,
                format!("expected the number of {} agents", what),
                line,
            )
        })?;
    }

    let mut sides: [Vec<AgentSpec>; 2] = [Vec::new(), Vec::new()];
    for (side, &count) in sides.iter_mut().zip(counts.iter()) {
        for _ in 0..count {
            let Some((line_number, line)) = lines.next() else {
                return Err(ParseError::input(format!(
                    "expected {} left and {} right agents",
                    counts[0], counts[1]
                )));
            };
            let spec = parse_agent_line(line).map_err(|(message, column)| {
                ParseError::new(line_number, message, line).with_column(column)
            })?;
            side.push(spec);
        }
    }

    if let Some((line_number, line)) = lines.next() {
        return Err(ParseError::new(
            line_number,
            "unexpected line after the last agent",
            line,
        ));
    }

    let [left, right] = sides;
    Instance::from_preferences(left, right).map_err(|e| ParseError::input(e.to_string()))
}

/// Write one agent's list in the given style
pub fn format_agent(agent: &Agent, style: &TextStyle) -> String {
    let mut out = format!("{}{}", agent.id(), style.id_separator);
    for group in agent.groups() {
        out.push(' ');
        if let [single] = group.as_slice() {
            out.push_str(&single.to_string());
            continue;
        }
        out.push_str(&style.open);
        let members: Vec<String> = group.iter().map(|p| p.to_string()).collect();
        out.push_str(&members.join(" "));
        out.push_str(&style.close);
    }
    out
}

/// Write a whole instance: the two counts, then left and right lines
pub fn format_instance(instance: &Instance, style: &TextStyle) -> String {
    let mut out = format!("{}\n{}\n", instance.num_left(), instance.num_right());
    for agent in instance.left().values().chain(instance.right().values()) {
        out.push_str(&format_agent(agent, style));
        out.push('\n');
    }
    out
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_agent(self, &TextStyle::standard()))
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_instance(self, &TextStyle::standard()))
    }
}
