//! Score-matrix format: `<rows>`, `<cols>`, then one line of scores per row.
//! A row line may be blank or shorter than `cols`.

use super::ParseError;
use crate::instance::ScoreMatrix;

fn parse_count(line_number: usize, line: Option<&str>, what: &str) -> Result<usize, ParseError> {
    let Some(line) = line else {
        return Err(ParseError::input(format!("missing number of {}", what)));
    };
    line.trim().parse().map_err(|_| {
        ParseError::new(line_number, format!("expected the number of {}", what), line)
    })
}

/// Parse a score matrix
pub fn parse_score_matrix(content: &str) -> Result<ScoreMatrix, ParseError> {
    let lines: Vec<&str> = content.lines().collect();
    let rows = parse_count(1, lines.first().copied(), "rows")?;
    let cols = parse_count(2, lines.get(1).copied(), "columns")?;

    let mut scores = Vec::with_capacity(rows);
    for row in 0..rows {
        let line_number = row + 3;
        let line = lines.get(row + 2).copied().unwrap_or("");
        let mut entries = Vec::new();
        for token in line.split_whitespace() {
            let column = token.as_ptr() as usize - line.as_ptr() as usize + 1;
            let score: f64 = token.parse().map_err(|_| {
                ParseError::new(line_number, format!("invalid score '{}'", token), line)
                    .with_column(column)
            })?;
            entries.push(score);
        }
        if entries.len() > cols {
            return Err(ParseError::new(
                line_number,
                format!("expected at most {} scores, found {}", cols, entries.len()),
                line,
            ));
        }
        scores.push(entries);
    }

    if let Some((index, line)) = lines
        .iter()
        .enumerate()
        .skip(rows + 2)
        .find(|(_, line)| !line.trim().is_empty())
    {
        return Err(ParseError::new(index + 1, "unexpected line after the last row", *line));
    }

    ScoreMatrix::new(rows, cols, scores).map_err(|e| ParseError::input(e.to_string()))
}
