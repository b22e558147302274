//! Text formats: instance snapshots and score matrices

mod grp;
mod text;

pub use grp::parse_score_matrix;
pub use text::{format_agent, format_instance, parse_instance};

use crate::instance::{Instance, ScoreMatrix};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a snapshot or score matrix stopped making sense.
///
/// `line` is 1-based; 0 means the problem concerns the whole input (a missing
/// count, an unreadable file, an inconsistent instance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub path: Option<PathBuf>,
    pub line: usize,
    pub column: Option<usize>,
    pub message: String,
    pub source_line: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>, source_line: impl Into<String>) -> Self {
        Self {
            path: None,
            line,
            column: None,
            message: message.into(),
            source_line: source_line.into(),
        }
    }

    /// Whole-input error with no offending line
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(0, message, "")
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

impl fmt::Display for ParseError {
    /// `file:line:column: message`, then the offending line with a caret
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}", path.display())?,
            None => f.write_str("<input>")?,
        }
        if self.line > 0 {
            write!(f, ":{}", self.line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ": {}", self.message)?;
        if self.line > 0 && !self.source_line.is_empty() {
            write!(f, "\n{:>5} | {}", self.line, self.source_line)?;
            if let Some(column) = self.column {
                write!(f, "\n      | {}^", " ".repeat(column.saturating_sub(1)))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// How agents are written: `<id><separator> <p> <open><p> <p><close>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub id_separator: String,
    pub open: String,
    pub close: String,
}

impl TextStyle {
    /// `1: 2 [3 4] 5`
    pub fn standard() -> Self {
        Self {
            id_separator: ":".to_string(),
            open: "[".to_string(),
            close: "]".to_string(),
        }
    }

    /// `1 2 (3 4) 5`
    pub fn plain() -> Self {
        Self {
            id_separator: String::new(),
            open: "(".to_string(),
            close: ")".to_string(),
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::standard()
    }
}

fn read_file(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path)
        .map_err(|e| ParseError::input(format!("failed to read file: {}", e)).with_path(path))
}

/// Read an instance snapshot from disk
pub fn read_instance(path: &Path) -> Result<Instance, ParseError> {
    parse_instance(&read_file(path)?).map_err(|e| e.with_path(path))
}

/// Read a score matrix from disk
pub fn read_score_matrix(path: &Path) -> Result<ScoreMatrix, ParseError> {
    parse_score_matrix(&read_file(path)?).map_err(|e| e.with_path(path))
}
