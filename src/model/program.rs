//! Solver-independent integer linear programs

use std::collections::BTreeMap;

/// Index of a column in a [`LinearProgram`]
pub type ColumnId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
}

/// `lower <= sum(coefficient * column) <= upper`; either bound may be infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub terms: Vec<(ColumnId, f64)>,
    pub lower: f64,
    pub upper: f64,
}

impl Row {
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximise,
    Minimise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    columns: Vec<Column>,
    rows: Vec<Row>,
    objective: Vec<(ColumnId, f64)>,
    sense: Sense,
}

impl LinearProgram {
    pub fn new(sense: Sense) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            objective: Vec::new(),
            sense,
        }
    }

    /// Add a 0/1 integer column
    pub fn add_binary(&mut self, name: impl Into<String>) -> ColumnId {
        self.columns.push(Column {
            name: name.into(),
            lower: 0.0,
            upper: 1.0,
            integer: true,
        });
        self.columns.len() - 1
    }

    /// Add a row. Repeated columns have their coefficients summed and zero
    /// coefficients are dropped.
    pub fn add_row(&mut self, terms: impl IntoIterator<Item = (ColumnId, f64)>, lower: f64, upper: f64) {
        let mut merged: BTreeMap<ColumnId, f64> = BTreeMap::new();
        for (column, coefficient) in terms {
            *merged.entry(column).or_insert(0.0) += coefficient;
        }
        self.rows.push(Row {
            terms: merged.into_iter().filter(|&(_, c)| c != 0.0).collect(),
            lower,
            upper,
        });
    }

    pub fn add_equality(&mut self, terms: impl IntoIterator<Item = (ColumnId, f64)>, rhs: f64) {
        self.add_row(terms, rhs, rhs);
    }

    pub fn add_at_least(&mut self, terms: impl IntoIterator<Item = (ColumnId, f64)>, rhs: f64) {
        self.add_row(terms, rhs, f64::INFINITY);
    }

    pub fn add_at_most(&mut self, terms: impl IntoIterator<Item = (ColumnId, f64)>, rhs: f64) {
        self.add_row(terms, f64::NEG_INFINITY, rhs);
    }

    pub fn set_objective(&mut self, terms: impl IntoIterator<Item = (ColumnId, f64)>) {
        self.objective = terms.into_iter().collect();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn objective(&self) -> &[(ColumnId, f64)] {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}
