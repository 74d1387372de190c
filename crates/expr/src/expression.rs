use crate::error::FormulaError;
use crate::event::ReportEvent;
use crate::formula::{self, Formula};
use log::warn;
use quire_data::DataRow;
use quire_types::Value;
use std::fmt;

/// What a function needs from the pipeline beyond a single forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Needs results computed in the structural preprocessing pass.
    pub prepare_run: bool,
    /// Needs page boundaries, or values only known after pagination.
    pub pagination: bool,
    /// Alternates state every N rows in a way the fast path does not replicate.
    pub row_banding: bool,
}

impl Requirements {
    pub fn is_single_pass(&self) -> bool {
        !self.prepare_run && !self.pagination && !self.row_banding
    }

    pub fn merge(self, other: Requirements) -> Requirements {
        Requirements {
            prepare_run: self.prepare_run || other.prepare_run,
            pagination: self.pagination || other.pagination,
            row_banding: self.row_banding || other.row_banding,
        }
    }
}

/// A stateless, named computation over the current row.
pub trait Expression: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Higher levels are evaluated first.
    fn dependency_level(&self) -> i32 {
        0
    }

    fn evaluate(&self, row: &DataRow) -> Value;

    fn box_clone(&self) -> Box<dyn Expression>;
}

/// A stateful computation driven by report lifecycle events.
pub trait Function: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn dependency_level(&self) -> i32 {
        0
    }

    fn handle_event(&mut self, event: &ReportEvent, row: &DataRow);

    fn value(&self) -> Value;

    fn requirements(&self) -> Requirements {
        Requirements::default()
    }

    fn box_clone(&self) -> Box<dyn Function>;
}

impl Clone for Box<dyn Function> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl Clone for Box<dyn Expression> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// An expression defined by a formula such as `[qty] * [price]`.
#[derive(Debug, Clone)]
pub struct FormulaExpression {
    name: String,
    level: i32,
    source: String,
    formula: Formula,
}

impl FormulaExpression {
    pub fn new(name: &str, source: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            name: name.to_string(),
            level: 0,
            source: source.to_string(),
            formula: formula::parse_formula(source)?,
        })
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}

impl Expression for FormulaExpression {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependency_level(&self) -> i32 {
        self.level
    }

    fn evaluate(&self, row: &DataRow) -> Value {
        formula::evaluate(&self.formula, row).unwrap_or_else(|e| {
            warn!("Expression '{}' failed: {e}", self.name);
            Value::Null
        })
    }

    fn box_clone(&self) -> Box<dyn Expression> {
        Box::new(self.clone())
    }
}
