//! Priority-ordered evaluation of a report's expressions and functions.

use crate::error::EvaluationError;
use crate::event::ReportEvent;
use crate::expression::{Expression, Function, Requirements};
use log::{debug, trace};
use quire_data::{DataRow, ExpressionValues};
use quire_types::ProcessingLevel;

/// One registered computation.
#[derive(Debug, Clone)]
pub enum ExpressionSlot {
    Expression(Box<dyn Expression>),
    Function(Box<dyn Function>),
}

impl ExpressionSlot {
    pub fn name(&self) -> &str {
        match self {
            ExpressionSlot::Expression(e) => e.name(),
            ExpressionSlot::Function(f) => f.name(),
        }
    }

    pub fn dependency_level(&self) -> i32 {
        match self {
            ExpressionSlot::Expression(e) => e.dependency_level(),
            ExpressionSlot::Function(f) => f.dependency_level(),
        }
    }

    pub fn requirements(&self) -> Requirements {
        match self {
            ExpressionSlot::Expression(_) => Requirements::default(),
            ExpressionSlot::Function(f) => f.requirements(),
        }
    }
}

/// Saved function state and expression results.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    functions: Vec<Option<Box<dyn Function>>>,
    values: ExpressionValues,
}

/// Evaluates registered expressions in dependency order.
///
/// Slots are kept sorted by dependency level, highest first, and by
/// registration order within a level. Every evaluation walks the whole list
/// and writes each result into the data row before moving on, so a slot at
/// level N reads the fresh values of every slot above N.
#[derive(Debug, Clone)]
pub struct ExpressionEvaluator {
    slots: Vec<(i32, usize, ExpressionSlot)>,
    next_registration: usize,
    level: ProcessingLevel,
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_registration: 0,
            level: ProcessingLevel::StructuralPreprocessing,
        }
    }

    pub fn register(&mut self, slot: ExpressionSlot) -> Result<(), EvaluationError> {
        if self.slots.iter().any(|(_, _, s)| s.name() == slot.name()) {
            return Err(EvaluationError::DuplicateName(slot.name().to_string()));
        }
        let key = (-slot.dependency_level(), self.next_registration);
        let position = self
            .slots
            .partition_point(|(level, order, _)| (*level, *order) < key);
        self.slots.insert(position, (key.0, key.1, slot));
        self.next_registration += 1;
        Ok(())
    }

    pub fn register_expression(
        &mut self,
        expression: Box<dyn Expression>,
    ) -> Result<(), EvaluationError> {
        self.register(ExpressionSlot::Expression(expression))
    }

    pub fn register_function(&mut self, function: Box<dyn Function>) -> Result<(), EvaluationError> {
        self.register(ExpressionSlot::Function(function))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot names in evaluation order.
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.slots.iter().map(|(_, _, s)| s.name()).collect()
    }

    pub fn requirements(&self) -> Requirements {
        self.slots
            .iter()
            .fold(Requirements::default(), |acc, (_, _, s)| acc.merge(s.requirements()))
    }

    pub fn processing_level(&self) -> ProcessingLevel {
        self.level
    }

    /// Moves to `level`. Staying on the same level is allowed; going back is not.
    pub fn set_processing_level(&mut self, level: ProcessingLevel) -> Result<(), EvaluationError> {
        if level < self.level {
            return Err(EvaluationError::BackwardTransition {
                from: self.level,
                to: level,
            });
        }
        if level != self.level {
            debug!("Expression evaluator entering {level}");
        }
        self.level = level;
        Ok(())
    }

    /// Recomputes every slot for the current row.
    pub fn evaluate(&self, row: &mut DataRow) {
        for (_, _, slot) in &self.slots {
            let value = match slot {
                ExpressionSlot::Expression(e) => e.evaluate(row),
                ExpressionSlot::Function(f) => f.value(),
            };
            row.set_expression(slot.name(), value);
        }
    }

    /// Delivers `event` to every function in evaluation order, refreshing
    /// each slot's value in the row as it goes.
    pub fn fire(&mut self, event: &ReportEvent, row: &mut DataRow) {
        trace!("Event {} at {} (page {})", event.kind, event.level, event.page);
        for (_, _, slot) in &mut self.slots {
            let value = match slot {
                ExpressionSlot::Expression(e) => e.evaluate(row),
                ExpressionSlot::Function(f) => {
                    f.handle_event(event, row);
                    f.value()
                }
            };
            row.set_expression(slot.name(), value);
        }
    }

    pub fn checkpoint(&self, row: &DataRow) -> Checkpoint {
        Checkpoint {
            functions: self
                .slots
                .iter()
                .map(|(_, _, s)| match s {
                    ExpressionSlot::Function(f) => Some(f.clone()),
                    ExpressionSlot::Expression(_) => None,
                })
                .collect(),
            values: row.expression_values().clone(),
        }
    }

    /// Restores the state saved by [`ExpressionEvaluator::checkpoint`].
    pub fn rollback(&mut self, checkpoint: &Checkpoint, row: &mut DataRow) {
        for ((_, _, slot), saved) in self.slots.iter_mut().zip(&checkpoint.functions) {
            if let (ExpressionSlot::Function(f), Some(saved)) = (slot, saved) {
                *f = saved.clone();
            }
        }
        row.restore_expression_values(checkpoint.values.clone());
    }
}
