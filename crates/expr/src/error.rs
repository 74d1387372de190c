use quire_types::ProcessingLevel;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Formula parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Unknown formula function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Division by zero")]
    DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Processing level cannot move from {from} back to {to}")]
    BackwardTransition {
        from: ProcessingLevel,
        to: ProcessingLevel,
    },

    #[error("An expression named '{0}' is already registered")]
    DuplicateName(String),

    #[error(transparent)]
    Formula(#[from] FormulaError),
}
