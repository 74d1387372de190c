//! Defines the error type returned by report runs.

use itertools::Itertools;
use quire_data::DataFactoryError;
use quire_expr::EvaluationError;
use quire_layout::LayoutError;
use quire_model::{StructuralViolation, ValidationError};
use thiserror::Error;

/// The main error enum for everything a report run can fail on.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report validation failed: {}", .0.iter().join("; "))]
    Validation(Vec<ValidationError>),

    #[error("Data factory error: {0}")]
    Data(#[from] DataFactoryError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Expression error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Report cannot use the streaming path: {0}")]
    NotStreamable(String),

    #[error("No page is open")]
    NoOpenPage,

    #[error("The report run was cancelled")]
    Cancelled,

    #[error("The process state was already closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<Vec<ValidationError>> for ReportError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ReportError::Validation(errors)
    }
}

impl From<ValidationError> for ReportError {
    fn from(error: ValidationError) -> Self {
        ReportError::Validation(vec![error])
    }
}

impl From<StructuralViolation> for ReportError {
    fn from(violation: StructuralViolation) -> Self {
        ReportError::Validation(vec![violation.into()])
    }
}

impl ReportError {
    /// Failures caused by the data source rather than by the report.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ReportError::Data(_) | ReportError::Layout(LayoutError::Query(_))
        )
    }
}
