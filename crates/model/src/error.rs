use crate::band::BandRole;
use quire_data::DataFactoryError;
use quire_expr::{EvaluationError, FormulaError};
use quire_types::InstanceId;
use thiserror::Error;

/// Illegal nesting in a report definition, detected before layout starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralViolation {
    #[error("{child} band {element} cannot be nested inside a {parent} band")]
    NestedRootBand {
        parent: BandRole,
        child: BandRole,
        element: InstanceId,
    },

    #[error("Sub-report {element} cannot be placed in a {band} band")]
    SubReportInPageBand { band: BandRole, element: InstanceId },

    #[error("The {section} section must be a {expected} band")]
    WrongSectionRole {
        section: &'static str,
        expected: BandRole,
    },

    #[error("Group '{0}' has no key fields")]
    GroupWithoutFields(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    Structural(#[from] StructuralViolation),

    #[error("Mandatory parameter '{0}' has no value")]
    MissingParameter(String),

    #[error("Query '{0}' is not provided by the data factory")]
    UnknownQuery(String),

    #[error("Report queries '{0}' but has no data factory")]
    NoDataFactory(String),

    #[error("Query could not be executed: {0}")]
    Data(#[from] DataFactoryError),

    #[error(transparent)]
    Expression(#[from] EvaluationError),

    #[error("Invalid formula: {0}")]
    Formula(#[from] FormulaError),
}
