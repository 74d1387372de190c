//! The report model consumed by the layout engine: bands, elements, groups,
//! expressions and the data factory a report draws its rows from.
//!
//! Definitions are immutable once handed to the engine. They are checked by
//! [`validate`] before a run starts so that illegal nesting never reaches
//! layout.

pub mod band;
pub mod builder;
pub mod error;
pub mod report;
pub mod validate;

pub use band::{
    Aggregation, Band, BandRole, Crosstab, Element, ElementKind, ParameterMapping,
    StyleExpression, SubReport,
};
pub use error::{StructuralViolation, ValidationError};
pub use report::{Group, PageDefinition, ParameterDefinition, ReportDefinition};
pub use validate::{structural_violations, validate};
