//! # quire
//!
//! A paginated report layout engine. Reports are described as bands
//! (report and page headers and footers, group headers and footers, the
//! item band) over the rows of a master query. The engine evaluates
//! expressions and functions row by row, lays bands out into boxes and
//! flows them onto pages.
//!
//! The workspace is split by concern:
//! - **types**: points, geometry, values and identifiers
//! - **style**: style keys, sheets and resolution
//! - **traits**: text metrics, progress and cancellation
//! - **data**: table models, data factories, caches and the data row
//! - **expr**: formulas, report functions and the evaluator
//! - **model**: the report definition and its validation
//! - **layout**: the render tree, box building and page breaking
//! - **engine**: the pagination controller, streaming path and writers
//!
//! This crate adds a tabular report helper, a batch runner and the `quire`
//! command-line tool.

pub use quire_core as engine;
pub use quire_data as data;
pub use quire_expr as expr;
pub use quire_layout as layout;
pub use quire_model as model;
pub use quire_style as style;
pub use quire_traits as traits;
pub use quire_types as types;

pub mod batch;
pub mod error;
pub mod tabular;

pub use error::QuireError;
pub use quire_core::{
    CollectingSink, ContentWriter, CsvContentWriter, EngineConfig, GenerationMode,
    HtmlContentWriter, PageSink, ReportError, ReportJob, ReportProcessor,
    ReportStructureValidator, RunOutcome, RunStatistics,
};
pub use quire_model::{ReportDefinition, builder::ReportBuilder};
pub use tabular::TabularReport;
