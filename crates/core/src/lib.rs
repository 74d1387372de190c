//! # quire-core
//!
//! Runs report definitions: the pagination controller, the per-run process
//! state, the single-pass streaming path and the reference content writers
//! used to compare both paths.
//!
//! - **processor**: [`ReportProcessor`] validates a report, opens its data
//!   sources, runs it and always closes them again
//! - **controller**: the multi-pass [`PaginationController`]
//! - **fast**: [`ReportStructureValidator`] and the [`StreamingProducer`]
//! - **state**: [`ProcessStateHandle`], owner of every opened data factory
//! - **sink** / **writers**: where finished pages and bands go
//! - **job**: [`ReportJob`], a report bound to a cache across validations
//!   and runs

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod fast;
pub mod job;
pub mod outcome;
pub mod processor;
pub mod sink;
pub mod state;
pub mod writers;

#[cfg(test)]
mod controller_test;
#[cfg(test)]
mod test_utils;

pub use config::{EngineConfig, EngineConfigBuilder, GenerationMode};
pub use context::RunContext;
pub use controller::{ControllerState, PaginationController};
pub use error::ReportError;
pub use fast::{Ineligibility, ReportStructureValidator, StreamingProducer};
pub use job::ReportJob;
pub use outcome::{RunOutcome, RunStatistics};
pub use processor::ReportProcessor;
pub use sink::{CollectingSink, CountingSink, PageSink, WriterSink};
pub use state::ProcessStateHandle;
pub use writers::{ContentWriter, CsvContentWriter, HtmlContentWriter};
