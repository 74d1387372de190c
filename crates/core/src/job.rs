//! A report bound to a processor and a data cache for its whole lifetime.

use crate::error::ReportError;
use crate::outcome::RunOutcome;
use crate::processor::ReportProcessor;
use crate::sink::PageSink;
use crate::state::ProcessStateHandle;
use crate::writers::ContentWriter;
use log::debug;
use quire_data::{DataCache, DataCacheStatistics, Parameters};
use quire_model::{ReportDefinition, ValidationError};
use std::sync::Arc;

/// Repeated validations and runs of one report share a cache, so a query
/// with the same parameters is executed once no matter how often the
/// parameters are checked before the report is rendered.
#[derive(Debug, Clone)]
pub struct ReportJob {
    report: Arc<ReportDefinition>,
    processor: ReportProcessor,
    cache: Arc<dyn DataCache>,
}

impl ReportJob {
    pub fn new(report: Arc<ReportDefinition>, processor: ReportProcessor) -> Self {
        let cache = processor.create_cache();
        Self {
            report,
            processor,
            cache,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn DataCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn report(&self) -> &ReportDefinition {
        &self.report
    }

    pub fn processor(&self) -> &ReportProcessor {
        &self.processor
    }

    /// Checks the report structure and the parameters, then runs the master
    /// query to prove it executes with them.
    pub fn validate_parameters(&self, parameters: &Parameters) -> Result<(), ReportError> {
        quire_model::validate(&self.report, parameters)?;
        let mut parameters = parameters.clone();
        parameters.merge_defaults(&self.report.parameter_defaults());

        let mut state = ProcessStateHandle::open(&self.report, self.cache.clone())?;
        let result = state.open_rows(&self.report, &parameters, None);
        state.close();
        match result {
            Ok(row) => {
                debug!(
                    "Parameters of '{}' validated against {} rows",
                    self.report.name,
                    row.row_count()
                );
                Ok(())
            }
            Err(ReportError::Data(e)) => Err(ValidationError::Data(e).into()),
            Err(e) => Err(e),
        }
    }

    pub fn render(&self, parameters: &Parameters, sink: &mut dyn PageSink) -> RunOutcome {
        self.processor
            .process(&self.report, parameters, self.cache.clone(), sink)
    }

    pub fn export(&self, parameters: &Parameters, writer: &mut dyn ContentWriter) -> RunOutcome {
        self.processor
            .export(&self.report, parameters, self.cache.clone(), writer)
    }

    pub fn cache_statistics(&self) -> DataCacheStatistics {
        self.cache.statistics()
    }
}
