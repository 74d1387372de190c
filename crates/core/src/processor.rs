//! Entry point for running a report: validation, resource handling and the
//! choice between the full pipeline and the single-pass path.

use crate::config::{EngineConfig, GenerationMode};
use crate::context::RunContext;
use crate::controller::PaginationController;
use crate::error::ReportError;
use crate::fast::{ReportStructureValidator, StreamingProducer};
use crate::outcome::{RunOutcome, RunStatistics};
use crate::sink::{PageSink, WriterSink};
use crate::state::ProcessStateHandle;
use crate::writers::ContentWriter;
use itertools::Itertools;
use log::{error, info};
use quire_data::{DataCache, Parameters, create_cache};
use quire_model::ReportDefinition;
use quire_traits::{
    CancellationToken, MonospaceMetrics, NoopProgressListener, ProgressListener, SharedMetrics,
};
use std::sync::Arc;

/// Runs reports under one [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct ReportProcessor {
    config: EngineConfig,
    metrics: SharedMetrics,
    progress: Arc<dyn ProgressListener>,
    cancel: CancellationToken,
}

impl Default for ReportProcessor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ReportProcessor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MonospaceMetrics::default()),
            progress: Arc::new(NoopProgressListener),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressListener>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A data cache of the configured backend.
    pub fn create_cache(&self) -> Arc<dyn DataCache> {
        create_cache(self.config.cache_backend, self.config.cache_capacity)
    }

    /// Paginates `report` and hands every finished page to `sink`.
    pub fn process(
        &self,
        report: &ReportDefinition,
        parameters: &Parameters,
        cache: Arc<dyn DataCache>,
        sink: &mut dyn PageSink,
    ) -> RunOutcome {
        self.run(report, parameters, cache, |state| {
            let ctx = RunContext::new(report, &self.config, self.metrics.clone(), parameters, false);
            PaginationController::new(ctx, state, sink)?
                .with_progress(self.progress.clone())
                .with_cancellation(self.cancel.clone())
                .run()
        })
    }

    /// Writes `report` as one continuous flow, taking the single-pass path
    /// when the configuration and the report allow it.
    pub fn export(
        &self,
        report: &ReportDefinition,
        parameters: &Parameters,
        cache: Arc<dyn DataCache>,
        writer: &mut dyn ContentWriter,
    ) -> RunOutcome {
        match self.config.generation_mode {
            GenerationMode::ForceFull => {
                info!("[EXPORT] Forcing full pipeline for '{}'.", report.name);
                self.export_full(report, parameters, cache, writer)
            }
            GenerationMode::ForceStreaming => {
                info!("[EXPORT] Forcing single-pass layout for '{}'.", report.name);
                self.export_fast(report, parameters, cache, writer)
            }
            GenerationMode::Auto => {
                if ReportStructureValidator::new().is_eligible(report) {
                    info!("[EXPORT] Report '{}' is streamable. Selecting single-pass layout.", report.name);
                    self.export_fast(report, parameters, cache, writer)
                } else {
                    info!(
                        "[EXPORT] Report '{}' needs look-back across pages. Selecting full pipeline.",
                        report.name
                    );
                    self.export_full(report, parameters, cache, writer)
                }
            }
        }
    }

    /// Exports through the pagination controller in flow mode.
    pub fn export_full(
        &self,
        report: &ReportDefinition,
        parameters: &Parameters,
        cache: Arc<dyn DataCache>,
        writer: &mut dyn ContentWriter,
    ) -> RunOutcome {
        self.run(report, parameters, cache, |state| {
            let ctx = RunContext::new(report, &self.config, self.metrics.clone(), parameters, true);
            let mut sink = WriterSink::new(writer);
            PaginationController::new(ctx, state, &mut sink)?
                .with_progress(self.progress.clone())
                .with_cancellation(self.cancel.clone())
                .run()
        })
    }

    /// Exports through the streaming producer. Fails with
    /// [`ReportError::NotStreamable`] for reports the structure validator
    /// rejects.
    pub fn export_fast(
        &self,
        report: &ReportDefinition,
        parameters: &Parameters,
        cache: Arc<dyn DataCache>,
        writer: &mut dyn ContentWriter,
    ) -> RunOutcome {
        let reasons = ReportStructureValidator::new().check(report);
        if !reasons.is_empty() {
            let error = ReportError::NotStreamable(reasons.iter().join("; "));
            error!("Report '{}' failed: {error}", report.name);
            return RunOutcome::failure(error, None);
        }
        self.run(report, parameters, cache, |state| {
            let ctx = RunContext::new(report, &self.config, self.metrics.clone(), parameters, true);
            StreamingProducer::new(ctx, state, writer)?
                .with_cancellation(self.cancel.clone())
                .run()
        })
    }

    /// Validates, opens the run's resources, runs `body` and closes the
    /// resources again whatever happened.
    fn run(
        &self,
        report: &ReportDefinition,
        parameters: &Parameters,
        cache: Arc<dyn DataCache>,
        body: impl FnOnce(&mut ProcessStateHandle) -> Result<RunStatistics, ReportError>,
    ) -> RunOutcome {
        if let Err(errors) = quire_model::validate(report, parameters) {
            let error = ReportError::from(errors);
            error!("Report '{}' failed validation: {error}", report.name);
            return RunOutcome::failure(error, None);
        }

        let mut state = match ProcessStateHandle::open(report, cache) {
            Ok(state) => state,
            Err(e) => {
                error!("Report '{}' could not open its data source: {e}", report.name);
                return RunOutcome::failure(e, None);
            }
        };

        let result = body(&mut state);
        if let Err(e) = &result {
            state.record_error(e.to_string());
        }
        state.close();

        match result {
            Ok(statistics) => {
                info!(
                    "Report '{}' finished: {} pages, {} rows",
                    report.name, statistics.pages, statistics.rows
                );
                RunOutcome::success(statistics)
            }
            Err(e) => {
                error!("Report '{}' failed: {e}", report.name);
                RunOutcome::failure(e, state.error_reason())
            }
        }
    }
}
