//! Runs independent reports side by side.
//!
//! Layout of a single report is single-threaded; a batch spreads whole
//! reports over rayon's global pool. Every report gets its own data cache.
//! To bound the number of threads, configure the global pool before the
//! first batch:
//!
//! ```ignore
//! rayon::ThreadPoolBuilder::new().num_threads(4).build_global()?;
//! ```

use quire_core::{CountingSink, CsvContentWriter, ReportError, ReportProcessor, RunOutcome};
use quire_data::Parameters;
use quire_model::ReportDefinition;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One report of a batch with the parameters to run it with.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub report: Arc<ReportDefinition>,
    pub parameters: Parameters,
}

impl BatchEntry {
    pub fn new(report: Arc<ReportDefinition>, parameters: Parameters) -> Self {
        Self { report, parameters }
    }
}

#[derive(Debug)]
pub struct BatchResult {
    pub name: String,
    pub outcome: RunOutcome,
    pub boxes: usize,
}

fn render_one(processor: &ReportProcessor, entry: &BatchEntry) -> BatchResult {
    let mut sink = CountingSink::default();
    let outcome = processor.process(
        &entry.report,
        &entry.parameters,
        processor.create_cache(),
        &mut sink,
    );
    BatchResult {
        name: entry.report.name.clone(),
        outcome,
        boxes: sink.boxes,
    }
}

fn export_one(processor: &ReportProcessor, entry: &BatchEntry) -> Result<Vec<u8>, ReportError> {
    let mut writer = CsvContentWriter::new(Vec::new());
    processor
        .export(
            &entry.report,
            &entry.parameters,
            processor.create_cache(),
            &mut writer,
        )
        .into_result()?;
    writer.into_inner()
}

/// Paginates every entry. Results come back in input order.
pub fn render_all(processor: &ReportProcessor, entries: &[BatchEntry]) -> Vec<BatchResult> {
    log::info!("[BATCH] Rendering {} reports", entries.len());
    #[cfg(feature = "parallel")]
    let results = entries.par_iter().map(|e| render_one(processor, e)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = entries.iter().map(|e| render_one(processor, e)).collect();
    results
}

/// Exports every entry to CSV. Results come back in input order.
pub fn export_all_csv(
    processor: &ReportProcessor,
    entries: &[BatchEntry],
) -> Vec<Result<Vec<u8>, ReportError>> {
    log::info!("[BATCH] Exporting {} reports", entries.len());
    #[cfg(feature = "parallel")]
    let results = entries.par_iter().map(|e| export_one(processor, e)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = entries.iter().map(|e| export_one(processor, e)).collect();
    results
}
