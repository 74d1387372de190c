pub mod fixtures;
pub mod page_assertions;

use quire::data::{InMemoryDataCache, Parameters};
use quire::layout::LogicalPageBox;
use quire::{
    CollectingSink, CsvContentWriter, EngineConfig, GenerationMode, HtmlContentWriter,
    ReportDefinition, ReportProcessor, RunOutcome,
};
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pages of a finished run together with its outcome.
pub struct Rendered {
    pub outcome: RunOutcome,
    pub pages: Vec<LogicalPageBox>,
}

impl Rendered {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of every page, pages separated by a form feed.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(LogicalPageBox::text_content)
            .collect::<Vec<_>>()
            .join("\u{c}")
    }
}

pub fn render(report: &ReportDefinition) -> Rendered {
    render_with(&ReportProcessor::default(), report)
}

pub fn render_with(processor: &ReportProcessor, report: &ReportDefinition) -> Rendered {
    init_logging();
    let mut sink = CollectingSink::new();
    let outcome = processor.process(
        report,
        &Parameters::new(),
        Arc::new(InMemoryDataCache::new()),
        &mut sink,
    );
    Rendered {
        outcome,
        pages: sink.into_pages(),
    }
}

fn processor(mode: GenerationMode) -> ReportProcessor {
    ReportProcessor::new(EngineConfig::builder().generation_mode(mode).build())
}

/// CSV export of `report` under `mode`, with the statistics of the run.
pub fn export_csv(report: &ReportDefinition, mode: GenerationMode) -> Result<(String, quire::RunStatistics), Box<dyn std::error::Error>> {
    init_logging();
    let mut writer = CsvContentWriter::new(Vec::new());
    let stats = processor(mode)
        .export(report, &Parameters::new(), Arc::new(InMemoryDataCache::new()), &mut writer)
        .into_result()?;
    Ok((String::from_utf8(writer.into_inner()?)?, stats))
}

/// HTML export of `report` under `mode`, with the statistics of the run.
pub fn export_html(report: &ReportDefinition, mode: GenerationMode) -> Result<(String, quire::RunStatistics), Box<dyn std::error::Error>> {
    init_logging();
    let mut writer = HtmlContentWriter::new(Vec::new(), &report.name);
    let stats = processor(mode)
        .export(report, &Parameters::new(), Arc::new(InMemoryDataCache::new()), &mut writer)
        .into_result()?;
    Ok((String::from_utf8(writer.into_inner())?, stats))
}
