use crate::config::EngineConfig;
use crate::outcome::RunOutcome;
use crate::processor::ReportProcessor;
use crate::sink::CollectingSink;
use quire_data::{DefaultTableModel, FactoryProbe, InMemoryDataCache, Parameters, TableDataFactory};
use quire_layout::LogicalPageBox;
use quire_model::PageDefinition;
use quire_model::builder::{BandBuilder, TextField};
use quire_model::BandRole;
use quire_style::Insets;
use quire_types::{Pt, Value};
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A margin-less page whose content area is `height` points tall.
pub fn page(height: i64) -> PageDefinition {
    PageDefinition::new(Pt::pt(200), Pt::pt(height)).with_margins(Insets::all(Pt::ZERO))
}

/// Rows `id = 1..=count` with `amount = 1`, grouped by `group` as given.
pub fn rows(groups: &[&str]) -> DefaultTableModel {
    groups.iter().enumerate().fold(
        DefaultTableModel::new(["id", "group", "amount"]),
        |table, (i, group)| {
            table.with_row(vec![Value::from(i + 1), Value::text(*group), Value::from(1)])
        },
    )
}

pub fn ungrouped(count: usize) -> DefaultTableModel {
    rows(&vec!["all"; count])
}

/// A factory serving `table` as query `rows`, with its probe.
pub fn factory(table: DefaultTableModel) -> (Arc<TableDataFactory>, Arc<FactoryProbe>) {
    let factory = TableDataFactory::new().with_table("rows", table);
    let probe = factory.probe();
    (Arc::new(factory), probe)
}

/// An item band printing the row id.
pub fn item_band() -> BandBuilder {
    BandBuilder::new(BandRole::ItemBand).child(TextField::new("id"))
}

pub fn render(report: &quire_model::ReportDefinition) -> (RunOutcome, Vec<LogicalPageBox>) {
    render_with(ReportProcessor::new(EngineConfig::default()), report)
}

pub fn render_with(
    processor: ReportProcessor,
    report: &quire_model::ReportDefinition,
) -> (RunOutcome, Vec<LogicalPageBox>) {
    init_logging();
    let mut sink = CollectingSink::new();
    let outcome = processor.process(
        report,
        &Parameters::new(),
        Arc::new(InMemoryDataCache::new()),
        &mut sink,
    );
    (outcome, sink.into_pages())
}
