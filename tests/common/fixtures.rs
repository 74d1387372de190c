use quire::data::{DefaultTableModel, FactoryProbe, TableDataFactory};
use quire::model::builder::{BandBuilder, GroupBuilder, Label, ReportBuilder, TextField};
use quire::model::{BandRole, PageDefinition};
use quire::style::{Insets, LayoutMode};
use quire::types::{Pt, Value};
use std::sync::Arc;

pub const REGIONS: [&str; 3] = ["East", "North", "West"];

/// `count` orders sorted by region, `amount = order_id % 7 + 1`.
pub fn orders(count: usize) -> DefaultTableModel {
    let per_region = count.div_ceil(REGIONS.len()).max(1);
    (0..count).fold(
        DefaultTableModel::new(["order_id", "customer", "region", "amount"]),
        |table, i| {
            table.with_row(vec![
                Value::from(i + 1),
                Value::text(format!("Customer {}", i % 13)),
                Value::text(REGIONS[(i / per_region).min(REGIONS.len() - 1)]),
                Value::from((i + 1) % 7 + 1),
            ])
        },
    )
}

/// A factory serving `table` as query `orders`, with its probe.
pub fn orders_factory(table: DefaultTableModel) -> (Arc<TableDataFactory>, Arc<FactoryProbe>) {
    let factory = TableDataFactory::new().with_table("orders", table);
    let probe = factory.probe();
    (Arc::new(factory), probe)
}

/// A margin-less page with a content area of `height` points.
pub fn page(height: i64) -> PageDefinition {
    PageDefinition::new(Pt::pt(300), Pt::pt(height)).with_margins(Insets::all(Pt::ZERO))
}

pub fn order_row() -> BandBuilder {
    BandBuilder::new(BandRole::ItemBand)
        .layout(LayoutMode::Row)
        .child(TextField::new("order_id"))
        .child(TextField::new("customer"))
        .child(TextField::new("amount"))
}

/// Orders grouped by region with plain bands only.
pub fn orders_report(table: DefaultTableModel) -> ReportBuilder {
    let (factory, _) = orders_factory(table);
    ReportBuilder::new("Orders")
        .query("orders")
        .data_factory(factory)
        .page_header(BandBuilder::new(BandRole::PageHeader).child(Label::new("Order listing")))
        .report_header(
            BandBuilder::new(BandRole::ReportHeader)
                .child(Label::new("Orders by region"))
                .child(Label::new("\r\nall amounts in EUR")),
        )
        .group(
            GroupBuilder::new("region")
                .field("region")
                .header(BandBuilder::new(BandRole::GroupHeader).child(TextField::new("region")))
                .footer(
                    BandBuilder::new(BandRole::GroupFooter)
                        .layout(LayoutMode::Row)
                        .child(Label::new("End of"))
                        .child(TextField::new("region")),
                ),
        )
        .item_band(order_row())
        .report_footer(BandBuilder::new(BandRole::ReportFooter).child(Label::new("<end & done>")))
        .page_footer(BandBuilder::new(BandRole::PageFooter).child(Label::new("confidential")))
}
