//! A ready-made report over an arbitrary table: one row band per record,
//! an optional grouping column and a count in the report footer.

use quire_data::{DefaultTableModel, TableDataFactory, TableModel};
use quire_expr::ItemCount;
use quire_model::builder::{BandBuilder, GroupBuilder, Label, ReportBuilder, TextField};
use quire_model::{BandRole, PageDefinition, ReportDefinition};
use quire_style::{LayoutMode, StyleKey};
use std::sync::Arc;

/// Name of the master query the tabular report reads.
pub const QUERY: &str = "rows";

#[derive(Debug, Clone)]
pub struct TabularReport {
    title: String,
    group_by: Option<String>,
    page: PageDefinition,
    page_numbers: bool,
}

impl TabularReport {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            group_by: None,
            page: PageDefinition::a4(),
            page_numbers: false,
        }
    }

    /// Starts a group, with the value as its header, whenever `field` changes.
    pub fn group_by(mut self, field: &str) -> Self {
        self.group_by = Some(field.to_string());
        self
    }

    pub fn page(mut self, page: PageDefinition) -> Self {
        self.page = page;
        self
    }

    /// Adds a page footer with the running page number.
    pub fn page_numbers(mut self, enabled: bool) -> Self {
        self.page_numbers = enabled;
        self
    }

    /// Builds the definition and binds `table` as its data.
    pub fn build(&self, table: DefaultTableModel) -> ReportDefinition {
        let columns: Vec<String> = (0..table.column_count())
            .filter_map(|c| table.column_name(c).map(str::to_string))
            .filter(|name| Some(name) != self.group_by.as_ref())
            .collect();

        let heading = columns
            .iter()
            .fold(BandBuilder::nested().layout(LayoutMode::Row), |band, name| {
                band.child(Label::new(name).style(StyleKey::Bold, true))
            });
        let item_band = columns
            .iter()
            .fold(BandBuilder::new(BandRole::ItemBand).layout(LayoutMode::Row), |band, name| {
                band.child(TextField::new(name).null_text("-"))
            });

        let mut builder = ReportBuilder::new(&self.title)
            .page(self.page)
            .query(QUERY)
            .data_factory(Arc::new(TableDataFactory::new().with_table(QUERY, table)))
            .function(ItemCount::new("row_count"))
            .report_header(
                BandBuilder::new(BandRole::ReportHeader)
                    .child(Label::new(&self.title).style(StyleKey::Bold, true))
                    .child(heading),
            )
            .item_band(item_band)
            .report_footer(
                BandBuilder::new(BandRole::ReportFooter)
                    .layout(LayoutMode::Row)
                    .child(Label::new("Rows:"))
                    .child(TextField::new("row_count")),
            );

        if let Some(field) = &self.group_by {
            builder = builder.group(
                GroupBuilder::new(field)
                    .field(field)
                    .header(BandBuilder::new(BandRole::GroupHeader).child(TextField::new(field).null_text("-"))),
            );
        }
        if self.page_numbers {
            builder = builder
                .function(quire_expr::PageNumber::new("page_number"))
                .page_footer(
                    BandBuilder::new(BandRole::PageFooter)
                        .layout(LayoutMode::Row)
                        .child(Label::new("Page"))
                        .child(TextField::new("page_number")),
                );
        }
        builder.build()
    }
}
