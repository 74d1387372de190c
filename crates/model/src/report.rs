use crate::band::{BandRole, Element, ElementKind};
use quire_data::{DataFactory, Parameters};
use quire_expr::ExpressionSlot;
use quire_style::{Insets, NamedStyles, StyleSheet};
use quire_types::{Pt, QueryName, Value};
use std::sync::Arc;

/// Physical page size and margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDefinition {
    pub width: Pt,
    pub height: Pt,
    pub margins: Insets,
}

impl PageDefinition {
    pub fn new(width: Pt, height: Pt) -> Self {
        Self {
            width,
            height,
            margins: Insets::all(Pt::pt(36)),
        }
    }

    pub fn a4() -> Self {
        Self::new(Pt::pt(595), Pt::pt(842))
    }

    pub fn letter() -> Self {
        Self::new(Pt::pt(612), Pt::pt(792))
    }

    pub fn with_margins(mut self, margins: Insets) -> Self {
        self.margins = margins;
        self
    }

    pub fn content_width(&self) -> Pt {
        (self.width - self.margins.horizontal()).clamp_non_negative()
    }

    pub fn content_height(&self) -> Pt {
        (self.height - self.margins.vertical()).clamp_non_negative()
    }
}

impl Default for PageDefinition {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    pub name: String,
    pub default: Option<Value>,
    pub mandatory: bool,
}

/// A grouping level. A new group instance starts whenever any key field
/// changes between consecutive rows.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: Arc<str>,
    pub fields: Vec<String>,
    pub header: Option<Element>,
    pub footer: Option<Element>,
}

/// A complete report: bands, groups, expressions, styles and the data
/// factory the rows come from.
#[derive(Debug, Clone, Default)]
pub struct ReportDefinition {
    pub name: String,
    pub query: Option<QueryName>,
    pub query_limit: Option<usize>,
    pub parameters: Vec<ParameterDefinition>,
    pub page: PageDefinition,
    /// Style of the report root, inherited by every band.
    pub style: StyleSheet,
    pub page_header: Option<Element>,
    pub page_footer: Option<Element>,
    pub report_header: Option<Element>,
    pub report_footer: Option<Element>,
    pub groups: Vec<Group>,
    pub item_band: Option<Element>,
    pub no_data: Option<Element>,
    pub expressions: Vec<ExpressionSlot>,
    pub styles: NamedStyles,
    /// `Some("3.8")` selects legacy sizing.
    pub compatibility_level: Option<String>,
    pub data_factory: Option<Arc<dyn DataFactory>>,
}

impl ReportDefinition {
    /// Parameter defaults declared by the report.
    pub fn parameter_defaults(&self) -> Parameters {
        self.parameters
            .iter()
            .filter_map(|p| p.default.clone().map(|v| (p.name.as_str(), v)))
            .collect()
    }

    /// Root sections in document order, with the role each must carry.
    pub fn sections<'a>(&'a self) -> Vec<(&'static str, BandRole, &'a Element)> {
        let mut out = Vec::new();
        let mut push = |section, role, band: &'a Option<Element>| {
            if let Some(band) = band {
                out.push((section, role, band));
            }
        };
        push("page-header", BandRole::PageHeader, &self.page_header);
        push("report-header", BandRole::ReportHeader, &self.report_header);
        for group in &self.groups {
            push("group-header", BandRole::GroupHeader, &group.header);
        }
        push("item-band", BandRole::ItemBand, &self.item_band);
        push("no-data", BandRole::NoData, &self.no_data);
        for group in self.groups.iter().rev() {
            push("group-footer", BandRole::GroupFooter, &group.footer);
        }
        push("report-footer", BandRole::ReportFooter, &self.report_footer);
        push("page-footer", BandRole::PageFooter, &self.page_footer);
        out
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| &*g.name == name)
    }

    /// True if any band of the report contains an element of the given kind.
    pub fn contains(&self, predicate: impl Fn(&ElementKind) -> bool) -> bool {
        let mut found = false;
        for (_, _, band) in self.sections() {
            band.walk(&mut |e| found |= predicate(&e.kind));
        }
        found
    }
}
