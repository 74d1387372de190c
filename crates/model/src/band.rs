use quire_data::DataFactory;
use quire_expr::Formula;
use quire_style::{StyleKey, StyleSheet};
use quire_types::{ElementName, InstanceId, Pt, QueryName};
use std::fmt;
use std::sync::Arc;

/// Where a band sits in the report structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandRole {
    ReportHeader,
    ReportFooter,
    PageHeader,
    PageFooter,
    GroupHeader,
    GroupFooter,
    ItemBand,
    NoData,
    /// A band nested inside another band.
    Nested,
}

impl BandRole {
    /// Roles that are top-level containers and may not appear nested.
    pub fn is_root_level(self) -> bool {
        !matches!(self, BandRole::Nested)
    }

    /// Page bands are laid out per page and cannot host sub-reports.
    pub fn is_page_band(self) -> bool {
        matches!(self, BandRole::PageHeader | BandRole::PageFooter)
    }
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BandRole::ReportHeader => "report-header",
            BandRole::ReportFooter => "report-footer",
            BandRole::PageHeader => "page-header",
            BandRole::PageFooter => "page-footer",
            BandRole::GroupHeader => "group-header",
            BandRole::GroupFooter => "group-footer",
            BandRole::ItemBand => "item-band",
            BandRole::NoData => "no-data",
            BandRole::Nested => "nested",
        };
        f.write_str(name)
    }
}

/// A per-row, data-bound override of one style key.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleExpression {
    pub key: StyleKey,
    pub formula: Formula,
}

/// A node of the report tree: a band or one of its content elements.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: InstanceId,
    pub name: Option<ElementName>,
    pub style: StyleSheet,
    pub style_class: Option<String>,
    pub style_expressions: Vec<StyleExpression>,
    pub kind: ElementKind,
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    Label(String),
    /// A value from the data row; `null_text` is shown for null values.
    TextField {
        field: String,
        null_text: Option<String>,
    },
    Rectangle,
    Band(Band),
    SubReport(Box<SubReport>),
    Crosstab(Box<Crosstab>),
}

#[derive(Debug, Clone)]
pub struct Band {
    pub role: BandRole,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: InstanceId::next(),
            name: None,
            style: StyleSheet::new(),
            style_class: None,
            style_expressions: Vec::new(),
            kind,
        }
    }

    pub fn as_band(&self) -> Option<&Band> {
        match &self.kind {
            ElementKind::Band(band) => Some(band),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.kind {
            ElementKind::Band(band) => &band.children,
            _ => &[],
        }
    }

    /// Visits this element and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Label(_) => "label",
            ElementKind::TextField { .. } => "text-field",
            ElementKind::Rectangle => "rectangle",
            ElementKind::Band(_) => "band",
            ElementKind::SubReport(_) => "sub-report",
            ElementKind::Crosstab(_) => "crosstab",
        }
    }
}

/// Maps a value of the outer report onto a parameter of a sub-report.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMapping {
    pub outer: String,
    pub inner: String,
}

/// A report embedded inline, with its own query and item band.
#[derive(Debug, Clone)]
pub struct SubReport {
    pub query: QueryName,
    pub parameters: Vec<ParameterMapping>,
    pub header: Option<Element>,
    pub item_band: Element,
    pub footer: Option<Element>,
    /// Factory to query; the enclosing report's factory when absent.
    pub data_factory: Option<Arc<dyn DataFactory>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    #[default]
    Sum,
    Count,
    Min,
    Max,
    Average,
}

/// A pivot grid: one row per distinct `row_field` value, one column per
/// distinct `column_field` value, totals on the right and bottom.
#[derive(Debug, Clone)]
pub struct Crosstab {
    /// Query providing the rows; the report's master query when absent.
    pub query: Option<QueryName>,
    pub row_field: Option<String>,
    pub column_field: Option<String>,
    pub measure: String,
    pub aggregation: Aggregation,
    pub row_header_width: Pt,
    pub cell_width: Pt,
    pub cell_height: Pt,
    pub total_label: String,
}

impl Default for Crosstab {
    fn default() -> Self {
        Self {
            query: None,
            row_field: None,
            column_field: None,
            measure: String::new(),
            aggregation: Aggregation::Sum,
            row_header_width: Pt::pt(80),
            cell_width: Pt::pt(60),
            cell_height: Pt::pt(14),
            total_label: "Total".to_string(),
        }
    }
}
