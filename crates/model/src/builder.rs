//! A fluent API for assembling report definitions in code.
//!
//! ```ignore
//! use quire_model::builder::*;
//!
//! let report = ReportBuilder::new("orders")
//!     .query("orders")
//!     .group(GroupBuilder::new("region").field("region").header(
//!         BandBuilder::new(BandRole::GroupHeader).child(TextField::new("region")),
//!     ))
//!     .item_band(
//!         BandBuilder::new(BandRole::ItemBand)
//!             .layout(LayoutMode::Row)
//!             .child(TextField::new("customer").style(StyleKey::Width, Dimension::percent(60)))
//!             .child(TextField::new("amount")),
//!     )
//!     .build();
//! ```

use crate::band::{
    Aggregation, Band, BandRole, Crosstab, Element, ElementKind, ParameterMapping,
    StyleExpression, SubReport,
};
use crate::report::{Group, PageDefinition, ParameterDefinition, ReportDefinition};
use log::warn;
use quire_data::DataFactory;
use quire_expr::{
    Expression, ExpressionSlot, FormulaError, FormulaExpression, Function, parse_formula,
};
use quire_style::{LayoutMode, NamedStyles, StyleKey, StyleSheet, StyleValue};
use quire_types::{ElementName, Pt, QueryName, Value};
use std::sync::Arc;

/// Anything that produces one element of the report tree.
pub trait ElementBuilder {
    fn build(self: Box<Self>) -> Element;
}

/// Properties shared by every element builder.
#[derive(Debug, Default, Clone)]
struct Common {
    name: Option<ElementName>,
    style: StyleSheet,
    class: Option<String>,
    expressions: Vec<StyleExpression>,
}

impl Common {
    fn into_element(self, kind: ElementKind) -> Element {
        let mut element = Element::new(kind);
        element.name = self.name;
        element.style = self.style;
        element.style_class = self.class;
        element.style_expressions = self.expressions;
        element
    }
}

macro_rules! impl_styled_element {
    ($($name:ident),+) => {
        $(
            impl $name {
                pub fn name(mut self, name: &str) -> Self {
                    self.common.name = Some(ElementName::from(name));
                    self
                }

                /// Sets a local style value. A value of the wrong type is
                /// logged and ignored.
                pub fn style(mut self, key: StyleKey, value: impl Into<StyleValue>) -> Self {
                    if let Err(e) = self.common.style.set(key, value) {
                        warn!("Ignoring style on {}: {e}", stringify!($name));
                    }
                    self
                }

                pub fn class(mut self, class: &str) -> Self {
                    self.common.class = Some(class.to_string());
                    self
                }

                /// Binds `key` to a formula evaluated for every row.
                pub fn style_expression(mut self, key: StyleKey, source: &str) -> Self {
                    match parse_formula(source) {
                        Ok(formula) => self.common.expressions.push(StyleExpression { key, formula }),
                        Err(e) => warn!("Ignoring style expression for {key}: {e}"),
                    }
                    self
                }
            }
        )+
    };
}

#[derive(Debug, Clone)]
pub struct Label {
    common: Common,
    text: String,
}

impl Label {
    pub fn new(text: &str) -> Self {
        Self {
            common: Common::default(),
            text: text.to_string(),
        }
    }
}

impl ElementBuilder for Label {
    fn build(self: Box<Self>) -> Element {
        self.common.into_element(ElementKind::Label(self.text))
    }
}

#[derive(Debug, Clone)]
pub struct TextField {
    common: Common,
    field: String,
    null_text: Option<String>,
}

impl TextField {
    pub fn new(field: &str) -> Self {
        Self {
            common: Common::default(),
            field: field.to_string(),
            null_text: None,
        }
    }

    pub fn null_text(mut self, text: &str) -> Self {
        self.null_text = Some(text.to_string());
        self
    }
}

impl ElementBuilder for TextField {
    fn build(self: Box<Self>) -> Element {
        self.common.into_element(ElementKind::TextField {
            field: self.field,
            null_text: self.null_text,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rectangle {
    common: Common,
}

impl Rectangle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ElementBuilder for Rectangle {
    fn build(self: Box<Self>) -> Element {
        self.common.into_element(ElementKind::Rectangle)
    }
}

pub struct BandBuilder {
    common: Common,
    role: BandRole,
    children: Vec<Box<dyn ElementBuilder>>,
}

impl BandBuilder {
    pub fn new(role: BandRole) -> Self {
        Self {
            common: Common::default(),
            role,
            children: Vec::new(),
        }
    }

    /// A band placed inside another band.
    pub fn nested() -> Self {
        Self::new(BandRole::Nested)
    }

    pub fn child(mut self, child: impl ElementBuilder + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn layout(self, mode: LayoutMode) -> Self {
        self.style(StyleKey::Layout, mode)
    }

    pub fn sticky(self) -> Self {
        self.style(StyleKey::Sticky, true)
    }

    pub fn into_element(self) -> Element {
        Box::new(self).build()
    }
}

impl ElementBuilder for BandBuilder {
    fn build(self: Box<Self>) -> Element {
        let band = Band {
            role: self.role,
            children: self.children.into_iter().map(|c| c.build()).collect(),
        };
        self.common.into_element(ElementKind::Band(band))
    }
}

pub struct SubReportBuilder {
    common: Common,
    query: QueryName,
    parameters: Vec<ParameterMapping>,
    header: Option<BandBuilder>,
    item_band: Option<BandBuilder>,
    footer: Option<BandBuilder>,
    data_factory: Option<Arc<dyn DataFactory>>,
}

impl SubReportBuilder {
    pub fn new(query: &str) -> Self {
        Self {
            common: Common::default(),
            query: QueryName::from(query),
            parameters: Vec::new(),
            header: None,
            item_band: None,
            footer: None,
            data_factory: None,
        }
    }

    /// Passes the outer row's `outer` value to the sub-report as `inner`.
    pub fn map_parameter(mut self, outer: &str, inner: &str) -> Self {
        self.parameters.push(ParameterMapping {
            outer: outer.to_string(),
            inner: inner.to_string(),
        });
        self
    }

    pub fn header(mut self, band: BandBuilder) -> Self {
        self.header = Some(band);
        self
    }

    pub fn item_band(mut self, band: BandBuilder) -> Self {
        self.item_band = Some(band);
        self
    }

    pub fn footer(mut self, band: BandBuilder) -> Self {
        self.footer = Some(band);
        self
    }

    pub fn data_factory(mut self, factory: Arc<dyn DataFactory>) -> Self {
        self.data_factory = Some(factory);
        self
    }
}

impl ElementBuilder for SubReportBuilder {
    fn build(self: Box<Self>) -> Element {
        let this = *self;
        let sub = SubReport {
            query: this.query,
            parameters: this.parameters,
            header: this.header.map(BandBuilder::into_element),
            item_band: this
                .item_band
                .unwrap_or_else(|| BandBuilder::new(BandRole::ItemBand))
                .into_element(),
            footer: this.footer.map(BandBuilder::into_element),
            data_factory: this.data_factory,
        };
        this.common.into_element(ElementKind::SubReport(Box::new(sub)))
    }
}

#[derive(Debug, Clone)]
pub struct CrosstabBuilder {
    common: Common,
    crosstab: Crosstab,
}

impl CrosstabBuilder {
    pub fn new(measure: &str) -> Self {
        Self {
            common: Common::default(),
            crosstab: Crosstab {
                measure: measure.to_string(),
                ..Crosstab::default()
            },
        }
    }

    pub fn query(mut self, query: &str) -> Self {
        self.crosstab.query = Some(QueryName::from(query));
        self
    }

    pub fn rows(mut self, field: &str) -> Self {
        self.crosstab.row_field = Some(field.to_string());
        self
    }

    pub fn columns(mut self, field: &str) -> Self {
        self.crosstab.column_field = Some(field.to_string());
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.crosstab.aggregation = aggregation;
        self
    }

    pub fn cell_size(mut self, width: Pt, height: Pt) -> Self {
        self.crosstab.cell_width = width;
        self.crosstab.cell_height = height;
        self
    }

    pub fn row_header_width(mut self, width: Pt) -> Self {
        self.crosstab.row_header_width = width;
        self
    }

    pub fn total_label(mut self, label: &str) -> Self {
        self.crosstab.total_label = label.to_string();
        self
    }
}

impl ElementBuilder for CrosstabBuilder {
    fn build(self: Box<Self>) -> Element {
        self.common
            .into_element(ElementKind::Crosstab(Box::new(self.crosstab)))
    }
}

impl_styled_element!(Label, TextField, Rectangle, BandBuilder, SubReportBuilder, CrosstabBuilder);

pub struct GroupBuilder {
    name: Arc<str>,
    fields: Vec<String>,
    header: Option<BandBuilder>,
    footer: Option<BandBuilder>,
}

impl GroupBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            fields: Vec::new(),
            header: None,
            footer: None,
        }
    }

    pub fn field(mut self, field: &str) -> Self {
        self.fields.push(field.to_string());
        self
    }

    pub fn header(mut self, band: BandBuilder) -> Self {
        self.header = Some(band);
        self
    }

    pub fn footer(mut self, band: BandBuilder) -> Self {
        self.footer = Some(band);
        self
    }

    fn build(self) -> Group {
        Group {
            name: self.name,
            fields: self.fields,
            header: self.header.map(BandBuilder::into_element),
            footer: self.footer.map(BandBuilder::into_element),
        }
    }
}

pub struct ReportBuilder {
    report: ReportDefinition,
}

impl ReportBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            report: ReportDefinition {
                name: name.to_string(),
                ..ReportDefinition::default()
            },
        }
    }

    pub fn query(mut self, query: &str) -> Self {
        self.report.query = Some(QueryName::from(query));
        self
    }

    pub fn query_limit(mut self, limit: usize) -> Self {
        self.report.query_limit = Some(limit);
        self
    }

    /// Declares an optional parameter with a default value.
    pub fn parameter(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.report.parameters.push(ParameterDefinition {
            name: name.to_string(),
            default: Some(default.into()),
            mandatory: false,
        });
        self
    }

    pub fn mandatory_parameter(mut self, name: &str) -> Self {
        self.report.parameters.push(ParameterDefinition {
            name: name.to_string(),
            default: None,
            mandatory: true,
        });
        self
    }

    pub fn page(mut self, page: PageDefinition) -> Self {
        self.report.page = page;
        self
    }

    /// Sets a style on the report root, inherited by every band.
    pub fn style(mut self, key: StyleKey, value: impl Into<StyleValue>) -> Self {
        if let Err(e) = self.report.style.set(key, value) {
            warn!("Ignoring report style: {e}");
        }
        self
    }

    pub fn style_class(mut self, name: &str, sheet: StyleSheet) -> Self {
        self.report.styles.insert(name, sheet);
        self
    }

    pub fn styles(mut self, styles: NamedStyles) -> Self {
        self.report.styles = styles;
        self
    }

    pub fn page_header(mut self, band: BandBuilder) -> Self {
        self.report.page_header = Some(band.into_element());
        self
    }

    pub fn page_footer(mut self, band: BandBuilder) -> Self {
        self.report.page_footer = Some(band.into_element());
        self
    }

    pub fn report_header(mut self, band: BandBuilder) -> Self {
        self.report.report_header = Some(band.into_element());
        self
    }

    pub fn report_footer(mut self, band: BandBuilder) -> Self {
        self.report.report_footer = Some(band.into_element());
        self
    }

    /// Adds the next, more deeply nested, group.
    pub fn group(mut self, group: GroupBuilder) -> Self {
        self.report.groups.push(group.build());
        self
    }

    pub fn item_band(mut self, band: BandBuilder) -> Self {
        self.report.item_band = Some(band.into_element());
        self
    }

    pub fn no_data(mut self, band: BandBuilder) -> Self {
        self.report.no_data = Some(band.into_element());
        self
    }

    pub fn expression(mut self, expression: impl Expression + 'static) -> Self {
        self.report
            .expressions
            .push(ExpressionSlot::Expression(Box::new(expression)));
        self
    }

    /// Adds a formula expression, failing if the formula does not parse.
    pub fn formula(self, name: &str, source: &str) -> Result<Self, FormulaError> {
        Ok(self.expression(FormulaExpression::new(name, source)?))
    }

    pub fn function(mut self, function: impl Function + 'static) -> Self {
        self.report
            .expressions
            .push(ExpressionSlot::Function(Box::new(function)));
        self
    }

    pub fn compatibility_level(mut self, level: &str) -> Self {
        self.report.compatibility_level = Some(level.to_string());
        self
    }

    pub fn data_factory(mut self, factory: Arc<dyn DataFactory>) -> Self {
        self.report.data_factory = Some(factory);
        self
    }

    pub fn build(self) -> ReportDefinition {
        self.report
    }
}
