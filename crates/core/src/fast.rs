//! Single-pass layout for streaming exporters.
//!
//! A report qualifies when nothing in it needs to look back across a page
//! boundary. For such a report the [`StreamingProducer`] builds each band
//! once, hands it to a [`ContentWriter`] and frees it, firing the same
//! events in the same order as a flow-mode run of the pagination
//! controller. The output of both is therefore identical.

use crate::context::{RunContext, group_break};
use crate::error::ReportError;
use crate::outcome::RunStatistics;
use crate::state::ProcessStateHandle;
use crate::writers::ContentWriter;
use log::{debug, info};
use quire_data::DataRow;
use quire_expr::{EventKind, ExpressionEvaluator, ReportEvent};
use quire_layout::{BoxBuilder, BoxConstraints, BoxId, RenderTree};
use quire_model::{Element, ElementKind, ReportDefinition};
use quire_style::{StyleKey, StyleSheet, StyleValue};
use quire_traits::CancellationToken;
use quire_types::ProcessingLevel;
use std::fmt;
use std::sync::Arc;

/// Why a report cannot take the single-pass path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    /// A page-spanning style set on an element, its class, or the report.
    Style { element: String, key: StyleKey },
    /// A page-spanning style computed per row.
    StyleExpression { element: String, key: StyleKey },
    /// A sub-report or crosstab.
    Element { element: String },
    /// A function needing a pass the single-pass path does not make.
    Function { name: String, requirement: &'static str },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::Style { element, key } => write!(f, "{element} sets {}", key.name()),
            Ineligibility::StyleExpression { element, key } => {
                write!(f, "{element} computes {} per row", key.name())
            }
            Ineligibility::Element { element } => write!(f, "{element} needs the full pipeline"),
            Ineligibility::Function { name, requirement } => {
                write!(f, "function '{name}' needs {requirement}")
            }
        }
    }
}

const PAGE_SPANNING_KEYS: [StyleKey; 4] = [
    StyleKey::Widows,
    StyleKey::Orphans,
    StyleKey::AvoidPageBreakInside,
    StyleKey::Sticky,
];

fn is_active(value: &StyleValue) -> bool {
    match value {
        StyleValue::Bool(on) => *on,
        StyleValue::Integer(n) => *n > 0,
        _ => false,
    }
}

fn active_keys(sheet: &StyleSheet) -> impl Iterator<Item = StyleKey> + '_ {
    PAGE_SPANNING_KEYS
        .into_iter()
        .filter(|key| sheet.get(*key).is_some_and(is_active))
}

fn describe(element: &Element) -> String {
    match &element.name {
        Some(name) => format!("{} '{name}'", element.kind_name()),
        None => format!("{} {}", element.kind_name(), element.id),
    }
}

/// Decides whether a report can be laid out in one forward pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportStructureValidator;

impl ReportStructureValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_eligible(&self, report: &ReportDefinition) -> bool {
        self.check(report).is_empty()
    }

    /// Every reason the report is not eligible, in document order.
    pub fn check(&self, report: &ReportDefinition) -> Vec<Ineligibility> {
        let mut reasons = Vec::new();

        for key in active_keys(&report.style) {
            reasons.push(Ineligibility::Style {
                element: format!("report '{}'", report.name),
                key,
            });
        }

        for (_, _, section) in report.sections() {
            section.walk(&mut |element| self.check_element(report, element, &mut reasons));
        }

        for slot in &report.expressions {
            let requirements = slot.requirements();
            let needs = [
                (requirements.prepare_run, "the structural preprocessing pass"),
                (requirements.pagination, "the pagination pass"),
                (requirements.row_banding, "row banding"),
            ];
            for (_, requirement) in needs.into_iter().filter(|(needed, _)| *needed) {
                reasons.push(Ineligibility::Function {
                    name: slot.name().to_string(),
                    requirement,
                });
            }
        }

        if !reasons.is_empty() {
            debug!(
                "Report '{}' is not eligible for single-pass layout: {}",
                report.name,
                reasons.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            );
        }
        reasons
    }

    fn check_element(&self, report: &ReportDefinition, element: &Element, reasons: &mut Vec<Ineligibility>) {
        if matches!(element.kind, ElementKind::SubReport(_) | ElementKind::Crosstab(_)) {
            reasons.push(Ineligibility::Element {
                element: describe(element),
            });
        }
        let class = element
            .style_class
            .as_deref()
            .and_then(|name| report.styles.get(name));
        let mut keys: Vec<StyleKey> = active_keys(&element.style).collect();
        if let Some(class) = class {
            keys.extend(active_keys(class).filter(|key| !element.style.is_local(*key)));
        }
        for key in keys {
            reasons.push(Ineligibility::Style {
                element: describe(element),
                key,
            });
        }
        for expression in &element.style_expressions {
            if PAGE_SPANNING_KEYS.contains(&expression.key) {
                reasons.push(Ineligibility::StyleExpression {
                    element: describe(element),
                    key: expression.key,
                });
            }
        }
    }
}

/// Lays out an eligible report band by band and writes each band as soon
/// as it is built.
pub struct StreamingProducer<'r, 's> {
    ctx: RunContext<'r>,
    state: &'s mut ProcessStateHandle,
    writer: &'s mut dyn ContentWriter,
    cancel: CancellationToken,
    evaluator: ExpressionEvaluator,
    row: DataRow,
    work: RenderTree,
    page_number: usize,
    stats: RunStatistics,
}

impl<'r, 's> StreamingProducer<'r, 's> {
    /// `ctx` must be a flow-mode context.
    pub fn new(
        ctx: RunContext<'r>,
        state: &'s mut ProcessStateHandle,
        writer: &'s mut dyn ContentWriter,
    ) -> Result<Self, ReportError> {
        let evaluator = ctx.evaluator()?;
        let row = state.open_rows(ctx.report, &ctx.parameters, ctx.query_limit)?;
        Ok(Self {
            ctx,
            state,
            writer,
            cancel: CancellationToken::new(),
            evaluator,
            row,
            work: RenderTree::new(),
            page_number: 0,
            stats: RunStatistics::default(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(mut self) -> Result<RunStatistics, ReportError> {
        let report = self.ctx.report;
        self.evaluator
            .set_processing_level(ProcessingLevel::ContentGeneration)?;
        info!(
            "Report '{}': single-pass layout over {} rows",
            report.name,
            self.row.row_count()
        );
        self.row.rewind();

        self.fire(EventKind::ReportInitialized, None);
        self.page_number = 1;
        self.fire(EventKind::PageStarted, None);
        if let Some(header) = &report.page_header {
            self.write_if(header, |first, last| first && last)?;
        }
        self.fire(EventKind::ReportStarted, None);
        if let Some(header) = &report.report_header {
            self.write(header)?;
        }

        self.process_rows()?;

        self.fire(EventKind::ReportFinished, None);
        if let Some(footer) = &report.report_footer {
            self.write(footer)?;
        }
        self.fire(EventKind::PageFinished, None);
        if let Some(footer) = &report.page_footer {
            self.write_if(footer, |first, last| first && last)?;
        }
        self.fire(EventKind::ReportDone, None);
        self.writer.finish()?;

        self.stats.pages = self.page_number;
        self.stats.rows = self.row.row_count();
        self.stats.passes.push(ProcessingLevel::ContentGeneration);
        self.stats.fast_path = true;
        debug!("Single-pass layout of '{}' done", report.name);
        Ok(self.stats)
    }

    fn process_rows(&mut self) -> Result<(), ReportError> {
        let report = self.ctx.report;
        if self.row.row_count() == 0 {
            if let Some(no_data) = &report.no_data {
                self.write(no_data)?;
            }
            return Ok(());
        }

        let mut open_from = Some(0);
        while self.row.advance() {
            if self.cancel.is_cancelled() {
                info!("Report '{}' cancelled at row {:?}", report.name, self.row.cursor());
                return Err(ReportError::Cancelled);
            }
            self.evaluator.evaluate(&mut self.row);
            if let Some(from) = open_from.take() {
                for group in &report.groups[from..] {
                    self.fire(EventKind::GroupStarted, Some(group.name.clone()));
                    if let Some(header) = &group.header {
                        self.write(header)?;
                    }
                }
                self.fire(EventKind::ItemsStarted, None);
            }

            self.fire(EventKind::ItemsAdvanced, None);
            if let Some(band) = &report.item_band {
                self.write(band)?;
            }

            if let Some(from) = group_break(&report.groups, &self.row) {
                self.fire(EventKind::ItemsFinished, None);
                for group in report.groups[from..].iter().rev() {
                    self.fire(EventKind::GroupFinished, Some(group.name.clone()));
                    if let Some(footer) = &group.footer {
                        self.write(footer)?;
                    }
                }
                open_from = Some(from);
            }
        }
        Ok(())
    }

    fn fire(&mut self, kind: EventKind, group: Option<Arc<str>>) {
        let mut event = ReportEvent::new(kind, ProcessingLevel::ContentGeneration, self.page_number);
        if let Some(group) = group {
            event = event.for_group(group);
        }
        self.evaluator.fire(&event, &mut self.row);
    }

    fn build(&mut self, element: &Element) -> Result<Option<BoxId>, ReportError> {
        let report = self.ctx.report;
        let mut builder = BoxBuilder::new(
            self.ctx.layout,
            &*self.ctx.metrics,
            &report.styles,
            &mut *self.state,
        )
        .with_height_base(report.page.content_height());
        let built = builder.build(
            &mut self.work,
            element,
            &self.ctx.root_style,
            &self.row,
            BoxConstraints::new(report.page.content_width()),
        );
        self.stats.diagnostics.extend(builder.take_diagnostics());
        Ok(built?)
    }

    fn write(&mut self, element: &Element) -> Result<(), ReportError> {
        self.write_if(element, |_, _| true)
    }

    /// Writes `element` when `shown` accepts its first- and last-page flags.
    fn write_if(&mut self, element: &Element, shown: impl Fn(bool, bool) -> bool) -> Result<(), ReportError> {
        let Some(id) = self.build(element)? else {
            return Ok(());
        };
        let style = &self.work.node(id)?.style;
        let visible = shown(
            style.flag(StyleKey::DisplayOnFirstPage),
            style.flag(StyleKey::DisplayOnLastPage),
        );
        self.stats.peak_active_boxes = self.stats.peak_active_boxes.max(self.work.active_count());
        if visible {
            self.writer.write_band(&self.work, id)?;
        }
        self.work.free_subtree(id)?;
        Ok(())
    }
}
