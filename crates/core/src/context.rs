//! Shared, read-only inputs of one report run.

use crate::config::EngineConfig;
use crate::error::ReportError;
use quire_data::{DataRow, Parameters};
use quire_expr::ExpressionEvaluator;
use quire_layout::LayoutConfig;
use quire_model::{Group, ReportDefinition};
use quire_style::{ResolvedStyle, StyleResolver};
use quire_traits::SharedMetrics;
use quire_types::Pt;

pub struct RunContext<'r> {
    pub report: &'r ReportDefinition,
    pub layout: LayoutConfig,
    pub metrics: SharedMetrics,
    /// Resolved style of the report root, inherited by every band.
    pub root_style: ResolvedStyle,
    pub parameters: Parameters,
    pub query_limit: Option<usize>,
}

impl<'r> RunContext<'r> {
    /// Parameters are merged with the report's declared defaults.
    pub fn new(
        report: &'r ReportDefinition,
        config: &EngineConfig,
        metrics: SharedMetrics,
        parameters: &Parameters,
        flow: bool,
    ) -> Self {
        let mut parameters = parameters.clone();
        parameters.merge_defaults(&report.parameter_defaults());
        let mut diagnostics = Vec::new();
        let root_style = StyleResolver::new(&report.styles).resolve(&report.style, None, None, &mut diagnostics);
        Self {
            report,
            layout: config.layout_for(report, flow),
            metrics,
            root_style,
            parameters,
            query_limit: config.query_limit_for(report),
        }
    }

    pub fn content_width(&self) -> Pt {
        self.report.page.content_width()
    }

    pub fn content_height(&self) -> Pt {
        self.report.page.content_height()
    }

    /// A fresh evaluator holding the report's expressions and functions.
    pub fn evaluator(&self) -> Result<ExpressionEvaluator, ReportError> {
        let mut evaluator = ExpressionEvaluator::new();
        for slot in &self.report.expressions {
            evaluator.register(slot.clone())?;
        }
        Ok(evaluator)
    }
}

/// The outermost group that ends with the current row: `Some(0)` on the
/// last row, `Some(groups.len())` never. `None` while every group goes on.
pub fn group_break(groups: &[Group], row: &DataRow) -> Option<usize> {
    if !row.has_next() {
        return Some(0);
    }
    let cursor = row.cursor()?;
    groups.iter().position(|group| {
        group
            .fields
            .iter()
            .any(|field| row.column_at(cursor, field) != row.next_value(field))
    })
}
