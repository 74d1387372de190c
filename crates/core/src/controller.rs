//! The pagination controller.
//!
//! Drives the rows of a report through the expression evaluator and the box
//! builder and flows the resulting bands onto pages. A run makes up to three
//! passes over the same data with one evaluator: structural preprocessing
//! (events only) when a function asks for it, pagination (layout without
//! output) when a function needs page boundaries, and content generation,
//! which hands every finished page to a [`PageSink`].
//!
//! Within a pass the controller moves through
//! `Idle → Initialized → (GroupOpen → ItemsOpen → ItemsClosed → GroupClosed)* → Finished`.

use crate::context::{RunContext, group_break};
use crate::error::ReportError;
use crate::outcome::RunStatistics;
use crate::sink::PageSink;
use crate::state::ProcessStateHandle;
use log::{debug, info, trace};
use quire_data::DataRow;
use quire_expr::{Checkpoint, EventKind, ExpressionEvaluator, ReportEvent};
use quire_layout::breaks::{SplitOutcome, split_box};
use quire_layout::{AreaKind, BoxBuilder, BoxConstraints, BoxId, LogicalPageBox, RenderTree};
use quire_model::Element;
use quire_style::StyleKey;
use quire_traits::{CancellationToken, NoopProgressListener, ProgressEvent, ProgressListener};
use quire_types::{ProcessingLevel, Pt};
use std::sync::Arc;

/// Rows between two progress updates.
const PROGRESS_INTERVAL: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Initialized,
    GroupOpen,
    ItemsOpen,
    ItemsClosed,
    GroupClosed,
    Finished,
}

#[derive(Debug)]
struct OpenGroup {
    index: usize,
    /// Height kept free for the group's sticky footer; zero if not sticky.
    sticky_footer: Pt,
    header_done: bool,
    /// Set while the group's own footer is being emitted.
    closing: bool,
}

pub struct PaginationController<'r, 's> {
    ctx: RunContext<'r>,
    state: &'s mut ProcessStateHandle,
    sink: &'s mut dyn PageSink,
    progress: Arc<dyn ProgressListener>,
    cancel: CancellationToken,
    evaluator: ExpressionEvaluator,
    row: DataRow,
    /// Scratch tree bands are built in. Emptied after each placement.
    work: RenderTree,
    level: ProcessingLevel,
    phase: ControllerState,
    page: Option<LogicalPageBox>,
    page_number: usize,
    page_footer_height: Pt,
    hide_header_on_last: bool,
    /// Sticky group headers repeated at the top of the current page.
    repeated: usize,
    break_pending: bool,
    open_groups: Vec<OpenGroup>,
    stats: RunStatistics,
}

impl<'r, 's> PaginationController<'r, 's> {
    pub fn new(
        ctx: RunContext<'r>,
        state: &'s mut ProcessStateHandle,
        sink: &'s mut dyn PageSink,
    ) -> Result<Self, ReportError> {
        let evaluator = ctx.evaluator()?;
        let row = state.open_rows(ctx.report, &ctx.parameters, ctx.query_limit)?;
        Ok(Self {
            ctx,
            state,
            sink,
            progress: Arc::new(NoopProgressListener),
            cancel: CancellationToken::new(),
            evaluator,
            row,
            work: RenderTree::new(),
            level: ProcessingLevel::StructuralPreprocessing,
            phase: ControllerState::Idle,
            page: None,
            page_number: 0,
            page_footer_height: Pt::ZERO,
            hide_header_on_last: false,
            repeated: 0,
            break_pending: false,
            open_groups: Vec::new(),
            stats: RunStatistics::default(),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressListener>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn phase(&self) -> ControllerState {
        self.phase
    }

    /// The passes this report needs, in order.
    pub fn planned_passes(&self) -> Vec<ProcessingLevel> {
        let requirements = self.evaluator.requirements();
        let mut passes = Vec::with_capacity(3);
        if requirements.prepare_run {
            passes.push(ProcessingLevel::StructuralPreprocessing);
        }
        if requirements.pagination {
            passes.push(ProcessingLevel::Pagination);
        }
        passes.push(ProcessingLevel::ContentGeneration);
        passes
    }

    pub fn run(mut self) -> Result<RunStatistics, ReportError> {
        for level in self.planned_passes() {
            self.run_pass(level)?;
        }
        self.transition(ControllerState::Finished);
        Ok(self.stats)
    }

    fn transition(&mut self, next: ControllerState) {
        if self.phase != next {
            trace!("Controller {:?} -> {next:?}", self.phase);
            self.phase = next;
        }
    }

    fn progress_event(&self) -> ProgressEvent {
        ProgressEvent {
            level: self.level,
            row: self.row.cursor().map_or(0, |c| c + 1),
            total_rows: self.row.row_count(),
            page: self.page_number,
        }
    }

    fn run_pass(&mut self, level: ProcessingLevel) -> Result<(), ReportError> {
        let report = self.ctx.report;
        self.evaluator.set_processing_level(level)?;
        self.level = level;
        info!("Report '{}': {level} pass over {} rows", report.name, self.row.row_count());

        self.row.rewind();
        self.page_number = 0;
        self.open_groups.clear();
        self.break_pending = false;
        self.progress.started(&self.progress_event());
        self.transition(ControllerState::Initialized);

        self.fire(EventKind::ReportInitialized, None);
        if level.performs_layout() {
            self.open_page()?;
        }
        self.fire(EventKind::ReportStarted, None);
        if let Some(header) = &report.report_header {
            self.emit(header, None)?;
        }

        self.process_rows()?;

        self.fire(EventKind::ReportFinished, None);
        if let Some(footer) = &report.report_footer {
            self.emit(footer, None)?;
        }
        if level.performs_layout() {
            self.finish_page(true)?;
            self.stats.pages = self.page_number;
        }
        self.fire(EventKind::ReportDone, None);
        if level == ProcessingLevel::ContentGeneration {
            self.stats.rows = self.row.row_count();
            self.sink.report_finished()?;
        }
        self.stats.passes.push(level);
        self.progress.finished(&self.progress_event());
        debug!("Finished {level} pass with {} pages", self.page_number);
        Ok(())
    }

    fn process_rows(&mut self) -> Result<(), ReportError> {
        let report = self.ctx.report;
        if self.row.row_count() == 0 {
            debug!("Report '{}' has no data", report.name);
            if let Some(no_data) = &report.no_data {
                self.emit(no_data, None)?;
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
                for index in from..report.groups.len() {
                    self.open_group(index)?;
                }
                self.fire(EventKind::ItemsStarted, None);
                self.transition(ControllerState::ItemsOpen);
            }

            let checkpoint = self
                .level
                .performs_layout()
                .then(|| self.evaluator.checkpoint(&self.row));
            self.fire(EventKind::ItemsAdvanced, None);
            if let Some(band) = &report.item_band {
                self.emit(band, checkpoint)?;
            }

            if let Some(from) = group_break(&report.groups, &self.row) {
                self.fire(EventKind::ItemsFinished, None);
                self.transition(ControllerState::ItemsClosed);
                for index in (from..report.groups.len()).rev() {
                    self.close_group(index)?;
                }
                open_from = Some(from);
            }

            if self.row.cursor().is_some_and(|c| (c + 1) % PROGRESS_INTERVAL == 0) {
                self.progress.updated(&self.progress_event());
            }
        }
        Ok(())
    }

    fn open_group(&mut self, index: usize) -> Result<(), ReportError> {
        let report = self.ctx.report;
        let group = &report.groups[index];
        self.fire(EventKind::GroupStarted, Some(group.name.clone()));
        self.transition(ControllerState::GroupOpen);
        let sticky_footer = match &group.footer {
            Some(footer) => self.measure(footer, true)?,
            None => Pt::ZERO,
        };
        self.open_groups.push(OpenGroup {
            index,
            sticky_footer,
            header_done: false,
            closing: false,
        });
        if let Some(header) = &group.header {
            self.emit(header, None)?;
        }
        if let Some(open) = self.open_groups.last_mut() {
            open.header_done = true;
        }
        Ok(())
    }

    fn close_group(&mut self, index: usize) -> Result<(), ReportError> {
        let report = self.ctx.report;
        let group = &report.groups[index];
        self.fire(EventKind::GroupFinished, Some(group.name.clone()));
        if let Some(open) = self.open_groups.last_mut() {
            open.closing = true;
        }
        if let Some(footer) = &group.footer {
            self.emit(footer, None)?;
        }
        self.open_groups.pop();
        self.transition(ControllerState::GroupClosed);
        Ok(())
    }

    fn fire(&mut self, kind: EventKind, group: Option<Arc<str>>) {
        let mut event = ReportEvent::new(kind, self.level, self.page_number);
        if let Some(group) = group {
            event = event.for_group(group);
        }
        self.evaluator.fire(&event, &mut self.row);
    }

    /// Builds `element` for the current row into the work tree.
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
        let diagnostics = builder.take_diagnostics();
        if self.level == ProcessingLevel::ContentGeneration {
            self.stats.diagnostics.extend(diagnostics);
        }
        Ok(built?)
    }

    /// Height `element` would take now. With `sticky_only`, non-sticky
    /// bands measure zero.
    fn measure(&mut self, element: &Element, sticky_only: bool) -> Result<Pt, ReportError> {
        if !self.level.performs_layout() {
            return Ok(Pt::ZERO);
        }
        let Some(id) = self.build(element)? else {
            return Ok(Pt::ZERO);
        };
        let node = self.work.node(id)?;
        let height = if sticky_only && !node.style.flag(StyleKey::Sticky) {
            Pt::ZERO
        } else {
            node.rect.height
        };
        self.work.free_subtree(id)?;
        Ok(height)
    }

    fn page(&self) -> Result<&LogicalPageBox, ReportError> {
        self.page.as_ref().ok_or(ReportError::NoOpenPage)
    }

    /// True while nothing but repeated headers sits in the content area.
    fn is_page_empty(&self) -> bool {
        self.page
            .as_ref()
            .is_none_or(|p| p.area_children(AreaKind::Content).len() <= self.repeated)
    }

    /// Content height to keep free for footers placed when the page closes.
    fn reserved(&self) -> Pt {
        self.page_footer_height
            + self
                .open_groups
                .iter()
                .filter(|g| !g.closing)
                .map(|g| g.sticky_footer)
                .sum::<Pt>()
    }

    /// Moves a finished band from the work tree onto the page.
    fn place(&mut self, area: AreaKind, id: BoxId) -> Result<(), ReportError> {
        let page = self.page.as_mut().ok_or(ReportError::NoOpenPage)?;
        page.place(area, &self.work, id)?;
        self.work.free_subtree(id)?;
        let active = self.work.active_count() + page.tree.active_count();
        self.stats.peak_active_boxes = self.stats.peak_active_boxes.max(active);
        Ok(())
    }

    /// Lays out `element` and flows it into the content area, breaking pages
    /// as needed. `checkpoint` is the evaluator state from before the
    /// current row was counted; a band pushed whole to the next page is
    /// counted again there.
    fn emit(&mut self, element: &Element, mut checkpoint: Option<Checkpoint>) -> Result<(), ReportError> {
        if !self.level.performs_layout() {
            return Ok(());
        }
        let Some(mut id) = self.build(element)? else {
            return Ok(());
        };
        let style = &self.work.node(id)?.style;
        let break_before = style.flag(StyleKey::PageBreakBefore);
        let break_after = style.flag(StyleKey::PageBreakAfter);

        let pending = std::mem::take(&mut self.break_pending);
        if (break_before || pending) && !self.ctx.layout.flow && !self.is_page_empty() {
            self.work.free_subtree(id)?;
            match self.restart_on_new_page(element, checkpoint.take())? {
                Some(rebuilt) => id = rebuilt,
                None => return Ok(()),
            }
        }

        loop {
            let available = self.page()?.remaining(self.reserved());
            let outcome = match available {
                None => SplitOutcome::Fits,
                Some(available) => {
                    let mut diagnostics = Vec::new();
                    let force = self.is_page_empty();
                    let outcome = split_box(&mut self.work, id, available, force, &mut diagnostics)?;
                    if self.level == ProcessingLevel::ContentGeneration {
                        self.stats.diagnostics.extend(diagnostics);
                    }
                    outcome
                }
            };
            match outcome {
                SplitOutcome::Fits => {
                    self.place(AreaKind::Content, id)?;
                    break;
                }
                SplitOutcome::Push => {
                    self.work.free_subtree(id)?;
                    match self.restart_on_new_page(element, checkpoint.take())? {
                        Some(rebuilt) => id = rebuilt,
                        None => return Ok(()),
                    }
                }
                SplitOutcome::Split { head, tail } => {
                    self.place(AreaKind::Content, head)?;
                    checkpoint = None;
                    self.break_page()?;
                    id = tail;
                }
            }
        }

        if break_after {
            self.break_pending = true;
        }
        Ok(())
    }

    /// Starts a new page and builds `element` again on it, after undoing
    /// and replaying the current row's item event when `checkpoint` is set.
    fn restart_on_new_page(
        &mut self,
        element: &Element,
        checkpoint: Option<Checkpoint>,
    ) -> Result<Option<BoxId>, ReportError> {
        if let Some(checkpoint) = &checkpoint {
            self.evaluator.rollback(checkpoint, &mut self.row);
        }
        self.break_page()?;
        if checkpoint.is_some() {
            self.fire(EventKind::ItemsAdvanced, None);
        }
        self.build(element)
    }

    fn break_page(&mut self) -> Result<(), ReportError> {
        if self.ctx.layout.flow {
            return Ok(());
        }
        self.finish_page(false)?;
        self.open_page()
    }

    fn open_page(&mut self) -> Result<(), ReportError> {
        let report = self.ctx.report;
        self.page_number += 1;
        self.page = Some(LogicalPageBox::new(self.page_number, report.page, self.ctx.layout.flow)?);
        self.repeated = 0;
        self.hide_header_on_last = false;
        debug!("Opened page {} ({})", self.page_number, self.level);
        self.fire(EventKind::PageStarted, None);

        if let Some(header) = &report.page_header {
            if let Some(id) = self.build(header)? {
                let style = &self.work.node(id)?.style;
                self.hide_header_on_last = !style.flag(StyleKey::DisplayOnLastPage);
                if self.page_number > 1 || style.flag(StyleKey::DisplayOnFirstPage) {
                    self.place(AreaKind::Header, id)?;
                } else {
                    self.work.free_subtree(id)?;
                }
            }
        }

        self.page_footer_height = match &report.page_footer {
            Some(footer) => self.measure(footer, false)?,
            None => Pt::ZERO,
        };

        let repeating: Vec<usize> = self
            .open_groups
            .iter()
            .filter(|g| g.header_done)
            .map(|g| g.index)
            .collect();
        for index in repeating {
            let Some(header) = &report.groups[index].header else { continue };
            let Some(id) = self.build(header)? else { continue };
            if self.work.node(id)?.style.flag(StyleKey::Sticky) {
                self.place(AreaKind::Content, id)?;
                self.repeated += 1;
            } else {
                self.work.free_subtree(id)?;
            }
        }
        Ok(())
    }

    fn finish_page(&mut self, last: bool) -> Result<(), ReportError> {
        if self.page.is_none() {
            return Ok(());
        }
        let report = self.ctx.report;
        self.fire(EventKind::PageFinished, None);

        let sticky: Vec<usize> = self
            .open_groups
            .iter()
            .rev()
            .filter(|g| !g.closing && g.sticky_footer > Pt::ZERO)
            .map(|g| g.index)
            .collect();
        for index in sticky {
            let Some(footer) = &report.groups[index].footer else { continue };
            if let Some(id) = self.build(footer)? {
                self.place(AreaKind::RepeatFooter, id)?;
            }
        }

        if let Some(footer) = &report.page_footer {
            if let Some(id) = self.build(footer)? {
                let style = &self.work.node(id)?.style;
                let shown = (self.page_number > 1 || style.flag(StyleKey::DisplayOnFirstPage))
                    && (!last || style.flag(StyleKey::DisplayOnLastPage));
                if shown {
                    self.place(AreaKind::Footer, id)?;
                } else {
                    self.work.free_subtree(id)?;
                }
            }
        }

        let Some(mut page) = self.page.take() else {
            return Ok(());
        };
        if last && self.hide_header_on_last {
            page.clear_area(AreaKind::Header)?;
        }
        page.finalize();
        if self.level == ProcessingLevel::ContentGeneration {
            self.sink.page_finished(&page)?;
        }
        debug!(
            "Finished page {} with {} boxes ({})",
            page.number,
            page.tree.active_count(),
            self.level
        );
        self.progress.updated(&self.progress_event());
        Ok(())
    }
}
