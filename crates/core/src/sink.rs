//! Receivers of finished pages.

use crate::error::ReportError;
use crate::writers::ContentWriter;
use quire_layout::{AreaKind, FlowSelector, LogicalPageBox};

/// Receives every finished page of the content pass, in order.
///
/// Pages are handed out by shared reference; a sink that keeps them must
/// clone.
pub trait PageSink {
    fn page_finished(&mut self, page: &LogicalPageBox) -> Result<(), ReportError>;

    fn report_finished(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Keeps the selected pages in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    selector: FlowSelector,
    pages: Vec<LogicalPageBox>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector(selector: FlowSelector) -> Self {
        Self {
            selector,
            pages: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[LogicalPageBox] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<LogicalPageBox> {
        self.pages
    }
}

impl PageSink for CollectingSink {
    fn page_finished(&mut self, page: &LogicalPageBox) -> Result<(), ReportError> {
        if self.selector.accepts(page.number) {
            self.pages.push(page.clone());
        }
        Ok(())
    }
}

/// Counts pages and boxes without keeping anything.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingSink {
    pub pages: usize,
    pub boxes: usize,
}

impl PageSink for CountingSink {
    fn page_finished(&mut self, page: &LogicalPageBox) -> Result<(), ReportError> {
        self.pages += 1;
        self.boxes += page.tree.active_count();
        Ok(())
    }
}

/// Feeds the bands of each selected page to a content writer, area by
/// area: header, content, repeat-footer, footer.
pub struct WriterSink<'w> {
    writer: &'w mut dyn ContentWriter,
    selector: FlowSelector,
}

impl<'w> WriterSink<'w> {
    pub fn new(writer: &'w mut dyn ContentWriter) -> Self {
        Self {
            writer,
            selector: FlowSelector::All,
        }
    }

    pub fn with_selector(mut self, selector: FlowSelector) -> Self {
        self.selector = selector;
        self
    }
}

impl PageSink for WriterSink<'_> {
    fn page_finished(&mut self, page: &LogicalPageBox) -> Result<(), ReportError> {
        if !self.selector.accepts(page.number) {
            return Ok(());
        }
        for kind in AreaKind::ALL {
            for band in page.area_children(kind) {
                self.writer.write_band(&page.tree, band)?;
            }
        }
        Ok(())
    }

    fn report_finished(&mut self) -> Result<(), ReportError> {
        self.writer.finish()
    }
}
