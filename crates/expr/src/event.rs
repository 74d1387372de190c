use quire_types::ProcessingLevel;
use std::fmt;
use std::sync::Arc;

/// Lifecycle events delivered to functions, in the order the pagination
/// controller guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ReportInitialized,
    ReportStarted,
    GroupStarted,
    GroupFinished,
    ItemsStarted,
    ItemsAdvanced,
    ItemsFinished,
    ReportFinished,
    ReportDone,
    PageStarted,
    PageFinished,
}

impl EventKind {
    /// Events that may only be delivered while a page is open.
    pub fn requires_open_page(self) -> bool {
        matches!(
            self,
            EventKind::ReportStarted
                | EventKind::GroupStarted
                | EventKind::ItemsStarted
                | EventKind::ItemsAdvanced
                | EventKind::PageFinished
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::ReportInitialized => "reportInitialized",
            EventKind::ReportStarted => "reportStarted",
            EventKind::GroupStarted => "groupStarted",
            EventKind::GroupFinished => "groupFinished",
            EventKind::ItemsStarted => "itemsStarted",
            EventKind::ItemsAdvanced => "itemsAdvanced",
            EventKind::ItemsFinished => "itemsFinished",
            EventKind::ReportFinished => "reportFinished",
            EventKind::ReportDone => "reportDone",
            EventKind::PageStarted => "pageStarted",
            EventKind::PageFinished => "pageFinished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEvent {
    pub kind: EventKind,
    pub level: ProcessingLevel,
    /// The group a group event belongs to.
    pub group: Option<Arc<str>>,
    /// The current page number, starting at 1; 0 before the first page.
    pub page: usize,
}

impl ReportEvent {
    pub fn new(kind: EventKind, level: ProcessingLevel, page: usize) -> Self {
        Self {
            kind,
            level,
            group: None,
            page,
        }
    }

    pub fn for_group(mut self, group: Arc<str>) -> Self {
        self.group = Some(group);
        self
    }

    pub fn is_group(&self, name: Option<&str>) -> bool {
        match name {
            Some(name) => self.group.as_deref() == Some(name),
            None => false,
        }
    }
}
