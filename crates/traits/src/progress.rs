//! Progress reporting for report runs.

use quire_types::ProcessingLevel;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub level: ProcessingLevel,
    /// Rows processed so far in this pass.
    pub row: usize,
    pub total_rows: usize,
    /// Pages finished so far in this pass.
    pub page: usize,
}

impl ProgressEvent {
    /// Completion of the current pass in percent.
    pub fn percent(&self) -> u8 {
        if self.total_rows == 0 {
            return 100;
        }
        ((self.row.min(self.total_rows) * 100) / self.total_rows) as u8
    }
}

/// Receives `started`, `updated` and `finished` notifications from a run.
///
/// Listeners are called on the rendering thread and must return quickly.
pub trait ProgressListener: Send + Sync + Debug {
    fn started(&self, event: &ProgressEvent);

    fn updated(&self, event: &ProgressEvent);

    fn finished(&self, event: &ProgressEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressListener;

impl ProgressListener for NoopProgressListener {
    fn started(&self, _event: &ProgressEvent) {}

    fn updated(&self, _event: &ProgressEvent) {}

    fn finished(&self, _event: &ProgressEvent) {}
}
