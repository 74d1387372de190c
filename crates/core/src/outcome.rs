use crate::error::ReportError;
use quire_layout::LayoutDiagnostic;
use quire_types::ProcessingLevel;

/// Counters collected while a report runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub pages: usize,
    pub rows: usize,
    pub passes: Vec<ProcessingLevel>,
    /// Largest number of live render boxes seen at once.
    pub peak_active_boxes: usize,
    /// Layout problems absorbed during content generation.
    pub diagnostics: Vec<LayoutDiagnostic>,
    pub fast_path: bool,
}

/// What a caller gets back from a run, successful or not.
#[derive(Debug)]
pub struct RunOutcome {
    pub succeeded: bool,
    pub error_reason: Option<String>,
    pub error: Option<ReportError>,
    pub pages: usize,
    pub statistics: RunStatistics,
}

impl RunOutcome {
    pub fn success(statistics: RunStatistics) -> Self {
        Self {
            succeeded: true,
            error_reason: None,
            error: None,
            pages: statistics.pages,
            statistics,
        }
    }

    pub fn failure(error: ReportError, reason: Option<&str>) -> Self {
        Self {
            succeeded: false,
            error_reason: Some(reason.map_or_else(|| error.to_string(), str::to_string)),
            error: Some(error),
            pages: 0,
            statistics: RunStatistics::default(),
        }
    }

    pub fn into_result(self) -> Result<RunStatistics, ReportError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.statistics),
        }
    }
}
