use serde::{Deserialize, Serialize};
use std::fmt;

/// The processing passes a report run goes through, in order.
///
/// Expressions are re-evaluated in every pass; the pass tells functions
/// which of their results are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessingLevel {
    /// Computes group structure and totals. No layout happens.
    StructuralPreprocessing,
    /// Lays out content to find page boundaries. No output is produced.
    Pagination,
    /// Lays out content and emits finished pages.
    ContentGeneration,
}

impl ProcessingLevel {
    pub const ALL: [ProcessingLevel; 3] = [
        ProcessingLevel::StructuralPreprocessing,
        ProcessingLevel::Pagination,
        ProcessingLevel::ContentGeneration,
    ];

    pub fn next(self) -> Option<ProcessingLevel> {
        match self {
            ProcessingLevel::StructuralPreprocessing => Some(ProcessingLevel::Pagination),
            ProcessingLevel::Pagination => Some(ProcessingLevel::ContentGeneration),
            ProcessingLevel::ContentGeneration => None,
        }
    }

    pub fn performs_layout(self) -> bool {
        !matches!(self, ProcessingLevel::StructuralPreprocessing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingLevel::StructuralPreprocessing => "structural-preprocessing",
            ProcessingLevel::Pagination => "pagination",
            ProcessingLevel::ContentGeneration => "content-generation",
        }
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
