//! Box tree construction, sizing, line breaking and page breaking.
//!
//! The [`BoxBuilder`] turns a band of the report model into a subtree of
//! the arena [`RenderTree`], fully sized and positioned at its own origin.
//! The pagination controller then moves finished bands onto a
//! [`LogicalPageBox`], splitting them with [`breaks::split_box`] when they
//! do not fit.

use quire_data::DataFactoryError;
use quire_style::{StyleDiagnostic, StyleKey};
use quire_types::{InstanceId, Pt};
use thiserror::Error;

pub mod breaks;
pub mod builder;
pub mod config;
pub mod crosstab;
pub mod page;
pub mod paragraph;
pub mod select;
pub mod sizing;
pub mod text;
pub mod tree;

pub use builder::{BoxBuilder, QuerySource};
pub use config::{CompatibilityMode, LayoutConfig};
pub use crosstab::{CrosstabGrid, find_cell};
pub use page::{AreaKind, LogicalPageBox};
pub use select::{FlowSelector, NodeMatcher};
pub use tree::{BoxId, CellKey, GeometryViolation, NodeKind, RenderNode, RenderTree, verify_geometry};

// Re-export geometry types used throughout the layout crate.
pub use quire_types::geometry::{BoxConstraints, Rect, Size};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("{0} is no longer part of the render tree")]
    StaleBox(BoxId),
    #[error("{0} cannot be appended to itself")]
    Cycle(BoxId),
    #[error("Data for a sub-report or crosstab could not be loaded: {0}")]
    Query(#[from] DataFactoryError),
}

/// A layout problem absorbed with a best-effort fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutDiagnostic {
    Style {
        element: Option<InstanceId>,
        diagnostic: StyleDiagnostic,
    },
    NegativeLength {
        element: Option<InstanceId>,
        key: StyleKey,
        value: Pt,
    },
    /// Content taller than its box was cut off.
    Clipped {
        element: Option<InstanceId>,
        content: Pt,
        limit: Pt,
    },
    /// An unbreakable box taller than a whole page.
    Oversized {
        element: Option<InstanceId>,
        height: Pt,
        available: Pt,
    },
}

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod builder_test;
