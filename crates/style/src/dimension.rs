//! Defines primitives for size and spacing.

use crate::parsers::{self, StyleParseError};
use quire_types::Pt;
use std::fmt;
use std::str::FromStr;

/// A length that may depend on the containing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    Pt(Pt),
    /// Percentage of the containing block in basis points (1% = 100).
    Percent(i64),
    #[default]
    Auto,
}

impl Dimension {
    pub fn pt(points: i64) -> Self {
        Dimension::Pt(Pt::pt(points))
    }

    pub fn percent(percent: i64) -> Self {
        Dimension::Percent(percent * 100)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    /// Resolves against `base`; `Auto` has no value.
    pub fn resolve(&self, base: Pt) -> Option<Pt> {
        match self {
            Dimension::Pt(v) => Some(*v),
            Dimension::Percent(bp) => Some(base.percent_bp(*bp)),
            Dimension::Auto => None,
        }
    }
}

impl FromStr for Dimension {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parsers::parse_dimension(s)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Pt(v) => write!(f, "{v}"),
            Dimension::Percent(bp) => write!(f, "{}%", *bp as f64 / 100.0),
            Dimension::Auto => f.write_str("auto"),
        }
    }
}

/// Four-sided spacing in fixed-point units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Insets {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Insets {
    pub fn all(value: Pt) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }
}

impl FromStr for Insets {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parsers::parse_insets(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_percentages() {
        assert_eq!(Dimension::percent(50).resolve(Pt::pt(300)), Some(Pt::pt(150)));
        assert_eq!(Dimension::pt(10).resolve(Pt::pt(300)), Some(Pt::pt(10)));
        assert_eq!(Dimension::Auto.resolve(Pt::pt(300)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimension::percent(25).to_string(), "25%");
        assert_eq!(Dimension::pt(3).to_string(), "3pt");
        assert_eq!(Dimension::Auto.to_string(), "auto");
    }
}
