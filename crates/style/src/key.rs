//! The fixed set of style keys known to the engine.

use crate::dimension::Dimension;
use crate::text::{LayoutMode, TextAlign, VerticalAlign};
use crate::value::{StyleValue, ValueType};
use quire_types::{Color, Pt};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

macro_rules! style_keys {
    ($($variant:ident => $name:literal, $ty:ident, $inherited:literal;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StyleKey {
            $($variant,)*
        }

        impl StyleKey {
            pub const ALL: &'static [StyleKey] = &[$(StyleKey::$variant,)*];
            pub const COUNT: usize = StyleKey::ALL.len();

            pub fn name(self) -> &'static str {
                match self {
                    $(StyleKey::$variant => $name,)*
                }
            }

            pub fn value_type(self) -> ValueType {
                match self {
                    $(StyleKey::$variant => ValueType::$ty,)*
                }
            }

            /// Whether a child without a local value takes its parent's.
            pub fn is_inherited(self) -> bool {
                match self {
                    $(StyleKey::$variant => $inherited,)*
                }
            }
        }
    };
}

style_keys! {
    FontFamily => "font-family", Text, true;
    FontSize => "font-size", Length, true;
    Bold => "bold", Bool, true;
    Italic => "italic", Bool, true;
    LineHeight => "line-height", Length, true;
    TextAlign => "text-align", Align, true;
    VerticalAlign => "vertical-align", VAlign, false;
    TextColor => "text-color", Color, true;
    BackgroundColor => "background-color", Color, false;
    Visible => "visible", Bool, false;
    InvisibleConsumesSpace => "invisible-consumes-space", Bool, false;
    Layout => "layout", Layout, false;
    PosX => "x", Length, false;
    PosY => "y", Length, false;
    Width => "width", Length, false;
    Height => "height", Length, false;
    MinWidth => "min-width", Length, false;
    MinHeight => "min-height", Length, false;
    MaxWidth => "max-width", Length, false;
    MaxHeight => "max-height", Length, false;
    PaddingTop => "padding-top", Length, false;
    PaddingRight => "padding-right", Length, false;
    PaddingBottom => "padding-bottom", Length, false;
    PaddingLeft => "padding-left", Length, false;
    DynamicHeight => "dynamic-height", Bool, false;
    OverflowX => "overflow-x", Bool, false;
    OverflowY => "overflow-y", Bool, false;
    Widows => "widows", Integer, true;
    Orphans => "orphans", Integer, true;
    AvoidPageBreakInside => "avoid-page-break-inside", Bool, false;
    PageBreakBefore => "pagebreak-before", Bool, false;
    PageBreakAfter => "pagebreak-after", Bool, false;
    Sticky => "sticky", Bool, false;
    DisplayOnFirstPage => "display-on-first-page", Bool, false;
    DisplayOnLastPage => "display-on-last-page", Bool, false;
    WrapText => "wrap-text", Bool, true;
}

impl StyleKey {
    /// Position of the key in per-key tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn default_value(self) -> StyleValue {
        match self {
            StyleKey::FontFamily => StyleValue::Text(Arc::from("Helvetica")),
            StyleKey::FontSize => StyleValue::Length(Dimension::Pt(Pt::pt(10))),
            StyleKey::TextAlign => StyleValue::Align(TextAlign::Left),
            StyleKey::VerticalAlign => StyleValue::VAlign(VerticalAlign::Top),
            StyleKey::TextColor => StyleValue::Color(Color::BLACK),
            StyleKey::BackgroundColor => StyleValue::Color(Color::TRANSPARENT),
            StyleKey::Layout => StyleValue::Layout(LayoutMode::Block),
            StyleKey::Width | StyleKey::Height | StyleKey::MaxWidth | StyleKey::MaxHeight => {
                StyleValue::Length(Dimension::Auto)
            }
            StyleKey::Visible
            | StyleKey::DisplayOnFirstPage
            | StyleKey::DisplayOnLastPage
            | StyleKey::WrapText => StyleValue::Bool(true),
            StyleKey::Widows | StyleKey::Orphans => StyleValue::Integer(0),
            key => match key.value_type() {
                ValueType::Bool => StyleValue::Bool(false),
                ValueType::Length => StyleValue::Length(Dimension::Pt(Pt::ZERO)),
                ValueType::Integer => StyleValue::Integer(0),
                ValueType::Text => StyleValue::Text(Arc::from("")),
                ValueType::Color => StyleValue::Color(Color::BLACK),
                ValueType::Align => StyleValue::Align(TextAlign::default()),
                ValueType::VAlign => StyleValue::VAlign(VerticalAlign::default()),
                ValueType::Layout => StyleValue::Layout(LayoutMode::default()),
            },
        }
    }

    pub fn from_name(name: &str) -> Option<StyleKey> {
        StyleKey::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl FromStr for StyleKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleKey::from_name(s).ok_or_else(|| format!("Unknown style key: '{s}'"))
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
