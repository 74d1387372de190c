use crate::dimension::Dimension;
use crate::parsers;
use crate::text::{LayoutMode, TextAlign, VerticalAlign};
use quire_types::{Color, Pt, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Length,
    Integer,
    Text,
    Color,
    Align,
    VAlign,
    Layout,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Length => "length",
            ValueType::Integer => "integer",
            ValueType::Text => "text",
            ValueType::Color => "color",
            ValueType::Align => "text-align",
            ValueType::VAlign => "vertical-align",
            ValueType::Layout => "layout",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleValue {
    Bool(bool),
    Length(Dimension),
    Integer(i64),
    Text(Arc<str>),
    Color(Color),
    Align(TextAlign),
    VAlign(VerticalAlign),
    Layout(LayoutMode),
}

impl StyleValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            StyleValue::Bool(_) => ValueType::Bool,
            StyleValue::Length(_) => ValueType::Length,
            StyleValue::Integer(_) => ValueType::Integer,
            StyleValue::Text(_) => ValueType::Text,
            StyleValue::Color(_) => ValueType::Color,
            StyleValue::Align(_) => ValueType::Align,
            StyleValue::VAlign(_) => ValueType::VAlign,
            StyleValue::Layout(_) => ValueType::Layout,
        }
    }

    pub fn pt(points: i64) -> Self {
        StyleValue::Length(Dimension::pt(points))
    }

    pub fn text(s: impl Into<Arc<str>>) -> Self {
        StyleValue::Text(s.into())
    }

    /// Interprets a data-bound value as a value of type `ty`.
    ///
    /// Only natural encodings are accepted: booleans for flags, numbers
    /// (points) or length strings for lengths, strings for names and
    /// colors. Anything else is rejected rather than converted.
    pub fn from_data(ty: ValueType, value: &Value) -> Option<StyleValue> {
        match (ty, value) {
            (ValueType::Bool, Value::Bool(b)) => Some(StyleValue::Bool(*b)),
            (ValueType::Length, Value::Number(n)) if n.is_finite() => {
                Some(StyleValue::Length(Dimension::Pt(Pt::from_f64(*n))))
            }
            (ValueType::Length, Value::Text(s)) => {
                parsers::parse_dimension(s).ok().map(StyleValue::Length)
            }
            (ValueType::Integer, Value::Number(n)) if n.fract() == 0.0 && n.is_finite() => {
                Some(StyleValue::Integer(*n as i64))
            }
            (ValueType::Text, Value::Text(s)) => Some(StyleValue::Text(s.clone())),
            (ValueType::Color, Value::Text(s)) => s.parse().ok().map(StyleValue::Color),
            (ValueType::Align, Value::Text(s)) => s.parse().ok().map(StyleValue::Align),
            (ValueType::VAlign, Value::Text(s)) => s.parse().ok().map(StyleValue::VAlign),
            (ValueType::Layout, Value::Text(s)) => s.parse().ok().map(StyleValue::Layout),
            _ => None,
        }
    }
}

impl From<bool> for StyleValue {
    fn from(v: bool) -> Self {
        StyleValue::Bool(v)
    }
}

impl From<Dimension> for StyleValue {
    fn from(v: Dimension) -> Self {
        StyleValue::Length(v)
    }
}

impl From<Pt> for StyleValue {
    fn from(v: Pt) -> Self {
        StyleValue::Length(Dimension::Pt(v))
    }
}

impl From<Color> for StyleValue {
    fn from(v: Color) -> Self {
        StyleValue::Color(v)
    }
}

impl From<TextAlign> for StyleValue {
    fn from(v: TextAlign) -> Self {
        StyleValue::Align(v)
    }
}

impl From<VerticalAlign> for StyleValue {
    fn from(v: VerticalAlign) -> Self {
        StyleValue::VAlign(v)
    }
}

impl From<LayoutMode> for StyleValue {
    fn from(v: LayoutMode) -> Self {
        StyleValue::Layout(v)
    }
}

impl From<&str> for StyleValue {
    fn from(v: &str) -> Self {
        StyleValue::Text(Arc::from(v))
    }
}

impl From<i64> for StyleValue {
    fn from(v: i64) -> Self {
        StyleValue::Integer(v)
    }
}
