//! Cascades style values: defaults, inherited, class, local, then per-row
//! expression overrides.

use crate::dimension::{Dimension, Insets};
use crate::font::FontSpec;
use crate::key::StyleKey;
use crate::stylesheet::{NamedStyles, StyleSheet};
use crate::text::{LayoutMode, TextAlign, VerticalAlign};
use crate::value::{StyleValue, ValueType};
use log::warn;
use quire_types::{Color, Pt, Value};
use std::fmt;
use std::sync::{Arc, LazyLock};

static DEFAULTS: LazyLock<ResolvedStyle> = LazyLock::new(|| ResolvedStyle {
    values: StyleKey::ALL.iter().map(|k| k.default_value()).collect(),
});

/// A fully-resolved value for every [`StyleKey`]. Cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    values: Arc<[StyleValue]>,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}

/// A style problem that was absorbed instead of failing the run.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleDiagnostic {
    /// A data-bound value could not be used for the key; the previous value was kept.
    TypeMismatch {
        key: StyleKey,
        expected: ValueType,
        found: Value,
    },
    /// An element referred to a style class that does not exist.
    UnknownClass(String),
}

impl fmt::Display for StyleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleDiagnostic::TypeMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "style expression for '{key}' produced {found:?}, expected {expected}"
            ),
            StyleDiagnostic::UnknownClass(name) => write!(f, "unknown style class '{name}'"),
        }
    }
}

impl ResolvedStyle {
    pub fn get(&self, key: StyleKey) -> &StyleValue {
        &self.values[key.index()]
    }

    /// Returns a copy with one value replaced.
    pub fn with(&self, key: StyleKey, value: StyleValue) -> ResolvedStyle {
        let mut values = self.values.to_vec();
        values[key.index()] = value;
        ResolvedStyle {
            values: values.into(),
        }
    }

    pub fn flag(&self, key: StyleKey) -> bool {
        matches!(self.get(key), StyleValue::Bool(true))
    }

    pub fn length(&self, key: StyleKey) -> Dimension {
        match self.get(key) {
            StyleValue::Length(d) => *d,
            _ => Dimension::Auto,
        }
    }

    pub fn integer(&self, key: StyleKey) -> i64 {
        match self.get(key) {
            StyleValue::Integer(n) => *n,
            _ => 0,
        }
    }

    pub fn font(&self) -> FontSpec {
        let family = match self.get(StyleKey::FontFamily) {
            StyleValue::Text(t) => t.clone(),
            _ => Arc::from("Helvetica"),
        };
        let size = match self.length(StyleKey::FontSize) {
            Dimension::Pt(p) if !p.is_negative() => p,
            _ => Pt::pt(10),
        };
        FontSpec::new(family, size)
            .bold(self.flag(StyleKey::Bold))
            .italic(self.flag(StyleKey::Italic))
    }

    /// Explicit line height, or `None` to derive it from font metrics.
    pub fn line_height(&self) -> Option<Pt> {
        match self.length(StyleKey::LineHeight) {
            Dimension::Pt(p) if p > Pt::ZERO => Some(p),
            _ => None,
        }
    }

    pub fn text_align(&self) -> TextAlign {
        match self.get(StyleKey::TextAlign) {
            StyleValue::Align(a) => *a,
            _ => TextAlign::Left,
        }
    }

    pub fn vertical_align(&self) -> VerticalAlign {
        match self.get(StyleKey::VerticalAlign) {
            StyleValue::VAlign(a) => *a,
            _ => VerticalAlign::Top,
        }
    }

    pub fn text_color(&self) -> Color {
        match self.get(StyleKey::TextColor) {
            StyleValue::Color(c) => *c,
            _ => Color::BLACK,
        }
    }

    /// The background color, if not transparent.
    pub fn background(&self) -> Option<Color> {
        match self.get(StyleKey::BackgroundColor) {
            StyleValue::Color(c) if !c.is_transparent() => Some(*c),
            _ => None,
        }
    }

    pub fn layout(&self) -> LayoutMode {
        match self.get(StyleKey::Layout) {
            StyleValue::Layout(m) => *m,
            _ => LayoutMode::Block,
        }
    }

    pub fn visible(&self) -> bool {
        self.flag(StyleKey::Visible)
    }

    /// Padding with percentages resolved against `base`.
    pub fn padding(&self, base: Pt) -> Insets {
        let side = |key| {
            self.length(key)
                .resolve(base)
                .unwrap_or(Pt::ZERO)
                .clamp_non_negative()
        };
        Insets {
            top: side(StyleKey::PaddingTop),
            right: side(StyleKey::PaddingRight),
            bottom: side(StyleKey::PaddingBottom),
            left: side(StyleKey::PaddingLeft),
        }
    }

    pub fn widows(&self) -> usize {
        self.integer(StyleKey::Widows).max(0) as usize
    }

    pub fn orphans(&self) -> usize {
        self.integer(StyleKey::Orphans).max(0) as usize
    }
}

/// Resolves element styles against a set of named classes.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    classes: &'a NamedStyles,
}

impl<'a> StyleResolver<'a> {
    pub fn new(classes: &'a NamedStyles) -> Self {
        Self { classes }
    }

    /// Resolves one element's style. Pure: the same inputs always give the
    /// same output, so callers may cache the result per element and parent.
    pub fn resolve(
        &self,
        local: &StyleSheet,
        class: Option<&str>,
        inherited: Option<&ResolvedStyle>,
        diagnostics: &mut Vec<StyleDiagnostic>,
    ) -> ResolvedStyle {
        let class_sheet = class.and_then(|name| {
            let sheet = self.classes.get(name);
            if sheet.is_none() {
                warn!("Unknown style class '{name}', ignoring");
                diagnostics.push(StyleDiagnostic::UnknownClass(name.to_string()));
            }
            sheet
        });

        let values = StyleKey::ALL
            .iter()
            .map(|&key| {
                if let Some(v) = local.get(key) {
                    return v.clone();
                }
                if let Some(v) = class_sheet.and_then(|s| s.get(key)) {
                    return v.clone();
                }
                match inherited {
                    Some(parent) if key.is_inherited() => parent.get(key).clone(),
                    _ => key.default_value(),
                }
            })
            .collect();
        ResolvedStyle { values }
    }

    /// Applies the current row's style expression results on top of `base`.
    ///
    /// `Null` results leave the static value in place. Results of the wrong
    /// type are dropped with a diagnostic.
    pub fn apply_expressions<'v>(
        &self,
        base: &ResolvedStyle,
        overrides: impl IntoIterator<Item = (StyleKey, &'v Value)>,
        diagnostics: &mut Vec<StyleDiagnostic>,
    ) -> ResolvedStyle {
        let mut values: Option<Vec<StyleValue>> = None;
        for (key, value) in overrides {
            if value.is_null() {
                continue;
            }
            match StyleValue::from_data(key.value_type(), value) {
                Some(v) => {
                    values.get_or_insert_with(|| base.values.to_vec())[key.index()] = v;
                }
                None => {
                    let diagnostic = StyleDiagnostic::TypeMismatch {
                        key,
                        expected: key.value_type(),
                        found: value.clone(),
                    };
                    warn!("{diagnostic}; keeping previous value");
                    diagnostics.push(diagnostic);
                }
            }
        }
        match values {
            Some(values) => ResolvedStyle {
                values: values.into(),
            },
            None => base.clone(),
        }
    }
}
