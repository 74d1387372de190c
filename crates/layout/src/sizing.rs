//! Width and height resolution under the two compatibility strategies.

use crate::LayoutDiagnostic;
use crate::config::CompatibilityMode;
use log::warn;
use quire_style::{Dimension, ResolvedStyle, StyleKey};
use quire_types::{InstanceId, Pt};

/// Resolves style lengths for one box and records what had to be corrected.
pub struct Sizer<'d> {
    pub mode: CompatibilityMode,
    pub element: Option<InstanceId>,
    pub diagnostics: &'d mut Vec<LayoutDiagnostic>,
}

impl Sizer<'_> {
    /// Resolves `key` against `base`. `Auto` has no value.
    ///
    /// Under legacy sizing a negative length is a percentage of `base`
    /// (`-50pt` reads as 50%). Under current sizing it is invalid and clamps
    /// to zero.
    pub fn length(&mut self, style: &ResolvedStyle, key: StyleKey, base: Pt) -> Option<Pt> {
        match style.length(key) {
            Dimension::Pt(v) if v.is_negative() => match self.mode {
                CompatibilityMode::Legacy38 => Some(base.mul_ratio(-v.units(), 100_000)),
                CompatibilityMode::Current => {
                    warn!("Negative {key} of {v} on {:?}, clamping to zero", self.element);
                    self.diagnostics.push(LayoutDiagnostic::NegativeLength {
                        element: self.element,
                        key,
                        value: v,
                    });
                    Some(Pt::ZERO)
                }
            },
            other => other.resolve(base).map(Pt::clamp_non_negative),
        }
    }

    /// The border-box width: explicit `width` or `auto_width`, clamped into
    /// `[min-width, max-width]`. The minimum wins over the maximum.
    pub fn width(&mut self, style: &ResolvedStyle, base: Pt, auto_width: Pt) -> Pt {
        let explicit = self.length(style, StyleKey::Width, base);
        let min = self.length(style, StyleKey::MinWidth, base).unwrap_or(Pt::ZERO);
        let max = self.length(style, StyleKey::MaxWidth, base);
        clamp(explicit.unwrap_or(auto_width), min, max)
    }

    /// True if the style declares a width of its own.
    pub fn has_width(&self, style: &ResolvedStyle) -> bool {
        !style.length(StyleKey::Width).is_auto()
    }

    /// The border-box height for `content` height of content.
    pub fn height(&mut self, style: &ResolvedStyle, base: Pt, content: Pt) -> Pt {
        let explicit = self.length(style, StyleKey::Height, base);
        let min = self.length(style, StyleKey::MinHeight, base).unwrap_or(Pt::ZERO);
        let max = self.length(style, StyleKey::MaxHeight, base);
        let height = match self.mode {
            CompatibilityMode::Legacy38 => {
                let declared = explicit.unwrap_or(min);
                if style.flag(StyleKey::DynamicHeight) {
                    declared.max(content)
                } else if explicit.is_some() || !min.is_zero() {
                    declared
                } else {
                    content
                }
            }
            CompatibilityMode::Current => content.max(explicit.unwrap_or(Pt::ZERO)).max(min),
        };
        clamp(height, min, max)
    }

    /// Whether children of a row take the full height of the row.
    pub fn stretches_row_children(&self) -> bool {
        self.mode == CompatibilityMode::Current
    }
}

fn clamp(value: Pt, min: Pt, max: Option<Pt>) -> Pt {
    let capped = match max {
        Some(max) => value.min(max),
        None => value,
    };
    capped.max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_style::StyleValue;

    fn style(entries: &[(StyleKey, Dimension)]) -> ResolvedStyle {
        entries.iter().fold(ResolvedStyle::default(), |s, (k, d)| {
            s.with(*k, StyleValue::Length(*d))
        })
    }

    fn sizer(mode: CompatibilityMode, diags: &mut Vec<LayoutDiagnostic>) -> Sizer<'_> {
        Sizer {
            mode,
            element: None,
            diagnostics: diags,
        }
    }

    #[test]
    fn test_negative_min_width_is_percentage_in_legacy_mode() {
        let s = style(&[(StyleKey::MinWidth, Dimension::pt(-50))]);
        let mut diags = Vec::new();
        let w = sizer(CompatibilityMode::Legacy38, &mut diags).width(&s, Pt::pt(400), Pt::ZERO);
        assert_eq!(w, Pt::pt(200));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_negative_length_clamps_in_current_mode() {
        let s = style(&[(StyleKey::MinWidth, Dimension::pt(-50))]);
        let mut diags = Vec::new();
        let w = sizer(CompatibilityMode::Current, &mut diags).width(&s, Pt::pt(400), Pt::ZERO);
        assert_eq!(w, Pt::ZERO);
        assert!(matches!(
            diags.as_slice(),
            [LayoutDiagnostic::NegativeLength {
                key: StyleKey::MinWidth,
                ..
            }]
        ));
    }

    #[test]
    fn test_min_height_fixes_height_only_in_legacy_mode() {
        let s = style(&[(StyleKey::MinHeight, Dimension::pt(20))]);
        let mut diags = Vec::new();
        let content = Pt::pt(42);
        assert_eq!(
            sizer(CompatibilityMode::Legacy38, &mut diags).height(&s, Pt::ZERO, content),
            Pt::pt(20)
        );
        assert_eq!(
            sizer(CompatibilityMode::Current, &mut diags).height(&s, Pt::ZERO, content),
            Pt::pt(42)
        );

        let dynamic = s.with(StyleKey::DynamicHeight, StyleValue::Bool(true));
        assert_eq!(
            sizer(CompatibilityMode::Legacy38, &mut diags).height(&dynamic, Pt::ZERO, content),
            Pt::pt(42)
        );
    }

    #[test]
    fn test_max_width_caps_but_min_wins() {
        let s = style(&[
            (StyleKey::Width, Dimension::percent(100)),
            (StyleKey::MaxWidth, Dimension::pt(150)),
        ]);
        let mut diags = Vec::new();
        let mut sz = sizer(CompatibilityMode::Current, &mut diags);
        assert_eq!(sz.width(&s, Pt::pt(400), Pt::ZERO), Pt::pt(150));

        let s = s.with(StyleKey::MinWidth, StyleValue::Length(Dimension::pt(180)));
        assert_eq!(sz.width(&s, Pt::pt(400), Pt::ZERO), Pt::pt(180));
    }

    #[test]
    fn test_auto_height_follows_content_in_both_modes() {
        let s = ResolvedStyle::default();
        let mut diags = Vec::new();
        for mode in [CompatibilityMode::Legacy38, CompatibilityMode::Current] {
            assert_eq!(sizer(mode, &mut diags).height(&s, Pt::ZERO, Pt::pt(33)), Pt::pt(33));
        }
    }
}
