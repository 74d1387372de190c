//! Text measurement used by line breaking.
//!
//! The engine does not shape text. It asks a [`TextMetrics`] provider for
//! advance widths and line heights and works with the results as exact
//! fixed-point values.

use quire_style::FontSpec;
use quire_types::Pt;
use std::fmt::Debug;
use std::sync::Arc;

pub trait TextMetrics: Send + Sync + Debug {
    /// Advance width of `text` set in `font`.
    fn text_width(&self, text: &str, font: &FontSpec) -> Pt;

    /// Default line height for `font` when the style sets none.
    fn line_height(&self, font: &FontSpec) -> Pt;

    /// Distance from the top of a line to its baseline.
    fn ascent(&self, font: &FontSpec) -> Pt {
        font.size.mul_ratio(800, 1000)
    }

    fn name(&self) -> &'static str;
}

pub type SharedMetrics = Arc<dyn TextMetrics>;

/// Every character has the same advance, a fixed fraction of the font size.
///
/// Deterministic and trivial to reason about in tests.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    /// Character advance in thousandths of an em.
    pub advance: i64,
    /// Line height in thousandths of an em.
    pub leading: i64,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance: 600,
            leading: 1200,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> Pt {
        let chars = text.chars().count() as i64;
        font.size.mul_ratio(self.advance * chars, 1000)
    }

    fn line_height(&self, font: &FontSpec) -> Pt {
        font.size.mul_ratio(self.leading, 1000)
    }

    fn name(&self) -> &'static str {
        "monospace"
    }
}

/// Advance widths from the standard Helvetica AFM table, in 1/1000 em, for
/// the printable ASCII range starting at the space character.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Proportional widths approximating Helvetica. Characters outside the table
/// use the digit width.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionalMetrics;

impl ProportionalMetrics {
    fn char_width(c: char) -> i64 {
        let code = c as u32;
        if (32..127).contains(&code) {
            i64::from(HELVETICA_WIDTHS[(code - 32) as usize])
        } else {
            556
        }
    }
}

impl TextMetrics for ProportionalMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> Pt {
        let mut em: i64 = text.chars().map(Self::char_width).sum();
        if font.bold {
            // Bold faces run roughly five percent wider.
            em += em / 20;
        }
        font.size.mul_ratio(em, 1000)
    }

    fn line_height(&self, font: &FontSpec) -> Pt {
        font.size.mul_ratio(1150, 1000)
    }

    fn ascent(&self, font: &FontSpec) -> Pt {
        font.size.mul_ratio(718, 1000)
    }

    fn name(&self) -> &'static str {
        "proportional"
    }
}
