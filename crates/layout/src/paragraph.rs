use crate::text::{self, LineLayout, TextRun};
use crate::LayoutError;
use crate::tree::{BoxId, NodeKind, RenderNode, RenderTree};
use quire_style::{Insets, ResolvedStyle, StyleKey, TextAlign, VerticalAlign};
use quire_traits::TextMetrics;
use quire_types::{ElementName, InstanceId, Pt, Rect};

/// Text contributed to a paragraph pool by one element.
#[derive(Debug, Clone)]
pub struct StyledRun {
    pub text: String,
    pub style: ResolvedStyle,
    pub element: Option<InstanceId>,
    pub name: Option<ElementName>,
}

/// Explicit `line-height` if set, otherwise the metrics' default for the font.
pub fn line_height_for(style: &ResolvedStyle, metrics: &dyn TextMetrics) -> Pt {
    style
        .line_height()
        .unwrap_or_else(|| metrics.line_height(&style.font()))
}

/// Lays out `runs` as one paragraph box at the origin, `width` wide.
///
/// The box gets `Line` children stacked from the top padding edge, each
/// holding `Text` boxes. With `word_boxes` every word gets a box of its own
/// instead of one box per run segment. Returns the paragraph and the height
/// of its lines.
pub fn layout_paragraph(
    tree: &mut RenderTree,
    metrics: &dyn TextMetrics,
    style: &ResolvedStyle,
    runs: &[StyledRun],
    width: Pt,
    padding: Insets,
    word_boxes: bool,
) -> Result<(BoxId, Pt), LayoutError> {
    let inner = (width - padding.horizontal()).clamp_non_negative();
    let text_runs: Vec<TextRun<'_>> = runs
        .iter()
        .map(|r| TextRun {
            text: &r.text,
            font: r.style.font(),
            line_height: line_height_for(&r.style, metrics),
        })
        .collect();
    let max_width = style.flag(StyleKey::WrapText).then_some(inner);
    let lines = text::break_lines(&text_runs, max_width, metrics);
    let content = text::lines_height(&lines);

    let paragraph = tree.alloc(RenderNode::new(NodeKind::Paragraph).with_style(style.clone()).with_rect(
        Rect::new(Pt::ZERO, Pt::ZERO, width, content + padding.vertical()),
    ));

    let align = style.text_align();
    let mut y = padding.top;
    for line in &lines {
        let line_id = tree.alloc(
            RenderNode::new(NodeKind::Line)
                .with_style(style.clone())
                .with_rect(Rect::new(padding.left, y, inner, line.height)),
        );
        let overflowing = line.width > inner;
        if overflowing {
            if let Some(node) = tree.get_mut(line_id) {
                node.overflow_x = true;
            }
            if let Some(node) = tree.get_mut(paragraph) {
                node.overflow_x = true;
            }
        }
        let placement = Placement {
            align,
            left: padding.left,
            y,
            inner,
            word_boxes,
        };
        place_items(tree, metrics, line_id, line, runs, &placement)?;
        tree.append_child(paragraph, line_id)?;
        y += line.height;
    }
    Ok((paragraph, content))
}

struct Placement {
    align: TextAlign,
    left: Pt,
    y: Pt,
    inner: Pt,
    word_boxes: bool,
}

fn place_items(
    tree: &mut RenderTree,
    metrics: &dyn TextMetrics,
    line_id: BoxId,
    line: &LineLayout,
    runs: &[StyledRun],
    placement: &Placement,
) -> Result<(), LayoutError> {
    let Placement {
        align,
        left,
        y,
        inner,
        word_boxes,
    } = *placement;
    let free = (inner - line.width).clamp_non_negative();
    if align == TextAlign::Justify && !line.hard_end {
        let words = split_words(line, runs, metrics);
        if words.len() > 1 {
            let gaps = (words.len() - 1) as i64;
            let spacing = inner - words.iter().map(|(_, _, w)| *w).sum::<Pt>();
            let per_gap = spacing / gaps;
            let mut remainder = spacing.units() - per_gap.units() * gaps;
            let mut x = left;
            for (run, word, width) in words {
                push_text(tree, line_id, &runs[run], word, Rect::new(x, y, width, line.height))?;
                x += width + per_gap;
                if remainder > 0 {
                    x += Pt::from_units(1);
                    remainder -= 1;
                }
            }
            return Ok(());
        }
    }

    let offset = match align {
        TextAlign::Left | TextAlign::Justify => Pt::ZERO,
        TextAlign::Center => free / 2,
        TextAlign::Right => free,
    };
    if word_boxes {
        for item in &line.items {
            let font = runs[item.run].style.font();
            let mut x = left + offset + item.x;
            for (start, piece) in word_pieces(&item.text) {
                let width = metrics.text_width(piece, &font);
                if !start {
                    x += width;
                    continue;
                }
                push_text(tree, line_id, &runs[item.run], piece, Rect::new(x, y, width, line.height))?;
                x += width;
            }
        }
        return Ok(());
    }
    for item in &line.items {
        let rect = Rect::new(left + offset + item.x, y, item.width, line.height);
        push_text(tree, line_id, &runs[item.run], &item.text, rect)?;
    }
    Ok(())
}

fn split_words<'l>(line: &'l LineLayout, runs: &[StyledRun], metrics: &dyn TextMetrics) -> Vec<(usize, &'l str, Pt)> {
    line.items
        .iter()
        .flat_map(|item| {
            let font = runs[item.run].style.font();
            item.text
                .split_whitespace()
                .map(move |w| (item.run, w, metrics.text_width(w, &font)))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Splits text into alternating word and whitespace pieces. The flag is
/// true for words.
fn word_pieces(text: &str) -> Vec<(bool, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_word = None;
    for (i, c) in text.char_indices() {
        let word = !c.is_whitespace();
        match in_word {
            Some(current) if current != word => {
                pieces.push((current, &text[start..i]));
                start = i;
            }
            _ => {}
        }
        in_word = Some(word);
    }
    if let Some(current) = in_word {
        pieces.push((current, &text[start..]));
    }
    pieces
}

fn push_text(tree: &mut RenderTree, line: BoxId, run: &StyledRun, text: &str, rect: Rect) -> Result<(), LayoutError> {
    let mut node = RenderNode::new(NodeKind::Text)
        .with_style(run.style.clone())
        .with_rect(rect)
        .with_text(text);
    node.element = run.element;
    node.name = run.name.clone();
    let id = tree.alloc(node);
    tree.append_child(line, id)
}

/// Shifts the lines of a paragraph inside a box taller than its content.
pub fn align_vertically(tree: &mut RenderTree, paragraph: BoxId, slack: Pt) {
    let Some(node) = tree.get(paragraph) else { return };
    let shift = match node.style.vertical_align() {
        VerticalAlign::Top => Pt::ZERO,
        VerticalAlign::Middle => slack / 2,
        VerticalAlign::Bottom => slack,
    };
    if shift.is_zero() {
        return;
    }
    let lines: Vec<BoxId> = tree.children(paragraph).collect();
    for line in lines {
        tree.translate(line, Pt::ZERO, shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_style::StyleValue;
    use quire_traits::MonospaceMetrics;

    fn run(text: &str, style: &ResolvedStyle) -> StyledRun {
        StyledRun {
            text: text.to_string(),
            style: style.clone(),
            element: None,
            name: None,
        }
    }

    fn text_boxes(tree: &RenderTree, root: BoxId) -> Vec<(String, Rect)> {
        tree.descendants(root)
            .into_iter()
            .filter_map(|id| tree.get(id))
            .filter(|n| n.kind == NodeKind::Text)
            .map(|n| (n.text.as_deref().unwrap_or_default().to_string(), n.rect))
            .collect()
    }

    #[test]
    fn test_right_and_center_alignment() {
        let m = MonospaceMetrics::default();
        let mut tree = RenderTree::new();
        let right = ResolvedStyle::default().with(StyleKey::TextAlign, StyleValue::Align(TextAlign::Right));
        let (p, _) = layout_paragraph(&mut tree, &m, &right, &[run("ab", &right)], Pt::pt(100), Insets::default(), false).unwrap();
        assert_eq!(text_boxes(&tree, p)[0].1.x, Pt::pt(88));

        let center = right.with(StyleKey::TextAlign, StyleValue::Align(TextAlign::Center));
        let (p, _) = layout_paragraph(&mut tree, &m, &center, &[run("ab", &center)], Pt::pt(100), Insets::default(), false).unwrap();
        assert_eq!(text_boxes(&tree, p)[0].1.x, Pt::pt(44));
    }

    #[test]
    fn test_justify_spreads_words_except_on_last_line() {
        let m = MonospaceMetrics::default();
        let mut tree = RenderTree::new();
        let style = ResolvedStyle::default().with(StyleKey::TextAlign, StyleValue::Align(TextAlign::Justify));
        // "aa bb cc" is 48pt; 36pt wide lines hold "aa bb" then "cc".
        let (p, _) = layout_paragraph(&mut tree, &m, &style, &[run("aa bb cc", &style)], Pt::pt(36), Insets::default(), false).unwrap();
        let boxes = text_boxes(&tree, p);
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0].1.x, Pt::ZERO);
        assert_eq!(boxes[1].1.right(), Pt::pt(36));
        assert_eq!(boxes[2].1.x, Pt::ZERO);
    }

    #[test]
    fn test_padding_offsets_lines() {
        let m = MonospaceMetrics::default();
        let mut tree = RenderTree::new();
        let style = ResolvedStyle::default();
        let padding = Insets::all(Pt::pt(5));
        let (p, content) = layout_paragraph(&mut tree, &m, &style, &[run("x", &style)], Pt::pt(50), padding, false).unwrap();
        assert_eq!(content, Pt::pt(12));
        assert_eq!(tree.node(p).unwrap().rect.height, Pt::pt(22));
        let line = tree.children(p).next().unwrap();
        assert_eq!(tree.node(line).unwrap().rect, Rect::new(Pt::pt(5), Pt::pt(5), Pt::pt(40), Pt::pt(12)));
    }

    #[test]
    fn test_word_boxes_split_each_word() {
        let m = MonospaceMetrics::default();
        let mut tree = RenderTree::new();
        let style = ResolvedStyle::default();
        let (p, _) = layout_paragraph(&mut tree, &m, &style, &[run("ab  cd", &style)], Pt::pt(100), Insets::default(), true).unwrap();
        let boxes = text_boxes(&tree, p);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].0, "ab");
        assert_eq!(boxes[1].0, "cd");
        assert_eq!(boxes[1].1.x, Pt::pt(24));
    }
}
