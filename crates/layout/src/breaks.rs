//! Page-break analysis: fitting, splitting and clipping of laid-out boxes.
//!
//! All positions are absolute within the tree. Heights passed in are
//! measured from the top edge of the box being examined.

use crate::tree::{BoxId, NodeKind, RenderTree};
use crate::{LayoutDiagnostic, LayoutError};
use log::{debug, warn};
use quire_style::StyleKey;
use quire_types::Pt;

pub struct BreakAnalysis {
    pub should_break: bool,
    pub remaining_height: Pt,
}

/// Checks whether a child of `child_height` fits below `cursor_y` in a
/// region `limit` tall.
pub fn check_fit(cursor_y: Pt, child_height: Pt, limit: Pt) -> BreakAnalysis {
    let available = (limit - cursor_y).clamp_non_negative();
    BreakAnalysis {
        should_break: child_height > available,
        remaining_height: available,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The box fits as it is (possibly after forced clipping).
    Fits,
    /// Nothing may stay on this page; move the whole box on.
    Push,
    /// `head` stays where it was. `tail` is a new detached root holding the
    /// rest, positioned at the head's original top.
    Split { head: BoxId, tail: BoxId },
}

/// Cuts `id` to at most `available` height.
///
/// With `force` the box sits at the top of an empty page and something must
/// stay: at least one line of a paragraph, or a clipped atomic box. A box
/// that avoids breaks inside is only split when forced.
pub fn split_box(
    tree: &mut RenderTree,
    id: BoxId,
    available: Pt,
    force: bool,
    diagnostics: &mut Vec<LayoutDiagnostic>,
) -> Result<SplitOutcome, LayoutError> {
    let node = tree.node(id)?;
    if node.rect.height <= available {
        return Ok(SplitOutcome::Fits);
    }
    if !force && node.style.flag(StyleKey::AvoidPageBreakInside) {
        debug!("{} box {id} avoids breaks inside, pushing it whole", node.kind.as_str());
        return Ok(SplitOutcome::Push);
    }
    match node.kind {
        NodeKind::Paragraph => split_paragraph(tree, id, available, force, diagnostics),
        kind if kind.stacks_children() && tree.child_count(id) > 0 => {
            split_container(tree, id, available, force, diagnostics)
        }
        _ => atomic(tree, id, available, force, diagnostics),
    }
}

fn atomic(
    tree: &mut RenderTree,
    id: BoxId,
    available: Pt,
    force: bool,
    diagnostics: &mut Vec<LayoutDiagnostic>,
) -> Result<SplitOutcome, LayoutError> {
    if !force {
        return Ok(SplitOutcome::Push);
    }
    let node = tree.node(id)?;
    let (element, height) = (node.element, node.rect.height);
    warn!("{} box of {height} does not fit an empty page of {available}, clipping", node.kind.as_str());
    diagnostics.push(LayoutDiagnostic::Oversized {
        element,
        height,
        available,
    });
    clip_to_height(tree, id, available);
    Ok(SplitOutcome::Fits)
}

/// Chooses how many of `total` lines stay on this page when `fitting` of
/// them fit. `None` pushes the whole box. Containers count their children
/// as lines.
///
/// `orphans` is the minimum left at the bottom of this page, `widows` the
/// minimum carried to the next one.
fn lines_to_keep(total: usize, fitting: usize, widows: usize, orphans: usize, force: bool) -> Option<usize> {
    let mut keep = fitting.min(total.saturating_sub(1));
    if total - keep < widows {
        keep = total.saturating_sub(widows);
    }
    if keep == 0 || keep < orphans {
        return force.then(|| fitting.clamp(1, total.saturating_sub(1).max(1)));
    }
    Some(keep)
}

fn split_paragraph(
    tree: &mut RenderTree,
    id: BoxId,
    available: Pt,
    force: bool,
    diagnostics: &mut Vec<LayoutDiagnostic>,
) -> Result<SplitOutcome, LayoutError> {
    let node = tree.node(id)?;
    let rect = node.rect;
    let (widows, orphans) = (node.style.widows(), node.style.orphans());
    let lines: Vec<BoxId> = tree.children(id).collect();
    if lines.len() < 2 {
        return atomic(tree, id, available, force, diagnostics);
    }
    let first_top = tree.node(lines[0])?.rect.y;
    let last_bottom = tree.node(lines[lines.len() - 1])?.rect.bottom();
    let pad_top = first_top - rect.y;
    let pad_bottom = rect.bottom() - last_bottom;
    let limit = rect.y + available - pad_bottom;
    let mut fitting = 0;
    for line in &lines {
        if tree.node(*line)?.rect.bottom() > limit {
            break;
        }
        fitting += 1;
    }

    let Some(keep) = lines_to_keep(lines.len(), fitting, widows, orphans, force) else {
        debug!("Paragraph {id}: {fitting} of {} lines fit, pushing it whole", lines.len());
        return Ok(SplitOutcome::Push);
    };

    let tail = tree.alloc(tree.node(id)?.clone());
    let head_bottom = tree.node(lines[keep - 1])?.rect.bottom();
    let mut cursor = rect.y + pad_top;
    for &line in &lines[keep..] {
        tree.detach(line)?;
        let line_rect = tree.node(line)?.rect;
        tree.translate(line, Pt::ZERO, cursor - line_rect.y);
        cursor += line_rect.height;
        tree.append_child(tail, line)?;
    }
    tree.node_mut(id)?.rect.height = head_bottom - rect.y + pad_bottom;
    tree.node_mut(tail)?.rect.height = cursor - rect.y + pad_bottom;
    if keep > fitting {
        // Forced: the kept lines overrun the page.
        clip_to_height(tree, id, available);
    }
    Ok(SplitOutcome::Split { head: id, tail })
}

fn split_container(
    tree: &mut RenderTree,
    id: BoxId,
    available: Pt,
    force: bool,
    diagnostics: &mut Vec<LayoutDiagnostic>,
) -> Result<SplitOutcome, LayoutError> {
    let rect = tree.node(id)?.rect;
    let children: Vec<BoxId> = tree.children(id).collect();
    let first_top = tree.node(children[0])?.rect.y;
    let last_bottom = tree.node(children[children.len() - 1])?.rect.bottom();
    let pad_top = first_top - rect.y;
    let pad_bottom = (rect.bottom() - last_bottom).clamp_non_negative();
    let limit = rect.y + available - pad_bottom;

    let Some(index) = children
        .iter()
        .position(|c| tree.get(*c).is_some_and(|n| n.rect.bottom() > limit))
    else {
        // Only the bottom padding overflows.
        return atomic(tree, id, available, force, diagnostics);
    };

    let child = children[index];
    let child_top = tree.node(child)?.rect.y;
    let force_child = force && index == 0;

    // `carried` is a partial child heading the tail; `split_at` the first
    // child moving over whole.
    let (carried, split_at) = if child_top >= limit {
        (None, index)
    } else {
        match split_box(tree, child, limit - child_top, force_child, diagnostics)? {
            SplitOutcome::Fits => (None, index + 1),
            SplitOutcome::Push => (None, index),
            SplitOutcome::Split { tail, .. } => (Some(tail), index + 1),
        }
    };
    if split_at == 0 && carried.is_none() {
        if force {
            return atomic(tree, id, available, force, diagnostics);
        }
        return Ok(SplitOutcome::Push);
    }
    if split_at >= children.len() && carried.is_none() {
        tree.node_mut(id)?.rect.height = available.min(rect.height);
        return Ok(SplitOutcome::Fits);
    }
    if carried.is_none() {
        // A break between children counts them as lines. A carried child
        // already applied its own minimums.
        let style = &tree.node(id)?.style;
        let (widows, orphans) = (style.widows(), style.orphans());
        match lines_to_keep(children.len(), split_at, widows, orphans, force) {
            None => {
                debug!("Container {id}: {split_at} of {} children fit, pushing it whole", children.len());
                return Ok(SplitOutcome::Push);
            }
            Some(keep) if keep < split_at => {
                return move_to_tail(tree, id, pad_top, pad_bottom, None, &children[keep..]);
            }
            Some(_) => {}
        }
    }
    move_to_tail(tree, id, pad_top, pad_bottom, carried, &children[split_at..])
}

/// Moves `carried` and then `moved` into a new tail box stacked from the
/// head's original top, and shrinks the head to what is left.
fn move_to_tail(
    tree: &mut RenderTree,
    id: BoxId,
    pad_top: Pt,
    pad_bottom: Pt,
    carried: Option<BoxId>,
    moved: &[BoxId],
) -> Result<SplitOutcome, LayoutError> {
    let rect = tree.node(id)?.rect;
    let tail = tree.alloc(tree.node(id)?.clone());
    let mut cursor = rect.y + pad_top;
    for c in carried.into_iter().chain(moved.iter().copied()) {
        if tree.node(c)?.parent().is_some() {
            tree.detach(c)?;
        }
        let c_rect = tree.node(c)?.rect;
        tree.translate(c, Pt::ZERO, cursor - c_rect.y);
        cursor += c_rect.height;
        tree.append_child(tail, c)?;
    }
    let head_bottom = tree
        .children(id)
        .last()
        .and_then(|c| tree.get(c))
        .map_or(rect.y + pad_top, |n| n.rect.bottom());
    tree.node_mut(id)?.rect.height = head_bottom - rect.y + pad_bottom;
    tree.node_mut(tail)?.rect.height = cursor - rect.y + pad_bottom;
    Ok(SplitOutcome::Split { head: id, tail })
}

/// Cuts `id` down to `height`, freeing everything that starts below the
/// new bottom edge. Lines and text are freed whole once they cross it.
/// Returns the number of freed boxes.
pub fn clip_to_height(tree: &mut RenderTree, id: BoxId, height: Pt) -> usize {
    let Some(node) = tree.get_mut(id) else { return 0 };
    node.rect.height = height;
    let bottom = node.rect.y + height;
    clip_children(tree, id, bottom)
}

fn clip_children(tree: &mut RenderTree, id: BoxId, bottom: Pt) -> usize {
    let children: Vec<BoxId> = tree.children(id).collect();
    let mut freed = 0;
    for child in children {
        let Some(node) = tree.get(child) else { continue };
        let rect = node.rect;
        if rect.bottom() <= bottom {
            continue;
        }
        let whole = rect.y >= bottom || matches!(node.kind, NodeKind::Line | NodeKind::Text);
        if whole {
            freed += tree.free_subtree(child).unwrap_or(0);
        } else {
            freed += clip_to_height(tree, child, bottom - rect.y);
        }
    }
    freed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_fit_is_exact() {
        let fit = check_fit(Pt::pt(10), Pt::pt(90), Pt::pt(100));
        assert!(!fit.should_break);
        assert_eq!(fit.remaining_height, Pt::pt(90));
        assert!(check_fit(Pt::pt(10), Pt::pt(90) + Pt::from_units(1), Pt::pt(100)).should_break);
    }

    #[test]
    fn test_lines_to_keep() {
        // Widows pull lines over to the next page.
        assert_eq!(lines_to_keep(4, 3, 2, 0, false), Some(2));
        // Too few lines left behind for the orphans setting.
        assert_eq!(lines_to_keep(4, 1, 0, 2, false), None);
        assert_eq!(lines_to_keep(4, 1, 0, 2, true), Some(1));
        assert_eq!(lines_to_keep(4, 0, 0, 0, false), None);
        assert_eq!(lines_to_keep(4, 0, 0, 0, true), Some(1));
    }
}
