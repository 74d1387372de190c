//! The render tree: an arena of boxes linked as an intrusive tree.
//!
//! Boxes are addressed by [`BoxId`], an index plus a generation. Freeing a
//! box bumps the generation of its slot, so ids held past a free are
//! detected instead of silently aliasing a new box. Freed slots are reused,
//! which keeps the arena as small as the largest live working set.

use crate::LayoutError;
use quire_style::ResolvedStyle;
use quire_types::{ElementName, InstanceId, Pt, Rect, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxId {
    index: u32,
    generation: u32,
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box {}v{}", self.index, self.generation)
    }
}

/// Represents the specific type of a render box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Page,
    HeaderArea,
    ContentArea,
    RepeatFooterArea,
    FooterArea,
    Band,
    Block,
    Row,
    Canvas,
    Paragraph,
    Line,
    Text,
    Rectangle,
    SubReport,
    Crosstab,
    CrosstabCell,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Page => "page",
            NodeKind::HeaderArea => "header-area",
            NodeKind::ContentArea => "content-area",
            NodeKind::RepeatFooterArea => "repeat-footer-area",
            NodeKind::FooterArea => "footer-area",
            NodeKind::Band => "band",
            NodeKind::Block => "block",
            NodeKind::Row => "row",
            NodeKind::Canvas => "canvas",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Line => "line",
            NodeKind::Text => "text",
            NodeKind::Rectangle => "rectangle",
            NodeKind::SubReport => "sub-report",
            NodeKind::Crosstab => "crosstab",
            NodeKind::CrosstabCell => "crosstab-cell",
        }
    }

    /// Children of these kinds are stacked top to bottom without gaps.
    pub fn stacks_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Band
                | NodeKind::Block
                | NodeKind::Paragraph
                | NodeKind::SubReport
                | NodeKind::Crosstab
                | NodeKind::HeaderArea
                | NodeKind::ContentArea
                | NodeKind::RepeatFooterArea
                | NodeKind::FooterArea
        )
    }
}

/// The (row, column) key of a crosstab cell. `None` on an axis means the
/// total over that axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row: Option<Value>,
    pub column: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Links {
    parent: Option<BoxId>,
    first_child: Option<BoxId>,
    last_child: Option<BoxId>,
    next: Option<BoxId>,
    prev: Option<BoxId>,
}

/// One box. Geometry is absolute within the tree it belongs to.
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub kind: NodeKind,
    pub rect: Rect,
    pub element: Option<InstanceId>,
    pub name: Option<ElementName>,
    pub style: ResolvedStyle,
    pub text: Option<Arc<str>>,
    pub cell: Option<CellKey>,
    pub overflow_x: bool,
    pub overflow_y: bool,
    links: Links,
}

impl RenderNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            rect: Rect::default(),
            element: None,
            name: None,
            style: ResolvedStyle::default(),
            text: None,
            cell: None,
            overflow_x: false,
            overflow_y: false,
            links: Links::default(),
        }
    }

    pub fn with_style(mut self, style: ResolvedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn parent(&self) -> Option<BoxId> {
        self.links.parent
    }

    pub fn first_child(&self) -> Option<BoxId> {
        self.links.first_child
    }

    pub fn last_child(&self) -> Option<BoxId> {
        self.links.last_child
    }

    pub fn next_sibling(&self) -> Option<BoxId> {
        self.links.next
    }

    pub fn prev_sibling(&self) -> Option<BoxId> {
        self.links.prev
    }

    pub fn has_overflow(&self) -> bool {
        self.overflow_x || self.overflow_y
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Occupied { generation: u32, node: RenderNode },
    Free { generation: u32, next_free: Option<u32> },
}

#[derive(Debug, Clone, Default)]
pub struct RenderTree {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    active: usize,
}

impl RenderTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live boxes.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Number of slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn alloc(&mut self, mut node: RenderNode) -> BoxId {
        node.links = Links::default();
        self.active += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            if let Slot::Free {
                generation,
                next_free,
            } = *slot
            {
                self.free_head = next_free;
                *slot = Slot::Occupied { generation, node };
                return BoxId { index, generation };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied {
            generation: 0,
            node,
        });
        BoxId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: BoxId) -> Option<&RenderNode> {
        match self.slots.get(id.index as usize) {
            Some(Slot::Occupied { generation, node }) if *generation == id.generation => Some(node),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut RenderNode> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot::Occupied { generation, node }) if *generation == id.generation => Some(node),
            _ => None,
        }
    }

    pub fn node(&self, id: BoxId) -> Result<&RenderNode, LayoutError> {
        self.get(id).ok_or(LayoutError::StaleBox(id))
    }

    pub fn node_mut(&mut self, id: BoxId) -> Result<&mut RenderNode, LayoutError> {
        self.get_mut(id).ok_or(LayoutError::StaleBox(id))
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.get(id).is_some()
    }

    fn links_mut(&mut self, id: BoxId) -> Result<&mut Links, LayoutError> {
        Ok(&mut self.node_mut(id)?.links)
    }

    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) -> Result<(), LayoutError> {
        if parent == child {
            return Err(LayoutError::Cycle(child));
        }
        self.detach(child)?;
        let last = self.node(parent)?.links.last_child;
        {
            let links = self.links_mut(child)?;
            links.parent = Some(parent);
            links.prev = last;
        }
        match last {
            Some(last) => self.links_mut(last)?.next = Some(child),
            None => self.links_mut(parent)?.first_child = Some(child),
        }
        self.links_mut(parent)?.last_child = Some(child);
        Ok(())
    }

    /// Unlinks `id` from its parent and siblings. Its own children stay
    /// attached to it.
    pub fn detach(&mut self, id: BoxId) -> Result<(), LayoutError> {
        let links = self.node(id)?.links;
        if let Some(prev) = links.prev {
            self.links_mut(prev)?.next = links.next;
        } else if let Some(parent) = links.parent {
            self.links_mut(parent)?.first_child = links.next;
        }
        if let Some(next) = links.next {
            self.links_mut(next)?.prev = links.prev;
        } else if let Some(parent) = links.parent {
            self.links_mut(parent)?.last_child = links.prev;
        }
        let own = self.links_mut(id)?;
        own.parent = None;
        own.next = None;
        own.prev = None;
        Ok(())
    }

    /// Detaches `id` and releases it with all of its descendants. Returns
    /// the number of boxes freed.
    pub fn free_subtree(&mut self, id: BoxId) -> Result<usize, LayoutError> {
        self.detach(id)?;
        let doomed = self.descendants(id);
        for &box_id in &doomed {
            let slot = &mut self.slots[box_id.index as usize];
            *slot = Slot::Free {
                generation: box_id.generation.wrapping_add(1),
                next_free: self.free_head,
            };
            self.free_head = Some(box_id.index);
        }
        self.active -= doomed.len();
        Ok(doomed.len())
    }

    /// Frees every child of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: BoxId) -> Result<usize, LayoutError> {
        let children: Vec<BoxId> = self.children(id).collect();
        let mut freed = 0;
        for child in children {
            freed += self.free_subtree(child)?;
        }
        Ok(freed)
    }

    pub fn children(&self, id: BoxId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|n| n.links.first_child),
        }
    }

    pub fn child_count(&self, id: BoxId) -> usize {
        self.children(id).count()
    }

    /// `id` and every box below it, in document order.
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            let mut children: Vec<BoxId> = self.children(current).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Moves `id` and its whole subtree by the given offsets.
    pub fn translate(&mut self, id: BoxId, dx: Pt, dy: Pt) {
        if dx.is_zero() && dy.is_zero() {
            return;
        }
        for box_id in self.descendants(id) {
            if let Some(node) = self.get_mut(box_id) {
                node.rect.x += dx;
                node.rect.y += dy;
            }
        }
    }

    /// Places the subtree so that `id` sits at (`x`, `y`).
    pub fn move_to(&mut self, id: BoxId, x: Pt, y: Pt) -> Result<(), LayoutError> {
        let rect = self.node(id)?.rect;
        self.translate(id, x - rect.x, y - rect.y);
        Ok(())
    }

    /// Copies the subtree rooted at `id` in `source` into this tree, as the
    /// last child of `parent` (or as a new root). Returns the copy's id.
    pub fn transplant(
        &mut self,
        source: &RenderTree,
        id: BoxId,
        parent: Option<BoxId>,
    ) -> Result<BoxId, LayoutError> {
        let copy = self.alloc(source.node(id)?.clone());
        if let Some(parent) = parent {
            self.append_child(parent, copy)?;
        }
        let children: Vec<BoxId> = source.children(id).collect();
        for child in children {
            self.transplant(source, child, Some(copy))?;
        }
        Ok(copy)
    }

    /// Moves the subtree at `id` out of this tree into a fresh one.
    pub fn extract(&mut self, id: BoxId) -> Result<(RenderTree, BoxId), LayoutError> {
        let mut tree = RenderTree::new();
        let root = tree.transplant(self, id, None)?;
        self.free_subtree(id)?;
        Ok((tree, root))
    }

    /// Concatenated text of every text box under `id`, one line per line box.
    pub fn text_content(&self, id: BoxId) -> String {
        let mut out = String::new();
        for box_id in self.descendants(id) {
            let Some(node) = self.get(box_id) else { continue };
            match node.kind {
                NodeKind::Line => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                }
                NodeKind::Text => {
                    if let Some(text) = &node.text {
                        out.push_str(text);
                    }
                }
                _ => {}
            }
        }
        out
    }
}

pub struct Children<'a> {
    tree: &'a RenderTree,
    next: Option<BoxId>,
}

impl Iterator for Children<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.links.next);
        Some(current)
    }
}

/// A geometry invariant broken somewhere in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryViolation {
    NegativeSize(BoxId),
    Escapes { child: BoxId, parent: BoxId },
    Gap { prev: BoxId, next: BoxId },
}

/// Checks box containment and, for stacking containers, that adjacent
/// children touch: `next.y == prev.y + prev.height`.
pub fn verify_geometry(tree: &RenderTree, root: BoxId) -> Vec<GeometryViolation> {
    let mut violations = Vec::new();
    for id in tree.descendants(root) {
        let Some(node) = tree.get(id) else { continue };
        if node.rect.width.is_negative() || node.rect.height.is_negative() {
            violations.push(GeometryViolation::NegativeSize(id));
        }
        let mut prev: Option<&RenderNode> = None;
        let mut prev_id = None;
        for child_id in tree.children(id) {
            let Some(child) = tree.get(child_id) else { continue };
            let escapes_y = child.rect.y < node.rect.y || child.rect.bottom() > node.rect.bottom();
            let escapes_x = child.rect.x < node.rect.x || child.rect.right() > node.rect.right();
            if (escapes_y && !node.overflow_y) || (escapes_x && !node.overflow_x) {
                violations.push(GeometryViolation::Escapes {
                    child: child_id,
                    parent: id,
                });
            }
            if node.kind.stacks_children() {
                if let (Some(p), Some(p_id)) = (prev, prev_id) {
                    if child.rect.y != p.rect.bottom() {
                        violations.push(GeometryViolation::Gap {
                            prev: p_id,
                            next: child_id,
                        });
                    }
                }
            }
            prev = Some(child);
            prev_id = Some(child_id);
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(tree: &mut RenderTree, kind: NodeKind, y: i64, h: i64) -> BoxId {
        tree.alloc(RenderNode::new(kind).with_rect(Rect::new(
            Pt::ZERO,
            Pt::pt(y),
            Pt::pt(100),
            Pt::pt(h),
        )))
    }

    #[test]
    fn test_append_and_iterate() {
        let mut tree = RenderTree::new();
        let root = boxed(&mut tree, NodeKind::Block, 0, 30);
        let a = boxed(&mut tree, NodeKind::Block, 0, 10);
        let b = boxed(&mut tree, NodeKind::Block, 10, 20);
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.node(b).unwrap().prev_sibling(), Some(a));
        assert_eq!(tree.node(a).unwrap().parent(), Some(root));
        assert!(verify_geometry(&tree, root).is_empty());
    }

    #[test]
    fn test_detach_middle_child_relinks_siblings() {
        let mut tree = RenderTree::new();
        let root = boxed(&mut tree, NodeKind::Row, 0, 10);
        let ids: Vec<BoxId> = (0..3).map(|_| boxed(&mut tree, NodeKind::Text, 0, 10)).collect();
        for id in &ids {
            tree.append_child(root, *id).unwrap();
        }
        tree.detach(ids[1]).unwrap();
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
        assert_eq!(tree.node(ids[2]).unwrap().prev_sibling(), Some(ids[0]));
        tree.detach(ids[2]).unwrap();
        assert_eq!(tree.node(root).unwrap().last_child(), Some(ids[0]));
    }

    #[test]
    fn test_free_subtree_invalidates_ids_and_reuses_slots() {
        let mut tree = RenderTree::new();
        let root = boxed(&mut tree, NodeKind::Block, 0, 10);
        let child = boxed(&mut tree, NodeKind::Block, 0, 10);
        let grandchild = boxed(&mut tree, NodeKind::Text, 0, 10);
        tree.append_child(root, child).unwrap();
        tree.append_child(child, grandchild).unwrap();
        assert_eq!(tree.active_count(), 3);

        assert_eq!(tree.free_subtree(child).unwrap(), 2);
        assert_eq!(tree.active_count(), 1);
        assert!(tree.get(grandchild).is_none());
        assert_eq!(tree.node(child).unwrap_err(), LayoutError::StaleBox(child));
        assert_eq!(tree.child_count(root), 0);

        let reused = boxed(&mut tree, NodeKind::Text, 0, 1);
        assert_eq!(tree.capacity(), 3);
        assert_ne!(reused, child);
        assert_ne!(reused, grandchild);
    }

    #[test]
    fn test_verify_reports_gaps_and_escapes() {
        let mut tree = RenderTree::new();
        let root = boxed(&mut tree, NodeKind::Block, 0, 30);
        let a = boxed(&mut tree, NodeKind::Block, 0, 10);
        let b = boxed(&mut tree, NodeKind::Block, 15, 20);
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        let violations = verify_geometry(&tree, root);
        assert!(violations.contains(&GeometryViolation::Gap { prev: a, next: b }));
        assert!(violations.contains(&GeometryViolation::Escapes {
            child: b,
            parent: root
        }));

        tree.node_mut(root).unwrap().overflow_y = true;
        let violations = verify_geometry(&tree, root);
        assert_eq!(violations, vec![GeometryViolation::Gap { prev: a, next: b }]);
    }

    #[test]
    fn test_extract_and_transplant_keep_geometry() {
        let mut tree = RenderTree::new();
        let root = boxed(&mut tree, NodeKind::Block, 5, 10);
        let child = boxed(&mut tree, NodeKind::Text, 5, 10);
        tree.append_child(root, child).unwrap();
        tree.node_mut(child).unwrap().text = Some("hi".into());

        let (mut page, page_root) = tree.extract(root).unwrap();
        assert_eq!(tree.active_count(), 0);
        assert_eq!(page.active_count(), 2);
        page.translate(page_root, Pt::pt(1), Pt::pt(2));
        let moved = page.children(page_root).next().unwrap();
        assert_eq!(page.node(moved).unwrap().rect.y, Pt::pt(7));
        assert_eq!(page.node(moved).unwrap().rect.x, Pt::pt(1));
    }
}
