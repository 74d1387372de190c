//! The finished unit of pagination handed to output writers.

use crate::LayoutError;
use crate::tree::{BoxId, NodeKind, RenderNode, RenderTree};
use quire_model::PageDefinition;
use quire_types::{Pt, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Header,
    Content,
    RepeatFooter,
    Footer,
}

impl AreaKind {
    pub const ALL: [AreaKind; 4] = [
        AreaKind::Header,
        AreaKind::Content,
        AreaKind::RepeatFooter,
        AreaKind::Footer,
    ];

    fn node_kind(self) -> NodeKind {
        match self {
            AreaKind::Header => NodeKind::HeaderArea,
            AreaKind::Content => NodeKind::ContentArea,
            AreaKind::RepeatFooter => NodeKind::RepeatFooterArea,
            AreaKind::Footer => NodeKind::FooterArea,
        }
    }
}

/// One page: a `Page` root with header, content, repeat-footer and footer
/// areas, in that order.
///
/// Bands are copied in with [`LogicalPageBox::place`] and stack inside their
/// area. [`LogicalPageBox::finalize`] pins the header to the top margin, the
/// footer to the bottom margin and the repeat-footer directly above it. In
/// flow mode the page has no fixed height and grows with its content.
#[derive(Debug, Clone)]
pub struct LogicalPageBox {
    pub number: usize,
    pub tree: RenderTree,
    pub root: BoxId,
    areas: [BoxId; 4],
    definition: PageDefinition,
    flow: bool,
}

impl LogicalPageBox {
    pub fn new(number: usize, definition: PageDefinition, flow: bool) -> Result<Self, LayoutError> {
        let mut tree = RenderTree::new();
        let height = if flow { Pt::ZERO } else { definition.height };
        let root = tree.alloc(
            RenderNode::new(NodeKind::Page).with_rect(Rect::new(Pt::ZERO, Pt::ZERO, definition.width, height)),
        );
        let margins = definition.margins;
        let areas = AreaKind::ALL.map(|kind| {
            tree.alloc(RenderNode::new(kind.node_kind()).with_rect(Rect::new(
                margins.left,
                margins.top,
                definition.content_width(),
                Pt::ZERO,
            )))
        });
        for area in areas {
            tree.append_child(root, area)?;
        }
        Ok(Self {
            number,
            tree,
            root,
            areas,
            definition,
            flow,
        })
    }

    pub fn is_flow(&self) -> bool {
        self.flow
    }

    pub fn definition(&self) -> &PageDefinition {
        &self.definition
    }

    pub fn area(&self, kind: AreaKind) -> BoxId {
        self.areas[kind as usize]
    }

    pub fn area_rect(&self, kind: AreaKind) -> Rect {
        self.tree.get(self.area(kind)).map(|n| n.rect).unwrap_or_default()
    }

    pub fn area_height(&self, kind: AreaKind) -> Pt {
        self.area_rect(kind).height
    }

    /// Bands placed in an area, top to bottom.
    pub fn area_children(&self, kind: AreaKind) -> Vec<BoxId> {
        self.tree.children(self.area(kind)).collect()
    }

    /// Height left for content when `reserved` is kept free for footers that
    /// are not placed yet. `None` in flow mode.
    pub fn remaining(&self, reserved: Pt) -> Option<Pt> {
        if self.flow {
            return None;
        }
        let used = self.area_height(AreaKind::Header)
            + self.area_height(AreaKind::Content)
            + self.area_height(AreaKind::RepeatFooter)
            + self.area_height(AreaKind::Footer)
            + reserved;
        Some((self.definition.content_height() - used).clamp_non_negative())
    }

    /// True if no band has been placed in the content area.
    pub fn is_content_empty(&self) -> bool {
        self.tree.child_count(self.area(AreaKind::Content)) == 0
    }

    /// Copies the band `id` from `source` to the bottom of `kind` and grows
    /// the area. Returns the copy's id in this page's tree.
    pub fn place(&mut self, kind: AreaKind, source: &RenderTree, id: BoxId) -> Result<BoxId, LayoutError> {
        let area = self.area(kind);
        let copy = self.tree.transplant(source, id, Some(area))?;
        let area_rect = self.tree.node(area)?.rect;
        self.tree.move_to(copy, area_rect.x, area_rect.bottom())?;
        let height = self.tree.node(copy)?.rect.height;
        self.tree.node_mut(area)?.rect.height += height;
        self.restack();
        Ok(copy)
    }

    /// Frees every band in `kind`.
    pub fn clear_area(&mut self, kind: AreaKind) -> Result<usize, LayoutError> {
        let area = self.area(kind);
        let freed = self.tree.clear_children(area)?;
        self.tree.node_mut(area)?.rect.height = Pt::ZERO;
        self.restack();
        Ok(freed)
    }

    /// Keeps the areas contiguous from the top margin while bands are added.
    fn restack(&mut self) {
        let mut y = self.definition.margins.top;
        for area in self.areas {
            let Some(rect) = self.tree.get(area).map(|n| n.rect) else { continue };
            self.tree.translate(area, Pt::ZERO, y - rect.y);
            y += rect.height;
        }
    }

    /// Final positions: footer at the bottom margin, repeat-footer directly
    /// above it. Flow pages end right after their footer.
    pub fn finalize(&mut self) {
        self.restack();
        if self.flow {
            let bottom = self.area_rect(AreaKind::Footer).bottom() + self.definition.margins.bottom;
            if let Some(root) = self.tree.get_mut(self.root) {
                root.rect.height = bottom;
            }
            return;
        }
        let footer_top = self.definition.height - self.definition.margins.bottom - self.area_height(AreaKind::Footer);
        let repeat_top = footer_top - self.area_height(AreaKind::RepeatFooter);
        for (kind, top) in [(AreaKind::RepeatFooter, repeat_top), (AreaKind::Footer, footer_top)] {
            let area = self.area(kind);
            let current = self.area_rect(kind).y;
            if top > current {
                self.tree.translate(area, Pt::ZERO, top - current);
            }
        }
    }

    /// Text of every band on the page, one line per line box.
    pub fn text_content(&self) -> String {
        self.tree.text_content(self.root)
    }

    pub fn area_text(&self, kind: AreaKind) -> String {
        self.tree.text_content(self.area(kind))
    }
}
