use crate::tree::{BoxId, NodeKind, RenderTree};
use quire_types::{ElementName, InstanceId};

/// Picks render nodes by kind, element name or element instance. Unset
/// criteria match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMatcher {
    pub kind: Option<NodeKind>,
    pub name: Option<ElementName>,
    pub element: Option<InstanceId>,
}

impl NodeMatcher {
    pub fn kind(kind: NodeKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<ElementName>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_element(mut self, element: InstanceId) -> Self {
        self.element = Some(element);
        self
    }

    pub fn matches(&self, tree: &RenderTree, id: BoxId) -> bool {
        let Some(node) = tree.get(id) else { return false };
        self.kind.is_none_or(|k| k == node.kind)
            && self.name.as_ref().is_none_or(|n| node.name.as_ref() == Some(n))
            && self.element.is_none_or(|e| node.element == Some(e))
    }

    /// Matching boxes under `root`, in document order.
    pub fn find_all(&self, tree: &RenderTree, root: BoxId) -> Vec<BoxId> {
        tree.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }

    pub fn find_first(&self, tree: &RenderTree, root: BoxId) -> Option<BoxId> {
        tree.descendants(root).into_iter().find(|&id| self.matches(tree, id))
    }
}

/// Which page numbers (1-based) a writer wants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowSelector {
    #[default]
    All,
    Pages(Vec<usize>),
    Range { first: usize, last: usize },
}

impl FlowSelector {
    pub fn accepts(&self, page: usize) -> bool {
        match self {
            FlowSelector::All => true,
            FlowSelector::Pages(pages) => pages.contains(&page),
            FlowSelector::Range { first, last } => (*first..=*last).contains(&page),
        }
    }
}
