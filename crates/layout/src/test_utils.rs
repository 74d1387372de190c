use crate::builder::{BoxBuilder, QuerySource};
use crate::config::{CompatibilityMode, LayoutConfig};
use crate::tree::{BoxId, NodeKind, RenderTree};
use crate::LayoutDiagnostic;
use quire_data::{DataFactory, DataFactoryError, DataRow, DefaultTableModel, Parameters, SharedTable};
use quire_model::Element;
use quire_style::{NamedStyles, ResolvedStyle};
use quire_traits::MonospaceMetrics;
use quire_types::{BoxConstraints, Pt, QueryName, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Serves fixed tables by query name and records every call.
#[derive(Default)]
pub struct StaticQueries {
    tables: HashMap<String, SharedTable>,
    pub calls: Vec<(String, Parameters)>,
}

impl StaticQueries {
    pub fn with(mut self, name: &str, table: DefaultTableModel) -> Self {
        self.tables.insert(name.to_string(), Arc::new(table));
        self
    }
}

impl QuerySource for StaticQueries {
    fn query(
        &mut self,
        query: &QueryName,
        parameters: &Parameters,
        _factory: Option<&Arc<dyn DataFactory>>,
    ) -> Result<SharedTable, DataFactoryError> {
        self.calls.push((query.to_string(), parameters.clone()));
        self.tables
            .get(query.as_str())
            .cloned()
            .ok_or_else(|| DataFactoryError::QueryNotFound(query.to_string()))
    }
}

pub struct Built {
    pub tree: RenderTree,
    pub root: Option<BoxId>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

impl Built {
    pub fn root(&self) -> BoxId {
        self.root.expect("element produced no box")
    }

    pub fn height(&self) -> Pt {
        self.tree.node(self.root()).unwrap().rect.height
    }

    pub fn width(&self) -> Pt {
        self.tree.node(self.root()).unwrap().rect.width
    }

    pub fn boxes(&self, kind: NodeKind) -> Vec<BoxId> {
        self.tree
            .descendants(self.root())
            .into_iter()
            .filter(|id| self.tree.get(*id).is_some_and(|n| n.kind == kind))
            .collect()
    }

    /// Contents of every text box, in document order.
    pub fn texts(&self) -> Vec<String> {
        self.boxes(NodeKind::Text)
            .into_iter()
            .filter_map(|id| self.tree.get(id)?.text.as_deref().map(str::to_string))
            .collect()
    }
}

pub fn build_in(mode: CompatibilityMode, element: &Element, width: Pt, row: &DataRow, queries: &mut dyn QuerySource) -> Built {
    let config = LayoutConfig {
        compatibility: mode,
        ..LayoutConfig::default()
    };
    let metrics = MonospaceMetrics::default();
    let styles = NamedStyles::default();
    let mut builder = BoxBuilder::new(config, &metrics, &styles, queries).with_height_base(Pt::pt(800));
    let mut tree = RenderTree::new();
    let root = builder
        .build(&mut tree, element, &ResolvedStyle::default(), row, BoxConstraints::new(width))
        .unwrap();
    Built {
        tree,
        root,
        diagnostics: builder.take_diagnostics(),
    }
}

/// Builds `element` in current mode with an empty data row.
pub fn build(element: &Element, width: Pt) -> Built {
    build_in(
        CompatibilityMode::Current,
        element,
        width,
        &DataRow::new(Parameters::default()),
        &mut StaticQueries::default(),
    )
}

pub fn table(columns: &[&str], rows: &[&[Value]]) -> DefaultTableModel {
    rows.iter()
        .fold(DefaultTableModel::new(columns.iter().copied()), |t, r| t.with_row(r.to_vec()))
}
