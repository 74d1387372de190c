//! Turns report elements into sized render boxes.
//!
//! Every box is built at its own origin. Containers position their children
//! relative to that origin, so a finished band can be moved anywhere with
//! [`RenderTree::move_to`].

use crate::breaks::clip_to_height;
use crate::config::LayoutConfig;
use crate::crosstab::CrosstabGrid;
use crate::paragraph::{self, StyledRun};
use crate::sizing::Sizer;
use crate::tree::{BoxId, CellKey, NodeKind, RenderNode, RenderTree};
use crate::{LayoutDiagnostic, LayoutError};
use log::{debug, warn};
use quire_data::{DataFactory, DataFactoryError, DataRow, Parameters, SharedTable};
use quire_expr::formula;
use quire_model::{Crosstab, Element, ElementKind, SubReport};
use quire_style::{Dimension, LayoutMode, NamedStyles, ResolvedStyle, StyleKey, StyleResolver};
use quire_traits::TextMetrics;
use quire_types::{BoxConstraints, InstanceId, Pt, QueryName, Rect, Value};
use std::sync::Arc;

/// Runs the queries of sub-reports and crosstabs on behalf of the builder.
pub trait QuerySource {
    /// Executes `query`. `factory` overrides the report's own data factory.
    fn query(
        &mut self,
        query: &QueryName,
        parameters: &Parameters,
        factory: Option<&Arc<dyn DataFactory>>,
    ) -> Result<SharedTable, DataFactoryError>;
}

pub struct BoxBuilder<'a> {
    config: LayoutConfig,
    metrics: &'a dyn TextMetrics,
    styles: &'a NamedStyles,
    queries: &'a mut dyn QuerySource,
    /// What height percentages resolve against.
    height_base: Pt,
    diagnostics: Vec<LayoutDiagnostic>,
}

impl<'a> BoxBuilder<'a> {
    pub fn new(
        config: LayoutConfig,
        metrics: &'a dyn TextMetrics,
        styles: &'a NamedStyles,
        queries: &'a mut dyn QuerySource,
    ) -> Self {
        Self {
            config,
            metrics,
            styles,
            queries,
            height_base: Pt::ZERO,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_height_base(mut self, height: Pt) -> Self {
        self.height_base = height;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &[LayoutDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<LayoutDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn sizer(&mut self, element: InstanceId) -> Sizer<'_> {
        Sizer {
            mode: self.config.compatibility,
            element: Some(element),
            diagnostics: &mut self.diagnostics,
        }
    }

    /// Resolves the static cascade for `element`, then applies its style
    /// expressions for the current row.
    pub fn resolve_style(
        &mut self,
        element: &Element,
        inherited: &ResolvedStyle,
        row: &DataRow,
    ) -> ResolvedStyle {
        let resolver = StyleResolver::new(self.styles);
        let mut diagnostics = Vec::new();
        let base = resolver.resolve(
            &element.style,
            element.style_class.as_deref(),
            Some(inherited),
            &mut diagnostics,
        );
        let style = if element.style_expressions.is_empty() {
            base
        } else {
            let values: Vec<(StyleKey, Value)> = element
                .style_expressions
                .iter()
                .map(|e| {
                    let value = formula::evaluate(&e.formula, row).unwrap_or_else(|err| {
                        warn!("Style expression for {} on {} failed: {err}", e.key, element.id);
                        Value::Null
                    });
                    (e.key, value)
                })
                .collect();
            resolver.apply_expressions(&base, values.iter().map(|(k, v)| (*k, v)), &mut diagnostics)
        };
        self.diagnostics
            .extend(diagnostics.into_iter().map(|diagnostic| LayoutDiagnostic::Style {
                element: Some(element.id),
                diagnostic,
            }));
        style
    }

    /// Builds `element` under a parent whose resolved style is `inherited`.
    ///
    /// Returns `None` for invisible elements that do not consume space.
    pub fn build(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        inherited: &ResolvedStyle,
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<Option<BoxId>, LayoutError> {
        let style = self.resolve_style(element, inherited, row);
        self.build_resolved(tree, element, style, row, constraints)
    }

    pub fn build_resolved(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<Option<BoxId>, LayoutError> {
        if !style.visible() {
            if !style.flag(StyleKey::InvisibleConsumesSpace) {
                return Ok(None);
            }
            return Ok(Some(self.placeholder(tree, element, style, constraints)));
        }
        let id = match &element.kind {
            ElementKind::Label(text) => self.text_element(tree, element, style, text.clone(), constraints)?,
            ElementKind::TextField { field, null_text } => {
                let text = field_text(row, field, null_text.as_deref());
                self.text_element(tree, element, style, text, constraints)?
            }
            ElementKind::Rectangle => self.rectangle(tree, element, style, constraints),
            ElementKind::Band(band) => match style.layout() {
                LayoutMode::Block => {
                    let kind = if band.role.is_root_level() {
                        NodeKind::Band
                    } else {
                        NodeKind::Block
                    };
                    self.block(tree, element, kind, style, &band.children, row, constraints)?
                }
                LayoutMode::Row => self.row(tree, element, style, &band.children, row, constraints)?,
                LayoutMode::Canvas => self.canvas(tree, element, style, &band.children, row, constraints)?,
                LayoutMode::Inline => self.inline(tree, element, style, &band.children, row, constraints)?,
            },
            ElementKind::SubReport(sub) => self.sub_report(tree, element, style, sub, row, constraints)?,
            ElementKind::Crosstab(crosstab) => {
                self.crosstab(tree, element, style, crosstab, row, constraints)?
            }
        };
        Ok(Some(id))
    }

    fn alloc(&self, tree: &mut RenderTree, element: &Element, kind: NodeKind, style: ResolvedStyle, width: Pt) -> BoxId {
        let mut node = RenderNode::new(kind)
            .with_style(style)
            .with_rect(Rect::new(Pt::ZERO, Pt::ZERO, width, Pt::ZERO));
        node.element = Some(element.id);
        node.name = element.name.clone();
        tree.alloc(node)
    }

    /// Sets the final height of a box whose content is `content` tall,
    /// clipping or aligning the content as needed. Returns the height.
    fn finish_height(&mut self, tree: &mut RenderTree, id: BoxId, element: InstanceId, content: Pt) -> Pt {
        let Some(node) = tree.get(id) else { return Pt::ZERO };
        let style = node.style.clone();
        let kind = node.kind;
        let base = self.height_base;
        let height = self.sizer(element).height(&style, base, content);
        if let Some(node) = tree.get_mut(id) {
            node.rect.height = height;
        }
        if height > content && kind == NodeKind::Paragraph {
            paragraph::align_vertically(tree, id, height - content);
        } else if height < content {
            if style.flag(StyleKey::OverflowY) {
                if let Some(node) = tree.get_mut(id) {
                    node.overflow_y = true;
                }
            } else {
                let freed = clip_to_height(tree, id, height);
                debug!("Clipped {element} to {height}, freeing {freed} box(es)");
                self.diagnostics.push(LayoutDiagnostic::Clipped {
                    element: Some(element),
                    content,
                    limit: height,
                });
            }
        }
        height
    }

    /// Flags horizontal overflow when a child reaches past the right edge.
    fn check_width(&self, tree: &mut RenderTree, id: BoxId, content_right: Pt) {
        let Some(node) = tree.get_mut(id) else { return };
        if content_right > node.rect.right() {
            if !node.style.flag(StyleKey::OverflowX) {
                warn!(
                    "Content of {:?} is {} wide but the box is {}",
                    node.element, content_right, node.rect.width
                );
            }
            node.overflow_x = true;
        }
    }

    fn placeholder(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        constraints: BoxConstraints,
    ) -> BoxId {
        let auto = match &element.kind {
            ElementKind::Band(band) if band.children.is_empty() && style.layout() == LayoutMode::Canvas => Pt::ZERO,
            _ => constraints.available_width,
        };
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, auto);
        let id = self.alloc(tree, element, NodeKind::Block, style, width);
        self.finish_height(tree, id, element.id, Pt::ZERO);
        id
    }

    fn text_element(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        text: String,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, constraints.available_width);
        let padding = style.padding(width);
        let run = StyledRun {
            text,
            style: style.clone(),
            element: Some(element.id),
            name: element.name.clone(),
        };
        let (id, content) = paragraph::layout_paragraph(
            tree,
            self.metrics,
            &style,
            std::slice::from_ref(&run),
            width,
            padding,
            self.config.complex_text,
        )?;
        if let Some(node) = tree.get_mut(id) {
            node.element = Some(element.id);
            node.name = element.name.clone();
        }
        self.finish_height(tree, id, element.id, content + padding.vertical());
        Ok(id)
    }

    fn rectangle(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        constraints: BoxConstraints,
    ) -> BoxId {
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, constraints.available_width);
        let id = self.alloc(tree, element, NodeKind::Rectangle, style, width);
        self.finish_height(tree, id, element.id, Pt::ZERO);
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn block(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        kind: NodeKind,
        style: ResolvedStyle,
        children: &[Element],
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, constraints.available_width);
        let padding = style.padding(width);
        let inner = (width - padding.horizontal()).clamp_non_negative();
        let id = self.alloc(tree, element, kind, style.clone(), width);

        let mut y = padding.top;
        let mut right = Pt::ZERO;
        for child in children {
            if let Some(c) = self.build(tree, child, &style, row, BoxConstraints::new(inner))? {
                tree.move_to(c, padding.left, y)?;
                let rect = tree.node(c)?.rect;
                y += rect.height;
                right = right.max(rect.right());
                tree.append_child(id, c)?;
            }
        }
        self.check_width(tree, id, right);
        self.finish_height(tree, id, element.id, y + padding.bottom);
        Ok(id)
    }

    fn row(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        children: &[Element],
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let own_width = self.sizer(element.id).has_width(&style);
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, constraints.available_width);
        let padding = style.padding(width);
        let inner = (width - padding.horizontal()).clamp_non_negative();
        // Without a width of its own a row does not establish a percentage
        // context; its children resolve against the enclosing one.
        let child_base = if own_width { inner } else { constraints.percentage_base };
        let id = self.alloc(tree, element, NodeKind::Row, style.clone(), width);

        let resolved: Vec<(&Element, ResolvedStyle)> = children
            .iter()
            .map(|c| (c, self.resolve_style(c, &style, row)))
            .filter(|(_, s)| s.visible() || s.flag(StyleKey::InvisibleConsumesSpace))
            .collect();
        let mut fixed = Pt::ZERO;
        let mut autos = 0i64;
        for (child, child_style) in &resolved {
            let mut sizer = self.sizer(child.id);
            if sizer.has_width(child_style) {
                fixed += sizer.width(child_style, child_base, Pt::ZERO);
            } else {
                autos += 1;
            }
        }
        let share = if autos > 0 {
            (inner - fixed).clamp_non_negative() / autos
        } else {
            Pt::ZERO
        };

        let mut x = padding.left;
        let mut tallest = Pt::ZERO;
        let mut placed = Vec::with_capacity(resolved.len());
        for (child, child_style) in resolved {
            let available = if self.sizer(child.id).has_width(&child_style) { inner } else { share };
            let child_constraints = BoxConstraints {
                available_width: available,
                percentage_base: child_base,
                max_height: None,
            };
            if let Some(c) = self.build_resolved(tree, child, child_style, row, child_constraints)? {
                tree.move_to(c, x, padding.top)?;
                let rect = tree.node(c)?.rect;
                x += rect.width;
                tallest = tallest.max(rect.height);
                tree.append_child(id, c)?;
                placed.push(c);
            }
        }
        self.check_width(tree, id, x);
        let height = self.finish_height(tree, id, element.id, tallest + padding.vertical());

        if self.sizer(element.id).stretches_row_children() {
            let inner_height = (height - padding.vertical()).clamp_non_negative();
            for c in placed {
                if let Some(node) = tree.get_mut(c) {
                    if node.rect.height < inner_height {
                        node.rect.height = inner_height;
                    }
                }
            }
        }
        Ok(id)
    }

    fn canvas(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        children: &[Element],
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let auto = if children.is_empty() {
            Pt::ZERO
        } else {
            constraints.available_width
        };
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, auto);
        let padding = style.padding(width);
        let inner = (width - padding.horizontal()).clamp_non_negative();
        let id = self.alloc(tree, element, NodeKind::Canvas, style.clone(), width);

        let mut bottom_anchored = Vec::new();
        let mut content = Pt::ZERO;
        let mut right = Pt::ZERO;
        for child in children {
            let child_style = self.resolve_style(child, &style, row);
            let pos_x = child_style.length(StyleKey::PosX);
            let pos_y = child_style.length(StyleKey::PosY);
            let Some(c) = self.build_resolved(tree, child, child_style, row, BoxConstraints::new(inner))? else {
                continue;
            };
            let rect = tree.node(c)?.rect;
            let x = padding.left + position(pos_x, inner, rect.width);
            right = right.max(x + rect.width);
            match pos_y {
                Dimension::Pt(v) if v.is_negative() => bottom_anchored.push((c, x, v)),
                other => {
                    let y = other.resolve(inner).unwrap_or(Pt::ZERO).clamp_non_negative();
                    tree.move_to(c, x, padding.top + y)?;
                    tree.append_child(id, c)?;
                    content = content.max(y + rect.height);
                }
            }
        }
        let height = self.finish_height(tree, id, element.id, content + padding.vertical());
        for (c, x, offset) in bottom_anchored {
            let child_height = tree.node(c)?.rect.height;
            let y = (height - padding.bottom + offset - child_height).max(padding.top);
            tree.move_to(c, x, y)?;
            tree.append_child(id, c)?;
            if y + child_height > height {
                if let Some(node) = tree.get_mut(id) {
                    node.overflow_y = true;
                }
            }
        }
        self.check_width(tree, id, right);
        Ok(id)
    }

    fn inline(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        children: &[Element],
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, constraints.available_width);
        let padding = style.padding(width);
        let mut runs = Vec::new();
        self.collect_runs(children, &style, row, &mut runs);
        let (id, content) = paragraph::layout_paragraph(
            tree,
            self.metrics,
            &style,
            &runs,
            width,
            padding,
            self.config.complex_text,
        )?;
        if let Some(node) = tree.get_mut(id) {
            node.element = Some(element.id);
            node.name = element.name.clone();
        }
        self.finish_height(tree, id, element.id, content + padding.vertical());
        Ok(id)
    }

    /// Flattens text-bearing descendants into runs of one paragraph pool.
    fn collect_runs(
        &mut self,
        children: &[Element],
        inherited: &ResolvedStyle,
        row: &DataRow,
        runs: &mut Vec<StyledRun>,
    ) {
        for child in children {
            let style = self.resolve_style(child, inherited, row);
            if !style.visible() {
                continue;
            }
            let text = match &child.kind {
                ElementKind::Label(text) => text.clone(),
                ElementKind::TextField { field, null_text } => field_text(row, field, null_text.as_deref()),
                ElementKind::Band(band) => {
                    self.collect_runs(&band.children, &style, row, runs);
                    continue;
                }
                _ => {
                    debug!("Skipping {} {} inside an inline band", child.kind_name(), child.id);
                    continue;
                }
            };
            runs.push(StyledRun {
                text,
                style,
                element: Some(child.id),
                name: child.name.clone(),
            });
        }
    }

    fn sub_report(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        sub: &SubReport,
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let parameters: Parameters = sub
            .parameters
            .iter()
            .map(|m| (m.inner.as_str(), row.get(&m.outer)))
            .collect();
        let table = self.queries.query(&sub.query, &parameters, sub.data_factory.as_ref())?;
        let mut sub_row = DataRow::new(parameters).with_table(table, None);
        debug!("Sub-report {} over '{}' with {} row(s)", element.id, sub.query, sub_row.row_count());

        let width = self.sizer(element.id).width(&style, constraints.percentage_base, constraints.available_width);
        let padding = style.padding(width);
        let inner = (width - padding.horizontal()).clamp_non_negative();
        let id = self.alloc(tree, element, NodeKind::SubReport, style.clone(), width);

        let mut y = padding.top;
        let mut place = |builder: &mut Self, tree: &mut RenderTree, band: &Element, data: &DataRow| {
            if let Some(c) = builder.build(tree, band, &style, data, BoxConstraints::new(inner))? {
                tree.move_to(c, padding.left, y)?;
                y += tree.node(c)?.rect.height;
                tree.append_child(id, c)?;
            }
            Ok::<(), LayoutError>(())
        };
        if let Some(header) = &sub.header {
            place(self, tree, header, &sub_row)?;
        }
        while sub_row.advance() {
            place(self, tree, &sub.item_band, &sub_row)?;
        }
        if let Some(footer) = &sub.footer {
            place(self, tree, footer, &sub_row)?;
        }
        self.finish_height(tree, id, element.id, y + padding.bottom);
        Ok(id)
    }

    fn crosstab(
        &mut self,
        tree: &mut RenderTree,
        element: &Element,
        style: ResolvedStyle,
        crosstab: &Crosstab,
        row: &DataRow,
        constraints: BoxConstraints,
    ) -> Result<BoxId, LayoutError> {
        let table = match &crosstab.query {
            Some(query) => Some(self.queries.query(query, row.parameters(), None)?),
            None => row.table().cloned(),
        };
        let grid = match &table {
            Some(table) => CrosstabGrid::compute(crosstab, table.as_ref()),
            None => CrosstabGrid::default(),
        };

        let columns = grid.column_keys.len() + usize::from(crosstab.column_field.is_some());
        let natural = crosstab.row_header_width + crosstab.cell_width * columns as i64;
        let width = self.sizer(element.id).width(&style, constraints.percentage_base, natural);
        let id = self.alloc(tree, element, NodeKind::Crosstab, style.clone(), width);
        let h = crosstab.cell_height;

        let mut column_headers: Vec<(Option<&Value>, String)> =
            grid.column_keys.iter().map(|k| (Some(k), k.display_text())).collect();
        if crosstab.column_field.is_some() {
            column_headers.push((None, crosstab.total_label.clone()));
        }
        let mut row_headers: Vec<(Option<&Value>, String)> =
            grid.row_keys.iter().map(|k| (Some(k), k.display_text())).collect();
        if crosstab.row_field.is_some() {
            row_headers.push((None, crosstab.total_label.clone()));
        }
        if crosstab.row_field.is_none() {
            row_headers = vec![(None, String::new())];
        }
        if crosstab.column_field.is_none() {
            column_headers = vec![(None, String::new())];
        }

        let mut y = Pt::ZERO;
        let mut right = Pt::ZERO;
        let header_line = self.crosstab_line(tree, &style, y, h);
        let mut x = crosstab.row_header_width;
        self.crosstab_cell(tree, header_line, &style, None, String::new(), Rect::new(Pt::ZERO, y, x, h))?;
        for (_, label) in &column_headers {
            let rect = Rect::new(x, y, crosstab.cell_width, h);
            self.crosstab_cell(tree, header_line, &style, None, label.clone(), rect)?;
            x += crosstab.cell_width;
        }
        right = right.max(x);
        finish_line(tree, header_line, x);
        tree.append_child(id, header_line)?;
        y += h;

        for (row_key, row_label) in &row_headers {
            let line = self.crosstab_line(tree, &style, y, h);
            let header_rect = Rect::new(Pt::ZERO, y, crosstab.row_header_width, h);
            self.crosstab_cell(tree, line, &style, None, row_label.clone(), header_rect)?;
            let mut x = crosstab.row_header_width;
            for (column_key, _) in &column_headers {
                let value = grid.cell(*row_key, *column_key).unwrap_or_default();
                let key = CellKey {
                    row: row_key.cloned(),
                    column: column_key.cloned(),
                };
                let rect = Rect::new(x, y, crosstab.cell_width, h);
                self.crosstab_cell(tree, line, &style, Some(key), value.display_text(), rect)?;
                x += crosstab.cell_width;
            }
            finish_line(tree, line, x);
            tree.append_child(id, line)?;
            right = right.max(x);
            y += h;
        }
        self.check_width(tree, id, right);
        self.finish_height(tree, id, element.id, y);
        Ok(id)
    }

    fn crosstab_line(&self, tree: &mut RenderTree, style: &ResolvedStyle, y: Pt, height: Pt) -> BoxId {
        tree.alloc(
            RenderNode::new(NodeKind::Row)
                .with_style(style.clone())
                .with_rect(Rect::new(Pt::ZERO, y, Pt::ZERO, height)),
        )
    }

    fn crosstab_cell(
        &mut self,
        tree: &mut RenderTree,
        line: BoxId,
        style: &ResolvedStyle,
        key: Option<CellKey>,
        text: String,
        rect: Rect,
    ) -> Result<(), LayoutError> {
        let run = StyledRun {
            text,
            style: style.clone(),
            element: None,
            name: None,
        };
        let (paragraph, _) = paragraph::layout_paragraph(
            tree,
            self.metrics,
            style,
            std::slice::from_ref(&run),
            rect.width,
            Default::default(),
            self.config.complex_text,
        )?;
        clip_to_height(tree, paragraph, rect.height);
        if let Some(node) = tree.get_mut(paragraph) {
            node.rect.height = rect.height;
        }
        tree.translate(paragraph, rect.x, rect.y);

        let mut cell = RenderNode::new(NodeKind::CrosstabCell)
            .with_style(style.clone())
            .with_rect(rect);
        cell.cell = key;
        let cell = tree.alloc(cell);
        tree.append_child(cell, paragraph)?;
        tree.append_child(line, cell)
    }
}

fn finish_line(tree: &mut RenderTree, line: BoxId, right: Pt) {
    if let Some(node) = tree.get_mut(line) {
        node.rect.width = right;
    }
}

/// Text shown by a text field: the row value, or `null_text` for nulls.
fn field_text(row: &DataRow, field: &str, null_text: Option<&str>) -> String {
    let value = row.get(field);
    if value.is_null() {
        null_text.unwrap_or_default().to_string()
    } else {
        value.display_text()
    }
}

/// Resolves a canvas position. Negative lengths are offsets from the far
/// edge of the canvas.
fn position(dim: Dimension, extent: Pt, size: Pt) -> Pt {
    match dim {
        Dimension::Pt(v) if v.is_negative() => (extent + v - size).clamp_non_negative(),
        other => other.resolve(extent).unwrap_or(Pt::ZERO).clamp_non_negative(),
    }
}
