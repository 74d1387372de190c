use crate::config::CompatibilityMode;
use crate::test_utils::*;
use crate::tree::NodeKind;
use crate::{LayoutDiagnostic, LayoutError, find_cell, verify_geometry};
use quire_data::{DataRow, Parameters};
use quire_model::BandRole;
use quire_model::builder::{
    BandBuilder, CrosstabBuilder, ElementBuilder, Label, Rectangle, SubReportBuilder, TextField,
};
use quire_style::{Dimension, LayoutMode, StyleKey, TextAlign};
use quire_types::{Pt, Value};
use std::sync::Arc;

fn element(builder: impl ElementBuilder + 'static) -> quire_model::Element {
    Box::new(builder).build()
}

#[test]
fn test_leading_crlf_label_is_three_lines_tall() {
    init_logging();
    let label = element(Label::new("\r\n\r\nClassic Cars").style(StyleKey::LineHeight, Pt::pt(14)));
    for mode in [CompatibilityMode::Legacy38, CompatibilityMode::Current] {
        let row = DataRow::new(Parameters::default());
        let built = build_in(mode, &label, Pt::pt(400), &row, &mut StaticQueries::default());
        assert_eq!(built.height(), Pt::pt(42), "{mode:?}");
        assert_eq!(built.boxes(NodeKind::Line).len(), 3);
        assert_eq!(built.texts(), vec!["Classic Cars"]);
    }
}

#[test]
fn test_min_height_band_sizing_differs_by_mode() {
    init_logging();
    let band = BandBuilder::new(BandRole::ItemBand)
        .style(StyleKey::MinHeight, Pt::pt(20))
        .child(Label::new("a\nb\nc"))
        .into_element();
    let row = DataRow::new(Parameters::default());

    let legacy = build_in(CompatibilityMode::Legacy38, &band, Pt::pt(200), &row, &mut StaticQueries::default());
    assert_eq!(legacy.height(), Pt::pt(20));
    assert_eq!(legacy.texts(), vec!["a"]);
    assert!(
        legacy
            .diagnostics
            .iter()
            .any(|d| matches!(d, LayoutDiagnostic::Clipped { limit, .. } if *limit == Pt::pt(20)))
    );
    assert!(verify_geometry(&legacy.tree, legacy.root()).is_empty());

    let current = build_in(CompatibilityMode::Current, &band, Pt::pt(200), &row, &mut StaticQueries::default());
    assert_eq!(current.height(), Pt::pt(36));
    assert_eq!(current.texts(), vec!["a", "b", "c"]);
    assert!(current.diagnostics.is_empty());
}

#[test]
fn test_overflow_keeps_content_past_fixed_height() {
    let band = BandBuilder::new(BandRole::ItemBand)
        .style(StyleKey::MinHeight, Pt::pt(20))
        .style(StyleKey::OverflowY, true)
        .child(Label::new("a\nb\nc"))
        .into_element();
    let row = DataRow::new(Parameters::default());
    let built = build_in(CompatibilityMode::Legacy38, &band, Pt::pt(200), &row, &mut StaticQueries::default());
    assert_eq!(built.height(), Pt::pt(20));
    assert_eq!(built.texts().len(), 3);
    assert!(built.tree.node(built.root()).unwrap().overflow_y);
    assert!(verify_geometry(&built.tree, built.root()).is_empty());
}

#[test]
fn test_row_without_width_passes_percentage_context_through() {
    let child = || Label::new("x").style(StyleKey::Width, Dimension::percent(50));
    let open = BandBuilder::nested().layout(LayoutMode::Row).child(child()).into_element();
    let built = build(&open, Pt::pt(400));
    let label = built.boxes(NodeKind::Paragraph)[0];
    assert_eq!(built.tree.node(label).unwrap().rect.width, Pt::pt(200));

    let fixed = BandBuilder::nested()
        .layout(LayoutMode::Row)
        .style(StyleKey::Width, Pt::pt(200))
        .child(child())
        .into_element();
    let built = build(&fixed, Pt::pt(400));
    let label = built.boxes(NodeKind::Paragraph)[0];
    assert_eq!(built.tree.node(label).unwrap().rect.width, Pt::pt(100));
}

#[test]
fn test_row_shares_remaining_width_between_auto_children() {
    let row = BandBuilder::nested()
        .layout(LayoutMode::Row)
        .child(Label::new("fixed").style(StyleKey::Width, Pt::pt(100)))
        .child(Label::new("a"))
        .child(Label::new("b"))
        .into_element();
    let built = build(&row, Pt::pt(300));
    let xs: Vec<(Pt, Pt)> = built
        .tree
        .children(built.root())
        .map(|c| {
            let r = built.tree.node(c).unwrap().rect;
            (r.x, r.width)
        })
        .collect();
    assert_eq!(
        xs,
        vec![
            (Pt::ZERO, Pt::pt(100)),
            (Pt::pt(100), Pt::pt(100)),
            (Pt::pt(200), Pt::pt(100))
        ]
    );
}

#[test]
fn test_row_children_stretch_only_in_current_mode() {
    let band = BandBuilder::nested()
        .layout(LayoutMode::Row)
        .child(Label::new("a"))
        .child(Label::new("a\nb"))
        .into_element();
    let row = DataRow::new(Parameters::default());
    for (mode, expected) in [
        (CompatibilityMode::Legacy38, Pt::pt(12)),
        (CompatibilityMode::Current, Pt::pt(24)),
    ] {
        let built = build_in(mode, &band, Pt::pt(200), &row, &mut StaticQueries::default());
        let first = built.tree.children(built.root()).next().unwrap();
        assert_eq!(built.tree.node(first).unwrap().rect.height, expected, "{mode:?}");
        assert_eq!(built.height(), Pt::pt(24));
    }
}

#[test]
fn test_canvas_negative_positions_anchor_far_edges() {
    let canvas = BandBuilder::nested()
        .layout(LayoutMode::Canvas)
        .style(StyleKey::Width, Pt::pt(200))
        .style(StyleKey::Height, Pt::pt(100))
        .child(
            Rectangle::new()
                .name("corner")
                .style(StyleKey::Width, Pt::pt(20))
                .style(StyleKey::Height, Pt::pt(10))
                .style(StyleKey::PosX, Pt::pt(-10))
                .style(StyleKey::PosY, Pt::pt(-5)),
        )
        .child(
            Label::new("hi")
                .style(StyleKey::Width, Pt::pt(50))
                .style(StyleKey::PosX, Pt::pt(30))
                .style(StyleKey::PosY, Pt::pt(40)),
        )
        .into_element();
    let built = build(&canvas, Pt::pt(400));
    let rect = built.tree.node(built.boxes(NodeKind::Rectangle)[0]).unwrap().rect;
    assert_eq!((rect.x, rect.y), (Pt::pt(170), Pt::pt(85)));
    let label = built.tree.node(built.boxes(NodeKind::Paragraph)[0]).unwrap().rect;
    assert_eq!((label.x, label.y), (Pt::pt(30), Pt::pt(40)));
    assert_eq!(built.height(), Pt::pt(100));
    assert!(verify_geometry(&built.tree, built.root()).is_empty());
}

#[test]
fn test_empty_canvas_collapses_to_zero_width() {
    let canvas = BandBuilder::nested().layout(LayoutMode::Canvas).into_element();
    let built = build(&canvas, Pt::pt(400));
    assert_eq!(built.width(), Pt::ZERO);
}

#[test]
fn test_invisible_elements_are_elided_or_keep_their_space() {
    let hidden = element(Label::new("secret").style(StyleKey::Visible, false));
    assert!(build(&hidden, Pt::pt(100)).root.is_none());

    let reserved = element(
        Label::new("secret")
            .style(StyleKey::Visible, false)
            .style(StyleKey::InvisibleConsumesSpace, true)
            .style(StyleKey::Height, Pt::pt(15)),
    );
    let built = build(&reserved, Pt::pt(100));
    assert_eq!(built.height(), Pt::pt(15));
    assert!(built.texts().is_empty());
}

#[test]
fn test_negative_width_clamps_with_diagnostic_in_current_mode() {
    let label = element(Label::new("x").style(StyleKey::Width, Pt::pt(-50)));
    let built = build(&label, Pt::pt(400));
    assert_eq!(built.width(), Pt::ZERO);
    assert!(matches!(
        built.diagnostics.as_slice(),
        [LayoutDiagnostic::NegativeLength { key: StyleKey::Width, .. }]
    ));
}

#[test]
fn test_text_field_uses_row_value_or_null_text() {
    let table = table(&["name"], &[&[Value::from("Alice")], &[Value::Null]]);
    let mut row = DataRow::new(Parameters::default()).with_table(Arc::new(table), None);
    let field = element(TextField::new("name").null_text("-"));
    row.advance();
    assert_eq!(build_in(CompatibilityMode::Current, &field, Pt::pt(100), &row, &mut StaticQueries::default()).texts(), vec!["Alice"]);
    row.advance();
    assert_eq!(build_in(CompatibilityMode::Current, &field, Pt::pt(100), &row, &mut StaticQueries::default()).texts(), vec!["-"]);
}

#[test]
fn test_style_expressions_follow_the_row() {
    let table = table(&["amount"], &[&[Value::from(50)], &[Value::from(500)]]);
    let mut row = DataRow::new(Parameters::default()).with_table(Arc::new(table), None);
    let label = element(
        Label::new("big")
            .style(StyleKey::TextAlign, TextAlign::Left)
            .style_expression(StyleKey::Visible, "[amount] >= 100"),
    );
    row.advance();
    assert!(build_in(CompatibilityMode::Current, &label, Pt::pt(100), &row, &mut StaticQueries::default()).root.is_none());
    row.advance();
    assert!(build_in(CompatibilityMode::Current, &label, Pt::pt(100), &row, &mut StaticQueries::default()).root.is_some());
}

#[test]
fn test_inline_band_pools_runs_into_one_paragraph() {
    let band = BandBuilder::nested()
        .layout(LayoutMode::Inline)
        .child(Label::new("Hello "))
        .child(Label::new("world").style(StyleKey::FontSize, Pt::pt(20)))
        .into_element();
    let built = build(&band, Pt::pt(400));
    assert_eq!(built.boxes(NodeKind::Paragraph).len(), 1);
    assert_eq!(built.boxes(NodeKind::Line).len(), 1);
    assert_eq!(built.texts(), vec!["Hello ", "world"]);
    assert_eq!(built.height(), Pt::pt(24));
}

#[test]
fn test_sub_report_maps_parameters_and_repeats_item_band() {
    let items = table(&["sku"], &[&[Value::from("A-1")], &[Value::from("B-2")]]);
    let mut queries = StaticQueries::default().with("items", items);
    let sub = element(
        SubReportBuilder::new("items")
            .map_parameter("order_id", "order")
            .header(BandBuilder::nested().child(Label::new("Items")))
            .item_band(BandBuilder::nested().child(TextField::new("sku"))),
    );
    let row = DataRow::new(Parameters::new().with("order_id", 7));
    let built = build_in(CompatibilityMode::Current, &sub, Pt::pt(300), &row, &mut queries);
    assert_eq!(built.texts(), vec!["Items", "A-1", "B-2"]);
    assert_eq!(built.height(), Pt::pt(36));
    assert_eq!(queries.calls.len(), 1);
    assert_eq!(queries.calls[0].1.get("order"), Some(&Value::from(7)));
    assert!(verify_geometry(&built.tree, built.root()).is_empty());
}

#[test]
fn test_sub_report_query_failure_propagates() {
    let sub = element(SubReportBuilder::new("missing").item_band(BandBuilder::nested()));
    let config = crate::LayoutConfig::default();
    let metrics = quire_traits::MonospaceMetrics::default();
    let styles = quire_style::NamedStyles::default();
    let mut queries = StaticQueries::default();
    let mut builder = crate::BoxBuilder::new(config, &metrics, &styles, &mut queries);
    let mut tree = crate::RenderTree::new();
    let result = builder.build(
        &mut tree,
        &sub,
        &quire_style::ResolvedStyle::default(),
        &DataRow::new(Parameters::default()),
        crate::BoxConstraints::new(Pt::pt(100)),
    );
    assert!(matches!(result, Err(LayoutError::Query(_))));
}

#[test]
fn test_crosstab_cells_are_addressable() {
    let sales = table(
        &["region", "year", "amount"],
        &[
            &[Value::from("north"), Value::from(2023), Value::from(10)],
            &[Value::from("south"), Value::from(2023), Value::from(7)],
            &[Value::from("north"), Value::from(2024), Value::from(5)],
        ],
    );
    let row = DataRow::new(Parameters::default()).with_table(Arc::new(sales), None);
    let crosstab = element(CrosstabBuilder::new("amount").rows("region").columns("year"));
    let built = build_in(CompatibilityMode::Current, &crosstab, Pt::pt(400), &row, &mut StaticQueries::default());

    let total = find_cell(&built.tree, built.root(), None, None).unwrap();
    assert_eq!(built.tree.text_content(total), Value::from(22.0).display_text());
    let north_2024 = find_cell(
        &built.tree,
        built.root(),
        Some(&Value::from("north")),
        Some(&Value::from(2024)),
    )
    .unwrap();
    assert_eq!(built.tree.text_content(north_2024), Value::from(5.0).display_text());
    // Header, two regions and the total row, 14pt each.
    assert_eq!(built.height(), Pt::pt(56));
    assert!(verify_geometry(&built.tree, built.root()).is_empty());
}
