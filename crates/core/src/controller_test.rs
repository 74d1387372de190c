use crate::config::{EngineConfig, GenerationMode};
use crate::error::ReportError;
use crate::processor::ReportProcessor;
use crate::test_utils::*;
use crate::writers::CsvContentWriter;
use quire_data::{DataFactoryError, DefaultTableModel, InMemoryDataCache, Parameters, TableDataFactory};
use quire_expr::{PageNumber, PageSum, PageTotal, TotalSum};
use quire_layout::{AreaKind, LogicalPageBox, verify_geometry};
use quire_model::BandRole;
use quire_model::builder::{BandBuilder, GroupBuilder, Label, ReportBuilder, TextField};
use quire_style::StyleKey;
use quire_traits::CancellationToken;
use quire_types::ProcessingLevel;
use std::sync::Arc;

fn content_counts(pages: &[LogicalPageBox]) -> Vec<usize> {
    pages.iter().map(|p| p.area_children(AreaKind::Content).len()).collect()
}

fn area_counts(pages: &[LogicalPageBox], kind: AreaKind) -> Vec<usize> {
    pages.iter().map(|p| p.area_children(kind).len()).collect()
}

#[test]
fn test_rows_flow_across_pages() {
    let (factory, probe) = factory(ungrouped(12));
    let report = ReportBuilder::new("flow")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(outcome.pages, 3);
    assert_eq!(content_counts(&pages), vec![5, 5, 2]);
    for page in &pages {
        assert!(verify_geometry(&page.tree, page.root).is_empty(), "page {}", page.number);
    }
    assert_eq!(pages[1].tree.text_content(pages[1].area_children(AreaKind::Content)[0]), "6");
    assert_eq!(probe.executions(), 1);
    assert_eq!(probe.open_instances(), 0);
}

#[test]
fn test_page_sum_counts_rows_on_their_final_page() {
    let (factory, _) = factory(ungrouped(10));
    let report = ReportBuilder::new("page-sum")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .function(PageSum::new("page_amount", "amount"))
        .page_footer(BandBuilder::new(BandRole::PageFooter).child(TextField::new("page_amount")))
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    let footers: Vec<String> = pages.iter().map(|p| p.area_text(AreaKind::Footer)).collect();
    assert_eq!(footers, vec!["4", "4", "2"]);
    assert_eq!(
        outcome.statistics.passes,
        vec![ProcessingLevel::Pagination, ProcessingLevel::ContentGeneration]
    );
}

#[test]
fn test_sticky_group_footer_repeats_while_group_is_open() {
    let (factory, _) = factory(ungrouped(10));
    let report = ReportBuilder::new("sticky")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .group(
            GroupBuilder::new("all")
                .field("group")
                .footer(BandBuilder::new(BandRole::GroupFooter).child(Label::new("cont")).sticky()),
        )
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(area_counts(&pages, AreaKind::RepeatFooter), vec![1, 1, 0]);
    assert_eq!(pages[0].area_text(AreaKind::RepeatFooter), "cont");
    let last = pages.last().unwrap();
    let bands = last.area_children(AreaKind::Content);
    assert_eq!(bands.len(), 3);
    assert_eq!(last.tree.text_content(bands[2]), "cont");
    for page in &pages {
        assert!(verify_geometry(&page.tree, page.root).is_empty(), "page {}", page.number);
    }
}

#[test]
fn test_sticky_group_header_is_repeated_on_continuation_pages() {
    let (factory, _) = factory(ungrouped(8));
    let report = ReportBuilder::new("sticky-header")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .group(
            GroupBuilder::new("all")
                .field("group")
                .header(BandBuilder::new(BandRole::GroupHeader).child(TextField::new("group")).sticky()),
        )
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(content_counts(&pages), vec![5, 5]);
    for page in &pages {
        let first = page.area_children(AreaKind::Content)[0];
        assert_eq!(page.tree.text_content(first), "all");
    }
}

#[test]
fn test_page_header_respects_first_and_last_page_flags() {
    let (factory, _) = factory(ungrouped(12));
    let report = ReportBuilder::new("header-flags")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .page_header(
            BandBuilder::new(BandRole::PageHeader)
                .child(Label::new("head"))
                .style(StyleKey::DisplayOnFirstPage, false)
                .style(StyleKey::DisplayOnLastPage, false),
        )
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(area_counts(&pages, AreaKind::Header), vec![0, 1, 0]);
    assert_eq!(content_counts(&pages), vec![5, 4, 3]);
}

#[test]
fn test_page_numbers_and_total_come_from_the_pagination_pass() {
    let (factory, _) = factory(ungrouped(7));
    let report = ReportBuilder::new("page-total")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .function(PageNumber::new("page"))
        .function(PageTotal::new("pages"))
        .page_footer(
            BandBuilder::new(BandRole::PageFooter)
                .child(TextField::new("page"))
                .child(TextField::new("pages").null_text("?")),
        )
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    let footers: Vec<String> = pages.iter().map(|p| p.area_text(AreaKind::Footer)).collect();
    assert_eq!(footers, vec!["1\n3", "2\n3", "3\n3"]);
}

#[test]
fn test_structural_pass_runs_only_when_needed() {
    let (factory, _) = factory(ungrouped(3));
    let report = ReportBuilder::new("total")
        .query("rows")
        .data_factory(factory)
        .function(TotalSum::new("total", "amount"))
        .report_header(BandBuilder::new(BandRole::ReportHeader).child(TextField::new("total")))
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(
        outcome.statistics.passes,
        vec![ProcessingLevel::StructuralPreprocessing, ProcessingLevel::ContentGeneration]
    );
    let header = pages[0].area_children(AreaKind::Content)[0];
    assert_eq!(pages[0].tree.text_content(header), "3");
}

#[test]
fn test_page_break_before_starts_each_group_on_a_new_page() {
    let (factory, _) = factory(rows(&["A", "A", "B", "B"]));
    let report = ReportBuilder::new("breaks")
        .query("rows")
        .data_factory(factory)
        .group(
            GroupBuilder::new("by-group").field("group").header(
                BandBuilder::new(BandRole::GroupHeader)
                    .child(TextField::new("group"))
                    .style(StyleKey::PageBreakBefore, true),
            ),
        )
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(content_counts(&pages), vec![3, 3]);
    let first = pages[1].area_children(AreaKind::Content)[0];
    assert_eq!(pages[1].tree.text_content(first), "B");
}

fn content_texts(pages: &[LogicalPageBox]) -> Vec<String> {
    pages.iter().map(|p| p.area_text(AreaKind::Content)).collect()
}

fn title() -> BandBuilder {
    BandBuilder::new(BandRole::ReportHeader).child(Label::new("title"))
}

#[test]
fn test_page_break_after_closes_the_page_behind_each_row() {
    let breaking = || item_band().style(StyleKey::PageBreakAfter, true);
    let (factory, _) = factory(ungrouped(3));
    let report = ReportBuilder::new("break-after")
        .query("rows")
        .data_factory(factory)
        .item_band(breaking())
        .report_footer(BandBuilder::new(BandRole::ReportFooter).child(Label::new("end")))
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(content_counts(&pages), vec![1, 1, 1, 1]);
    assert_eq!(content_texts(&pages), vec!["1", "2", "3", "end"]);

    // A break still pending when the report ends opens no empty page.
    let (factory, _) = crate::test_utils::factory(ungrouped(3));
    let report = ReportBuilder::new("break-after-last")
        .query("rows")
        .data_factory(factory)
        .item_band(breaking())
        .build();
    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(content_counts(&pages), vec![1, 1, 1]);
}

#[test]
fn test_explicit_break_wins_over_orphans() {
    let (factory, _) = factory(ungrouped(2));
    let report = ReportBuilder::new("break-over-orphans")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .report_header(title())
        .item_band(
            BandBuilder::new(BandRole::ItemBand)
                .child(TextField::new("id"))
                .child(Label::new("a\nb\nc"))
                .style(StyleKey::Orphans, 2i64)
                .style(StyleKey::Widows, 2i64)
                .style(StyleKey::PageBreakBefore, true),
        )
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    // The title is left alone on the first page.
    assert_eq!(content_texts(&pages), vec!["title", "1\na\nb\nc", "2\na\nb\nc"]);
}

#[test]
fn test_band_avoiding_breaks_moves_to_the_next_page_whole() {
    let (factory, _) = factory(ungrouped(1));
    let report = ReportBuilder::new("keep-together")
        .page(page(30))
        .query("rows")
        .data_factory(factory)
        .report_header(title())
        .item_band(
            item_band()
                .child(Label::new("second"))
                .style(StyleKey::AvoidPageBreakInside, true),
        )
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(content_texts(&pages), vec!["title", "1\nsecond"]);
    for page in &pages {
        assert!(verify_geometry(&page.tree, page.root).is_empty(), "page {}", page.number);
    }
}

#[test]
fn test_band_orphans_keep_rows_off_a_nearly_full_page() {
    let (factory, _) = factory(ungrouped(1));
    let report = ReportBuilder::new("band-orphans")
        .page(page(30))
        .query("rows")
        .data_factory(factory)
        .report_header(title())
        .item_band(
            item_band()
                .child(Label::new("x"))
                .child(Label::new("y"))
                .style(StyleKey::Orphans, 2i64),
        )
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    // One child would fit under the title; two are required.
    assert_eq!(content_texts(&pages), vec!["title", "1\nx", "y"]);
}

#[test]
fn test_plain_group_footer_prints_once_where_emitted() {
    let (factory, _) = factory(ungrouped(10));
    let report = ReportBuilder::new("plain-footer")
        .page(page(60))
        .query("rows")
        .data_factory(factory)
        .group(
            GroupBuilder::new("all")
                .field("group")
                .footer(BandBuilder::new(BandRole::GroupFooter).child(Label::new("total"))),
        )
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert!(area_counts(&pages, AreaKind::RepeatFooter).iter().all(|n| *n == 0));
    assert_eq!(content_counts(&pages), vec![5, 5, 1]);
    let texts = content_texts(&pages);
    assert_eq!(texts.iter().map(|t| t.matches("total").count()).sum::<usize>(), 1);
    assert_eq!(texts[2], "total");
}

#[test]
fn test_no_data_band_when_query_is_empty() {
    let (factory, _) = factory(DefaultTableModel::new(["id"]));
    let report = ReportBuilder::new("empty")
        .query("rows")
        .data_factory(factory)
        .item_band(item_band())
        .no_data(BandBuilder::new(BandRole::NoData).child(Label::new("nothing")))
        .build();

    let (outcome, pages) = render(&report);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].area_text(AreaKind::Content), "nothing");
}

#[test]
fn test_cancellation_stops_the_run_and_releases_factories() {
    let (factory, probe) = factory(ungrouped(100));
    let report = ReportBuilder::new("cancelled")
        .query("rows")
        .data_factory(factory)
        .item_band(item_band())
        .build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let processor = ReportProcessor::new(EngineConfig::default()).with_cancellation(cancel);
    let (outcome, pages) = render_with(processor, &report);
    assert!(!outcome.succeeded);
    assert!(matches!(outcome.error, Some(ReportError::Cancelled)));
    assert!(pages.is_empty());
    assert_eq!(probe.open_instances(), 0);
}

#[test]
fn test_failed_query_is_reported_and_factories_closed() {
    let factory = TableDataFactory::new().with_query("rows", |_| {
        Err(DataFactoryError::QueryFailed {
            query: "rows".to_string(),
            message: "connection refused".to_string(),
        })
    });
    let probe = factory.probe();
    let report = ReportBuilder::new("broken")
        .query("rows")
        .data_factory(Arc::new(factory))
        .item_band(item_band())
        .build();

    let (outcome, pages) = render(&report);
    assert!(!outcome.succeeded);
    assert!(pages.is_empty());
    assert!(outcome.error.as_ref().is_some_and(ReportError::is_data_error));
    let reason = outcome.error_reason.unwrap_or_default();
    assert!(reason.contains("connection refused"), "{reason}");
    assert_eq!(probe.open_count(), 1);
    assert_eq!(probe.close_count(), 1);
}

#[test]
fn test_unknown_query_fails_validation() {
    let (factory, probe) = factory(ungrouped(3));
    let report = ReportBuilder::new("unknown")
        .query("missing")
        .data_factory(factory)
        .item_band(item_band())
        .build();

    let (outcome, _) = render(&report);
    assert!(matches!(outcome.error, Some(ReportError::Validation(_))));
    assert!(outcome.error_reason.unwrap_or_default().contains("missing"));
    assert_eq!(probe.open_count(), 0);
}

#[test]
fn test_structural_violation_fails_before_any_data_access() {
    let (factory, probe) = factory(ungrouped(3));
    let report = ReportBuilder::new("wrong-role")
        .query("rows")
        .data_factory(factory)
        .item_band(BandBuilder::new(BandRole::ReportHeader).child(TextField::new("id")))
        .build();

    let (outcome, _) = render(&report);
    assert!(matches!(outcome.error, Some(ReportError::Validation(_))));
    assert_eq!(probe.open_count(), 0);
}

#[test]
fn test_fast_and_full_exports_match() {
    init_logging();
    let (factory, _) = factory(rows(&["A", "A", "B", "C", "C", "C"]));
    let report = ReportBuilder::new("equivalent")
        .query("rows")
        .data_factory(factory)
        .page_header(BandBuilder::new(BandRole::PageHeader).child(Label::new("Sales")))
        .report_header(BandBuilder::new(BandRole::ReportHeader).child(Label::new("Start")))
        .group(
            GroupBuilder::new("by-group")
                .field("group")
                .header(BandBuilder::new(BandRole::GroupHeader).child(TextField::new("group")))
                .footer(BandBuilder::new(BandRole::GroupFooter).child(Label::new("end of group"))),
        )
        .item_band(item_band().child(TextField::new("amount")))
        .report_footer(BandBuilder::new(BandRole::ReportFooter).child(Label::new("Done")))
        .page_footer(BandBuilder::new(BandRole::PageFooter).child(Label::new("page")))
        .build();

    let export = |mode| {
        let processor = ReportProcessor::new(EngineConfig::builder().generation_mode(mode).build());
        let mut writer = CsvContentWriter::new(Vec::new());
        let outcome = processor.export(
            &report,
            &Parameters::new(),
            Arc::new(InMemoryDataCache::new()),
            &mut writer,
        );
        assert!(outcome.succeeded, "{:?}", outcome.error_reason);
        (outcome.statistics.fast_path, writer.into_inner().unwrap())
    };

    let (full_fast, full) = export(GenerationMode::ForceFull);
    let (fast_fast, fast) = export(GenerationMode::ForceStreaming);
    assert!(!full_fast);
    assert!(fast_fast);
    assert_eq!(String::from_utf8(fast).unwrap(), String::from_utf8(full).unwrap());
}

#[test]
fn test_forced_streaming_rejects_sticky_reports() {
    let (factory, _) = factory(ungrouped(2));
    let report = ReportBuilder::new("sticky")
        .query("rows")
        .data_factory(factory)
        .item_band(item_band().sticky())
        .build();
    let processor = ReportProcessor::new(
        EngineConfig::builder()
            .generation_mode(GenerationMode::ForceStreaming)
            .build(),
    );
    let mut writer = CsvContentWriter::new(Vec::new());
    let outcome = processor.export(
        &report,
        &Parameters::new(),
        Arc::new(InMemoryDataCache::new()),
        &mut writer,
    );
    assert!(matches!(outcome.error, Some(ReportError::NotStreamable(_))));
}
