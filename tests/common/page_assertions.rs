use quire::layout::{AreaKind, GeometryViolation, LogicalPageBox, verify_geometry};

/// Geometry violations of every page, tagged with the page number.
pub fn geometry_violations(pages: &[LogicalPageBox]) -> Vec<(usize, GeometryViolation)> {
    pages
        .iter()
        .flat_map(|page| {
            verify_geometry(&page.tree, page.root)
                .into_iter()
                .map(move |v| (page.number, v))
        })
        .collect()
}

/// Number of bands in `kind` on each page.
pub fn band_counts(pages: &[LogicalPageBox], kind: AreaKind) -> Vec<usize> {
    pages.iter().map(|p| p.area_children(kind).len()).collect()
}

/// Text of `kind` on each page.
pub fn area_texts(pages: &[LogicalPageBox], kind: AreaKind) -> Vec<String> {
    pages.iter().map(|p| p.area_text(kind)).collect()
}

/// Assert the number of pages of a rendered report
#[macro_export]
macro_rules! assert_page_count {
    ($rendered:expr, $count:expr) => {
        assert_eq!(
            $rendered.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $rendered.page_count()
        );
    };
}

/// Assert that a rendered report contains specific text
#[macro_export]
macro_rules! assert_report_contains_text {
    ($rendered:expr, $text:expr) => {
        let text = $rendered.text();
        assert!(
            text.contains($text),
            "Report should contain '{}', but its text was:\n{}",
            $text,
            text
        );
    };
}

/// Assert that every page keeps children inside parents and stacks
/// siblings without gaps
#[macro_export]
macro_rules! assert_geometry_valid {
    ($rendered:expr) => {
        let violations = $crate::common::page_assertions::geometry_violations(&$rendered.pages);
        assert!(violations.is_empty(), "Geometry violations: {:?}", violations);
    };
}

/// Assert that a run succeeded, showing the error reason otherwise
#[macro_export]
macro_rules! assert_succeeded {
    ($rendered:expr) => {
        assert!(
            $rendered.outcome.succeeded,
            "Run failed: {:?}",
            $rendered.outcome.error_reason
        );
    };
}
