//! Built-in report functions.
//!
//! Functions accumulate state from lifecycle events. The evaluator clones
//! them for checkpoints, so state that only grows during the structural
//! pass is kept behind an `Arc` to keep those clones cheap.

use crate::event::{EventKind, ReportEvent};
use crate::expression::{Function, Requirements};
use quire_data::DataRow;
use quire_types::{ProcessingLevel, Value};
use std::sync::Arc;

fn starts_scope(event: &ReportEvent, group: Option<&str>) -> bool {
    match group {
        None => event.kind == EventKind::ReportStarted,
        Some(_) => event.kind == EventKind::GroupStarted && event.is_group(group),
    }
}

fn numeric(row: &DataRow, field: &str) -> f64 {
    row.get(field).as_f64().unwrap_or(0.0)
}

macro_rules! function_boilerplate {
    () => {
        fn name(&self) -> &str {
            &self.name
        }

        fn box_clone(&self) -> Box<dyn Function> {
            Box::new(self.clone())
        }
    };
}

/// Running sum of a field, reset when its group (or the report) starts.
#[derive(Debug, Clone)]
pub struct ItemSum {
    name: String,
    field: String,
    group: Option<Arc<str>>,
    sum: f64,
}

impl ItemSum {
    pub fn new(name: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            group: None,
            sum: 0.0,
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(Arc::from(group));
        self
    }
}

impl Function for ItemSum {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, row: &DataRow) {
        if starts_scope(event, self.group.as_deref()) {
            self.sum = 0.0;
        } else if event.kind == EventKind::ItemsAdvanced {
            self.sum += numeric(row, &self.field);
        }
    }

    fn value(&self) -> Value {
        Value::Number(self.sum)
    }
}

/// Number of rows seen since its group (or the report) started.
#[derive(Debug, Clone)]
pub struct ItemCount {
    name: String,
    group: Option<Arc<str>>,
    count: usize,
}

impl ItemCount {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group: None,
            count: 0,
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(Arc::from(group));
        self
    }
}

impl Function for ItemCount {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, _row: &DataRow) {
        if starts_scope(event, self.group.as_deref()) {
            self.count = 0;
        } else if event.kind == EventKind::ItemsAdvanced {
            self.count += 1;
        }
    }

    fn value(&self) -> Value {
        Value::from(self.count)
    }
}

/// The full sum of a field over its group, available from the group's
/// first row on.
///
/// Totals are collected during structural preprocessing, one per group
/// instance in order. Later passes replay the same group sequence and read
/// the collected totals back.
#[derive(Debug, Clone)]
pub struct TotalSum {
    name: String,
    field: String,
    group: Option<Arc<str>>,
    totals: Arc<Vec<f64>>,
    cursor: Option<usize>,
    collecting: bool,
}

impl TotalSum {
    pub fn new(name: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            group: None,
            totals: Arc::new(Vec::new()),
            cursor: None,
            collecting: false,
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(Arc::from(group));
        self
    }
}

impl Function for TotalSum {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, row: &DataRow) {
        if event.kind == EventKind::ReportInitialized {
            self.collecting = event.level == ProcessingLevel::StructuralPreprocessing;
            if self.collecting {
                self.totals = Arc::new(Vec::new());
            }
            self.cursor = None;
        } else if starts_scope(event, self.group.as_deref()) {
            if self.collecting {
                let totals = Arc::make_mut(&mut self.totals);
                totals.push(0.0);
                self.cursor = Some(totals.len() - 1);
            } else {
                self.cursor = Some(self.cursor.map_or(0, |c| c + 1));
            }
        } else if event.kind == EventKind::ItemsAdvanced && self.collecting {
            if let Some(c) = self.cursor {
                let value = numeric(row, &self.field);
                if let Some(total) = Arc::make_mut(&mut self.totals).get_mut(c) {
                    *total += value;
                }
            }
        }
    }

    fn value(&self) -> Value {
        self.cursor
            .and_then(|c| self.totals.get(c))
            .map_or(Value::Null, |t| Value::Number(*t))
    }

    fn requirements(&self) -> Requirements {
        Requirements {
            prepare_run: true,
            ..Requirements::default()
        }
    }
}

/// Sum of a field over the rows printed on the current page.
#[derive(Debug, Clone)]
pub struct PageSum {
    name: String,
    field: String,
    sum: f64,
}

impl PageSum {
    pub fn new(name: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            sum: 0.0,
        }
    }
}

impl Function for PageSum {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, row: &DataRow) {
        match event.kind {
            EventKind::PageStarted => self.sum = 0.0,
            EventKind::ItemsAdvanced => self.sum += numeric(row, &self.field),
            _ => {}
        }
    }

    fn value(&self) -> Value {
        Value::Number(self.sum)
    }

    fn requirements(&self) -> Requirements {
        Requirements {
            pagination: true,
            ..Requirements::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageNumber {
    name: String,
    page: usize,
}

impl PageNumber {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            page: 0,
        }
    }
}

impl Function for PageNumber {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, _row: &DataRow) {
        if matches!(event.kind, EventKind::PageStarted | EventKind::ReportInitialized) {
            self.page = event.page;
        }
    }

    fn value(&self) -> Value {
        Value::from(self.page)
    }
}

/// Total page count, known once the pagination pass has finished.
#[derive(Debug, Clone)]
pub struct PageTotal {
    name: String,
    counting: bool,
    pages: usize,
    total: Option<usize>,
}

impl PageTotal {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            counting: false,
            pages: 0,
            total: None,
        }
    }
}

impl Function for PageTotal {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, _row: &DataRow) {
        match event.kind {
            EventKind::ReportInitialized => {
                self.counting = event.level == ProcessingLevel::Pagination;
                if self.counting {
                    self.pages = 0;
                }
            }
            EventKind::PageStarted if self.counting => self.pages = self.pages.max(event.page),
            EventKind::ReportDone if self.counting => self.total = Some(self.pages),
            _ => {}
        }
    }

    fn value(&self) -> Value {
        self.total.map_or(Value::Null, Value::from)
    }

    fn requirements(&self) -> Requirements {
        Requirements {
            pagination: true,
            ..Requirements::default()
        }
    }
}

/// Alternates between `false` and `true` every `every` rows.
#[derive(Debug, Clone)]
pub struct RowBanding {
    name: String,
    group: Option<Arc<str>>,
    every: usize,
    count: usize,
}

impl RowBanding {
    pub fn new(name: &str, every: usize) -> Self {
        Self {
            name: name.to_string(),
            group: None,
            every: every.max(1),
            count: 0,
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(Arc::from(group));
        self
    }
}

impl Function for RowBanding {
    function_boilerplate!();

    fn handle_event(&mut self, event: &ReportEvent, _row: &DataRow) {
        if starts_scope(event, self.group.as_deref()) {
            self.count = 0;
        } else if event.kind == EventKind::ItemsAdvanced {
            self.count += 1;
        }
    }

    fn value(&self) -> Value {
        Value::Bool(self.count > 0 && ((self.count - 1) / self.every) % 2 == 1)
    }

    fn requirements(&self) -> Requirements {
        Requirements {
            row_banding: true,
            ..Requirements::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_data::{DefaultTableModel, Parameters};

    fn event(kind: EventKind, level: ProcessingLevel) -> ReportEvent {
        ReportEvent::new(kind, level, 1)
    }

    fn rows(values: &[(&str, i64)]) -> DataRow {
        let mut table = DefaultTableModel::new(["region", "amount"]);
        for (r, a) in values {
            table.push_row(vec![Value::from(*r), Value::from(*a)]);
        }
        DataRow::new(Parameters::new()).with_table(Arc::new(table), None)
    }

    /// Drives one pass over the rows, grouping by region.
    fn run_pass(f: &mut dyn Function, row: &mut DataRow, level: ProcessingLevel) -> Vec<Value> {
        let mut seen = Vec::new();
        row.rewind();
        f.handle_event(&event(EventKind::ReportInitialized, level), row);
        f.handle_event(&event(EventKind::ReportStarted, level), row);
        while row.advance() {
            if row.is_changed("region") {
                f.handle_event(&event(EventKind::GroupStarted, level).for_group("region".into()), row);
            }
            f.handle_event(&event(EventKind::ItemsAdvanced, level), row);
            seen.push(f.value());
        }
        f.handle_event(&event(EventKind::ReportDone, level), row);
        seen
    }

    #[test]
    fn test_item_sum_resets_per_group() {
        let mut row = rows(&[("E", 1), ("E", 2), ("W", 5)]);
        let mut f = ItemSum::new("sum", "amount").in_group("region");
        let seen = run_pass(&mut f, &mut row, ProcessingLevel::ContentGeneration);
        assert_eq!(seen, vec![Value::from(1), Value::from(3), Value::from(5)]);
    }

    #[test]
    fn test_total_sum_known_from_first_row() {
        let mut row = rows(&[("E", 1), ("E", 2), ("W", 5)]);
        let mut f = TotalSum::new("total", "amount").in_group("region");
        run_pass(&mut f, &mut row, ProcessingLevel::StructuralPreprocessing);
        let seen = run_pass(&mut f, &mut row, ProcessingLevel::ContentGeneration);
        assert_eq!(seen, vec![Value::from(3), Value::from(3), Value::from(5)]);
        assert!(f.requirements().prepare_run);
    }

    #[test]
    fn test_page_sum_resets_on_page_start() {
        let row = rows(&[("E", 4)]);
        let mut f = PageSum::new("ps", "amount");
        let level = ProcessingLevel::ContentGeneration;
        f.handle_event(&event(EventKind::PageStarted, level), &row);
        let mut row = row;
        row.advance();
        f.handle_event(&event(EventKind::ItemsAdvanced, level), &row);
        assert_eq!(f.value(), Value::from(4));
        f.handle_event(&event(EventKind::PageStarted, level), &row);
        assert_eq!(f.value(), Value::from(0));
    }

    #[test]
    fn test_page_total_counts_during_pagination_only() {
        let row = rows(&[]);
        let mut f = PageTotal::new("pages");
        let pagination = ProcessingLevel::Pagination;
        f.handle_event(&event(EventKind::ReportInitialized, pagination), &row);
        for page in 1..=3 {
            f.handle_event(&ReportEvent::new(EventKind::PageStarted, pagination, page), &row);
        }
        assert_eq!(f.value(), Value::Null);
        f.handle_event(&event(EventKind::ReportDone, pagination), &row);
        let content = ProcessingLevel::ContentGeneration;
        f.handle_event(&event(EventKind::ReportInitialized, content), &row);
        f.handle_event(&ReportEvent::new(EventKind::PageStarted, content, 1), &row);
        assert_eq!(f.value(), Value::from(3));
    }

    #[test]
    fn test_row_banding_alternates() {
        let mut row = rows(&[("E", 1), ("E", 1), ("E", 1), ("E", 1), ("E", 1)]);
        let mut f = RowBanding::new("band", 2);
        let seen = run_pass(&mut f, &mut row, ProcessingLevel::ContentGeneration);
        let flags: Vec<bool> = seen.iter().map(Value::is_truthy).collect();
        assert_eq!(flags, vec![false, false, true, true, false]);
    }
}
