use crate::error::DataFactoryError;
use indexmap::IndexSet;
use quire_types::Value;
use std::fmt;
use std::sync::Arc;

/// A read-only, rectangular result set.
pub trait TableModel: Send + Sync + fmt::Debug {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn column_name(&self, column: usize) -> Option<&str>;

    /// The value at `(row, column)`, or `Null` when out of range.
    fn value_at(&self, row: usize, column: usize) -> Value;

    fn find_column(&self, name: &str) -> Option<usize> {
        (0..self.column_count()).find(|&c| self.column_name(c) == Some(name))
    }

    /// True for views handed out by a data cache.
    fn is_cache_view(&self) -> bool {
        false
    }
}

pub type SharedTable = Arc<dyn TableModel>;

/// An in-memory table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultTableModel {
    columns: IndexSet<Arc<str>>,
    rows: Vec<Vec<Value>>,
}

impl DefaultTableModel {
    pub fn new<S: Into<Arc<str>>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.push_row(row);
        self
    }

    /// Builds a table from an array of JSON objects. Columns appear in
    /// first-seen order; missing fields are `Null`.
    pub fn from_json_rows(rows: &[serde_json::Value]) -> Result<Self, DataFactoryError> {
        let mut columns: IndexSet<Arc<str>> = IndexSet::new();
        for (index, row) in rows.iter().enumerate() {
            let object = row.as_object().ok_or_else(|| {
                DataFactoryError::InvalidData(format!("row {index} is not a JSON object"))
            })?;
            for key in object.keys() {
                if !columns.contains(key.as_str()) {
                    columns.insert(Arc::from(key.as_str()));
                }
            }
        }

        let mut table = DefaultTableModel {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows.iter().filter_map(serde_json::Value::as_object) {
            let values = table
                .columns
                .iter()
                .map(|c| row.get(&**c).map(json_to_value).unwrap_or_default())
                .collect();
            table.rows.push(values);
        }
        Ok(table)
    }

    /// Drops rows beyond `limit`.
    pub fn truncate(&mut self, limit: usize) {
        self.rows.truncate(limit);
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or_default(),
        serde_json::Value::String(s) => Value::text(s.as_str()),
        other => Value::text(other.to_string()),
    }
}

impl TableModel for DefaultTableModel {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, column: usize) -> Option<&str> {
        self.columns.get_index(column).map(|c| &**c)
    }

    fn value_at(&self, row: usize, column: usize) -> Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }

    fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }
}

/// The read-only view a data cache hands out in place of the stored table.
#[derive(Debug, Clone)]
pub struct CachedTableModel {
    inner: SharedTable,
}

impl CachedTableModel {
    pub fn new(inner: SharedTable) -> Self {
        Self { inner }
    }
}

impl TableModel for CachedTableModel {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_name(&self, column: usize) -> Option<&str> {
        self.inner.column_name(column)
    }

    fn value_at(&self, row: usize, column: usize) -> Value {
        self.inner.value_at(row, column)
    }

    fn find_column(&self, name: &str) -> Option<usize> {
        self.inner.find_column(name)
    }

    fn is_cache_view(&self) -> bool {
        true
    }
}
