use crate::parameters::Parameters;
use crate::table::SharedTable;
use indexmap::IndexMap;
use quire_types::Value;
use std::sync::Arc;

/// Values computed by expressions for the current row, by name.
pub type ExpressionValues = IndexMap<Arc<str>, Value>;

/// A named view over the current table row, the report parameters and the
/// expression results.
///
/// Names resolve against expression results first, then table columns, then
/// parameters. The cursor starts before the first row.
#[derive(Debug, Clone, Default)]
pub struct DataRow {
    table: Option<SharedTable>,
    row_count: usize,
    cursor: Option<usize>,
    parameters: Parameters,
    expressions: ExpressionValues,
    previous_expressions: ExpressionValues,
}

impl DataRow {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    /// Binds a result set, exposing at most `limit` rows.
    pub fn with_table(mut self, table: SharedTable, limit: Option<usize>) -> Self {
        let rows = table.row_count();
        self.row_count = limit.map_or(rows, |l| l.min(rows));
        self.table = Some(table);
        self
    }

    pub fn table(&self) -> Option<&SharedTable> {
        self.table.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn has_next(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.row_count
    }

    pub fn is_last(&self) -> bool {
        self.cursor.is_some() && !self.has_next()
    }

    /// Moves to the next row. Current expression values become the
    /// previous ones.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.cursor = Some(self.cursor.map_or(0, |c| c + 1));
        self.previous_expressions = self.expressions.clone();
        true
    }

    /// Rewinds to before the first row and forgets expression results.
    pub fn rewind(&mut self) {
        self.cursor = None;
        self.expressions.clear();
        self.previous_expressions.clear();
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Value {
        if let Some(v) = self.expressions.get(name) {
            return v.clone();
        }
        if self.cursor.is_some() {
            if let Some(v) = self.column_value(self.cursor, name) {
                return v;
            }
        }
        if let Some(v) = self.parameters.get(name) {
            return v.clone();
        }
        Value::Null
    }

    fn column_value(&self, row: Option<usize>, name: &str) -> Option<Value> {
        let table = self.table.as_ref()?;
        let column = table.find_column(name)?;
        match row {
            Some(r) if r < self.row_count => Some(table.value_at(r, column)),
            _ => Some(Value::Null),
        }
    }

    /// The column value of an arbitrary row, `Null` when out of range.
    pub fn column_at(&self, row: usize, name: &str) -> Value {
        self.column_value(Some(row), name).unwrap_or_default()
    }

    /// The column value of the row after the cursor.
    pub fn next_value(&self, name: &str) -> Value {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.column_at(next, name)
    }

    pub fn is_column(&self, name: &str) -> bool {
        self.table.as_ref().and_then(|t| t.find_column(name)).is_some()
    }

    /// Whether `name` differs from its value on the previous row. On the
    /// first row every column counts as changed.
    pub fn is_changed(&self, name: &str) -> bool {
        if self.expressions.contains_key(name) {
            return self.previous_expressions.get(name) != self.expressions.get(name);
        }
        if self.is_column(name) {
            return match self.cursor {
                None => false,
                Some(0) => true,
                Some(c) => self.column_at(c - 1, name) != self.column_at(c, name),
            };
        }
        false
    }

    pub fn set_expression(&mut self, name: &str, value: Value) {
        match self.expressions.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.expressions.insert(Arc::from(name), value);
            }
        }
    }

    pub fn expression_values(&self) -> &ExpressionValues {
        &self.expressions
    }

    pub fn restore_expression_values(&mut self, values: ExpressionValues) {
        self.expressions = values;
    }

    pub fn column_names(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|t| {
                (0..t.column_count())
                    .filter_map(|c| t.column_name(c).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
