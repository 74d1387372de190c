//! Pivot aggregation behind crosstab boxes.

use crate::tree::{BoxId, NodeKind, RenderTree};
use indexmap::IndexMap;
use itertools::Itertools;
use quire_data::TableModel;
use quire_model::{Aggregation, Crosstab};
use quire_types::Value;

#[derive(Debug, Clone, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn add(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        self.count += 1;
        if let Some(v) = value.as_f64() {
            self.sum += v;
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
    }

    fn result(&self, aggregation: Aggregation) -> Value {
        match aggregation {
            Aggregation::Sum => Value::from(self.sum),
            Aggregation::Count => Value::from(self.count),
            Aggregation::Min => self.min.map_or(Value::Null, Value::from),
            Aggregation::Max => self.max.map_or(Value::Null, Value::from),
            Aggregation::Average if self.count == 0 => Value::Null,
            Aggregation::Average => Value::from(self.sum / self.count as f64),
        }
    }
}

type CellAddress = (Option<Value>, Option<Value>);

/// Aggregated crosstab values keyed by `(row-key, column-key)`.
///
/// `None` on an axis means the total over that axis, so `(None, None)` is the
/// grand total.
#[derive(Debug, Clone, Default)]
pub struct CrosstabGrid {
    pub row_keys: Vec<Value>,
    pub column_keys: Vec<Value>,
    cells: IndexMap<CellAddress, Value>,
}

impl CrosstabGrid {
    pub fn compute(def: &Crosstab, table: &dyn TableModel) -> Self {
        let column = |name: &Option<String>| name.as_deref().and_then(|n| table.find_column(n));
        let row_column = column(&def.row_field);
        let col_column = column(&def.column_field);
        let measure = table.find_column(&def.measure);
        if measure.is_none() {
            log::warn!("Crosstab measure '{}' is not a column of the table", def.measure);
        }

        let key_at = |row: usize, c: Option<usize>| c.map(|c| table.value_at(row, c));
        let mut accumulators: IndexMap<CellAddress, Accumulator> = IndexMap::new();
        for row in 0..table.row_count() {
            let value = measure.map_or(Value::Null, |m| table.value_at(row, m));
            let r = key_at(row, row_column);
            let c = key_at(row, col_column);
            let addresses = [
                (r.clone(), c.clone()),
                (r.clone(), None),
                (None, c.clone()),
                (None, None),
            ];
            for address in addresses.into_iter().unique() {
                accumulators.entry(address).or_default().add(&value);
            }
        }

        let keys = |select: fn(&CellAddress) -> &Option<Value>| -> Vec<Value> {
            accumulators
                .keys()
                .filter_map(|a| select(a).clone())
                .unique()
                .sorted()
                .collect()
        };
        let row_keys = keys(|a| &a.0);
        let column_keys = keys(|a| &a.1);
        let cells = accumulators
            .into_iter()
            .map(|(address, acc)| (address, acc.result(def.aggregation)))
            .collect();
        Self {
            row_keys,
            column_keys,
            cells,
        }
    }

    /// The aggregated value for a cell, `None` if no row contributed to it.
    pub fn cell(&self, row: Option<&Value>, column: Option<&Value>) -> Option<Value> {
        self.cells.get(&(row.cloned(), column.cloned())).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Finds the cell box for `(row, column)` below `root`.
pub fn find_cell(
    tree: &RenderTree,
    root: BoxId,
    row: Option<&Value>,
    column: Option<&Value>,
) -> Option<BoxId> {
    tree.descendants(root).into_iter().find(|&id| {
        tree.get(id).is_some_and(|n| {
            n.kind == NodeKind::CrosstabCell
                && n.cell
                    .as_ref()
                    .is_some_and(|k| k.row.as_ref() == row && k.column.as_ref() == column)
        })
    })
}
