//! Data factories: the objects that execute named queries.

use crate::error::DataFactoryError;
use crate::parameters::Parameters;
use crate::table::{DefaultTableModel, SharedTable};
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Executes named queries against some backing store.
///
/// The engine never queries the factory held by the report definition.
/// Each run calls [`DataFactory::derive`] to get a private instance, opens
/// it, and closes it when the run's process state is closed.
pub trait DataFactory: Send + Sync + fmt::Debug {
    fn open(&mut self) -> Result<(), DataFactoryError>;

    fn is_open(&self) -> bool;

    fn query_data(
        &mut self,
        query: &str,
        parameters: &Parameters,
    ) -> Result<SharedTable, DataFactoryError>;

    fn query_names(&self) -> Vec<String>;

    /// A fresh, closed copy of this factory for one report run.
    fn derive(&self) -> Box<dyn DataFactory>;

    fn close(&mut self);
}

type QueryFn = dyn Fn(&Parameters) -> Result<DefaultTableModel, DataFactoryError> + Send + Sync;

#[derive(Clone)]
enum QuerySource {
    Static(Arc<DefaultTableModel>),
    Computed(Arc<QueryFn>),
}

impl fmt::Debug for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuerySource::Static(t) => f.debug_tuple("Static").field(t).finish(),
            QuerySource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Shared counters observing a factory and every instance derived from it.
#[derive(Debug, Default)]
pub struct FactoryProbe {
    executions: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl FactoryProbe {
    /// Number of queries actually executed.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Instances currently open.
    pub fn open_instances(&self) -> usize {
        self.open_count().saturating_sub(self.close_count())
    }
}

/// A factory over in-memory tables and computed queries.
#[derive(Debug, Clone, Default)]
pub struct TableDataFactory {
    queries: IndexMap<String, QuerySource>,
    open: bool,
    probe: Arc<FactoryProbe>,
}

impl TableDataFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: DefaultTableModel) -> Self {
        self.queries
            .insert(name.to_string(), QuerySource::Static(Arc::new(table)));
        self
    }

    /// Registers a query computed from the parameters on every execution.
    pub fn with_query<F>(mut self, name: &str, query: F) -> Self
    where
        F: Fn(&Parameters) -> Result<DefaultTableModel, DataFactoryError> + Send + Sync + 'static,
    {
        self.queries
            .insert(name.to_string(), QuerySource::Computed(Arc::new(query)));
        self
    }

    pub fn probe(&self) -> Arc<FactoryProbe> {
        self.probe.clone()
    }
}

impl DataFactory for TableDataFactory {
    fn open(&mut self) -> Result<(), DataFactoryError> {
        if !self.open {
            self.open = true;
            self.probe.opened.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn query_data(
        &mut self,
        query: &str,
        parameters: &Parameters,
    ) -> Result<SharedTable, DataFactoryError> {
        if !self.open {
            return Err(DataFactoryError::NotOpen);
        }
        let source = self
            .queries
            .get(query)
            .ok_or_else(|| DataFactoryError::QueryNotFound(query.to_string()))?;
        self.probe.executions.fetch_add(1, Ordering::SeqCst);
        debug!("Executing query '{query}' with {} parameter(s)", parameters.len());
        match source {
            QuerySource::Static(table) => Ok(table.clone()),
            QuerySource::Computed(f) => Ok(Arc::new(f(parameters)?)),
        }
    }

    fn query_names(&self) -> Vec<String> {
        self.queries.keys().cloned().collect()
    }

    fn derive(&self) -> Box<dyn DataFactory> {
        Box::new(TableDataFactory {
            queries: self.queries.clone(),
            open: false,
            probe: self.probe.clone(),
        })
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.probe.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableModel;
    use quire_types::Value;

    fn factory() -> TableDataFactory {
        TableDataFactory::new()
            .with_table("orders", DefaultTableModel::new(["id"]).with_row(vec![Value::from(1)]))
            .with_query("by_year", |p| {
                let year = p.get("year").cloned().unwrap_or_default();
                Ok(DefaultTableModel::new(["year"]).with_row(vec![year]))
            })
    }

    #[test]
    fn test_query_requires_open() {
        let mut f = factory();
        assert_eq!(
            f.query_data("orders", &Parameters::new()).unwrap_err(),
            DataFactoryError::NotOpen
        );
        f.open().unwrap();
        assert_eq!(f.query_data("orders", &Parameters::new()).unwrap().row_count(), 1);
        assert!(matches!(
            f.query_data("nope", &Parameters::new()),
            Err(DataFactoryError::QueryNotFound(_))
        ));
    }

    #[test]
    fn test_computed_query_sees_parameters() {
        let mut f = factory();
        f.open().unwrap();
        let table = f
            .query_data("by_year", &Parameters::new().with("year", 2003))
            .unwrap();
        assert_eq!(table.value_at(0, 0), Value::from(2003));
    }

    #[test]
    fn test_derived_instances_share_probe_and_close_once() {
        let template = factory();
        let probe = template.probe();
        let mut derived = template.derive();
        assert!(!derived.is_open());
        derived.open().unwrap();
        assert_eq!(probe.open_instances(), 1);
        derived.close();
        derived.close();
        assert_eq!(probe.close_count(), 1);
        assert_eq!(probe.open_instances(), 0);
        assert_eq!(derived.query_names(), vec!["orders", "by_year"]);
    }
}
