//! Per-run ownership of opened data factories.

use crate::error::ReportError;
use log::{debug, warn};
use quire_data::{
    CachingDataFactory, DataCache, DataFactory, DataFactoryError, DataRow, Parameters, SharedTable,
    TableModel,
};
use quire_layout::QuerySource;
use quire_model::ReportDefinition;
use quire_types::QueryName;
use std::sync::Arc;

/// Identity of a factory held by a report definition.
fn source_key(factory: &Arc<dyn DataFactory>) -> usize {
    Arc::as_ptr(factory).cast::<()>() as usize
}

/// The resources of one report run.
///
/// Every data factory the run touches is derived from its definition, wrapped
/// in a [`CachingDataFactory`] over the run's cache and opened here. Closing
/// the handle closes each of them exactly once, whether the run succeeded or
/// not. Dropping an unclosed handle closes it.
#[derive(Debug)]
pub struct ProcessStateHandle {
    cache: Arc<dyn DataCache>,
    primary: Option<CachingDataFactory>,
    /// Factories of sub-reports that bring their own, keyed by the
    /// definition they were derived from.
    secondary: Vec<(usize, CachingDataFactory)>,
    error_reason: Option<String>,
    closed: bool,
}

impl ProcessStateHandle {
    /// Opens the report's own data factory, if it has one.
    pub fn open(report: &ReportDefinition, cache: Arc<dyn DataCache>) -> Result<Self, ReportError> {
        let mut handle = Self {
            cache,
            primary: None,
            secondary: Vec::new(),
            error_reason: None,
            closed: false,
        };
        if let Some(factory) = &report.data_factory {
            let mut derived = CachingDataFactory::new(factory.derive(), handle.cache.clone());
            derived.open()?;
            debug!("Opened data factory for report '{}'", report.name);
            handle.primary = Some(derived);
        }
        Ok(handle)
    }

    pub fn cache(&self) -> &Arc<dyn DataCache> {
        &self.cache
    }

    /// Executes the report's master query and binds it to a fresh data row.
    /// A report without a query gets an empty row set.
    pub fn open_rows(
        &mut self,
        report: &ReportDefinition,
        parameters: &Parameters,
        limit: Option<usize>,
    ) -> Result<DataRow, ReportError> {
        let row = DataRow::new(parameters.clone());
        let Some(query) = &report.query else {
            return Ok(row);
        };
        let table = self.query(query, parameters, None)?;
        debug!("Master query '{query}' returned {} rows", table.row_count());
        Ok(row.with_table(table, limit))
    }

    /// True while any factory of this run is open.
    pub fn is_open(&self) -> bool {
        self.primary.as_ref().is_some_and(|f| f.is_open())
            || self.secondary.iter().any(|(_, f)| f.is_open())
    }

    pub fn open_factories(&self) -> usize {
        usize::from(self.primary.is_some()) + self.secondary.len()
    }

    pub fn record_error(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.error_reason.is_none() {
            self.error_reason = Some(reason);
        } else {
            debug!("Dropping secondary error: {reason}");
        }
    }

    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes every opened factory. Further calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let count = self.open_factories();
        if let Some(mut factory) = self.primary.take() {
            factory.close();
        }
        for (_, mut factory) in self.secondary.drain(..) {
            factory.close();
        }
        debug!("Process state closed, released {count} data factories");
    }

    fn secondary_for(
        &mut self,
        source: &Arc<dyn DataFactory>,
    ) -> Result<&mut CachingDataFactory, DataFactoryError> {
        let key = source_key(source);
        let index = match self.secondary.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                let mut derived = CachingDataFactory::new(source.derive(), self.cache.clone());
                derived.open()?;
                self.secondary.push((key, derived));
                self.secondary.len() - 1
            }
        };
        Ok(&mut self.secondary[index].1)
    }
}

impl QuerySource for ProcessStateHandle {
    fn query(
        &mut self,
        query: &QueryName,
        parameters: &Parameters,
        factory: Option<&Arc<dyn DataFactory>>,
    ) -> Result<SharedTable, DataFactoryError> {
        if self.closed {
            return Err(DataFactoryError::NotOpen);
        }
        let target = match factory {
            Some(source) => self.secondary_for(source)?,
            None => self.primary.as_mut().ok_or(DataFactoryError::NotOpen)?,
        };
        target.query_data(query.as_str(), parameters)
    }
}

impl Drop for ProcessStateHandle {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Process state dropped without close, closing now");
            self.close();
        }
    }
}
