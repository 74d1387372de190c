//! Data access for the report engine.
//!
//! Reports read rows through a [`DataFactory`], which executes named queries
//! and returns [`TableModel`]s. A [`DataCache`] sits behind every factory so
//! that the pagination and content passes of one report run never execute
//! the same query twice. The current row, the report parameters and the
//! expression results are exposed by name through [`DataRow`].

pub mod cache;
pub mod error;
pub mod factory;
pub mod parameters;
pub mod row;
pub mod table;

pub use cache::{
    CacheBackend, CachingDataFactory, DataCache, DataCacheKey, DataCacheStatistics,
    InMemoryDataCache, LfuDataCache, NoOpDataCache, create_cache,
};
pub use error::DataFactoryError;
pub use factory::{DataFactory, FactoryProbe, TableDataFactory};
pub use parameters::Parameters;
pub use row::{DataRow, ExpressionValues};
pub use table::{CachedTableModel, DefaultTableModel, SharedTable, TableModel};
