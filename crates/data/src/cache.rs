//! Memoizes query results for the lifetime of one report instance.
//!
//! A report is paginated before its content is generated, and may be
//! validated several times before that. All of these passes ask the same
//! queries with the same parameters; the cache makes sure the backing query
//! executes once per `(query, parameters)` key.

use crate::error::DataFactoryError;
use crate::factory::DataFactory;
use crate::parameters::Parameters;
use crate::table::{CachedTableModel, SharedTable};
use log::{debug, trace};
use quire_types::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataCacheKey {
    pub query: Arc<str>,
    pub parameters: Vec<(Arc<str>, Value)>,
}

impl DataCacheKey {
    pub fn new(query: &str, parameters: &Parameters) -> Self {
        Self {
            query: Arc::from(query),
            parameters: parameters.fingerprint(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataCacheStatistics {
    pub get_count: u64,
    pub hit_count: u64,
    pub put_count: u64,
    pub entries: usize,
}

impl DataCacheStatistics {
    pub fn miss_count(&self) -> u64 {
        self.get_count - self.hit_count
    }

    pub fn hit_rate(&self) -> f64 {
        if self.get_count == 0 {
            0.0
        } else {
            self.hit_count as f64 / self.get_count as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    hits: AtomicU64,
    puts: AtomicU64,
}

impl Counters {
    fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, entries: usize) -> DataCacheStatistics {
        DataCacheStatistics {
            get_count: self.gets.load(Ordering::Relaxed),
            hit_count: self.hits.load(Ordering::Relaxed),
            put_count: self.puts.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// Storage for query results.
///
/// `put` returns the table callers must use from then on: a read-only view
/// over the stored snapshot, never the original.
pub trait DataCache: Send + Sync + fmt::Debug {
    fn get(&self, key: &DataCacheKey) -> Option<SharedTable>;

    fn put(&self, key: DataCacheKey, model: SharedTable) -> SharedTable;

    fn statistics(&self) -> DataCacheStatistics;

    fn clear(&self);
}

fn view(model: SharedTable) -> SharedTable {
    if model.is_cache_view() {
        model
    } else {
        Arc::new(CachedTableModel::new(model))
    }
}

/// An unbounded map behind a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryDataCache {
    entries: RwLock<HashMap<DataCacheKey, SharedTable>>,
    counters: Counters,
}

impl InMemoryDataCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataCache for InMemoryDataCache {
    fn get(&self, key: &DataCacheKey) -> Option<SharedTable> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        self.counters.record_get(found.is_some());
        found
    }

    fn put(&self, key: DataCacheKey, model: SharedTable) -> SharedTable {
        let model = view(model);
        self.counters.record_put();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, model.clone());
        model
    }

    fn statistics(&self) -> DataCacheStatistics {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner).len();
        self.counters.snapshot(entries)
    }

    fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[derive(Debug)]
struct LfuEntry {
    model: SharedTable,
    uses: u64,
    inserted: u64,
}

#[derive(Debug, Default)]
struct LfuState {
    entries: HashMap<DataCacheKey, LfuEntry>,
    sequence: u64,
}

/// A bounded cache evicting the least-frequently used entry, oldest first
/// among equals.
#[derive(Debug)]
pub struct LfuDataCache {
    capacity: usize,
    state: Mutex<LfuState>,
    counters: Counters,
}

impl LfuDataCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LfuState::default()),
            counters: Counters::default(),
        }
    }
}

impl DataCache for LfuDataCache {
    fn get(&self, key: &DataCacheKey) -> Option<SharedTable> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let found = state.entries.get_mut(key).map(|e| {
            e.uses += 1;
            e.model.clone()
        });
        self.counters.record_get(found.is_some());
        found
    }

    fn put(&self, key: DataCacheKey, model: SharedTable) -> SharedTable {
        let model = view(model);
        self.counters.record_put();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.uses, e.inserted))
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                trace!("Evicting cached query '{}'", victim.query);
                state.entries.remove(&victim);
            }
        }
        state.sequence += 1;
        let inserted = state.sequence;
        state.entries.insert(
            key,
            LfuEntry {
                model: model.clone(),
                uses: 0,
                inserted,
            },
        );
        model
    }

    fn statistics(&self) -> DataCacheStatistics {
        let entries = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len();
        self.counters.snapshot(entries)
    }

    fn clear(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }
}

/// Caches nothing; every request reaches the factory.
#[derive(Debug, Default)]
pub struct NoOpDataCache {
    counters: Counters,
}

impl DataCache for NoOpDataCache {
    fn get(&self, _key: &DataCacheKey) -> Option<SharedTable> {
        self.counters.record_get(false);
        None
    }

    fn put(&self, _key: DataCacheKey, model: SharedTable) -> SharedTable {
        self.counters.record_put();
        view(model)
    }

    fn statistics(&self) -> DataCacheStatistics {
        self.counters.snapshot(0)
    }

    fn clear(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    InMemory,
    Lfu,
    None,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(CacheBackend::InMemory),
            "lfu" => Ok(CacheBackend::Lfu),
            "none" | "noop" | "off" => Ok(CacheBackend::None),
            other => Err(format!("Unknown cache backend: '{other}'")),
        }
    }
}

pub fn create_cache(backend: CacheBackend, capacity: usize) -> Arc<dyn DataCache> {
    match backend {
        CacheBackend::InMemory => Arc::new(InMemoryDataCache::new()),
        CacheBackend::Lfu => Arc::new(LfuDataCache::new(capacity)),
        CacheBackend::None => Arc::new(NoOpDataCache::default()),
    }
}

/// A factory that consults a cache before executing a query.
#[derive(Debug)]
pub struct CachingDataFactory {
    inner: Box<dyn DataFactory>,
    cache: Arc<dyn DataCache>,
}

impl CachingDataFactory {
    pub fn new(inner: Box<dyn DataFactory>, cache: Arc<dyn DataCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<dyn DataCache> {
        &self.cache
    }
}

impl DataFactory for CachingDataFactory {
    fn open(&mut self) -> Result<(), DataFactoryError> {
        self.inner.open()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn query_data(
        &mut self,
        query: &str,
        parameters: &Parameters,
    ) -> Result<SharedTable, DataFactoryError> {
        let key = DataCacheKey::new(query, parameters);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Query '{query}' served from cache");
            return Ok(hit);
        }
        let model = self.inner.query_data(query, parameters)?;
        Ok(self.cache.put(key, model))
    }

    fn query_names(&self) -> Vec<String> {
        self.inner.query_names()
    }

    fn derive(&self) -> Box<dyn DataFactory> {
        Box::new(CachingDataFactory {
            inner: self.inner.derive(),
            cache: self.cache.clone(),
        })
    }

    fn close(&mut self) {
        self.inner.close()
    }
}
