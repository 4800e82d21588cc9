use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::{
    DataStore, DataStoreFactory, JsonStore, LmdbStore, StoreConfig, StoreContext, StoreError,
    StoreResult, json, lmdb,
};

/// Names of the stores `load()` always registers.
pub const BUILTIN_STORES: [&str; 2] = [lmdb::NAME, json::NAME];

struct Inner {
    config: StoreConfig,
    /// Keyed by upper-cased name.
    catalog: BTreeMap<String, DataStoreFactory>,
    active: Option<Arc<dyn DataStore>>,
}

impl Inner {
    fn available(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }

    fn register_builtins(&mut self) {
        self.catalog
            .insert(lmdb::NAME.to_owned(), Arc::new(LmdbStore::factory));
        self.catalog
            .insert(json::NAME.to_owned(), Arc::new(JsonStore::factory));
    }

    /// Catalog entry for `name` plus the context to build it with.
    fn lookup(&self, name: &str) -> StoreResult<Pending> {
        let key = name.to_uppercase();
        let Some(factory) = self.catalog.get(&key) else {
            return Err(StoreError::UnknownDataStore {
                name: name.to_owned(),
                available: self.available(),
            });
        };
        Ok(Pending {
            name: key,
            factory: Arc::clone(factory),
            context: self.config.context(),
        })
    }
}

/// A selected catalog entry that has not been instantiated yet.
struct Pending {
    name: String,
    factory: DataStoreFactory,
    context: StoreContext,
}

impl Pending {
    fn instantiate(self) -> StoreResult<Arc<dyn DataStore>> {
        let store = (self.factory)(&self.context).map_err(|source| StoreError::Instantiate {
            name: self.name,
            source: Box::new(source),
        })?;
        Ok(Arc::from(store))
    }
}

/// Catalog of data store factories plus the single active store.
///
/// Catalog mutation and the clear-rebuild step of `load()` share one lock,
/// so a reload never interleaves with registrations. Factories and store
/// loads run outside that lock and may call back into the manager; only a
/// nested `load()` from inside a factory or store would block, since loads
/// are serialised among themselves.
pub struct DataStoreManager {
    inner: Mutex<Inner>,
    loading: Mutex<()>,
}

impl DataStoreManager {
    /// An empty catalog; nothing is registered until `load()` or
    /// `register_data_store`.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                catalog: BTreeMap::new(),
                active: None,
            }),
            loading: Mutex::new(()),
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.inner.lock().config.clone()
    }

    /// Replace the configuration used by the next `load()`/selection.
    pub fn set_config(&self, config: StoreConfig) {
        self.inner.lock().config = config;
    }

    /// Rebuild the catalog, select the configured store and read from it.
    ///
    /// If a store is already active the catalog is cleared first, dropping
    /// anything registered since the last load. The new store becomes active
    /// only after its own load succeeded. Returns `Ok(false)` when the
    /// configured name is not a built-in store or when the store's load
    /// fails; the active store is left untouched in both cases.
    ///
    /// # Errors
    /// Returns [`StoreError::Instantiate`] if the selected store cannot be
    /// constructed.
    pub fn load(&self) -> StoreResult<bool> {
        let _loading = self.loading.lock();

        let pending = {
            let mut inner = self.inner.lock();
            if inner.active.is_some() {
                inner.catalog.clear();
            }
            inner.register_builtins();

            let selected = inner.config.selected.to_uppercase();
            let Some(name) = BUILTIN_STORES.into_iter().find(|n| *n == selected) else {
                error!(
                    "Unable to determine selected data store '{}'",
                    inner.config.selected
                );
                info!("Available data stores: {:?}", inner.available());
                return Ok(false);
            };
            inner.lookup(name)?
        };

        let store = pending.instantiate()?;
        info!("Loading data store: {}", store.name());
        if !store.load() {
            error!(
                "Data store {} failed to load, keeping the previous store",
                store.name()
            );
            return Ok(false);
        }

        self.inner.lock().active = Some(store);
        Ok(true)
    }

    /// Add or overwrite a catalog entry. Names are case-insensitive.
    ///
    /// The factory runs without the catalog lock held, so it may query the
    /// manager; it must not call `load()`.
    pub fn register_data_store<F>(&self, name: &str, factory: F)
    where
        F: Fn(&StoreContext) -> StoreResult<Box<dyn DataStore>> + Send + Sync + 'static,
    {
        self.inner
            .lock()
            .catalog
            .insert(name.to_uppercase(), Arc::new(factory));
    }

    /// Remove a catalog entry; no-op if absent.
    pub fn unregister_data_store(&self, name: &str) {
        self.inner.lock().catalog.remove(&name.to_uppercase());
    }

    /// Remove every catalog entry. The active store stays active.
    pub fn clear_data_stores(&self) {
        self.inner.lock().catalog.clear();
    }

    /// Catalog names, sorted.
    pub fn available_data_stores(&self) -> Vec<String> {
        self.inner.lock().available()
    }

    /// Instantiate a catalog entry and make it the active store.
    ///
    /// The previous active store is replaced, not shut down; it lives on
    /// while other holders keep its `Arc`.
    ///
    /// # Errors
    /// [`StoreError::UnknownDataStore`] if `name` is not in the catalog,
    /// [`StoreError::Instantiate`] if its factory fails. The active store is
    /// unchanged in both cases.
    pub fn select_data_store(&self, name: &str) -> StoreResult<()> {
        let pending = self.inner.lock().lookup(name)?;
        let store = pending.instantiate()?;
        self.inner.lock().active = Some(store);
        Ok(())
    }

    /// The active store, if one has been selected.
    pub fn active(&self) -> Option<Arc<dyn DataStore>> {
        self.inner.lock().active.clone()
    }
}
