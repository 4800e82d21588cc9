use std::path::PathBuf;
use std::sync::Arc;

use anchor_grid::ChunkLoader;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoreResult;

/// A persistence engine for chunk loader definitions.
///
/// Stores keep an in-memory copy of what they hold, filled by [`load`] and
/// kept current by [`save`]/[`delete`]. All I/O is synchronous.
///
/// [`load`]: DataStore::load
/// [`save`]: DataStore::save
/// [`delete`]: DataStore::delete
pub trait DataStore: Send + Sync {
    /// Catalog name of this store.
    fn name(&self) -> &str;

    /// Read every persisted loader. Errors are logged and reported as `false`.
    fn load(&self) -> bool;

    /// Loaders read by the last `load`, plus later saves.
    fn chunk_loaders(&self) -> Vec<ChunkLoader>;

    /// Insert or overwrite a loader.
    fn save(&self, loader: &ChunkLoader) -> StoreResult<()>;

    /// Remove a loader, `false` if it was not stored.
    fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Process context a store is instantiated with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreContext {
    /// Directory the store keeps its files in.
    pub data_dir: PathBuf,
}

/// Builds a store bound to a [`StoreContext`].
pub type DataStoreFactory =
    Arc<dyn Fn(&StoreContext) -> StoreResult<Box<dyn DataStore>> + Send + Sync>;

/// Data store section of the configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the store to use, matched case-insensitively.
    pub selected: String,
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(selected: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            selected: selected.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn context(&self) -> StoreContext {
        StoreContext {
            data_dir: self.data_dir.clone(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(crate::lmdb::NAME, "data")
    }
}
