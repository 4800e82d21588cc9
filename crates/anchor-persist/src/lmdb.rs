//! LMDB-backed store.

use std::collections::BTreeMap;
use std::path::Path;

use anchor_grid::ChunkLoader;
use heed::{Database, Env, EnvOpenOptions, types::Bytes};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{DataStore, StoreContext, StoreResult};

pub(crate) const NAME: &str = "LMDB";

/// Chunk loaders in an LMDB environment.
///
/// Key: the 16 raw bytes of the loader id. Value: bincode-encoded
/// [`ChunkLoader`].
pub struct LmdbStore {
    env: Env,
    db: Database<Bytes, Bytes>,
    loaders: RwLock<BTreeMap<Uuid, ChunkLoader>>,
}

impl LmdbStore {
    /// Open or create the environment at `path`.
    ///
    /// # Safety
    /// Uses unsafe to call heed's open method which requires ensuring
    /// the environment is not opened multiple times with different options.
    #[allow(unsafe_code)]
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        // SAFETY: every open of this path uses the same options
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(64 * 1024 * 1024)
                .max_dbs(1)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let db = env.create_database(&mut wtxn, Some("chunkloaders"))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            db,
            loaders: RwLock::new(BTreeMap::new()),
        })
    }

    /// Catalog factory: environment under `<data_dir>/lmdb`.
    pub fn factory(ctx: &StoreContext) -> StoreResult<Box<dyn DataStore>> {
        Ok(Box::new(Self::open(ctx.data_dir.join("lmdb"))?))
    }

    fn read_all(&self) -> StoreResult<BTreeMap<Uuid, ChunkLoader>> {
        let rtxn = self.env.read_txn()?;
        let mut loaders = BTreeMap::new();
        for entry in self.db.iter(&rtxn)? {
            let (key, value) = entry?;
            match bincode::deserialize::<ChunkLoader>(value) {
                Ok(loader) => {
                    loaders.insert(loader.id, loader);
                }
                Err(e) => {
                    tracing::error!("Skipping undecodable chunk loader record {key:02x?}: {e}");
                }
            }
        }
        Ok(loaders)
    }
}

impl DataStore for LmdbStore {
    fn name(&self) -> &str {
        NAME
    }

    fn load(&self) -> bool {
        match self.read_all() {
            Ok(loaders) => {
                tracing::info!("Loaded {} chunk loader(s) from LMDB", loaders.len());
                *self.loaders.write() = loaders;
                true
            }
            Err(e) => {
                tracing::error!("Failed to read chunk loaders from LMDB: {e}");
                false
            }
        }
    }

    fn chunk_loaders(&self) -> Vec<ChunkLoader> {
        self.loaders.read().values().cloned().collect()
    }

    fn save(&self, loader: &ChunkLoader) -> StoreResult<()> {
        let bytes = bincode::serialize(loader)?;

        let mut wtxn = self.env.write_txn()?;
        self.db.put(&mut wtxn, loader.id.as_bytes().as_slice(), &bytes)?;
        wtxn.commit()?;

        self.loaders.write().insert(loader.id, loader.clone());
        tracing::trace!("Persisted chunk loader {}", loader.id);
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut wtxn = self.env.write_txn()?;
        let deleted = self.db.delete(&mut wtxn, id.as_bytes().as_slice())?;
        wtxn.commit()?;

        self.loaders.write().remove(&id);
        if deleted {
            tracing::trace!("Deleted chunk loader {id}");
        }
        Ok(deleted)
    }
}
