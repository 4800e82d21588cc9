//! Flat-file JSON store.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anchor_grid::ChunkLoader;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{DataStore, StoreContext, StoreResult};

pub(crate) const NAME: &str = "JSON";

const FILE_NAME: &str = "chunkloaders.json";

/// Chunk loaders in one JSON array, rewritten on every change.
///
/// Writes go to a temp file in the same directory which then replaces the
/// target, so a crash mid-write leaves the previous file intact.
pub struct JsonStore {
    path: PathBuf,
    loaders: RwLock<BTreeMap<Uuid, ChunkLoader>>,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaders: RwLock::new(BTreeMap::new()),
        }
    }

    /// Catalog factory: `<data_dir>/chunkloaders.json`.
    pub fn factory(ctx: &StoreContext) -> StoreResult<Box<dyn DataStore>> {
        std::fs::create_dir_all(&ctx.data_dir)?;
        Ok(Box::new(Self::open(ctx.data_dir.join(FILE_NAME))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StoreResult<BTreeMap<Uuid, ChunkLoader>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        let loaders: Vec<ChunkLoader> = serde_json::from_reader(BufReader::new(file))?;
        Ok(loaders.into_iter().map(|l| (l.id, l)).collect())
    }

    fn write_all(&self, loaders: &BTreeMap<Uuid, ChunkLoader>) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &loaders.values().collect::<Vec<_>>())?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::trace!("Wrote {} chunk loader(s) to {}", loaders.len(), self.path.display());
        Ok(())
    }
}

impl DataStore for JsonStore {
    fn name(&self) -> &str {
        NAME
    }

    fn load(&self) -> bool {
        match self.read_all() {
            Ok(loaders) => {
                tracing::info!(
                    "Loaded {} chunk loader(s) from {}",
                    loaders.len(),
                    self.path.display()
                );
                *self.loaders.write() = loaders;
                true
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {e}", self.path.display());
                false
            }
        }
    }

    fn chunk_loaders(&self) -> Vec<ChunkLoader> {
        self.loaders.read().values().cloned().collect()
    }

    fn save(&self, loader: &ChunkLoader) -> StoreResult<()> {
        let mut loaders = self.loaders.write();
        let previous = loaders.insert(loader.id, loader.clone());
        if let Err(e) = self.write_all(&loaders) {
            match previous {
                Some(previous) => loaders.insert(loader.id, previous),
                None => loaders.remove(&loader.id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut loaders = self.loaders.write();
        let Some(previous) = loaders.remove(&id) else {
            return Ok(false);
        };
        if let Err(e) = self.write_all(&loaders) {
            loaders.insert(id, previous);
            return Err(e);
        }
        Ok(true)
    }
}
