//! Data store selection and reload behaviour.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anchor_grid::{ChunkLoader, ChunkPos};
use anchor_persist::{
    BUILTIN_STORES, DataStore, DataStoreManager, StoreConfig, StoreError, StoreResult,
};
use uuid::Uuid;

/// Store that only lives in memory and reports a fixed load result.
struct FixedStore {
    name: &'static str,
    load_ok: bool,
}

impl DataStore for FixedStore {
    fn name(&self) -> &str {
        self.name
    }

    fn load(&self) -> bool {
        self.load_ok
    }

    fn chunk_loaders(&self) -> Vec<ChunkLoader> {
        Vec::new()
    }

    fn save(&self, _loader: &ChunkLoader) -> StoreResult<()> {
        Ok(())
    }

    fn delete(&self, _id: Uuid) -> StoreResult<bool> {
        Ok(false)
    }
}

fn manager(selected: &str) -> (tempfile::TempDir, DataStoreManager) {
    let dir = tempfile::tempdir().unwrap();
    let manager = DataStoreManager::new(StoreConfig::new(selected, dir.path()));
    (dir, manager)
}

#[test]
fn load_selects_configured_store() {
    for selected in ["json", "JSON", "Lmdb", "LMDB"] {
        let (_dir, manager) = manager(selected);
        assert!(manager.load().unwrap(), "load failed for {selected}");

        let active = manager.active().unwrap();
        assert!(active.name().eq_ignore_ascii_case(selected));

        let mut available = manager.available_data_stores();
        available.sort();
        let mut builtins: Vec<_> = BUILTIN_STORES.iter().map(|s| (*s).to_owned()).collect();
        builtins.sort();
        assert_eq!(available, builtins);
    }
}

#[test]
fn unknown_configured_store_fails_without_side_effects() {
    let (dir, manager) = manager("json");
    assert!(manager.load().unwrap());
    let before = manager.active().unwrap();

    manager.set_config(StoreConfig::new("mysql", dir.path()));
    assert!(!manager.load().unwrap());

    let after = manager.active().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!manager.available_data_stores().is_empty());
}

#[test]
fn unknown_store_on_first_load() {
    let (_dir, manager) = manager("h2");
    assert!(!manager.load().unwrap());
    assert!(manager.active().is_none());
    assert_eq!(manager.available_data_stores().len(), BUILTIN_STORES.len());
}

#[test]
fn selecting_missing_store_is_an_instantiation_error() {
    let (_dir, manager) = manager("json");
    let err = manager.select_data_store("MYSQL").unwrap_err();
    assert!(matches!(err, StoreError::UnknownDataStore { .. }));
    assert!(manager.active().is_none());
}

#[test]
fn failing_factory_leaves_active_store_alone() {
    let (_dir, manager) = manager("json");
    assert!(manager.load().unwrap());
    let before = manager.active().unwrap();

    manager.register_data_store("broken", |_ctx| {
        Err(StoreError::Io(std::io::Error::other("connection refused")))
    });
    let err = manager.select_data_store("BROKEN").unwrap_err();
    match &err {
        StoreError::Instantiate { name, source } => {
            assert_eq!(name, "BROKEN");
            assert!(matches!(**source, StoreError::Io(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(Arc::ptr_eq(&before, &manager.active().unwrap()));
}

#[test]
fn reload_discards_custom_stores() {
    let (_dir, manager) = manager("json");
    assert!(manager.load().unwrap());

    manager.register_data_store("memory", |_ctx| {
        Ok(Box::new(FixedStore {
            name: "MEMORY",
            load_ok: true,
        }))
    });
    assert!(manager.available_data_stores().contains(&"MEMORY".to_owned()));

    assert!(manager.load().unwrap());
    assert!(!manager.available_data_stores().contains(&"MEMORY".to_owned()));
}

#[test]
fn custom_store_survives_first_load() {
    let (_dir, manager) = manager("json");
    manager.register_data_store("memory", |_ctx| {
        Ok(Box::new(FixedStore {
            name: "MEMORY",
            load_ok: true,
        }))
    });

    // Nothing active yet, so the catalog is extended rather than reset.
    assert!(manager.load().unwrap());
    assert!(manager.available_data_stores().contains(&"MEMORY".to_owned()));

    manager.select_data_store("memory").unwrap();
    assert_eq!(manager.active().unwrap().name(), "MEMORY");
}

#[test]
fn select_replaces_active_store() {
    let (_dir, manager) = manager("json");
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    manager.register_data_store("memory", move |_ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixedStore {
            name: "MEMORY",
            load_ok: false,
        }))
    });

    manager.select_data_store("memory").unwrap();
    let first = manager.active().unwrap();
    manager.select_data_store("memory").unwrap();
    let second = manager.active().unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.load());
}

#[test]
fn loaders_survive_restart() {
    for selected in BUILTIN_STORES {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(selected, dir.path());
        let kept = ChunkLoader::new("overworld", ChunkPos::new(0, 0), 2);
        let dropped = ChunkLoader::new("overworld", ChunkPos::new(9, 9), 1);

        {
            let manager = DataStoreManager::new(config.clone());
            assert!(manager.load().unwrap());
            let store = manager.active().unwrap();
            store.save(&kept).unwrap();
            store.save(&dropped).unwrap();
            assert!(store.delete(dropped.id).unwrap());
        }

        let manager = DataStoreManager::new(config);
        assert!(manager.load().unwrap());
        assert_eq!(manager.active().unwrap().chunk_loaders(), vec![kept]);
    }
}

#[test]
fn switching_store_on_reload() {
    let dir = tempfile::tempdir().unwrap();
    let manager = DataStoreManager::new(StoreConfig::new("json", dir.path()));
    assert!(manager.load().unwrap());
    let loader = ChunkLoader::new("overworld", ChunkPos::new(1, 1), 1);
    manager.active().unwrap().save(&loader).unwrap();

    manager.set_config(StoreConfig::new("lmdb", dir.path()));
    assert!(manager.load().unwrap());
    let active = manager.active().unwrap();
    assert_eq!(active.name(), "LMDB");
    assert!(active.chunk_loaders().is_empty());
}

#[test]
fn failed_store_load_keeps_previous_store() {
    let (dir, manager) = manager("json");
    assert!(manager.load().unwrap());
    let before = manager.active().unwrap();
    let loader = ChunkLoader::new("overworld", ChunkPos::new(2, 3), 1);
    before.save(&loader).unwrap();

    std::fs::write(dir.path().join("chunkloaders.json"), b"[{").unwrap();
    assert!(!manager.load().unwrap());

    let after = manager.active().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.chunk_loaders(), vec![loader]);
}

#[test]
fn failed_first_load_leaves_no_active_store() {
    let (_dir, manager) = manager("memory");
    manager.register_data_store("failing", |_ctx| {
        Ok(Box::new(FixedStore {
            name: "FAILING",
            load_ok: false,
        }))
    });

    // Not a built-in, so load() refuses it before any factory runs.
    assert!(!manager.load().unwrap());
    assert!(manager.active().is_none());

    manager.set_config(StoreConfig::new("json", manager.config().data_dir));
    let dir = manager.config().data_dir;
    std::fs::write(dir.join("chunkloaders.json"), b"not json").unwrap();
    assert!(!manager.load().unwrap());
    assert!(manager.active().is_none());
}

#[test]
fn factory_may_query_the_manager() {
    let (_dir, manager) = manager("json");
    let manager = Arc::new(manager);
    let weak = Arc::downgrade(&manager);
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    manager.register_data_store("memory", move |_ctx| {
        if let Some(manager) = weak.upgrade() {
            counter.store(manager.available_data_stores().len(), Ordering::SeqCst);
        }
        Ok(Box::new(FixedStore {
            name: "MEMORY",
            load_ok: true,
        }))
    });

    manager.select_data_store("memory").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(manager.active().unwrap().name(), "MEMORY");
}
