//! Chunk loader persistence.
//!
//! A [`DataStoreManager`] keeps a catalog of named [`DataStore`] factories and
//! at most one active store instance. At startup `load()` rebuilds the catalog
//! from the built-in stores, instantiates the one named in [`StoreConfig`] and
//! reads its chunk loaders.
//!
//! # Built-in stores
//!
//! | Name   | Layout                                                |
//! |--------|-------------------------------------------------------|
//! | `LMDB` | heed environment in `<data_dir>/lmdb`, bincode values |
//! | `JSON` | pretty-printed array in `<data_dir>/chunkloaders.json` |
//!
//! # Usage
//!
//! ```ignore
//! let manager = DataStoreManager::new(StoreConfig::new("lmdb", "data"));
//! if manager.load()? {
//!     let store = manager.active().unwrap();
//!     for loader in store.chunk_loaders() {
//!         tickets.register(&loader);
//!     }
//! }
//! ```

mod error;
mod json;
mod lmdb;
mod manager;
mod store;

pub use error::{StoreError, StoreResult};
pub use json::JsonStore;
pub use lmdb::LmdbStore;
pub use manager::{BUILTIN_STORES, DataStoreManager};
pub use store::{DataStore, DataStoreFactory, StoreConfig, StoreContext};
