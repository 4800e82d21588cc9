//! Region ticket manager.
//!
//! [`TicketManager`] turns [`ChunkLoader`] definitions into live grid tickets.
//! Each owner id maps to at most one ticket; the map sits behind a single lock
//! that is held across the whole check-then-insert (register) and
//! check-then-remove (deregister) sequence, so concurrent callers for the same
//! id cannot both win.
//!
//! Nothing here persists. Callers pair `register`/`deregister` with the
//! matching save/delete on their data store.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use anchor_grid::{ChunkLoader, ChunkPos, MemoryGrid};
//! use anchor_tickets::{TicketConfig, TicketManager};
//!
//! let grid = Arc::new(MemoryGrid::new().with_world(
//!     "overworld",
//!     ChunkPos::new(-8, -8),
//!     ChunkPos::new(8, 8),
//! ));
//! let manager = TicketManager::new(grid, TicketConfig::default());
//!
//! let loader = ChunkLoader::new("Overworld", ChunkPos::new(0, 0), 1);
//! assert!(manager.register(&loader));
//! assert!(manager.deregister(&loader));
//! ```

mod manager;

pub use manager::{ActiveTicket, DEFAULT_MAX_RADIUS, ReplacePolicy, TicketConfig, TicketManager};

pub use anchor_grid::ChunkLoader;
