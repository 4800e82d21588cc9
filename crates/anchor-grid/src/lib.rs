//! Grid boundary for chunk anchoring.
//!
//! Holds the types shared between the ticket manager and the persistence
//! layer: chunk coordinates, the [`ChunkLoader`] definition an owner registers,
//! and the [`GridAdapter`] trait that the host world implements to hand out
//! keep-alive tickets.
//!
//! [`MemoryGrid`] is an in-process grid with the same contract, used by the
//! demo server and by tests.

mod adapter;
mod error;
mod loader;
mod memory;
mod pos;

pub use adapter::{Chunk, GridAdapter, TicketId, WorldId, WorldInfo};
pub use error::{GridError, GridResult};
pub use loader::ChunkLoader;
pub use memory::MemoryGrid;
pub use pos::ChunkPos;
