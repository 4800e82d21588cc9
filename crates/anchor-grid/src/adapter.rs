//! The host grid boundary.

use std::fmt;

use crate::{ChunkPos, GridResult};

/// Grid-assigned world handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// Grid-assigned ticket handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket#{}", self.0)
    }
}

/// A world known to the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldInfo {
    pub id: WorldId,
    pub name: String,
}

/// A chunk the grid resolved, i.e. one that exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chunk {
    pub world: WorldId,
    pub pos: ChunkPos,
}

/// Host grid operations the ticket manager relies on.
///
/// Every call is expected to be a fast in-memory operation on the host. A
/// host that cannot complete a call returns an error instead of blocking.
pub trait GridAdapter: Send + Sync {
    /// All worlds currently known to the host.
    fn worlds(&self) -> Vec<WorldInfo>;

    /// Resolve a chunk, `None` if it does not exist.
    fn resolve_chunk(&self, world: WorldId, pos: ChunkPos) -> Option<Chunk>;

    /// Whether the host offers a ticketing service at all.
    fn tickets_supported(&self) -> bool;

    /// Ask for a new ticket in `world`. `None` when the host refuses.
    fn create_ticket(&self, world: WorldId) -> Option<TicketId>;

    /// Keep `pos` loaded for as long as `ticket` holds it. Idempotent.
    fn force_chunk(&self, ticket: TicketId, pos: ChunkPos) -> GridResult<()>;

    /// Stop keeping `pos` loaded on behalf of `ticket`.
    fn unforce_chunk(&self, ticket: TicketId, pos: ChunkPos) -> GridResult<()>;

    /// Release the ticket and every chunk it forced.
    fn release_ticket(&self, ticket: TicketId) -> GridResult<()>;

    /// Chunks currently forced by `ticket`, empty for unknown tickets.
    fn ticket_chunks(&self, ticket: TicketId) -> Vec<ChunkPos>;

    /// Lift the host's per-owner ticket and chunk limits.
    fn raise_limits(&self) -> GridResult<()>;
}
