//! Grid error types.

use thiserror::Error;

use crate::{ChunkPos, TicketId, WorldId};

/// Errors a grid reports for ticket operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The ticket was never issued or has been released.
    #[error("unknown ticket: {0}")]
    UnknownTicket(TicketId),

    /// The chunk does not exist in the ticket's world.
    #[error("chunk {pos} does not exist in world {world}")]
    MissingChunk { world: WorldId, pos: ChunkPos },

    /// Ticketing is unavailable on this host.
    #[error("ticketing is disabled on this grid")]
    TicketsDisabled,

    /// The host refused to lift its ticket limits.
    #[error("ticket limits are locked by the host")]
    LimitsLocked,
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
