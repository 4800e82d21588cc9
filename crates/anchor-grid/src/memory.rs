//! In-process grid with rectangular worlds.

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;

use crate::{Chunk, ChunkPos, GridAdapter, GridError, GridResult, TicketId, WorldId, WorldInfo};

struct WorldState {
    info: WorldInfo,
    /// Inclusive bounds of existing chunks.
    min: ChunkPos,
    max: ChunkPos,
    /// Holes inside the bounds.
    missing: HashSet<ChunkPos>,
}

impl WorldState {
    fn contains(&self, pos: ChunkPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.z..=self.max.z).contains(&pos.z)
            && !self.missing.contains(&pos)
    }
}

struct TicketState {
    world: WorldId,
    forced: BTreeSet<ChunkPos>,
}

#[derive(Default)]
struct Inner {
    worlds: Vec<WorldState>,
    tickets: HashMap<TicketId, TicketState>,
    next_ticket: u64,
    ticket_limit: Option<usize>,
    tickets_disabled: bool,
    limits_locked: bool,
}

impl Inner {
    fn world(&self, id: WorldId) -> Option<&WorldState> {
        self.worlds.iter().find(|w| w.info.id == id)
    }
}

/// A grid whose worlds are rectangles of chunks held in memory.
///
/// Tickets are counted until released, so a ticket the caller drops without
/// releasing stays visible through [`MemoryGrid::ticket_count`].
#[derive(Default)]
pub struct MemoryGrid {
    inner: Mutex<Inner>,
}

impl MemoryGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a world whose chunks span `min..=max` on both axes.
    #[must_use]
    pub fn with_world(mut self, name: impl Into<String>, min: ChunkPos, max: ChunkPos) -> Self {
        let inner = self.inner.get_mut();
        let id = WorldId(inner.worlds.len() as u32);
        inner.worlds.push(WorldState {
            info: WorldInfo {
                id,
                name: name.into(),
            },
            min,
            max,
            missing: HashSet::new(),
        });
        self
    }

    /// Punch a hole into an existing world.
    #[must_use]
    pub fn without_chunk(mut self, world: &str, pos: ChunkPos) -> Self {
        let inner = self.inner.get_mut();
        if let Some(state) = inner.worlds.iter_mut().find(|w| w.info.name == world) {
            state.missing.insert(pos);
        }
        self
    }

    /// Refuse new tickets once `limit` are live.
    #[must_use]
    pub fn with_ticket_limit(mut self, limit: usize) -> Self {
        self.inner.get_mut().ticket_limit = Some(limit);
        self
    }

    /// Simulate a host without a ticketing service.
    #[must_use]
    pub fn tickets_disabled(mut self) -> Self {
        self.inner.get_mut().tickets_disabled = true;
        self
    }

    /// Simulate a host whose limits cannot be overridden.
    #[must_use]
    pub fn limits_locked(mut self) -> Self {
        self.inner.get_mut().limits_locked = true;
        self
    }

    /// Look up a world by its exact name.
    pub fn world_id(&self, name: &str) -> Option<WorldId> {
        let inner = self.inner.lock();
        inner
            .worlds
            .iter()
            .find(|w| w.info.name == name)
            .map(|w| w.info.id)
    }

    /// Number of live tickets, including ones nobody references anymore.
    pub fn ticket_count(&self) -> usize {
        self.inner.lock().tickets.len()
    }

    /// Current ticket limit, `None` when unlimited.
    pub fn ticket_limit(&self) -> Option<usize> {
        self.inner.lock().ticket_limit
    }

    /// Whether any live ticket forces `pos` in `world`.
    pub fn is_forced(&self, world: WorldId, pos: ChunkPos) -> bool {
        let inner = self.inner.lock();
        inner
            .tickets
            .values()
            .any(|t| t.world == world && t.forced.contains(&pos))
    }

    /// Union of all chunks forced in `world`.
    pub fn forced_chunks(&self, world: WorldId) -> BTreeSet<ChunkPos> {
        let inner = self.inner.lock();
        inner
            .tickets
            .values()
            .filter(|t| t.world == world)
            .flat_map(|t| t.forced.iter().copied())
            .collect()
    }
}

impl GridAdapter for MemoryGrid {
    fn worlds(&self) -> Vec<WorldInfo> {
        let inner = self.inner.lock();
        inner.worlds.iter().map(|w| w.info.clone()).collect()
    }

    fn resolve_chunk(&self, world: WorldId, pos: ChunkPos) -> Option<Chunk> {
        let inner = self.inner.lock();
        let state = inner.world(world)?;
        state.contains(pos).then_some(Chunk { world, pos })
    }

    fn tickets_supported(&self) -> bool {
        !self.inner.lock().tickets_disabled
    }

    fn create_ticket(&self, world: WorldId) -> Option<TicketId> {
        let mut inner = self.inner.lock();
        if inner.tickets_disabled || inner.world(world).is_none() {
            return None;
        }
        if let Some(limit) = inner.ticket_limit
            && inner.tickets.len() >= limit
        {
            tracing::trace!("ticket limit {limit} reached");
            return None;
        }

        let id = TicketId(inner.next_ticket);
        inner.next_ticket += 1;
        inner.tickets.insert(
            id,
            TicketState {
                world,
                forced: BTreeSet::new(),
            },
        );
        Some(id)
    }

    fn force_chunk(&self, ticket: TicketId, pos: ChunkPos) -> GridResult<()> {
        let mut inner = self.inner.lock();
        if inner.tickets_disabled {
            return Err(GridError::TicketsDisabled);
        }
        let world = inner
            .tickets
            .get(&ticket)
            .map(|t| t.world)
            .ok_or(GridError::UnknownTicket(ticket))?;
        if !inner.world(world).is_some_and(|w| w.contains(pos)) {
            return Err(GridError::MissingChunk { world, pos });
        }
        if let Some(state) = inner.tickets.get_mut(&ticket) {
            state.forced.insert(pos);
        }
        Ok(())
    }

    fn unforce_chunk(&self, ticket: TicketId, pos: ChunkPos) -> GridResult<()> {
        let mut inner = self.inner.lock();
        if inner.tickets_disabled {
            return Err(GridError::TicketsDisabled);
        }
        let state = inner
            .tickets
            .get_mut(&ticket)
            .ok_or(GridError::UnknownTicket(ticket))?;
        state.forced.remove(&pos);
        Ok(())
    }

    fn release_ticket(&self, ticket: TicketId) -> GridResult<()> {
        let mut inner = self.inner.lock();
        inner
            .tickets
            .remove(&ticket)
            .map(|_| ())
            .ok_or(GridError::UnknownTicket(ticket))
    }

    fn ticket_chunks(&self, ticket: TicketId) -> Vec<ChunkPos> {
        let inner = self.inner.lock();
        inner
            .tickets
            .get(&ticket)
            .map(|t| t.forced.iter().copied().collect())
            .unwrap_or_default()
    }

    fn raise_limits(&self) -> GridResult<()> {
        let mut inner = self.inner.lock();
        if inner.limits_locked {
            return Err(GridError::LimitsLocked);
        }
        inner.ticket_limit = None;
        Ok(())
    }
}
