use std::sync::Arc;

use anchor_grid::{Chunk, ChunkLoader, ChunkPos, GridAdapter, TicketId, WorldId, WorldInfo};
use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What `register` does when the owner id already holds a ticket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplacePolicy {
    /// Release the old ticket once the new one is fully forced.
    #[default]
    ReleasePrevious,
    /// Overwrite the mapping and leave the old ticket alive on the grid.
    KeepPrevious,
}

/// Largest radius `register` accepts unless configured otherwise.
pub const DEFAULT_MAX_RADIUS: u32 = 32;

#[derive(Clone, Copy, Debug)]
pub struct TicketConfig {
    /// Log the ticket's chunk list after every force/unforce.
    pub debug: bool,
    pub replace: ReplacePolicy,
    /// Radii above this are refused; the scan is `(2r+1)^2` chunks.
    pub max_radius: u32,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            debug: false,
            replace: ReplacePolicy::default(),
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

/// The ticket held for one owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveTicket {
    pub ticket: TicketId,
    pub world: WorldId,
    pub center: ChunkPos,
    pub radius: u32,
}

impl ActiveTicket {
    /// Whether `pos` lies within the owner's configured radius.
    pub fn covers(&self, pos: ChunkPos) -> bool {
        self.center.chebyshev(pos) <= self.radius
    }
}

/// Owner-to-ticket bookkeeping on top of a [`GridAdapter`].
///
/// Constructed once at startup and torn down with [`TicketManager::shutdown`]
/// (or on drop), which releases every ticket still held.
pub struct TicketManager<G: GridAdapter> {
    grid: Arc<G>,
    config: TicketConfig,
    tickets: Mutex<HashMap<Uuid, ActiveTicket>>,
}

impl<G: GridAdapter> TicketManager<G> {
    pub fn new(grid: Arc<G>, config: TicketConfig) -> Self {
        Self {
            grid,
            config,
            tickets: Mutex::new(HashMap::new()),
        }
    }

    pub fn grid(&self) -> &Arc<G> {
        &self.grid
    }

    pub fn config(&self) -> TicketConfig {
        self.config
    }

    /// Ask the host to lift its ticket limits.
    ///
    /// Failure is logged and otherwise ignored; the manager keeps working
    /// under whatever limits the host enforces.
    pub fn attempt_raise_host_limits(&self) -> bool {
        match self.grid.raise_limits() {
            Ok(()) => {
                info!("Raised host ticket limits");
                true
            }
            Err(e) => {
                warn!("Failed to raise host ticket limits, continuing with host defaults: {e}");
                false
            }
        }
    }

    /// Case-insensitive lookup across every world the grid knows.
    pub fn resolve_world(&self, name: &str) -> Option<WorldInfo> {
        self.grid
            .worlds()
            .into_iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }

    /// Issue a ticket covering `loader`'s square.
    ///
    /// Returns `false` without touching the owner map when the radius exceeds
    /// `max_radius`, when the world or the center chunk cannot be resolved,
    /// when the grid refuses a ticket, or when any chunk fails to force (the
    /// half-built ticket is released).
    pub fn register(&self, loader: &ChunkLoader) -> bool {
        if loader.radius > self.config.max_radius {
            warn!(
                "Chunk loader {} radius {} exceeds the maximum of {}",
                loader.id, loader.radius, self.config.max_radius
            );
            return false;
        }
        let Some((world, center)) = self.resolve_center(loader) else {
            return false;
        };

        let mut tickets = self.tickets.lock();

        let Some(ticket) = self.grid.create_ticket(world.id) else {
            warn!(
                "Grid refused a ticket for chunk loader {} in {}",
                loader.id, world.name
            );
            return false;
        };

        let chunks = self.enumerate_radius(loader.radius, &center);
        let forced = chunks
            .iter()
            .filter(|chunk| self.force_chunk(ticket, Some(*chunk)))
            .count();
        if forced != chunks.len() {
            warn!(
                "Forced only {forced}/{} chunks for chunk loader {}, releasing {ticket}",
                chunks.len(),
                loader.id
            );
            if let Err(e) = self.grid.release_ticket(ticket) {
                warn!("Failed to release {ticket}: {e}");
            }
            return false;
        }

        let active = ActiveTicket {
            ticket,
            world: world.id,
            center: loader.center,
            radius: loader.radius,
        };
        if let Some(previous) = tickets.insert(loader.id, active) {
            match self.config.replace {
                ReplacePolicy::ReleasePrevious => {
                    if let Err(e) = self.grid.release_ticket(previous.ticket) {
                        warn!("Failed to release replaced {}: {e}", previous.ticket);
                    }
                }
                ReplacePolicy::KeepPrevious => {
                    warn!(
                        "Chunk loader {} re-registered, {} is no longer tracked",
                        loader.id, previous.ticket
                    );
                }
            }
        }

        info!(
            "Loaded chunk loader {} at {} in {} ({} chunks)",
            loader.id,
            loader.center,
            world.name,
            chunks.len()
        );
        true
    }

    /// Release the ticket held for `loader.id`.
    ///
    /// Fails when the world or center chunk cannot be resolved, or when the
    /// owner holds no ticket. The mapping is dropped even if the grid no
    /// longer knows the ticket, but the call then reports `false`.
    pub fn deregister(&self, loader: &ChunkLoader) -> bool {
        if self.resolve_center(loader).is_none() {
            return false;
        }

        let mut tickets = self.tickets.lock();
        let Some(active) = tickets.remove(&loader.id) else {
            debug!("No ticket held for chunk loader {}", loader.id);
            return false;
        };
        drop(tickets);

        match self.grid.release_ticket(active.ticket) {
            Ok(()) => {
                info!(
                    "Unloaded chunk loader {} at {} in {}",
                    loader.id, loader.center, loader.world
                );
                true
            }
            Err(e) => {
                warn!("Failed to release {} for {}: {e}", active.ticket, loader.id);
                false
            }
        }
    }

    /// Force one chunk on an existing ticket. Idempotent.
    pub fn force_chunk(&self, ticket: TicketId, chunk: Option<&Chunk>) -> bool {
        if !self.grid.tickets_supported() {
            return false;
        }
        let Some(chunk) = chunk else {
            return false;
        };
        if let Err(e) = self.grid.force_chunk(ticket, chunk.pos) {
            warn!("Failed to force {} on {ticket}: {e}", chunk.pos);
            return false;
        }
        self.log_chunk_list("LOAD", ticket);
        true
    }

    /// Stop forcing one chunk on an existing ticket.
    pub fn release_chunk(&self, ticket: TicketId, chunk: Option<&Chunk>) -> bool {
        if !self.grid.tickets_supported() {
            return false;
        }
        let Some(chunk) = chunk else {
            return false;
        };
        if let Err(e) = self.grid.unforce_chunk(ticket, chunk.pos) {
            warn!("Failed to unforce {} on {ticket}: {e}", chunk.pos);
            return false;
        }
        self.log_chunk_list("UNLOAD", ticket);
        true
    }

    /// Snapshot of every owner and its ticket.
    pub fn list_tickets(&self) -> HashMap<Uuid, ActiveTicket> {
        self.tickets.lock().clone()
    }

    pub fn ticket(&self, id: Uuid) -> Option<ActiveTicket> {
        self.tickets.lock().get(&id).copied()
    }

    pub fn is_loaded(&self, id: Uuid) -> bool {
        self.tickets.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tickets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.lock().is_empty()
    }

    /// Existing chunks within `radius` of `center`.
    ///
    /// Ordered x-major, then z, both ascending: for radius 1 around the origin
    /// the sequence starts `(-1,-1), (-1,0), (-1,1), (0,-1)`. Missing chunks
    /// are skipped.
    pub fn enumerate_radius(&self, radius: u32, center: &Chunk) -> Vec<Chunk> {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let mut chunks = Vec::new();
        for dx in -r..=r {
            for dz in -r..=r {
                let Some(pos) = center.pos.offset(dx, dz) else {
                    continue;
                };
                if let Some(chunk) = self.grid.resolve_chunk(center.world, pos) {
                    chunks.push(chunk);
                }
            }
        }
        chunks
    }

    /// Release every ticket and forget all owners.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<_> = self.tickets.lock().drain().collect();
        for (id, active) in &drained {
            if let Err(e) = self.grid.release_ticket(active.ticket) {
                warn!("Failed to release {} for {id} during shutdown: {e}", active.ticket);
            }
        }
        if !drained.is_empty() {
            info!("Released {} chunk loader ticket(s)", drained.len());
        }
        drained.len()
    }

    fn resolve_center(&self, loader: &ChunkLoader) -> Option<(WorldInfo, Chunk)> {
        let Some(world) = self.resolve_world(&loader.world) else {
            debug!("Unknown world '{}' for chunk loader {}", loader.world, loader.id);
            return None;
        };
        let Some(center) = self.grid.resolve_chunk(world.id, loader.center) else {
            debug!(
                "Center chunk {} missing in {} for chunk loader {}",
                loader.center, world.name, loader.id
            );
            return None;
        };
        Some((world, center))
    }

    fn log_chunk_list(&self, action: &str, ticket: TicketId) {
        if self.config.debug {
            debug!("{action}");
            debug!("CList: {:?}", self.grid.ticket_chunks(ticket));
        }
    }
}

impl<G: GridAdapter> Drop for TicketManager<G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
