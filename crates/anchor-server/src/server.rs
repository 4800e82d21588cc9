//! Ties the ticket manager to the active data store.

use std::sync::Arc;

use anchor_grid::{ChunkLoader, ChunkPos, GridAdapter};
use anchor_persist::{DataStore, DataStoreManager};
use anchor_tickets::{TicketConfig, TicketManager};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::command::{Command, HELP};

/// Runtime state: live tickets plus the store they are persisted in.
///
/// Every add/remove goes to the ticket manager first and is persisted only
/// once the grid accepted it.
pub struct Server<G: GridAdapter> {
    tickets: TicketManager<G>,
    stores: DataStoreManager,
}

impl<G: GridAdapter> Server<G> {
    pub fn new(grid: Arc<G>, ticket_config: TicketConfig, stores: DataStoreManager) -> Self {
        Self {
            tickets: TicketManager::new(grid, ticket_config),
            stores,
        }
    }

    pub fn tickets(&self) -> &TicketManager<G> {
        &self.tickets
    }

    pub fn stores(&self) -> &DataStoreManager {
        &self.stores
    }

    /// Raise host limits, load the configured store and issue a ticket for
    /// every persisted loader.
    pub fn start(&self) -> eyre::Result<usize> {
        self.tickets.attempt_raise_host_limits();
        if !self.stores.load()? {
            eyre::bail!(
                "failed to load data store '{}', available: {:?}",
                self.stores.config().selected,
                self.stores.available_data_stores()
            );
        }
        Ok(self.register_persisted())
    }

    /// Handle one console command. Returns `false` once the server should stop.
    pub fn handle(&self, command: Command) -> bool {
        match command {
            Command::Add {
                world,
                x,
                z,
                radius,
            } => {
                let loader = ChunkLoader::new(world, ChunkPos::new(x, z), radius);
                if let Err(e) = self.add(&loader) {
                    error!("{e}");
                }
            }
            Command::Resize { id, radius } => {
                if let Err(e) = self.resize(id, radius) {
                    error!("{e}");
                }
            }
            Command::Remove { id } => {
                if let Err(e) = self.remove(id) {
                    error!("{e}");
                }
            }
            Command::List => self.list(),
            Command::Stores => {
                info!(
                    "Available data stores: {:?}",
                    self.stores.available_data_stores()
                );
                if let Some(store) = self.stores.active() {
                    info!("Active data store: {}", store.name());
                }
            }
            Command::Reload => {
                if let Err(e) = self.reload() {
                    error!("Reload failed: {e}");
                }
            }
            Command::Help => {
                info!("Commands:");
                for line in HELP {
                    info!("{line}");
                }
            }
            Command::Quit => {
                info!("Shutting down...");
                return false;
            }
            Command::Usage(usage) => info!("Usage: {usage}"),
            Command::Unknown(s) => {
                if !s.is_empty() {
                    info!("Unknown command: '{}'. Type 'help' for commands.", s);
                }
            }
        }
        true
    }

    /// Register `loader` and persist it.
    pub fn add(&self, loader: &ChunkLoader) -> eyre::Result<()> {
        let store = self.active_store()?;
        if !self.tickets.register(loader) {
            eyre::bail!(
                "could not load chunk loader at {} in '{}'",
                loader.center,
                loader.world
            );
        }
        if let Err(e) = store.save(loader) {
            // Keep grid and store in agreement.
            self.tickets.deregister(loader);
            return Err(e.into());
        }
        info!("Added chunk loader {}", loader.id);
        Ok(())
    }

    /// Re-register a stored loader with a new radius.
    pub fn resize(&self, id: Uuid, radius: u32) -> eyre::Result<()> {
        let store = self.active_store()?;
        let previous = Self::stored(store.as_ref(), id)?;
        let loader = previous.with_radius(radius);
        if !self.tickets.register(&loader) {
            eyre::bail!("could not resize chunk loader {id}");
        }
        if let Err(e) = store.save(&loader) {
            // Put the grid back to what the store still holds.
            if !self.tickets.register(&previous) {
                warn!("Failed to restore chunk loader {id} at radius {}", previous.radius);
            }
            return Err(e.into());
        }
        info!("Resized chunk loader {id} to radius {radius}");
        Ok(())
    }

    /// Deregister a loader and delete it from the store.
    pub fn remove(&self, id: Uuid) -> eyre::Result<()> {
        let store = self.active_store()?;
        let loader = Self::stored(store.as_ref(), id)?;
        if !self.tickets.deregister(&loader) {
            warn!("Chunk loader {id} held no ticket");
        }
        store.delete(id)?;
        info!("Removed chunk loader {id}");
        Ok(())
    }

    /// Reload the store and rebuild every ticket from it.
    pub fn reload(&self) -> eyre::Result<usize> {
        if !self.stores.load()? {
            eyre::bail!(
                "data store '{}' did not load, keeping current tickets",
                self.stores.config().selected
            );
        }
        self.tickets.shutdown();
        Ok(self.register_persisted())
    }

    pub fn list(&self) {
        let Some(store) = self.stores.active() else {
            info!("No active data store");
            return;
        };
        let loaders = store.chunk_loaders();
        info!("Chunk loaders ({}):", loaders.len());
        for loader in loaders {
            let state = match self.tickets.ticket(loader.id) {
                Some(active) => format!(
                    "{} chunk(s) on {}",
                    self.tickets.grid().ticket_chunks(active.ticket).len(),
                    active.ticket
                ),
                None => "not loaded".to_owned(),
            };
            info!(
                "  - {} {} {} r={} ({state})",
                loader.id, loader.world, loader.center, loader.radius
            );
        }
    }

    /// Release every ticket.
    pub fn shutdown(&self) -> usize {
        self.tickets.shutdown()
    }

    fn register_persisted(&self) -> usize {
        let Some(store) = self.stores.active() else {
            return 0;
        };
        let loaders = store.chunk_loaders();
        let loaded = loaders
            .iter()
            .filter(|loader| {
                let ok = self.tickets.register(loader);
                if !ok {
                    warn!(
                        "Failed to load chunk loader {} at {} in '{}'",
                        loader.id, loader.center, loader.world
                    );
                }
                ok
            })
            .count();
        info!("Loaded {loaded}/{} chunk loader(s)", loaders.len());
        loaded
    }

    fn active_store(&self) -> eyre::Result<Arc<dyn DataStore>> {
        self.stores
            .active()
            .ok_or_else(|| eyre::eyre!("no active data store"))
    }

    fn stored(store: &dyn DataStore, id: Uuid) -> eyre::Result<ChunkLoader> {
        store
            .chunk_loaders()
            .into_iter()
            .find(|loader| loader.id == id)
            .ok_or_else(|| eyre::eyre!("unknown chunk loader {id}"))
    }
}
