//! Chunk anchoring server
//!
//! This binary:
//! 1. Reads `anchor.toml` (or `$ANCHOR_CONFIG`)
//! 2. Builds the configured worlds and lifts host ticket limits
//! 3. Loads the selected data store and issues a ticket per saved loader
//! 4. Accepts console commands until `quit`, then releases every ticket
//!
//! Type `help` for the command list.

mod command;
mod config;
mod server;

use std::io::BufRead;
use std::sync::{Arc, mpsc};
use std::thread;

use anchor_persist::DataStoreManager;
use tracing::{error, info};

use crate::command::{Command, parse_command};
use crate::config::ServerConfig;
use crate::server::Server;

const CRATES: [&str; 4] = ["anchor_server", "anchor_tickets", "anchor_persist", "anchor_grid"];

fn main() -> eyre::Result<()> {
    let config = ServerConfig::load()?;

    // Initialize logging
    let level = if config.debug { "debug" } else { "info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for krate in CRATES {
        filter = filter.add_directive(format!("{krate}={level}").parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting chunk anchor server");
    info!(
        "Data store: {} in {}",
        config.data_store.selected,
        config.data_store.data_dir.display()
    );

    let grid = Arc::new(config.build_grid());
    let ticket_config = config.ticket_config();
    let server = Server::new(
        grid,
        ticket_config,
        DataStoreManager::new(config.data_store.clone()),
    );

    if let Err(e) = server.start() {
        error!("Startup failed: {e}");
        return Err(e);
    }

    // Set up command input channel
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    // Spawn input thread
    thread::spawn(move || {
        input_thread(cmd_tx);
    });

    info!("Type 'help' for commands");

    // A closed channel means stdin hit EOF.
    while let Ok(cmd) = cmd_rx.recv() {
        if !server.handle(cmd) {
            break;
        }
    }

    server.shutdown();
    Ok(())
}

fn input_thread(tx: mpsc::Sender<Command>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let cmd = parse_command(&line);
        let is_quit = matches!(cmd, Command::Quit);
        if tx.send(cmd).is_err() || is_quit {
            break;
        }
    }
}
