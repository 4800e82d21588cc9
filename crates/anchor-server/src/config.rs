//! Server configuration file.

use std::path::{Path, PathBuf};

use anchor_grid::{ChunkPos, MemoryGrid};
use anchor_persist::StoreConfig;
use anchor_tickets::{DEFAULT_MAX_RADIUS, TicketConfig};
use serde::Deserialize;

/// `ANCHOR_CONFIG` overrides the config file path.
pub const CONFIG_PATH_VAR: &str = "ANCHOR_CONFIG";
/// `ANCHOR_DATA_STORE` overrides `data_store.selected`.
pub const DATA_STORE_VAR: &str = "ANCHOR_DATA_STORE";

const DEFAULT_PATH: &str = "anchor.toml";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Log every forced chunk list.
    pub debug: bool,
    /// Host ticket limit before `raise_limits`; `None` is unlimited.
    pub ticket_limit: Option<usize>,
    /// Largest loader radius accepted by `/chunkloader add` and reloads.
    pub max_radius: u32,
    pub data_store: StoreConfig,
    pub worlds: Vec<WorldConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WorldConfig {
    pub name: String,
    /// Inclusive lower chunk corner `[x, z]`.
    pub min: [i32; 2],
    /// Inclusive upper chunk corner `[x, z]`.
    pub max: [i32; 2],
}

impl Default for ServerConfig {
    fn default() -> Self {
        let world = |name: &str| WorldConfig {
            name: name.to_owned(),
            min: [-64, -64],
            max: [64, 64],
        };
        Self {
            debug: false,
            ticket_limit: None,
            max_radius: DEFAULT_MAX_RADIUS,
            data_store: StoreConfig::default(),
            worlds: vec![world("overworld"), world("the_nether"), world("the_end")],
        }
    }
}

impl ServerConfig {
    /// Read the file named by `ANCHOR_CONFIG` (or `anchor.toml`), then apply
    /// environment overrides. A missing file yields the defaults.
    pub fn load() -> eyre::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATH));
        let mut config = Self::from_file(&path)?;
        if let Ok(selected) = std::env::var(DATA_STORE_VAR) {
            config.data_store.selected = selected;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> eyre::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(eyre::eyre!("failed to read {}: {e}", path.display())),
        }
    }

    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(content)?;
        for world in &config.worlds {
            if world.min[0] > world.max[0] || world.min[1] > world.max[1] {
                eyre::bail!("world '{}' has min above max", world.name);
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn ticket_config(&self) -> TicketConfig {
        TicketConfig {
            debug: self.debug,
            max_radius: self.max_radius,
            ..TicketConfig::default()
        }
    }

    /// The in-process grid described by `worlds`.
    #[must_use]
    pub fn build_grid(&self) -> MemoryGrid {
        let mut grid = self.worlds.iter().fold(MemoryGrid::new(), |grid, world| {
            grid.with_world(
                world.name.clone(),
                ChunkPos::new(world.min[0], world.min[1]),
                ChunkPos::new(world.max[0], world.max[1]),
            )
        });
        if let Some(limit) = self.ticket_limit {
            grid = grid.with_ticket_limit(limit);
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use anchor_grid::GridAdapter;

    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = ServerConfig::parse("").unwrap();
        assert!(!config.debug);
        assert_eq!(config.max_radius, DEFAULT_MAX_RADIUS);
        assert_eq!(config.data_store.selected, "LMDB");
        assert_eq!(config.worlds.len(), 3);
    }

    #[test]
    fn full_file() {
        let config = ServerConfig::parse(
            r#"
            debug = true
            ticket_limit = 4
            max_radius = 8

            [data_store]
            selected = "json"
            data_dir = "/var/lib/anchor"

            [[worlds]]
            name = "overworld"
            min = [-8, -8]
            max = [8, 8]
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.ticket_limit, Some(4));
        let tickets = config.ticket_config();
        assert!(tickets.debug);
        assert_eq!(tickets.max_radius, 8);
        assert_eq!(config.data_store.selected, "json");
        assert_eq!(config.data_store.data_dir, PathBuf::from("/var/lib/anchor"));
        assert_eq!(
            config.worlds,
            vec![WorldConfig {
                name: "overworld".to_owned(),
                min: [-8, -8],
                max: [8, 8],
            }]
        );

        let grid = config.build_grid();
        assert_eq!(grid.worlds().len(), 1);
        assert_eq!(grid.ticket_limit(), Some(4));
    }

    #[test]
    fn partial_store_section_keeps_defaults() {
        let config = ServerConfig::parse("[data_store]\nselected = \"json\"\n").unwrap();
        assert_eq!(config.data_store.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = ServerConfig::parse(
            "[[worlds]]\nname = \"flat\"\nmin = [4, 0]\nmax = [0, 0]\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.worlds.len(), 3);
    }
}
