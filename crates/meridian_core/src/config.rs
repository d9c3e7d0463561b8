//! Configuration for the partition stores

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Backend for a single partition store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Volatile in-memory store, for tests.
    Memory,
    /// File-backed embedded store.
    Embedded { path: String },
}

impl StoreConfig {
    fn embedded(path: &str) -> Self {
        StoreConfig::Embedded {
            path: path.to_string(),
        }
    }
}

/// One entry per partition. Each store is an independent file (or memory
/// instance); nothing requires them to live on the same volume, or host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionsConfig {
    #[serde(default = "default_north")]
    pub north: StoreConfig,
    #[serde(default = "default_south")]
    pub south: StoreConfig,
    #[serde(default = "default_friends")]
    pub friends: StoreConfig,
}

fn default_north() -> StoreConfig {
    StoreConfig::embedded("./meridian-n.db")
}

fn default_south() -> StoreConfig {
    StoreConfig::embedded("./meridian-s.db")
}

fn default_friends() -> StoreConfig {
    StoreConfig::embedded("./meridian-friends.db")
}

impl Default for PartitionsConfig {
    fn default() -> Self {
        Self {
            north: default_north(),
            south: default_south(),
            friends: default_friends(),
        }
    }
}

/// Top-level configuration for Meridian
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeridianConfig {
    #[serde(default)]
    pub partitions: PartitionsConfig,
}

impl MeridianConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| CoreError::Configuration {
            path: path.display().to_string(),
            cause: Box::new(e),
        })?;

        toml::from_str(&raw).map_err(|e| CoreError::Configuration {
            path: path.display().to_string(),
            cause: Box::new(e),
        })
    }

    /// All three partitions in memory, for tests.
    pub fn in_memory() -> Self {
        Self {
            partitions: PartitionsConfig {
                north: StoreConfig::Memory,
                south: StoreConfig::Memory,
                friends: StoreConfig::Memory,
            },
        }
    }
}
