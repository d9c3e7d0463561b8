//! Partitioned storage backend for Meridian
//!
//! User records are split across two independent embedded stores keyed by
//! hemisphere, with a third store holding friendship edges. Each store is an
//! isolated unit of durability; nothing here spans partitions, and there is
//! no two-phase commit anywhere in this design. Cross-partition consistency
//! is the job of the layers above.

use miette::Diagnostic;
use std::fmt::{self, Display};
use std::sync::Arc;
use thiserror::Error;

use crate::config::MeridianConfig;
use crate::directory::UserDirectory;
use crate::friends::FriendshipGraph;
use crate::id::Hemisphere;
use crate::service::SocialService;

pub mod migration;
pub mod models;
pub mod partition;
pub mod schema;

pub use partition::Partition;

/// Core storage error type. The only failure kind a partition surfaces;
/// business rules live above this layer.
#[derive(Error, Debug, Diagnostic)]
pub enum StoreError {
    #[error("Connection failed")]
    #[diagnostic(help("Check the store configuration and that the data directory is writable"))]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(help("Check the query syntax and table schema"))]
    QueryFailed(#[source] surrealdb::Error),

    #[error("A uniqueness constraint rejected the row")]
    #[diagnostic(help("The table declares a unique index that already contains this value"))]
    ConstraintViolation { detail: String },

    #[error("Stored record could not be decoded: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The three independently-addressable stores.
///
/// The one-letter keys double as database names and match the identifier
/// tags, so a record's leading character names its store directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionRole {
    UsersNorth,
    UsersSouth,
    Friends,
}

impl PartitionRole {
    pub fn key(&self) -> &'static str {
        match self {
            PartitionRole::UsersNorth => "n",
            PartitionRole::UsersSouth => "s",
            PartitionRole::Friends => "f",
        }
    }
}

impl Display for PartitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<Hemisphere> for PartitionRole {
    fn from(hemisphere: Hemisphere) -> Self {
        match hemisphere {
            Hemisphere::North => PartitionRole::UsersNorth,
            Hemisphere::South => PartitionRole::UsersSouth,
        }
    }
}

/// A where-clause plus its named bind values.
///
/// Callers write the clause against field names (`username = $username`)
/// and bind every `$name` placeholder; values are never spliced into the
/// query text.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub clause: String,
    pub binds: Vec<(String, serde_json::Value)>,
}

impl Filter {
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            binds: Vec::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.binds.push((name.into(), value.into()));
        self
    }
}

/// Limit/offset window applied to a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub limit: usize,
    pub offset: usize,
}

/// The composition root: all three partition handles, opened once at
/// startup and shared by reference for the life of the process.
#[derive(Debug, Clone)]
pub struct Stores {
    pub north: Arc<Partition>,
    pub south: Arc<Partition>,
    pub friends: Arc<Partition>,
}

impl Stores {
    /// Open (and migrate) every partition named by the configuration.
    pub async fn connect(config: &MeridianConfig) -> crate::error::Result<Self> {
        let (north, south, friends) = tokio::try_join!(
            Partition::connect(PartitionRole::UsersNorth, &config.partitions.north),
            Partition::connect(PartitionRole::UsersSouth, &config.partitions.south),
            Partition::connect(PartitionRole::Friends, &config.partitions.friends),
        )?;

        Ok(Self {
            north: Arc::new(north),
            south: Arc::new(south),
            friends: Arc::new(friends),
        })
    }

    /// Three fresh in-memory partitions, for tests.
    pub async fn in_memory() -> crate::error::Result<Self> {
        Self::connect(&MeridianConfig::in_memory()).await
    }

    pub fn directory(&self) -> UserDirectory {
        UserDirectory::new(self.north.clone(), self.south.clone())
    }

    pub fn graph(&self) -> FriendshipGraph {
        FriendshipGraph::new(self.friends.clone(), self.directory())
    }

    pub fn service(&self) -> SocialService {
        SocialService::new(self.directory(), self.graph())
    }
}
