//! Schema versioning for the partition stores
//!
//! Each partition migrates independently at connect time; there is no
//! coordination between stores, matching the rest of the design.

use super::schema::Schema;
use super::{PartitionRole, Result, StoreError};
use surrealdb::{Connection, Surreal};

/// Store migration runner
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run all migrations for one partition.
    pub async fn run<C: Connection>(db: &Surreal<C>, role: PartitionRole) -> Result<()> {
        let current_version = Self::get_schema_version(db).await?;

        if current_version < 1 {
            tracing::info!(partition = %role, "Running migration v1: initial schema");
            Self::migrate_v1(db, role).await?;
            Self::update_schema_version(db, 1).await?;
        }

        // Add more migrations here as needed

        Ok(())
    }

    /// Migration v1: table definitions and indexes for this partition's role
    async fn migrate_v1<C: Connection>(db: &Surreal<C>, role: PartitionRole) -> Result<()> {
        for table in Schema::tables_for(role) {
            db.query(&table.schema)
                .await
                .map_err(StoreError::QueryFailed)?;

            for index in &table.indexes {
                db.query(index).await.map_err(StoreError::QueryFailed)?;
            }
        }

        Ok(())
    }

    /// Get schema version
    async fn get_schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32> {
        let mut result = db
            .query("SELECT schema_version FROM schema_meta LIMIT 1")
            .await
            .map_err(StoreError::QueryFailed)?;

        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            schema_version: u32,
        }

        let versions: Vec<SchemaVersion> = result.take(0).unwrap_or_default();

        Ok(versions.first().map(|v| v.schema_version).unwrap_or(0))
    }

    /// Update schema version
    async fn update_schema_version<C: Connection>(db: &Surreal<C>, version: u32) -> Result<()> {
        let updated: Vec<serde_json::Value> = db
            .query("UPDATE schema_meta SET schema_version = $version, updated_at = time::now()")
            .bind(("version", version))
            .await
            .map_err(StoreError::QueryFailed)?
            .take(0)
            .unwrap_or_default();

        if updated.is_empty() {
            db.query("CREATE schema_meta SET schema_version = $version, created_at = time::now(), updated_at = time::now()")
                .bind(("version", version))
                .await
                .map_err(StoreError::QueryFailed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::Partition;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let partition = Partition::connect(PartitionRole::UsersNorth, &StoreConfig::Memory)
            .await
            .unwrap();

        let version = MigrationRunner::get_schema_version(partition.handle())
            .await
            .unwrap();
        assert_eq!(version, 1);

        // Running migrations again should be a no-op
        MigrationRunner::run(partition.handle(), PartitionRole::UsersNorth)
            .await
            .unwrap();
        let version = MigrationRunner::get_schema_version(partition.handle())
            .await
            .unwrap();
        assert_eq!(version, 1);
    }
}
