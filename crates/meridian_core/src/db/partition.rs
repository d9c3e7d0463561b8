//! A single partition store
//!
//! One embedded SurrealDB instance per partition, opened once and shared by
//! reference for the life of the process. The store knows nothing about the
//! other partitions and enforces no cross-row business rules; it surfaces
//! only [`StoreError`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};

use super::migration::MigrationRunner;
use super::{Filter, PartitionRole, Result, Slice, StoreError};
use crate::config::StoreConfig;

pub struct Partition {
    role: PartitionRole,
    db: Surreal<Any>,
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition").field("role", &self.role).finish()
    }
}

impl Partition {
    /// Open the store backing one partition and bring its schema up to
    /// date. Called once per partition at startup; the handle is shared
    /// from then on.
    pub async fn connect(role: PartitionRole, config: &StoreConfig) -> Result<Self> {
        let endpoint = match config {
            StoreConfig::Memory => "memory".to_string(),
            StoreConfig::Embedded { path } => {
                // Ensure the parent directory exists for file-based storage
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            StoreError::Other(format!("Failed to create store directory: {}", e))
                        })?;
                    }
                }
                format!("surrealkv://{}", path)
            }
        };

        tracing::info!(partition = %role, "Connecting partition store at: {}", endpoint);
        let connect_start = std::time::Instant::now();
        let db = any::connect(endpoint)
            .await
            .map_err(StoreError::ConnectionFailed)?;
        db.use_ns("meridian")
            .use_db(role.key())
            .await
            .map_err(StoreError::ConnectionFailed)?;
        tracing::info!(
            partition = %role,
            "Partition store ready in {:?}",
            connect_start.elapsed()
        );

        MigrationRunner::run(&db, role).await?;

        Ok(Self { role, db })
    }

    pub fn role(&self) -> PartitionRole {
        self.role
    }

    /// Raw handle, for migrations and tests.
    pub fn handle(&self) -> &Surreal<Any> {
        &self.db
    }

    /// Point lookup: at most one row is expected to match. Callers are
    /// responsible for predicates that are unique, such as a record key.
    pub async fn get<T>(&self, table: &str, filter: Filter) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let sql = format!("SELECT * FROM {} WHERE {} LIMIT 1", table, filter.clause);
        let rows: Vec<T> = self.run_select(sql, filter.binds).await?;
        Ok(rows.into_iter().next())
    }

    /// O(1) lookup by record key.
    pub async fn get_by_key<T>(&self, table: &str, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.db
            .select((table, key))
            .await
            .map_err(StoreError::QueryFailed)
    }

    /// Finite, re-issuable scan in insertion order. Issuing the same
    /// predicate twice yields the same row set, so a paged read and its
    /// companion count always agree.
    pub async fn scan<T>(
        &self,
        table: &str,
        filter: Option<Filter>,
        slice: Option<Slice>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let mut sql = format!("SELECT * FROM {}", table);
        let mut binds = Vec::new();
        if let Some(filter) = filter {
            sql.push_str(&format!(" WHERE {}", filter.clause));
            binds = filter.binds;
        }
        sql.push_str(" ORDER BY created_at ASC");
        if let Some(slice) = slice {
            sql.push_str(&format!(" LIMIT {} START {}", slice.limit, slice.offset));
        }

        self.run_select(sql, binds).await
    }

    /// Row count for a predicate, from the same candidate set a scan with
    /// that predicate would return.
    pub async fn count(&self, table: &str, filter: Filter) -> Result<usize> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            total: usize,
        }

        let sql = format!(
            "SELECT count() AS total FROM {} WHERE {} GROUP ALL",
            table, filter.clause
        );
        let rows: Vec<CountRow> = self.run_select(sql, filter.binds).await?;
        Ok(rows.first().map(|row| row.total).unwrap_or(0))
    }

    /// Insert a row under an explicit record key.
    pub async fn create<T>(&self, table: &str, key: &str, row: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let created: Option<T> = self
            .db
            .create((table, key))
            .content(row)
            .await
            .map_err(map_write_error)?;

        created.ok_or_else(|| StoreError::Other(format!("Insert into {} returned no record", table)))
    }

    /// Insert a row with a store-assigned record key.
    pub async fn create_auto<T>(&self, table: &str, row: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let created: Option<T> = self
            .db
            .create(table)
            .content(row)
            .await
            .map_err(map_write_error)?;

        created.ok_or_else(|| StoreError::Other(format!("Insert into {} returned no record", table)))
    }

    /// Merge a sparse field set into the row with the given key. Returns
    /// whether a row existed to update.
    pub async fn update_by_key<T, P>(&self, table: &str, key: &str, patch: P) -> Result<bool>
    where
        T: DeserializeOwned + Send + Sync,
        P: Serialize + Send + Sync + 'static,
    {
        let updated: Option<T> = self
            .db
            .update((table, key))
            .merge(patch)
            .await
            .map_err(map_write_error)?;
        Ok(updated.is_some())
    }

    /// Delete the row with the given key. Returns whether a row existed.
    pub async fn delete_by_key<T>(&self, table: &str, key: &str) -> Result<bool>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let deleted: Option<T> = self
            .db
            .delete((table, key))
            .await
            .map_err(StoreError::QueryFailed)?;
        Ok(deleted.is_some())
    }

    /// Delete every row matching the predicate, returning the number of
    /// rows removed. Zero matches is not an error.
    pub async fn delete_where(&self, table: &str, filter: Filter) -> Result<usize> {
        // Count the deleted rows by deserializing only their record keys;
        // surrealdb's `RecordId` round-trips where `serde_json::Value`
        // cannot represent the engine's record-link enum.
        #[derive(serde::Deserialize)]
        struct DeletedRow {
            #[allow(dead_code)]
            id: surrealdb::RecordId,
        }

        let sql = format!("DELETE {} WHERE {} RETURN BEFORE", table, filter.clause);
        let rows: Vec<DeletedRow> = self.run_select(sql, filter.binds).await?;
        Ok(rows.len())
    }

    async fn run_select<T>(
        &self,
        sql: String,
        binds: Vec<(String, serde_json::Value)>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let mut query = self.db.query(sql);
        for bind in binds {
            query = query.bind(bind);
        }

        let mut response = query.await.map_err(StoreError::QueryFailed)?;
        response.take(0).map_err(StoreError::QueryFailed)
    }
}

fn map_write_error(error: surrealdb::Error) -> StoreError {
    let detail = error.to_string();
    // Unique index rejections and duplicate record keys come back as plain
    // query errors; pick them out so callers can tell them apart from I/O
    // faults.
    if detail.contains("already contains") || detail.contains("already exists") {
        StoreError::ConstraintViolation { detail }
    } else {
        StoreError::QueryFailed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::USERS_TABLE;
    use crate::db::models::DbUser;
    use crate::id::{Hemisphere, UserId};
    use crate::users::{NewUser, User};

    async fn north_partition() -> Partition {
        Partition::connect(PartitionRole::UsersNorth, &StoreConfig::Memory)
            .await
            .unwrap()
    }

    fn sample_user(username: &str, email: &str) -> User {
        User::assemble(
            UserId::generate(Hemisphere::North),
            Hemisphere::North,
            NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: "$argon2id$stub".to_string(),
                latitude: 40.0,
                longitude: -3.0,
                language: "es".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_and_point_lookups() {
        let partition = north_partition().await;
        let user = sample_user("alice", "alice@example.com");
        let key = user.id.to_record_key();

        partition
            .create::<DbUser>(USERS_TABLE, &key, DbUser::from(user.clone()))
            .await
            .unwrap();

        let by_key: Option<DbUser> = partition.get_by_key(USERS_TABLE, &key).await.unwrap();
        assert_eq!(by_key.unwrap().username, "alice");

        let by_name: Option<DbUser> = partition
            .get(
                USERS_TABLE,
                Filter::new("username = $username").bind("username", "alice"),
            )
            .await
            .unwrap();
        assert_eq!(by_name.unwrap().email, "alice@example.com");

        let missing: Option<DbUser> = partition
            .get(
                USERS_TABLE,
                Filter::new("username = $username").bind("username", "ghost"),
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let partition = north_partition().await;
        let first = sample_user("alice", "alice@example.com");
        let second = sample_user("alice", "other@example.com");

        partition
            .create::<DbUser>(USERS_TABLE, &first.id.to_record_key(), DbUser::from(first))
            .await
            .unwrap();

        let err = partition
            .create::<DbUser>(USERS_TABLE, &second.id.to_record_key(), DbUser::from(second))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_scan_slicing_and_count_agree() {
        let partition = north_partition().await;
        for i in 0..5 {
            let user = sample_user(&format!("user{}", i), &format!("user{}@example.com", i));
            partition
                .create::<DbUser>(USERS_TABLE, &user.id.to_record_key(), DbUser::from(user))
                .await
                .unwrap();
        }

        let all: Vec<DbUser> = partition.scan(USERS_TABLE, None, None).await.unwrap();
        assert_eq!(all.len(), 5);
        // Insertion order
        assert_eq!(all[0].username, "user0");
        assert_eq!(all[4].username, "user4");

        let window: Vec<DbUser> = partition
            .scan(USERS_TABLE, None, Some(Slice { limit: 2, offset: 2 }))
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].username, "user2");

        let total = partition
            .count(USERS_TABLE, Filter::new("latitude = $latitude").bind("latitude", 40.0))
            .await
            .unwrap();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_delete_where_reports_rows_affected() {
        let partition = north_partition().await;
        let user = sample_user("alice", "alice@example.com");
        let key = user.id.to_record_key();
        partition
            .create::<DbUser>(USERS_TABLE, &key, DbUser::from(user))
            .await
            .unwrap();

        let filter = Filter::new("username = $username").bind("username", "alice");
        assert_eq!(
            partition.delete_where(USERS_TABLE, filter.clone()).await.unwrap(),
            1
        );
        // Second pass matches nothing and still succeeds
        assert_eq!(partition.delete_where(USERS_TABLE, filter).await.unwrap(), 0);
    }
}
