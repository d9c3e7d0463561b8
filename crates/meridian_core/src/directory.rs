//! Cross-partition user directory
//!
//! Lookups that cannot know the partition up front (username, email) fan
//! out to both user stores concurrently and merge after both complete;
//! lookups by identifier route straight to the partition the identifier's
//! tag names. There is no cross-partition lock anywhere: uniqueness checks
//! issued before an insert can race a concurrent registration, and that
//! window is part of the design.

use std::future::Future;
use std::sync::Arc;

use crate::db::models::{DbUser, DbUserPatch};
use crate::db::schema::USERS_TABLE;
use crate::db::{Filter, Partition};
use crate::error::Result;
use crate::geo;
use crate::id::{Hemisphere, UserId};
use crate::users::{NewUser, User, UserSummary, UserUpdate};

#[derive(Debug, Clone)]
pub struct UserDirectory {
    north: Arc<Partition>,
    south: Arc<Partition>,
}

impl UserDirectory {
    pub fn new(north: Arc<Partition>, south: Arc<Partition>) -> Self {
        Self { north, south }
    }

    fn partition_for(&self, hemisphere: Hemisphere) -> &Partition {
        match hemisphere {
            Hemisphere::North => &self.north,
            Hemisphere::South => &self.south,
        }
    }

    /// Mint a fresh identifier for a partition. Collisions in the random
    /// token are treated as negligible and not checked.
    pub fn generate_id(&self, hemisphere: Hemisphere) -> UserId {
        UserId::generate(hemisphere)
    }

    /// Look a user up by username across both partitions.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_by_field("username", username).await
    }

    /// Look a user up by email across both partitions.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by_field("email", email).await
    }

    /// Scatter one query to both user partitions and gather both results,
    /// north first. Every multi-partition read goes through here; the
    /// gather never short-circuits on the first store to answer.
    async fn fan_out<T, F, Fut>(&self, run: F) -> Result<(T, T)>
    where
        F: Fn(Arc<Partition>) -> Fut,
        Fut: Future<Output = crate::db::Result<T>>,
    {
        let (north, south) =
            tokio::try_join!(run(self.north.clone()), run(self.south.clone()))?;
        Ok((north, south))
    }

    /// Point lookup fanned out to both user stores. Uniqueness across
    /// partitions is only advisory, so both sides can match; the north
    /// result wins that tie, decided only after both queries complete.
    async fn find_by_field(&self, field: &'static str, value: &str) -> Result<Option<User>> {
        let filter = Filter::new(format!("{} = $value", field)).bind("value", value);
        tracing::debug!(field, "Fanning user lookup out to both partitions");

        let (north, south) = self
            .fan_out(|partition| {
                let filter = filter.clone();
                async move { partition.get::<DbUser>(USERS_TABLE, filter).await }
            })
            .await?;

        match north.or(south) {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    /// Look a user up by identifier. The identifier routes itself: its tag
    /// names the partition, so this is a single-store point lookup.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let row: Option<DbUser> = self
            .partition_for(id.hemisphere())
            .get_by_key(USERS_TABLE, &id.to_record_key())
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    /// Every user across both partitions, north first, with the total.
    /// Callers receive no partition boundary information.
    pub async fn list_all(&self) -> Result<(Vec<UserSummary>, usize)> {
        let (north, south) = self
            .fan_out(|partition| async move {
                partition.scan::<DbUser>(USERS_TABLE, None, None).await
            })
            .await?;

        let mut users = Vec::with_capacity(north.len() + south.len());
        for row in north.into_iter().chain(south) {
            let user: User = row.try_into()?;
            users.push(UserSummary::from(user));
        }

        let total = users.len();
        Ok((users, total))
    }

    /// Assign a partition from the supplied coordinates, mint an
    /// identifier, and insert. Username/email uniqueness is the caller's
    /// pre-check; a lost race surfaces as a storage constraint error.
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let hemisphere = geo::resolve(new_user.latitude, new_user.longitude)?;
        let id = self.generate_id(hemisphere);
        let user = User::assemble(id, hemisphere, new_user);

        tracing::debug!(user = %user.id, partition = %hemisphere, "Registering user");
        self.partition_for(hemisphere)
            .create::<DbUser>(
                USERS_TABLE,
                &user.id.to_record_key(),
                DbUser::from(user.clone()),
            )
            .await?;

        Ok(user)
    }

    /// Merge a sparse field set into the stored record. An empty update is
    /// a successful no-op, not an error; `updated_at` is bumped only when
    /// something is actually written.
    pub async fn update(&self, id: &UserId, update: UserUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let patch = DbUserPatch {
            username: update.username,
            email: update.email,
            password_hash: update.password_hash,
            latitude: update.latitude,
            longitude: update.longitude,
            language: update.language,
            updated_at: chrono::Utc::now().into(),
        };

        self.partition_for(id.hemisphere())
            .update_by_key::<DbUser, _>(USERS_TABLE, &id.to_record_key(), patch)
            .await?;

        Ok(())
    }

    /// Delete the record from its partition. Friendship edges are NOT
    /// touched here; the cascade is a separate call owned by the
    /// orchestrating use case, and the two are not atomic.
    pub async fn remove(&self, id: &UserId) -> Result<bool> {
        let removed = self
            .partition_for(id.hemisphere())
            .delete_by_key::<DbUser>(USERS_TABLE, &id.to_record_key())
            .await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Stores;
    use pretty_assertions::assert_eq;

    fn new_user(username: &str, latitude: f64) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "$argon2id$stub".to_string(),
            latitude,
            longitude: -3.0,
            language: "es".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_routes_by_hemisphere() {
        let stores = Stores::in_memory().await.unwrap();
        let directory = stores.directory();

        let alice = directory.register(new_user("alice", 40.0)).await.unwrap();
        let bob = directory.register(new_user("bob", -40.0)).await.unwrap();

        assert_eq!(alice.hemisphere, Hemisphere::North);
        assert!(alice.id.as_str().starts_with('n'));
        assert_eq!(bob.hemisphere, Hemisphere::South);
        assert!(bob.id.as_str().starts_with('s'));

        // Identifier-routed lookups hit the right store
        let found = directory.find_by_id(&bob.id).await.unwrap().unwrap();
        assert_eq!(found.username, "bob");
    }

    #[tokio::test]
    async fn test_register_rejects_bad_coordinates() {
        let stores = Stores::in_memory().await.unwrap();
        let directory = stores.directory();

        let err = directory.register(new_user("nowhere", 120.0)).await.unwrap_err();
        assert!(matches!(err, crate::CoreError::InvalidCoordinate { .. }));
    }

    #[tokio::test]
    async fn test_find_by_username_fans_out() {
        let stores = Stores::in_memory().await.unwrap();
        let directory = stores.directory();

        directory.register(new_user("alice", 40.0)).await.unwrap();
        directory.register(new_user("bob", -40.0)).await.unwrap();

        // Found without a partition hint, whichever store holds the row
        let alice = directory.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.hemisphere, Hemisphere::North);
        let bob = directory.find_by_username("bob").await.unwrap().unwrap();
        assert_eq!(bob.hemisphere, Hemisphere::South);

        // Absence is a successful None, not an error
        assert!(directory.find_by_username("ghost").await.unwrap().is_none());

        let bob = directory.find_by_email("bob@example.com").await.unwrap().unwrap();
        assert_eq!(bob.username, "bob");
    }

    #[tokio::test]
    async fn test_list_all_concatenates_partitions() {
        let stores = Stores::in_memory().await.unwrap();
        let directory = stores.directory();

        directory.register(new_user("alice", 40.0)).await.unwrap();
        directory.register(new_user("bob", -40.0)).await.unwrap();
        directory.register(new_user("carol", 10.0)).await.unwrap();

        let (users, total) = directory.list_all().await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(users.len(), 3);
        // North rows first, in insertion order
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[1].username, "carol");
        assert_eq!(users[2].username, "bob");
    }

    #[tokio::test]
    async fn test_update_merges_sparse_fields() {
        let stores = Stores::in_memory().await.unwrap();
        let directory = stores.directory();

        let alice = directory.register(new_user("alice", 40.0)).await.unwrap();

        // Empty update is a successful no-op
        directory.update(&alice.id, UserUpdate::default()).await.unwrap();
        let unchanged = directory.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(unchanged.updated_at, alice.updated_at);

        directory
            .update(
                &alice.id,
                UserUpdate {
                    language: Some("en".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = directory.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(updated.language, "en");
        // Untouched fields survive the merge
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@example.com");
        assert!(updated.updated_at > alice.updated_at);
    }

    #[tokio::test]
    async fn test_remove_is_single_partition() {
        let stores = Stores::in_memory().await.unwrap();
        let directory = stores.directory();

        let alice = directory.register(new_user("alice", 40.0)).await.unwrap();
        assert!(directory.remove(&alice.id).await.unwrap());
        assert!(directory.find_by_id(&alice.id).await.unwrap().is_none());
        // Removing again finds nothing
        assert!(!directory.remove(&alice.id).await.unwrap());
    }
}
