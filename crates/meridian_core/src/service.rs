//! Account and friendship use cases
//!
//! The pre-check-then-act orchestration that sits between the transport
//! layer and the partitioned components. Input arrives already validated
//! and authenticated; credentials arrive already hashed. Every pre-check
//! here has a window against a concurrent conflicting request, because
//! nothing locks across partitions; that window is accepted, not patched.

use crate::directory::UserDirectory;
use crate::error::{CoreError, Result};
use crate::friends::FriendshipGraph;
use crate::id::UserId;
use crate::users::{FriendPage, NewUser, PageRequest, User, UserSummary, UserUpdate};

#[derive(Debug, Clone)]
pub struct SocialService {
    directory: UserDirectory,
    graph: FriendshipGraph,
}

impl SocialService {
    pub fn new(directory: UserDirectory, graph: FriendshipGraph) -> Self {
        Self { directory, graph }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn graph(&self) -> &FriendshipGraph {
        &self.graph
    }

    /// Register an account after confirming the username and email are
    /// free in both partitions.
    pub async fn register_account(&self, new_user: NewUser) -> Result<User> {
        if self
            .directory
            .find_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(CoreError::already_exists("username", &new_user.username));
        }
        if self
            .directory
            .find_by_email(&new_user.email)
            .await?
            .is_some()
        {
            return Err(CoreError::already_exists("email", &new_user.email));
        }

        self.directory.register(new_user).await
    }

    /// A user's public profile summary.
    pub async fn profile(&self, id: &UserId) -> Result<UserSummary> {
        let user = self
            .directory
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::user_not_found(id.as_str()))?;
        Ok(UserSummary::from(user))
    }

    /// Apply a sparse profile update. An update with no fields set is a
    /// successful no-op.
    pub async fn update_profile(&self, id: &UserId, update: UserUpdate) -> Result<()> {
        if self.directory.find_by_id(id).await?.is_none() {
            return Err(CoreError::user_not_found(id.as_str()));
        }
        self.directory.update(id, update).await
    }

    /// Delete an account: cascade the friendship edges first, then remove
    /// the record from its partition. The two deletes hit independent
    /// stores sequentially; a crash in between leaves the record without
    /// edges, never dangling edges without a cascade.
    pub async fn delete_account(&self, id: &UserId) -> Result<()> {
        if self.directory.find_by_id(id).await?.is_none() {
            return Err(CoreError::user_not_found(id.as_str()));
        }

        self.graph.remove_all(id).await?;
        self.directory.remove(id).await?;
        tracing::debug!(user = %id, "Account deleted");
        Ok(())
    }

    /// Every account across both partitions, with the total.
    pub async fn list_accounts(&self) -> Result<(Vec<UserSummary>, usize)> {
        self.directory.list_all().await
    }

    /// Add a friendship after confirming the friend exists and the pair is
    /// not already joined.
    pub async fn befriend(&self, user: &UserId, friend: &UserId) -> Result<()> {
        if self.directory.find_by_id(friend).await?.is_none() {
            return Err(CoreError::user_not_found(friend.as_str()));
        }
        if self.graph.exists(user, friend).await? {
            return Err(CoreError::already_exists("friendship", friend.as_str()));
        }

        self.graph.add(user, friend).await
    }

    /// Remove a friendship after confirming the friend exists and the pair
    /// is actually joined.
    pub async fn unfriend(&self, user: &UserId, friend: &UserId) -> Result<()> {
        if self.directory.find_by_id(friend).await?.is_none() {
            return Err(CoreError::user_not_found(friend.as_str()));
        }
        if !self.graph.exists(user, friend).await? {
            return Err(CoreError::friendship_not_found(
                user.as_str(),
                friend.as_str(),
            ));
        }

        self.graph.remove(user, friend).await?;
        Ok(())
    }

    /// A user's friends, optionally paginated. A window with a zero page
    /// or zero limit degrades to the unpaginated listing.
    pub async fn friends_of(&self, user: &UserId, page: Option<PageRequest>) -> Result<FriendPage> {
        let page = page.filter(|p| p.page > 0 && p.limit > 0);
        self.graph.list_friends(user, page).await
    }
}
