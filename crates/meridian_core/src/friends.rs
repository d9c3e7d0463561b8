//! Symmetric friendship graph
//!
//! Edges are stored once per unordered pair, in whichever column order the
//! insert arrived, so every query here matches both orders. Listing fans
//! out twice: once into the edge store for neighbor identifiers, then once
//! per neighbor into the user partition its identifier names.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::db::models::DbFriendEdge;
use crate::db::schema::FRIENDS_TABLE;
use crate::db::{Filter, Partition};
use crate::directory::UserDirectory;
use crate::error::{CoreError, Result};
use crate::id::UserId;
use crate::users::{FriendPage, FriendProfile, PageRequest};

#[derive(Debug, Clone)]
pub struct FriendshipGraph {
    edges: Arc<Partition>,
    directory: UserDirectory,
}

impl FriendshipGraph {
    pub fn new(edges: Arc<Partition>, directory: UserDirectory) -> Self {
        Self { edges, directory }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    fn pair_filter(a: &UserId, b: &UserId) -> Filter {
        Filter::new("(user_id = $a AND friend_id = $b) OR (user_id = $b AND friend_id = $a)")
            .bind("a", a.as_str())
            .bind("b", b.as_str())
    }

    /// Whether an edge joins the two users, in either column order.
    pub async fn exists(&self, a: &UserId, b: &UserId) -> Result<bool> {
        let row: Option<DbFriendEdge> = self
            .edges
            .get(FRIENDS_TABLE, Self::pair_filter(a, b))
            .await?;
        Ok(row.is_some())
    }

    /// Raw edge insert. Neighbor existence and duplicate suppression are
    /// the caller's pre-checks; a racing duplicate is not rejected here.
    pub async fn add(&self, a: &UserId, b: &UserId) -> Result<()> {
        let row = DbFriendEdge {
            user_id: a.to_string(),
            friend_id: b.to_string(),
            created_at: chrono::Utc::now().into(),
        };

        tracing::debug!(user = %a, friend = %b, "Inserting friendship edge");
        self.edges
            .create_auto::<DbFriendEdge>(FRIENDS_TABLE, row)
            .await?;
        Ok(())
    }

    /// Delete the edge between two users, whichever column order it was
    /// stored in. Zero rows matched is still success.
    pub async fn remove(&self, a: &UserId, b: &UserId) -> Result<usize> {
        let removed = self
            .edges
            .delete_where(FRIENDS_TABLE, Self::pair_filter(a, b))
            .await?;
        Ok(removed)
    }

    /// Delete every edge mentioning the user, in either position. Used as
    /// the cascade step of account deletion; calling it again is a no-op.
    pub async fn remove_all(&self, user: &UserId) -> Result<usize> {
        let filter = Filter::new("user_id = $id OR friend_id = $id").bind("id", user.as_str());
        let removed = self.edges.delete_where(FRIENDS_TABLE, filter).await?;
        tracing::debug!(user = %user, removed, "Cascaded friendship edges");
        Ok(removed)
    }

    /// One (optionally paginated) page of the user's friends, hydrated
    /// with their public profile fields.
    ///
    /// The page window and the reported total both derive from the same
    /// candidate set, so `total_pages` always matches what paging through
    /// every page would deliver.
    pub async fn list_friends(
        &self,
        user: &UserId,
        page: Option<PageRequest>,
    ) -> Result<FriendPage> {
        let candidates = self.neighbor_ids(user).await?;
        let total = candidates.len();

        if total == 0 {
            return Ok(FriendPage::empty(page));
        }

        let window: Vec<String> = match page {
            Some(p) => {
                let offset = (p.page as usize).saturating_sub(1) * p.limit as usize;
                candidates
                    .into_iter()
                    .skip(offset)
                    .take(p.limit as usize)
                    .collect()
            }
            None => candidates,
        };

        // Hydrate every neighbor concurrently; the join preserves the
        // candidate order regardless of completion order.
        let friends = try_join_all(window.into_iter().map(|raw| {
            let directory = self.directory.clone();
            async move {
                let id = UserId::parse(&raw)?;
                let user = directory
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| CoreError::user_not_found(raw))?;
                Ok::<_, CoreError>(FriendProfile::from(user))
            }
        }))
        .await?;

        Ok(FriendPage {
            friends,
            total,
            total_pages: page.map(|p| total.div_ceil(p.limit as usize)),
            current_page: page.map(|p| p.page),
        })
    }

    /// The ordered, de-duplicated neighbor identifiers: the union of rows
    /// where the user is the first party and rows where it is the second,
    /// each mapped to the opposite column. The distinct pass guards
    /// against an accidental duplicate edge.
    async fn neighbor_ids(&self, user: &UserId) -> Result<Vec<String>> {
        let filter = Filter::new("user_id = $id OR friend_id = $id").bind("id", user.as_str());
        let edges: Vec<DbFriendEdge> = self
            .edges
            .scan(FRIENDS_TABLE, Some(filter), None)
            .await?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for edge in edges {
            let neighbor = if edge.user_id == user.as_str() {
                edge.friend_id
            } else {
                edge.user_id
            };
            if seen.insert(neighbor.clone()) {
                ids.push(neighbor);
            }
        }

        Ok(ids)
    }
}
