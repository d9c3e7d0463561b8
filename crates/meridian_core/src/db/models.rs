//! Database row wrappers
//!
//! These types mirror the domain types but use `RecordId` keys and store
//! datetimes, keeping the domain models free of engine types.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::schema::USERS_TABLE;
use crate::id::{Hemisphere, IdError, UserId};
use crate::users::User;

/// Stored representation of a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbUser {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
    pub hemisphere: Hemisphere,
    pub created_at: surrealdb::Datetime,
    pub updated_at: surrealdb::Datetime,
}

/// Stored representation of a friendship edge. One row per unordered pair;
/// the record key is store-assigned and never exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbFriendEdge {
    pub user_id: String,
    pub friend_id: String,
    pub created_at: surrealdb::Datetime,
}

/// Sparse user patch; only present fields are merged into the stored row.
#[derive(Debug, Clone, Serialize)]
pub struct DbUserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub updated_at: surrealdb::Datetime,
}

impl From<User> for DbUser {
    fn from(user: User) -> Self {
        Self {
            id: RecordId::from_table_key(USERS_TABLE, user.id.to_record_key()),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            latitude: user.latitude,
            longitude: user.longitude,
            language: user.language,
            hemisphere: user.hemisphere,
            created_at: user.created_at.into(),
            updated_at: user.updated_at.into(),
        }
    }
}

impl TryFrom<DbUser> for User {
    type Error = IdError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let id = UserId::parse(strip_brackets(&row.id.key().to_string()))?;

        Ok(Self {
            id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            latitude: row.latitude,
            longitude: row.longitude,
            language: row.language,
            hemisphere: row.hemisphere,
            created_at: row.created_at.into_inner().into(),
            updated_at: row.updated_at.into_inner().into(),
        })
    }
}

/// Record keys round-trip through SurrealDB's display form, which wraps
/// non-identifier keys in angle brackets.
pub fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('⟨')
        .and_then(|s| s.strip_suffix('⟩'))
        .unwrap_or(s)
}
