//! Domain models for user accounts and friend listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{Hemisphere, UserId};

/// A stored user account.
///
/// The credential is an opaque hashed blob: it is written at registration,
/// compared by the authentication collaborator one layer up, and excluded
/// from every public projection below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier; its first character names the partition
    pub id: UserId,

    /// Unique across both user partitions (advisory, via pre-check)
    pub username: String,

    /// Unique across both user partitions (advisory, via pre-check)
    pub email: String,

    /// Opaque hashed credential; never logged, decoded, or returned
    pub password_hash: String,

    pub latitude: f64,
    pub longitude: f64,

    /// BCP 47-style language tag chosen at registration
    pub language: String,

    /// Partition tag assigned at registration; authoritative thereafter
    pub hemisphere: Hemisphere,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build the full record from registration input, stamping timestamps.
    pub fn assemble(id: UserId, hemisphere: Hemisphere, new_user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            latitude: new_user.latitude,
            longitude: new_user.longitude,
            language: new_user.language,
            hemisphere,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration input. The credential arrives pre-hashed; this layer never
/// sees a plaintext password.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
}

/// Sparse profile update. `None` fields are left untouched; an update with
/// every field `None` is a successful no-op.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub language: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.language.is_none()
    }
}

/// Public projection used by account listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            latitude: user.latitude,
            longitude: user.longitude,
            language: user.language,
        }
    }
}

/// Public projection returned by friend listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<User> for FriendProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            latitude: user.latitude,
            longitude: user.longitude,
        }
    }
}

/// 1-based page window for friend listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

/// One page of hydrated friends.
///
/// `total` always counts the full unpaginated candidate set; `total_pages`
/// and `current_page` are present only when the request was paginated.
#[derive(Debug, Clone, Serialize)]
pub struct FriendPage {
    pub friends: Vec<FriendProfile>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
}

impl FriendPage {
    /// The empty listing, shared by the zero-neighbor short-circuit.
    pub fn empty(page: Option<PageRequest>) -> Self {
        Self {
            friends: Vec::new(),
            total: 0,
            total_pages: page.map(|_| 0),
            current_page: page.map(|p| p.page),
        }
    }
}
