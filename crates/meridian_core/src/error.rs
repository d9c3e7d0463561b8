use crate::db::StoreError;
use crate::id::IdError;
use miette::Diagnostic;
use thiserror::Error;

/// Failures surfaced by the partitioned core.
///
/// Everything an underlying store can get wrong is normalized into
/// [`CoreError::Storage`] before it crosses this boundary; the orchestration
/// layer above maps these kinds to responses and never sees engine detail
/// beyond the `#[source]` chain.
#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Coordinates ({latitude}, {longitude}) are out of range")]
    #[diagnostic(
        code(meridian_core::invalid_coordinate),
        help("Latitude must be within [-90, 90] and longitude within [-180, 180]")
    )]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Malformed user identifier")]
    #[diagnostic(
        code(meridian_core::malformed_identifier),
        help("Identifiers are a hemisphere tag ('n' or 's') followed by 32 hex characters")
    )]
    MalformedIdentifier {
        #[source]
        cause: IdError,
    },

    #[error("User not found: {id}")]
    #[diagnostic(code(meridian_core::user_not_found))]
    UserNotFound { id: String },

    #[error("No friendship between {user} and {friend}")]
    #[diagnostic(code(meridian_core::friendship_not_found))]
    FriendshipNotFound { user: String, friend: String },

    #[error("{what} '{key}' already exists")]
    #[diagnostic(
        code(meridian_core::already_exists),
        help("Existence is pre-checked across both user partitions before inserting")
    )]
    AlreadyExists { what: &'static str, key: String },

    #[error("Storage error")]
    #[diagnostic(
        code(meridian_core::storage_error),
        help("Check that the partition stores are reachable and migrated")
    )]
    Storage(#[from] StoreError),

    #[error("Configuration error")]
    #[diagnostic(
        code(meridian_core::configuration_error),
        help("Check the configuration file at {path}")
    )]
    Configuration {
        path: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<IdError> for CoreError {
    fn from(cause: IdError) -> Self {
        CoreError::MalformedIdentifier { cause }
    }
}

// Helper constructors for the common kinds
impl CoreError {
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    pub fn friendship_not_found(user: impl Into<String>, friend: impl Into<String>) -> Self {
        Self::FriendshipNotFound {
            user: user.into(),
            friend: friend.into(),
        }
    }

    pub fn already_exists(what: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            what,
            key: key.into(),
        }
    }
}
