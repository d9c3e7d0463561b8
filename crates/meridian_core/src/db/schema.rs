//! Table definitions for the partition stores

use super::PartitionRole;

/// Users table, present in both hemisphere partitions.
pub const USERS_TABLE: &str = "users";

/// Friendship edge table, present only in the friends partition.
pub const FRIENDS_TABLE: &str = "friends";

/// Migration bookkeeping table, present in every partition.
pub const META_TABLE: &str = "schema_meta";

/// SQL schema definitions for the partition stores
pub struct Schema;

impl Schema {
    /// Table definitions for one partition, chosen by its role. The two
    /// user partitions share an identical schema; the friends partition
    /// holds only edges.
    pub fn tables_for(role: PartitionRole) -> Vec<TableDefinition> {
        match role {
            PartitionRole::UsersNorth | PartitionRole::UsersSouth => {
                vec![Self::schema_meta(), Self::users()]
            }
            PartitionRole::Friends => vec![Self::schema_meta(), Self::friends()],
        }
    }

    /// Migration bookkeeping table
    pub fn schema_meta() -> TableDefinition {
        TableDefinition {
            name: META_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE schema_meta SCHEMAFULL;
                DEFINE FIELD schema_version ON schema_meta TYPE int;
                DEFINE FIELD created_at ON schema_meta TYPE datetime;
                DEFINE FIELD updated_at ON schema_meta TYPE datetime;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Users table
    ///
    /// The unique indexes hold within a single partition only; uniqueness
    /// across partitions is an application-level pre-check.
    pub fn users() -> TableDefinition {
        TableDefinition {
            name: USERS_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE users SCHEMAFULL;
                DEFINE FIELD username ON users TYPE string;
                DEFINE FIELD email ON users TYPE string;
                DEFINE FIELD password_hash ON users TYPE string;
                DEFINE FIELD latitude ON users TYPE float;
                DEFINE FIELD longitude ON users TYPE float;
                DEFINE FIELD language ON users TYPE string;
                DEFINE FIELD hemisphere ON users TYPE string;
                DEFINE FIELD created_at ON users TYPE datetime;
                DEFINE FIELD updated_at ON users TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX users_username ON users FIELDS username UNIQUE".to_string(),
                "DEFINE INDEX users_email ON users FIELDS email UNIQUE".to_string(),
            ],
        }
    }

    /// Friendship edges
    ///
    /// One row per unordered pair, in whichever column order the insert
    /// arrived. The columns are foreign-key-shaped but reference records in
    /// other stores, so no engine-level constraint is possible, and the
    /// pair index is deliberately non-unique (duplicate suppression is a
    /// caller pre-check).
    pub fn friends() -> TableDefinition {
        TableDefinition {
            name: FRIENDS_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE friends SCHEMAFULL;
                DEFINE FIELD user_id ON friends TYPE string;
                DEFINE FIELD friend_id ON friends TYPE string;
                DEFINE FIELD created_at ON friends TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX friends_user ON friends FIELDS user_id".to_string(),
                "DEFINE INDEX friends_friend ON friends FIELDS friend_id".to_string(),
            ],
        }
    }
}

pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}
