//! Hemisphere tags and self-routing record identifiers
//!
//! Every user identifier carries its partition in its first character: `n`
//! for the northern store, `s` for the southern one. The remainder is a
//! random 32-character hex token. Routing a read or write to the right
//! partition is therefore a pure string-prefix decode with no lookup table.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;
use uuid::Uuid;

/// Length of the random token that follows the hemisphere tag.
pub const TOKEN_LEN: usize = 32;

/// Errors that can occur when working with identifiers
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum IdError {
    #[error("Identifier is empty")]
    #[diagnostic(help("Identifiers are a hemisphere tag followed by a 32-character hex token"))]
    Empty,

    #[error("Unknown hemisphere tag '{found}'")]
    #[diagnostic(help("The first character of an identifier must be 'n' or 's'"))]
    UnknownTag { found: char },

    #[error("Invalid identifier token in '{input}'")]
    #[diagnostic(help(
        "The tag must be followed by exactly 32 lowercase hexadecimal characters"
    ))]
    InvalidToken { input: String },
}

/// The partition a user record lives in, named by geographic hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// One-letter tag used as the identifier prefix and the store key.
    pub fn tag(&self) -> char {
        match self {
            Hemisphere::North => 'n',
            Hemisphere::South => 's',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Hemisphere::North => "n",
            Hemisphere::South => "s",
        }
    }

    /// Decode a tag character back into a hemisphere.
    pub fn from_tag(tag: char) -> Result<Self, IdError> {
        match tag {
            'n' => Ok(Hemisphere::North),
            's' => Ok(Hemisphere::South),
            found => Err(IdError::UnknownTag { found }),
        }
    }
}

impl Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(tag), None) => Hemisphere::from_tag(tag),
            (None, _) => Err(IdError::Empty),
            (Some(_), Some(_)) => Err(IdError::InvalidToken {
                input: s.to_string(),
            }),
        }
    }
}

impl Serialize for Hemisphere {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Hemisphere {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A user identifier: hemisphere tag plus random hex token.
///
/// The tag is authoritative once minted. Moving a user between hemispheres
/// would mean a new identifier; the tag is never recomputed from the
/// coordinates stored alongside it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Mint a fresh identifier for the given hemisphere.
    pub fn generate(hemisphere: Hemisphere) -> Self {
        let mut buf = Uuid::encode_buffer();
        let token = Uuid::new_v4().simple().encode_lower(&mut buf);
        UserId(format!("{}{}", hemisphere.tag(), token))
    }

    /// Parse and validate an identifier from its wire form.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let mut chars = s.chars();
        let tag = chars.next().ok_or(IdError::Empty)?;
        Hemisphere::from_tag(tag)?;

        let token = &s[1..];
        let valid = token.len() == TOKEN_LEN
            && token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        if !valid {
            return Err(IdError::InvalidToken {
                input: s.to_string(),
            });
        }

        Ok(UserId(s.to_string()))
    }

    /// The partition this identifier routes to, decoded from its tag.
    pub fn hemisphere(&self) -> Hemisphere {
        // The constructor validated the tag, so the decode cannot fail.
        Hemisphere::from_tag(self.0.chars().next().unwrap_or('n'))
            .unwrap_or(Hemisphere::North)
    }

    /// The random token portion, without the tag.
    pub fn token(&self) -> &str {
        &self.0[1..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Record key used inside the partition store.
    pub fn to_record_key(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

struct UserIdVisitor;

impl Visitor<'_> for UserIdVisitor {
    type Value = UserId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "a hemisphere tag ('n' or 's') followed by a 32-character hex token"
        )
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        UserId::parse(s).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(UserIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_routes_back_to_its_hemisphere() {
        let north = UserId::generate(Hemisphere::North);
        let south = UserId::generate(Hemisphere::South);

        assert_eq!(north.hemisphere(), Hemisphere::North);
        assert_eq!(south.hemisphere(), Hemisphere::South);

        assert!(north.as_str().starts_with('n'));
        assert!(south.as_str().starts_with('s'));
        assert_eq!(north.token().len(), TOKEN_LEN);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = UserId::generate(Hemisphere::North);
        let b = UserId::generate(Hemisphere::North);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_round_trip() {
        let id = UserId::generate(Hemisphere::South);
        let parsed = UserId::parse(id.as_str()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(UserId::parse(""), Err(IdError::Empty)));
        assert!(matches!(
            UserId::parse("x0123456789abcdef0123456789abcdef"),
            Err(IdError::UnknownTag { found: 'x' })
        ));
        // Too short
        assert!(UserId::parse("nabc").is_err());
        // Uppercase hex is not the wire format
        assert!(UserId::parse("nABCDEF0123456789ABCDEF0123456789").is_err());
        // Non-hex token
        assert!(UserId::parse("nzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        // Trailing garbage
        let mut long = UserId::generate(Hemisphere::North).as_str().to_string();
        long.push('0');
        assert!(UserId::parse(&long).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = UserId::generate(Hemisphere::North);
        let json = serde_json::to_string(&id).unwrap();
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);

        assert!(serde_json::from_str::<UserId>("\"not-an-id\"").is_err());
    }

    #[test]
    fn test_hemisphere_serde_uses_tag_strings() {
        assert_eq!(serde_json::to_string(&Hemisphere::North).unwrap(), "\"n\"");
        assert_eq!(serde_json::to_string(&Hemisphere::South).unwrap(), "\"s\"");
        let parsed: Hemisphere = serde_json::from_str("\"s\"").unwrap();
        assert_eq!(parsed, Hemisphere::South);
    }
}
