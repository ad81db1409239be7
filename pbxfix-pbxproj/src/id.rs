//! Object identifiers and identifier generators.
//!
//! Every object in a project file is keyed by a 24 character hexadecimal
//! identifier. The width is a format contract of the grammar: readers rely on
//! it, so [`ObjectId::parse`] checks both the length and the character class
//! instead of trusting whatever bytes follow a marker.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation failures for [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier {value:?} has {len} characters, expected {}", ObjectId::LEN)]
    WrongLength { value: String, len: usize },

    #[error("identifier {value:?} contains non-hex character {ch:?}")]
    NotHex { value: String, ch: char },
}

/// A validated 24 character hexadecimal object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Width of every identifier in the grammar.
    pub const LEN: usize = 24;

    pub fn parse(value: &str) -> Result<Self, IdError> {
        let len = value.chars().count();
        if len != Self::LEN {
            return Err(IdError::WrongLength {
                value: value.to_string(),
                len,
            });
        }
        if let Some(ch) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(IdError::NotHex {
                value: value.to_string(),
                ch,
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Returns true when `value` satisfies the identifier contract.
    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of fresh identifiers for new objects.
///
/// `kind` is the object's `isa` and `name` a human label; generators may
/// ignore both.
pub trait IdGenerator: Send {
    fn next_id(&mut self, kind: &str, name: &str) -> ObjectId;
}

/// Deterministic identifiers: sha256 over a seed, the kind, the name and a
/// running counter, truncated to 12 bytes.
#[derive(Debug, Clone)]
pub struct HashedIds {
    seed: String,
    counter: u64,
}

impl HashedIds {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: 0,
        }
    }
}

impl IdGenerator for HashedIds {
    fn next_id(&mut self, kind: &str, name: &str) -> ObjectId {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update([0]);
        hasher.update(kind.as_bytes());
        hasher.update([0]);
        hasher.update(name.as_bytes());
        hasher.update([0]);
        hasher.update(self.counter.to_le_bytes());
        self.counter += 1;

        let digest = hasher.finalize();
        ObjectId(hex::encode_upper(&digest[..ObjectId::LEN / 2]))
    }
}

/// Random identifiers built from v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self, _kind: &str, _name: &str) -> ObjectId {
        let uuid = uuid::Uuid::new_v4();
        ObjectId(hex::encode_upper(&uuid.as_bytes()[..ObjectId::LEN / 2]))
    }
}
