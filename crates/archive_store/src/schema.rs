use std::fmt;

use chat_provider::{null_as_empty, Conversation};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric schema tag stored at the top of every archive.
///
/// Whole values serialize as JSON integers (`1`), anything else as a float, so
/// the tag reads back exactly as it was written.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SchemaVersion(f64);

impl SchemaVersion {
    pub const V1: Self = Self(1.0);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn major(self) -> f64 {
        self.0.trunc()
    }

    fn is_whole(self) -> bool {
        self.0.fract() == 0.0 && self.0 >= 0.0 && self.0 <= u64::MAX as f64
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.is_whole() {
            serializer.serialize_u64(self.0 as u64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(Self)
    }
}

/// Versioned container of every conversation saved to one archive file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    version: SchemaVersion,
    #[serde(default, deserialize_with = "null_as_empty")]
    conversations: Vec<Conversation>,
}

impl Default for Archive {
    fn default() -> Self {
        Self {
            version: SchemaVersion::V1,
            conversations: Vec::new(),
        }
    }
}

impl Archive {
    #[must_use]
    pub fn new(version: SchemaVersion, conversations: Vec<Conversation>) -> Self {
        Self {
            version,
            conversations,
        }
    }

    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Appends `conversation` after every conversation already in the archive.
    pub fn push(&mut self, conversation: Conversation) {
        self.conversations.push(conversation);
    }
}
