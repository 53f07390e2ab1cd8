//! Provider-neutral conversation model and the reply contract for one exchange.
//!
//! This crate defines the turn log shared by the REPL, the archive, and every
//! provider, plus the single-call contract a provider must uphold. It excludes
//! transport details and wire payloads.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

pub mod timestamp;

/// Role tag for turns typed by the human operator.
pub const USER_ROLE: &str = "user";
/// Role tag for turns produced by the model.
pub const ASSISTANT_ROLE: &str = "assistant";

/// One conversational turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: String,
    content: String,
    #[serde(with = "timestamp")]
    timestamp: OffsetDateTime,
}

impl Message {
    #[must_use]
    pub fn new(
        role: impl Into<String>,
        content: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Creates a user turn stamped with the current time.
    #[must_use]
    pub fn user_now(content: impl Into<String>) -> Self {
        Self::new(USER_ROLE, content, OffsetDateTime::now_utc())
    }

    /// Creates a turn with `role` stamped with the current time.
    #[must_use]
    pub fn now(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(role, content, OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// Ordered, append-only turn log plus a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_messages(title: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            title: title.into(),
            messages,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends one turn to the end of the log.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// Reads a JSON `null` list as empty. Older archives wrote `null` for
/// conversations that ended before their first turn.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Failure of one model exchange.
///
/// Every variant ends the interactive session; none is retried by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// Network or HTTP-level failure reaching the model endpoint.
    Transport(String),
    /// The endpoint answered with a payload that does not match the expected shape.
    MalformedResponse(String),
    /// The endpoint answered with zero reply candidates.
    NoCandidates,
    /// The endpoint answered with more than one reply candidate.
    AmbiguousCandidates { count: usize },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "model request failed: {message}"),
            Self::MalformedResponse(message) => write!(f, "malformed model response: {message}"),
            Self::NoCandidates => write!(f, "model response contained no reply candidates"),
            Self::AmbiguousCandidates { count } => write!(
                f,
                "model response contained {count} reply candidates; expected at most one"
            ),
        }
    }
}

impl std::error::Error for ExchangeError {}

/// Error returned while constructing/configuring a provider before any exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Immutable metadata describing a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for one blocking request/response exchange.
pub trait ChatProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Produces exactly one reply turn for `conversation`, stamped with a fresh timestamp.
    ///
    /// Implementations must fail rather than fabricate or drop a turn.
    fn reply(&self, conversation: &Conversation) -> Result<Message, ExchangeError>;
}
