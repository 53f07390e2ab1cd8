//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport logic and is intended for offline runs and
//! contract-level integration testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chat_provider::{
    ChatProvider, Conversation, ExchangeError, Message, ProviderProfile, ASSISTANT_ROLE,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const ECHO_PREFIX: &str = "mock: ";

/// One scripted exchange result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Reply(String),
    Fail(ExchangeError),
}

/// Provider that plays back scripted outcomes, then echoes the last turn.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockOutcome>>,
    observed_turn_counts: Mutex<Vec<usize>>,
}

impl MockProvider {
    /// Scripted replies returned in order before falling back to echoing.
    #[must_use]
    pub fn new(replies: Vec<String>) -> Self {
        Self::scripted(replies.into_iter().map(MockOutcome::Reply).collect())
    }

    #[must_use]
    pub fn scripted(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            observed_turn_counts: Mutex::new(Vec::new()),
        }
    }

    /// Number of turns in each conversation handed to `reply`, in call order.
    #[must_use]
    pub fn observed_turn_counts(&self) -> Vec<usize> {
        lock_unpoisoned(&self.observed_turn_counts).clone()
    }
}

impl ChatProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn reply(&self, conversation: &Conversation) -> Result<Message, ExchangeError> {
        lock_unpoisoned(&self.observed_turn_counts).push(conversation.len());

        match lock_unpoisoned(&self.script).pop_front() {
            Some(MockOutcome::Reply(text)) => Ok(Message::now(ASSISTANT_ROLE, text)),
            Some(MockOutcome::Fail(error)) => Err(error),
            None => {
                let last = conversation.last_message().map_or("", Message::content);
                Ok(Message::now(ASSISTANT_ROLE, format!("{ECHO_PREFIX}{last}")))
            }
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
