use chat_provider::{ChatProvider, Conversation, ExchangeError, Message};
use tracing::debug;

/// The conversation being built by the current process.
///
/// Turns are only ever appended. A failed exchange leaves the conversation as
/// it was, so everything typed so far can still be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    conversation: Conversation,
}

impl Session {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(title),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.conversation.title()
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[must_use]
    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    /// Appends a `user` turn stamped now. Any text, including empty, is accepted.
    pub fn append_user_turn(&mut self, text: impl Into<String>) -> &Message {
        self.push(Message::user_now(text))
    }

    pub fn append_reply_turn(&mut self, reply: Message) -> &Message {
        self.push(reply)
    }

    /// Asks `provider` for one reply to the whole conversation and appends it.
    pub fn exchange(&mut self, provider: &dyn ChatProvider) -> Result<&Message, ExchangeError> {
        let reply = provider.reply(&self.conversation)?;
        debug!(
            provider = %provider.profile().provider_id,
            turns = self.conversation.len() + 1,
            "reply received"
        );
        Ok(self.append_reply_turn(reply))
    }

    fn push(&mut self, message: Message) -> &Message {
        self.conversation.push(message);
        &self.conversation.messages()[self.conversation.len() - 1]
    }
}
