//! Transport-only chat-completions client primitives.
//!
//! This crate owns request building and response parsing for one
//! chat-completions endpoint. It holds no conversation state and no REPL
//! coupling; one call is one blocking-from-the-caller request/response pair.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::CompletionsApiClient;
pub use config::CompletionsApiConfig;
pub use error::CompletionsApiError;
pub use payload::{Choice, ChoiceMessage, CompletionRequest, CompletionResponse, WireMessage};
pub use url::normalize_completions_url;
