//! Line-oriented chat REPL with a durable daily conversation archive.
//!
//! ## Provider bootstrap
//!
//! `SHLLM_PROVIDER` selects the model exchange adapter:
//!
//! - `completions` (default) posts the whole conversation to a
//!   chat-completions endpoint. `SHLLM_API_URL` may be a base URL
//!   (`https://api.openai.com/v1`) or the full `/chat/completions` endpoint;
//!   `SHLLM_API_KEY`, `SHLLM_MODEL`, and `SHLLM_TIMEOUT_SEC` are optional.
//! - `mock` echoes the last user turn, for offline runs.
//!
//! ## Archive contract
//!
//! Each process appends exactly one conversation to
//! `$notes/shllm/<YYYY-MM-DD>.json` (or the `--filepath` override). Whatever
//! ends the session (end of input, an exchange failure, SIGINT/SIGTERM, or a
//! panic), the conversation is saved once. When the archive cannot be read,
//! decoded, or replaced, the conversation goes to
//! `./shllm-failover-<uuid>.json` and the path is reported.

pub mod config;
pub mod logging;
pub mod persist;
pub mod providers;
pub mod repl;
pub mod session;
pub mod title;
