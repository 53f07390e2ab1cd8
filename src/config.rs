//! Environment configuration.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use archive_store::expand_home;

pub const NOTES_ENV_VAR: &str = "notes";
pub const PROVIDER_ENV_VAR: &str = "SHLLM_PROVIDER";
pub const API_URL_ENV_VAR: &str = "SHLLM_API_URL";
pub const API_KEY_ENV_VAR: &str = "SHLLM_API_KEY";
pub const MODEL_ENV_VAR: &str = "SHLLM_MODEL";
pub const TIMEOUT_ENV_VAR: &str = "SHLLM_TIMEOUT_SEC";
pub const LOG_ENV_VAR: &str = "SHLLM_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeout { value } => write!(
                f,
                "{TIMEOUT_ENV_VAR} must be a positive whole number of seconds, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process settings read once at startup. Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub notes_root: Option<String>,
    pub provider_id: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model_id: Option<String>,
    pub timeout: Option<Duration>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            notes_root: env_string_opt(NOTES_ENV_VAR),
            provider_id: env_string_opt(PROVIDER_ENV_VAR).map(|value| value.trim().to_string()),
            api_url: env_string_opt(API_URL_ENV_VAR),
            api_key: env_string_opt(API_KEY_ENV_VAR),
            model_id: env_string_opt(MODEL_ENV_VAR),
            timeout: env_string_opt(TIMEOUT_ENV_VAR)
                .map(|value| parse_timeout(&value))
                .transpose()?,
            log_filter: env_string_opt(LOG_ENV_VAR),
        })
    }

    /// Directory that holds the `shllm/` archive folder.
    ///
    /// A leading `~` expands to `home`; when `notes` is unset the current
    /// directory is used.
    #[must_use]
    pub fn notes_root(&self, current_dir: &Path, home: Option<&Path>) -> PathBuf {
        match &self.notes_root {
            Some(notes) => expand_home(notes, home),
            None => current_dir.to_path_buf(),
        }
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidTimeout {
            value: value.to_string(),
        }),
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
