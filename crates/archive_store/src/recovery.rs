//! Last-resort persistence for a conversation the archive could not take.
//!
//! Recovery writes into a freshly created, uniquely named file in two stages:
//! the merged archive bytes when the caller already has them, otherwise (or
//! when that write fails) just the new conversation.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use chat_provider::Conversation;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::codec::{encode_conversation, EncodeError};

pub const FAILOVER_FILE_PREFIX: &str = "shllm-failover-";

const MAX_NAME_ATTEMPTS: usize = 8;

/// Which payload ended up in the recovery file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    /// The whole merged archive, including the new conversation.
    FullArchive,
    /// Only the new conversation.
    ConversationOnly,
}

impl fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullArchive => f.write_str("full archive"),
            Self::ConversationOnly => f.write_str("conversation only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub path: PathBuf,
    pub stage: RecoveryStage,
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("could not create a recovery file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not encode the conversation for recovery: {0}")]
    Encode(#[source] EncodeError),

    #[error("could not write recovery file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writable recovery target that can be emptied between stages.
pub trait FailoverFile: Write {
    /// Discards anything written so far.
    fn reset(&mut self) -> io::Result<()>;

    /// Makes written bytes durable.
    fn commit(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl FailoverFile for File {
    fn reset(&mut self) -> io::Result<()> {
        self.set_len(0)?;
        self.rewind()
    }

    fn commit(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Creates recovery targets that never collide with existing files.
pub trait FailoverOpener {
    type File: FailoverFile;

    /// Directory the recovery files land in.
    fn location(&self) -> &Path;

    fn open_unique(&self) -> io::Result<(PathBuf, Self::File)>;
}

/// Opens `shllm-failover-<uuid>.json` in a directory with create-new semantics.
#[derive(Debug, Clone)]
pub struct UniqueFileOpener {
    dir: PathBuf,
}

impl UniqueFileOpener {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FailoverOpener for UniqueFileOpener {
    type File = File;

    fn location(&self) -> &Path {
        &self.dir
    }

    fn open_unique(&self) -> io::Result<(PathBuf, File)> {
        let mut last_error = None;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self
                .dir
                .join(format!("{FAILOVER_FILE_PREFIX}{}.json", Uuid::new_v4()));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| io::Error::other("no unique recovery file name found")))
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryPath<O = UniqueFileOpener> {
    opener: O,
}

impl RecoveryPath {
    /// Recovery into uniquely named files under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_opener(UniqueFileOpener::new(dir))
    }
}

impl<O: FailoverOpener> RecoveryPath<O> {
    #[must_use]
    pub fn with_opener(opener: O) -> Self {
        Self { opener }
    }

    #[must_use]
    pub fn location(&self) -> &Path {
        self.opener.location()
    }

    /// Persists `conversation` somewhere recoverable and reports where.
    ///
    /// `full_archive` is tried first when present and non-empty; the
    /// conversation alone is written when that is absent or fails.
    pub fn recover(
        &self,
        full_archive: Option<&[u8]>,
        conversation: &Conversation,
    ) -> Result<Recovered, RecoveryError> {
        let (path, mut file) =
            self.opener
                .open_unique()
                .map_err(|source| RecoveryError::Create {
                    dir: self.location().to_path_buf(),
                    source,
                })?;

        if let Some(bytes) = full_archive.filter(|bytes| !bytes.is_empty()) {
            match write_stage(&mut file, bytes) {
                Ok(()) => {
                    return Ok(Recovered {
                        path,
                        stage: RecoveryStage::FullArchive,
                    })
                }
                Err(error) => warn!(
                    recovery_file = %path.display(),
                    %error,
                    "full archive recovery write failed; falling back to conversation only"
                ),
            }
        }

        let fallback = encode_conversation(conversation).map_err(RecoveryError::Encode)?;
        file.reset()
            .and_then(|()| write_stage(&mut file, &fallback))
            .map_err(|source| RecoveryError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(Recovered {
            path,
            stage: RecoveryStage::ConversationOnly,
        })
    }
}

fn write_stage<F: FailoverFile>(file: &mut F, bytes: &[u8]) -> io::Result<()> {
    // write_all reports a zero-byte write as ErrorKind::WriteZero.
    file.write_all(bytes)?;
    file.commit()
}
