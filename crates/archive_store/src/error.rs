use std::path::PathBuf;

use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::recovery::{RecoveryError, RecoveryStage};

/// Why the primary archive could not be updated.
#[derive(Debug, Error)]
pub enum ArchiveFault {
    #[error("I/O error while reading archive {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode archive {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("I/O error while writing archive {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ArchiveStoreError {
    /// The archive was not updated, but the conversation is safe in `recovery_file`.
    #[error(
        "archive {archive} is unavailable ({fault}); your conversation was saved to {recovery_file}"
    )]
    Unavailable {
        archive: PathBuf,
        recovery_file: PathBuf,
        stage: RecoveryStage,
        #[source]
        fault: ArchiveFault,
    },

    /// Neither the archive nor any recovery file could hold the conversation.
    #[error("conversation lost: archive {archive} failed ({fault}) and recovery failed ({recovery})")]
    FatalDataLoss {
        archive: PathBuf,
        fault: ArchiveFault,
        #[source]
        recovery: RecoveryError,
    },
}

impl ArchiveStoreError {
    /// Location of the recovery file, when one was written.
    #[must_use]
    pub fn recovery_file(&self) -> Option<&std::path::Path> {
        match self {
            Self::Unavailable { recovery_file, .. } => Some(recovery_file),
            Self::FatalDataLoss { .. } => None,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalDataLoss { .. })
    }
}

#[derive(Debug, Error)]
pub enum ArchivePathError {
    #[error("failed to create archive directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
