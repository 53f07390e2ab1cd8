use chat_provider::Conversation;
use thiserror::Error;

use crate::schema::{Archive, SchemaVersion};

/// Schema version written by this build.
pub const CURRENT_VERSION: SchemaVersion = SchemaVersion::V1;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("archive is not well-formed JSON matching the conversation-list schema: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("archive schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        found: SchemaVersion,
        supported: SchemaVersion,
    },
}

#[derive(Debug, Error)]
#[error("failed to encode archive content: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Parses archive bytes. Empty (or whitespace-only) input is a fresh v1 archive.
pub fn decode(bytes: &[u8]) -> Result<Archive, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Archive::default());
    }

    let archive: Archive = serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;
    if archive.version().major() > CURRENT_VERSION.major() {
        return Err(DecodeError::UnsupportedVersion {
            found: archive.version(),
            supported: CURRENT_VERSION,
        });
    }

    Ok(archive)
}

/// Serializes the whole archive, version tag unchanged.
pub fn encode(archive: &Archive) -> Result<Vec<u8>, EncodeError> {
    to_document(archive)
}

/// Serializes a single conversation; the payload of last-resort recovery files.
pub fn encode_conversation(conversation: &Conversation) -> Result<Vec<u8>, EncodeError> {
    to_document(conversation)
}

fn to_document<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}
