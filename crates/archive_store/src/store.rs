use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chat_provider::Conversation;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::codec::{decode, encode};
use crate::error::{ArchiveFault, ArchiveStoreError};
use crate::recovery::{FailoverOpener, RecoveryPath, UniqueFileOpener};
use crate::schema::Archive;

/// Result of a successful merge into the primary archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    pub archive: PathBuf,
    pub conversation_count: usize,
    pub bytes_written: usize,
}

/// Read-merge-write access to one archive file with a recovery fallback.
#[derive(Debug, Clone)]
pub struct ArchiveStore<O = UniqueFileOpener> {
    archive_path: PathBuf,
    recovery: RecoveryPath<O>,
}

impl ArchiveStore {
    /// Store for `archive_path` whose recovery files go to `recovery_dir`.
    #[must_use]
    pub fn new(archive_path: impl Into<PathBuf>, recovery_dir: impl Into<PathBuf>) -> Self {
        Self::with_recovery(archive_path, RecoveryPath::in_dir(recovery_dir))
    }
}

impl<O: FailoverOpener> ArchiveStore<O> {
    #[must_use]
    pub fn with_recovery(archive_path: impl Into<PathBuf>, recovery: RecoveryPath<O>) -> Self {
        Self {
            archive_path: archive_path.into(),
            recovery,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.archive_path
    }

    #[must_use]
    pub fn recovery_dir(&self) -> &Path {
        self.recovery.location()
    }

    /// Reads and decodes the archive; a missing file is an empty archive.
    pub fn load(&self) -> Result<Archive, ArchiveFault> {
        let bytes = match fs::read(&self.archive_path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(archive = %self.archive_path.display(), "archive does not exist yet");
                Vec::new()
            }
            Err(source) => {
                return Err(ArchiveFault::Read {
                    path: self.archive_path.clone(),
                    source,
                })
            }
        };

        decode(&bytes).map_err(|source| ArchiveFault::Decode {
            path: self.archive_path.clone(),
            source,
        })
    }

    /// Appends `conversation` after every conversation already archived and
    /// rewrites the archive.
    ///
    /// When the archive cannot be read, decoded, encoded, or written, the
    /// conversation is written to a recovery file and the error names it.
    pub fn append_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<AppendReport, ArchiveStoreError> {
        let mut archive = match self.load() {
            Ok(archive) => archive,
            Err(fault) => return Err(self.fail_over(None, conversation, fault)),
        };
        archive.push(conversation.clone());

        let bytes = match encode(&archive) {
            Ok(bytes) => bytes,
            Err(source) => return Err(self.fail_over(None, conversation, source.into())),
        };

        if let Err(source) = replace_file(&self.archive_path, &bytes) {
            let fault = ArchiveFault::Write {
                path: self.archive_path.clone(),
                source,
            };
            return Err(self.fail_over(Some(&bytes), conversation, fault));
        }

        info!(
            archive = %self.archive_path.display(),
            conversations = archive.len(),
            bytes = bytes.len(),
            "conversation archived"
        );
        Ok(AppendReport {
            archive: self.archive_path.clone(),
            conversation_count: archive.len(),
            bytes_written: bytes.len(),
        })
    }

    fn fail_over(
        &self,
        full_archive: Option<&[u8]>,
        conversation: &Conversation,
        fault: ArchiveFault,
    ) -> ArchiveStoreError {
        warn!(
            archive = %self.archive_path.display(),
            %fault,
            "archive unavailable; writing conversation to a recovery file"
        );

        match self.recovery.recover(full_archive, conversation) {
            Ok(recovered) => {
                warn!(
                    recovery_file = %recovered.path.display(),
                    stage = %recovered.stage,
                    "conversation saved to recovery file"
                );
                ArchiveStoreError::Unavailable {
                    archive: self.archive_path.clone(),
                    recovery_file: recovered.path,
                    stage: recovered.stage,
                    fault,
                }
            }
            Err(recovery) => {
                error!(
                    archive = %self.archive_path.display(),
                    %fault,
                    %recovery,
                    "recovery failed; conversation lost"
                );
                ArchiveStoreError::FatalDataLoss {
                    archive: self.archive_path.clone(),
                    fault,
                    recovery,
                }
            }
        }
    }
}

/// Replaces `path` with `bytes` through a synced sibling temp file and a rename,
/// so the previous content survives any failed write.
///
/// An existing symlink is followed and its target replaced; the link stays.
fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let resolved = resolve_target(path)?;
    let path = resolved.as_path();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let temp_path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    let result = write_synced(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn resolve_target(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => fs::canonicalize(path),
        _ => Ok(path.to_path_buf()),
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_file_overwrites_existing_content() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("archive.json");
        fs::write(&path, "old content that is longer").expect("seed file");

        replace_file(&path, b"new").expect("replace should succeed");

        assert_eq!(fs::read(&path).expect("read back"), b"new".to_vec());
    }

    #[test]
    fn replace_file_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("archive.json");

        replace_file(&path, b"content").expect("replace should succeed");

        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("list dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["archive.json".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn replace_file_writes_through_symlink() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let target = dir.path().join("real.json");
        let link = dir.path().join("archive.json");
        fs::write(&target, "old").expect("seed target");
        std::os::unix::fs::symlink(&target, &link).expect("symlink should be created");

        replace_file(&link, b"new").expect("replace should succeed");

        let link_metadata = fs::symlink_metadata(&link).expect("link metadata");
        assert!(link_metadata.file_type().is_symlink());
        assert_eq!(fs::read(&target).expect("read target"), b"new".to_vec());
    }

    #[cfg(unix)]
    #[test]
    fn replace_file_through_dangling_symlink_fails_and_keeps_link() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let link = dir.path().join("archive.json");
        std::os::unix::fs::symlink(dir.path().join("missing").join("real.json"), &link)
            .expect("symlink should be created");

        replace_file(&link, b"new").expect_err("dangling link cannot be resolved");

        assert!(fs::symlink_metadata(&link)
            .expect("link metadata")
            .file_type()
            .is_symlink());
    }

    #[test]
    fn replace_file_onto_directory_keeps_directory_and_cleans_up() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("archive.json");
        fs::create_dir(&path).expect("directory in the way");

        replace_file(&path, b"content").expect_err("cannot replace a directory");

        assert!(path.is_dir());
        assert_eq!(fs::read_dir(dir.path()).expect("list dir").count(), 1);
    }
}
