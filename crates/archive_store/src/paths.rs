use std::fs;
use std::path::{Path, PathBuf};

use time::Date;

use crate::error::ArchivePathError;

/// Subdirectory of the notes root holding the daily archives.
pub const ARCHIVE_SUBDIR: &str = "shllm";

/// Expands a leading `~` or `~/` to `home`. Other paths are returned as given.
#[must_use]
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (path, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        (path, _) => PathBuf::from(path),
    }
}

#[must_use]
pub fn archive_dir(notes_root: &Path) -> PathBuf {
    notes_root.join(ARCHIVE_SUBDIR)
}

#[must_use]
pub fn archive_file_name(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}.json",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Returns `<notes_root>/shllm/<YYYY-MM-DD>.json`, creating the directory if needed.
pub fn default_archive_path(notes_root: &Path, date: Date) -> Result<PathBuf, ArchivePathError> {
    let dir = archive_dir(notes_root);
    fs::create_dir_all(&dir).map_err(|source| ArchivePathError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir.join(archive_file_name(date)))
}
