mod codec;
mod error;
mod paths;
mod recovery;
mod schema;
mod store;

pub use codec::{decode, encode, encode_conversation, DecodeError, EncodeError, CURRENT_VERSION};
pub use error::{ArchiveFault, ArchivePathError, ArchiveStoreError};
pub use paths::{
    archive_dir, archive_file_name, default_archive_path, expand_home, ARCHIVE_SUBDIR,
};
pub use recovery::{
    FailoverFile, FailoverOpener, Recovered, RecoveryError, RecoveryPath, RecoveryStage,
    UniqueFileOpener, FAILOVER_FILE_PREFIX,
};
pub use schema::{Archive, SchemaVersion};
pub use store::{AppendReport, ArchiveStore};
