pub mod lockfile;
pub mod merge;

pub use lockfile::{LOCKFILE_NAME, LockFile, LockedArtifact, content_hash};
pub use merge::{
    Conflict, ConflictStrategy, MergeReport, Resolution, WrittenFile, backup_path,
    clean_untracked, merge_files,
};
