//! Reconciles compiled file operations with what is on disk.
//!
//! A target that does not exist is written. A target the lockfile owns is
//! overwritten silently. Anything else is a conflict and the
//! [`ConflictStrategy`] decides its fate.

use std::collections::HashSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::lockfile::LockFile;
use crate::artifact::ArtifactRef;
use crate::compiler::{FileAction, FileOperation};
use crate::error::{ForgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConflictStrategy {
    Overwrite,
    #[default]
    Skip,
    Backup,
    /// Interactive prompting is not available; behaves like `Skip`.
    Prompt,
}

impl FromStr for ConflictStrategy {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            "backup" => Ok(Self::Backup),
            "prompt" => Ok(Self::Prompt),
            other => Err(ForgeError::Config {
                message: format!("unknown conflict strategy '{other}'"),
                suggestion: Some("use one of: overwrite, skip, backup, prompt".into()),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Resolution {
    Overwrite,
    Backup,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub path: PathBuf,
    pub source_ref: ArtifactRef,
    pub resolution: Resolution,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub source_ref: ArtifactRef,
    pub action: FileAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub written: Vec<WrittenFile>,
    pub conflicts: Vec<Conflict>,
}

impl MergeReport {
    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.conflicts
            .iter()
            .filter(|c| c.resolution == Resolution::Skip)
            .map(|c| c.path.as_path())
    }
}

/// Applies `operations` under `root`. Paths in operations and in the lockfile
/// are relative to `root`. With `dry_run` nothing is touched on disk and the
/// report describes what would happen. I/O errors abort the merge.
pub async fn merge_files(
    root: &Path,
    operations: &[FileOperation],
    lock: &LockFile,
    strategy: ConflictStrategy,
    dry_run: bool,
) -> Result<MergeReport> {
    let owned = lock.owned_paths();
    let mut report = MergeReport::default();

    for op in operations {
        let target = root.join(&op.path);
        let exists = tokio::fs::try_exists(&target).await?;

        if !exists || owned.contains(op.path.as_path()) {
            let action = if exists {
                FileAction::Update
            } else {
                FileAction::Create
            };
            if !dry_run {
                write_file(&target, &op.content).await?;
            }
            report.written.push(WrittenFile {
                path: op.path.clone(),
                source_ref: op.source_ref.clone(),
                action,
            });
            continue;
        }

        let (resolution, backup_path) = match strategy {
            ConflictStrategy::Overwrite => {
                if !dry_run {
                    write_file(&target, &op.content).await?;
                }
                (Resolution::Overwrite, None)
            }
            ConflictStrategy::Backup => {
                let backup = backup_path(&op.path);
                if !dry_run {
                    tokio::fs::copy(&target, root.join(&backup)).await?;
                    write_file(&target, &op.content).await?;
                }
                (Resolution::Backup, Some(backup))
            }
            ConflictStrategy::Skip | ConflictStrategy::Prompt => (Resolution::Skip, None),
        };

        info!(path = %op.path.display(), %resolution, "file exists and is not managed by forge");
        if resolution != Resolution::Skip {
            report.written.push(WrittenFile {
                path: op.path.clone(),
                source_ref: op.source_ref.clone(),
                action: FileAction::Update,
            });
        }
        report.conflicts.push(Conflict {
            path: op.path.clone(),
            source_ref: op.source_ref.clone(),
            resolution,
            backup_path,
        });
    }

    Ok(report)
}

/// Deletes every lock-owned path that is not in `current_paths`. Files that
/// are already gone are ignored; other failures are logged and skipped.
/// Returns the paths actually removed.
pub async fn clean_untracked(
    root: &Path,
    lock: &LockFile,
    current_paths: &HashSet<PathBuf>,
) -> Vec<PathBuf> {
    let mut stale: Vec<&Path> = lock
        .owned_paths()
        .into_iter()
        .filter(|p| !current_paths.contains(*p))
        .collect();
    stale.sort();

    let mut removed = Vec::new();
    for path in stale {
        match tokio::fs::remove_file(root.join(path)).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed file no longer produced by any artifact");
                removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale file"),
        }
    }
    removed
}

/// `<path>.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}
