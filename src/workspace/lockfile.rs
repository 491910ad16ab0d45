//! `forge.lock`: the record of which workspace files Forge owns.
//!
//! Every path listed under an entry's `files` was written by Forge and may be
//! overwritten or removed without a conflict check. The lockfile is read once
//! at the start of an install and rebuilt from scratch at the end.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::artifact::{ArtifactType, ResolvedArtifact};
use crate::error::{ForgeError, Result};

pub const LOCKFILE_NAME: &str = "forge.lock";
pub const LOCKFILE_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    pub version: String,
    pub locked_at: DateTime<Utc>,
    /// Keyed `type:id`.
    #[serde(default)]
    pub artifacts: BTreeMap<String, LockedArtifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedArtifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    pub version: String,
    #[serde(rename = "registry")]
    pub registry_source_name: String,
    #[serde(rename = "sha256")]
    pub content_hash: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    pub resolved_at: DateTime<Utc>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: LOCKFILE_VERSION.to_string(),
            locked_at: Utc::now(),
            artifacts: BTreeMap::new(),
        }
    }
}

impl LockFile {
    pub fn path(workspace: &Path) -> PathBuf {
        workspace.join(LOCKFILE_NAME)
    }

    /// Reads `forge.lock` from `workspace`; a missing file is an empty lock.
    pub async fn load(workspace: &Path) -> Result<Self> {
        let path = Self::path(workspace);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let lock: Self = serde_json::from_str(&text).map_err(|e| ForgeError::Config {
            message: format!("failed to parse {}: {e}", path.display()),
            suggestion: Some(format!("delete {} and re-run install", path.display())),
        })?;
        if lock.version != LOCKFILE_VERSION {
            return Err(ForgeError::Config {
                message: format!(
                    "{} has unsupported version '{}'",
                    path.display(),
                    lock.version
                ),
                suggestion: Some("upgrade forge or regenerate the lockfile".into()),
            });
        }
        Ok(lock)
    }

    pub async fn save(&self, workspace: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        tokio::fs::write(Self::path(workspace), json).await?;
        Ok(())
    }

    /// Every path some entry owns. Paths that would leave the workspace
    /// (absolute, or containing `..`) are never treated as owned.
    pub fn owned_paths(&self) -> HashSet<&Path> {
        self.artifacts
            .iter()
            .flat_map(|(key, entry)| {
                entry.files.iter().filter_map(move |file| {
                    if is_workspace_relative(file) {
                        Some(file.as_path())
                    } else {
                        warn!(artifact = %key, path = %file.display(), "ignoring lockfile path outside the workspace");
                        None
                    }
                })
            })
            .collect()
    }

    pub fn is_owned(&self, path: &Path) -> bool {
        is_workspace_relative(path)
            && self
                .artifacts
                .values()
                .any(|entry| entry.files.iter().any(|f| f == path))
    }

    /// Fresh lock for a completed install. Workspace configs are never locked.
    /// `files` maps `type:id` to the paths written for that artifact.
    pub fn rebuild(
        artifacts: &[Arc<ResolvedArtifact>],
        files: &HashMap<String, Vec<PathBuf>>,
        now: DateTime<Utc>,
    ) -> Self {
        let artifacts = artifacts
            .iter()
            .filter(|a| a.reference.kind != ArtifactType::WorkspaceConfig)
            .map(|a| {
                let key = a.key();
                let entry = LockedArtifact {
                    id: a.reference.id.clone(),
                    kind: a.reference.kind,
                    version: a.bundle.meta.version().to_string(),
                    registry_source_name: a.bundle.source.clone(),
                    content_hash: content_hash(&a.bundle.content),
                    files: files.get(&key).cloned().unwrap_or_default(),
                    resolved_at: now,
                };
                (key, entry)
            })
            .collect();

        Self {
            version: LOCKFILE_VERSION.to_string(),
            locked_at: now,
            artifacts,
        }
    }
}

/// Non-empty and made only of normal components.
pub fn is_workspace_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Hex-encoded SHA-256 of opaque artifact content.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::tests::node;
    use tempfile::TempDir;

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn missing_lockfile_is_empty() {
        let tmp = TempDir::new().unwrap();
        let lock = LockFile::load(tmp.path()).await.unwrap();
        assert!(lock.artifacts.is_empty());
        assert_eq!(lock.version, "1");
    }

    #[tokio::test]
    async fn save_and_load_use_persisted_field_names() {
        let tmp = TempDir::new().unwrap();
        let skill = node(ArtifactType::Skill, "s", "body", vec![]);
        let files = HashMap::from([(
            "skill:s".to_string(),
            vec![PathBuf::from(".claude/skills/s/SKILL.md")],
        )]);
        let lock = LockFile::rebuild(&[skill], &files, Utc::now());
        lock.save(tmp.path()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(LockFile::path(tmp.path())).unwrap())
                .unwrap();
        let entry = &raw["artifacts"]["skill:s"];
        assert_eq!(raw["version"], "1");
        assert!(raw["lockedAt"].is_string());
        assert_eq!(entry["type"], "skill");
        assert_eq!(entry["sha256"], content_hash("body"));
        assert!(entry["registry"].is_string());
        assert!(entry["resolvedAt"].is_string());

        let loaded = LockFile::load(tmp.path()).await.unwrap();
        assert_eq!(loaded, lock);
        assert!(loaded.is_owned(Path::new(".claude/skills/s/SKILL.md")));
        assert!(!loaded.is_owned(Path::new("README.md")));
    }

    #[test]
    fn workspace_configs_are_not_locked() {
        let config = node(ArtifactType::WorkspaceConfig, "team", "x", vec![]);
        let agent = node(ArtifactType::Agent, "a", "y", vec![]);
        let lock = LockFile::rebuild(&[config, agent], &HashMap::new(), Utc::now());
        assert_eq!(lock.artifacts.keys().collect::<Vec<_>>(), vec!["agent:a"]);
    }

    #[test]
    fn escaping_paths_are_never_owned() {
        let skill = node(ArtifactType::Skill, "s", "", vec![]);
        let files = HashMap::from([(
            "skill:s".to_string(),
            vec![
                PathBuf::from(".claude/skills/s/SKILL.md"),
                PathBuf::from("/etc/passwd"),
                PathBuf::from("../outside.md"),
                PathBuf::from("./a/../../b.md"),
            ],
        )]);
        let lock = LockFile::rebuild(&[skill], &files, Utc::now());

        let owned = lock.owned_paths();
        assert_eq!(owned.len(), 1);
        assert!(owned.contains(Path::new(".claude/skills/s/SKILL.md")));
        assert!(!lock.is_owned(Path::new("/etc/passwd")));
        assert!(!lock.is_owned(Path::new("../outside.md")));
    }

    #[tokio::test]
    async fn unknown_version_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            LockFile::path(tmp.path()),
            r#"{"version":"9","lockedAt":"2026-01-01T00:00:00Z","artifacts":{}}"#,
        )
        .unwrap();
        let err = LockFile::load(tmp.path()).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
