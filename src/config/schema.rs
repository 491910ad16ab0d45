use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::adapters::git::DEFAULT_REF;
use crate::workspace::ConflictStrategy;

pub const CONFIG_FILE_NAME: &str = "forge.toml";
pub const DEFAULT_TARGET: &str = "claude-code";

// ── Workspace ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory holding `forge.toml`, `forge.lock` and the compiled output.
    #[serde(skip)]
    pub workspace_dir: PathBuf,

    #[serde(default = "default_target")]
    pub target: String,

    #[serde(default)]
    pub conflict_strategy: ConflictStrategy,

    /// Root for git checkouts. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Artifact references installed when none are given explicitly.
    #[serde(default)]
    pub install: Vec<String>,

    /// Ordered by priority, highest first.
    #[serde(default)]
    pub registries: Vec<RegistryDescriptor>,
}

fn default_target() -> String {
    DEFAULT_TARGET.into()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("."),
            target: default_target(),
            conflict_strategy: ConflictStrategy::default(),
            cache_dir: None,
            install: Vec::new(),
            registries: Vec::new(),
        }
    }
}

// ── Registry sources ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegistryDescriptor {
    Filesystem(FilesystemSource),
    Git(GitSource),
    Http(HttpSource),
}

impl RegistryDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Filesystem(s) => &s.name,
            Self::Git(s) => &s.name,
            Self::Http(s) => &s.name,
        }
    }

    pub fn writable(&self) -> bool {
        match self {
            Self::Filesystem(s) => s.writable,
            Self::Git(s) => s.writable,
            Self::Http(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemSource {
    pub name: String,
    /// `~` is expanded; relative paths are taken from the workspace root.
    pub path: String,
    #[serde(default)]
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitSource {
    pub name: String,
    pub url: String,
    #[serde(rename = "ref", default = "default_git_ref")]
    pub git_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sparse: Vec<String>,
    #[serde(default)]
    pub writable: bool,
}

fn default_git_ref() -> String {
    DEFAULT_REF.into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSource {
    pub name: String,
    pub url: String,
}
