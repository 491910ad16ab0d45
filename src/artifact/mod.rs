//! Artifact data model: types, references, bundles and resolved trees.

pub mod metadata;
pub mod reference;

pub use metadata::{
    AgentMeta, ArtifactBase, ArtifactMeta, PluginMeta, SkillMeta, WorkspaceConfigMeta,
};
pub use reference::{ArtifactRef, VersionRequest, is_kebab_case};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ForgeError;

// ── ArtifactType ─────────────────────────────────────────────────────────────

/// The four kinds of artifact Forge manages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ArtifactType {
    Skill,
    Agent,
    Plugin,
    WorkspaceConfig,
}

impl ArtifactType {
    pub const ALL: [Self; 4] = [
        Self::Skill,
        Self::Agent,
        Self::Plugin,
        Self::WorkspaceConfig,
    ];

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Directory under a filesystem registry root holding this type.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Skill => "skills",
            Self::Agent => "agents",
            Self::Plugin => "plugins",
            Self::WorkspaceConfig => "workspace-configs",
        }
    }

    /// Fixed content file stored next to `metadata.toml`.
    pub fn content_file_name(self) -> &'static str {
        match self {
            Self::Skill => "SKILL.md",
            Self::Agent => "AGENT.md",
            Self::Plugin => "PLUGIN.md",
            Self::WorkspaceConfig => "WORKSPACE.md",
        }
    }

    /// Whether artifacts of this type may declare dependencies.
    pub fn has_dependencies(self) -> bool {
        !matches!(self, Self::WorkspaceConfig)
    }
}

impl FromStr for ArtifactType {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skill" => Ok(Self::Skill),
            "agent" => Ok(Self::Agent),
            "plugin" => Ok(Self::Plugin),
            "workspace-config" => Ok(Self::WorkspaceConfig),
            other => Err(ForgeError::InvalidReference {
                input: s.to_string(),
                reason: format!("unknown artifact type '{other}'"),
            }),
        }
    }
}

// ── Bundles ──────────────────────────────────────────────────────────────────

/// Raw artifact as read from a source. Content is opaque and never parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub meta: ArtifactMeta,
    pub content: String,
    pub content_file_name: String,
    /// Name of the registry source this bundle was read from.
    pub source: String,
}

impl ArtifactBundle {
    pub fn new(meta: ArtifactMeta, content: impl Into<String>) -> Self {
        let content_file_name = meta.kind().content_file_name().to_string();
        Self {
            meta,
            content: content.into(),
            content_file_name,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Lightweight listing entry for discovery front-ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSummary {
    #[serde(rename = "ref")]
    pub reference: ArtifactRef,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&ArtifactMeta> for ArtifactSummary {
    fn from(meta: &ArtifactMeta) -> Self {
        let base = meta.base();
        Self {
            reference: meta.to_ref(),
            name: base.name.clone(),
            description: base.description.clone(),
            tags: base.tags.iter().cloned().collect(),
        }
    }
}

/// An artifact with its transitively resolved dependencies.
///
/// Subtrees are shared through `Arc`: an id resolved once in a run is the same
/// node wherever it appears.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub reference: ArtifactRef,
    pub bundle: ArtifactBundle,
    pub dependencies: Vec<Arc<ResolvedArtifact>>,
}

impl ResolvedArtifact {
    /// `type:id` key used by the resolver cache and the lockfile.
    pub fn key(&self) -> String {
        self.reference.key()
    }
}
