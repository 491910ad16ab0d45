//! Per-type artifact metadata (`metadata.toml`).
//!
//! Metadata is a sum type keyed by `type`. Every variant projects onto the
//! shared [`ArtifactBase`]; type-specific payloads (dependencies, the agent
//! skill list) are only reachable after matching on the variant. Validation
//! happens once, at the adapter boundary, through [`ArtifactMeta::parse_toml`].

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::reference::{VersionRequest, is_kebab_case};
use super::{ArtifactRef, ArtifactType};

/// Fields shared by every artifact type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBase {
    pub id: String,
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMeta {
    #[serde(flatten)]
    pub base: ArtifactBase,
    /// Dependency key (`[type:]id`) → semver range.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMeta {
    #[serde(flatten)]
    pub base: ArtifactBase,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_skill: Option<String>,
    /// Skills the agent uses; each becomes an implicit wildcard dependency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMeta {
    #[serde(flatten)]
    pub base: ArtifactBase,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfigMeta {
    #[serde(flatten)]
    pub base: ArtifactBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ArtifactMeta {
    Skill(SkillMeta),
    Agent(AgentMeta),
    Plugin(PluginMeta),
    WorkspaceConfig(WorkspaceConfigMeta),
}

impl ArtifactMeta {
    pub fn kind(&self) -> ArtifactType {
        match self {
            Self::Skill(_) => ArtifactType::Skill,
            Self::Agent(_) => ArtifactType::Agent,
            Self::Plugin(_) => ArtifactType::Plugin,
            Self::WorkspaceConfig(_) => ArtifactType::WorkspaceConfig,
        }
    }

    pub fn base(&self) -> &ArtifactBase {
        match self {
            Self::Skill(m) => &m.base,
            Self::Agent(m) => &m.base,
            Self::Plugin(m) => &m.base,
            Self::WorkspaceConfig(m) => &m.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn version(&self) -> &Version {
        &self.base().version
    }

    /// Exact reference to this artifact's declared version.
    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef::new(self.kind(), self.id(), self.version().to_string())
    }

    /// Declared dependency map; `None` for types that cannot have one.
    pub fn dependencies(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Skill(m) => Some(&m.dependencies),
            Self::Agent(m) => Some(&m.dependencies),
            Self::Plugin(m) => Some(&m.dependencies),
            Self::WorkspaceConfig(_) => None,
        }
    }

    /// Parse and validate a metadata document for an artifact stored under
    /// the `kind` directory. The `type` field is optional in the file but must
    /// agree with the directory when present.
    pub fn parse_toml(kind: ArtifactType, text: &str) -> Result<Self, String> {
        let mut table: toml::Table = toml::from_str(text).map_err(|e| e.to_string())?;

        match table.get("type") {
            Some(toml::Value::String(declared)) if declared != kind.as_str() => {
                return Err(format!(
                    "declares type '{declared}' but is stored as {kind}"
                ));
            }
            Some(toml::Value::String(_)) => {}
            Some(_) => return Err("'type' must be a string".into()),
            None => {
                table.insert("type".into(), toml::Value::String(kind.as_str().into()));
            }
        }

        let meta: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| e.to_string())?;
        meta.validate()?;
        Ok(meta)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), String> {
        let base = self.base();
        if !is_kebab_case(&base.id) {
            return Err(format!("id '{}' must be kebab-case", base.id));
        }
        if base.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }

        if let Some(deps) = self.dependencies() {
            for (key, range) in deps {
                let (_, id) = split_dependency_key(key);
                if !is_kebab_case(id) {
                    return Err(format!("dependency '{key}' is not a valid [type:]id"));
                }
                VersionRequest::parse(range).map_err(|e| format!("dependency '{key}': {e}"))?;
            }
        }

        if let Self::Agent(agent) = self {
            for skill in agent.skills.iter().chain(agent.root_skill.iter()) {
                if !is_kebab_case(skill) {
                    return Err(format!("skill '{skill}' must be kebab-case"));
                }
            }
        }

        Ok(())
    }
}

/// Splits an optional `agent:`/`plugin:`/`skill:` prefix off a dependency key.
/// Untyped keys are skills.
pub fn split_dependency_key(key: &str) -> (ArtifactType, &str) {
    for kind in [ArtifactType::Agent, ArtifactType::Plugin, ArtifactType::Skill] {
        if let Some(id) = key
            .strip_prefix(kind.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
        {
            return (kind, id);
        }
    }
    (ArtifactType::Skill, key)
}
