use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ArtifactType;
use crate::error::ForgeError;

pub const WILDCARD: &str = "*";
pub const LATEST: &str = "latest";

/// `{type, id, version}`: what a user or a dependency edge asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    pub id: String,
    pub version: String,
}

impl ArtifactRef {
    pub fn new(kind: ArtifactType, id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            version: version.into(),
        }
    }

    /// Reference to any version of `kind:id`.
    pub fn any(kind: ArtifactType, id: impl Into<String>) -> Self {
        Self::new(kind, id, WILDCARD)
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.version.trim(), WILDCARD | LATEST | "")
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.kind, self.id, self.version)
    }
}

/// Parses `[type:]id[@version]`. Type defaults to skill, version to `*`.
impl FromStr for ArtifactRef {
    type Err = ForgeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ForgeError::InvalidReference {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let (head, version) = match trimmed.split_once('@') {
            Some((head, version)) if !version.trim().is_empty() => (head, version.trim()),
            Some(_) => return Err(invalid("empty version after '@'".into())),
            None => (trimmed, WILDCARD),
        };

        let (kind, id) = match head.split_once(':') {
            Some((kind, id)) => {
                let kind = kind
                    .parse::<ArtifactType>()
                    .map_err(|_| invalid(format!("unknown artifact type '{kind}'")))?;
                (kind, id)
            }
            None => (ArtifactType::Skill, head),
        };

        if !is_kebab_case(id) {
            return Err(invalid(format!("id '{id}' must be kebab-case")));
        }
        VersionRequest::parse(version).map_err(invalid)?;

        Ok(Self::new(kind, id, version))
    }
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionRequest {
    /// `*`, `latest` or empty.
    Any,
    /// A bare semver: exactly that version.
    Exact(Version),
    Range(VersionReq),
}

impl VersionRequest {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if matches!(raw, WILDCARD | LATEST | "") {
            return Ok(Self::Any);
        }
        if let Ok(version) = Version::parse(raw) {
            return Ok(Self::Exact(version));
        }
        VersionReq::parse(raw)
            .map(Self::Range)
            .map_err(|e| format!("invalid version range '{raw}': {e}"))
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => exact == version,
            Self::Range(req) => req.matches(version),
        }
    }
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub fn is_kebab_case(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && !id.ends_with('-')
        && !id.contains("--")
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
