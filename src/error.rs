use thiserror::Error;

use crate::artifact::ArtifactType;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Forge.
///
/// Every variant carries a stable machine-readable [`code`](ForgeError::code)
/// and, where one exists, an actionable [`suggestion`](ForgeError::suggestion)
/// for front-ends to display next to the message.
#[derive(Debug, Error)]
pub enum ForgeError {
    // ── Lookup ──────────────────────────────────────────────────────────
    #[error("{kind} '{id}' not found")]
    NotFound { kind: ArtifactType, id: String },

    #[error("invalid metadata in {path}: {reason}")]
    InvalidMetadata { path: String, reason: String },

    #[error("invalid artifact reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    // ── Resolution ──────────────────────────────────────────────────────
    #[error("circular dependency: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("{key}: requested version '{requested}' but registry has {available}")]
    VersionMismatch {
        key: String,
        requested: String,
        available: String,
    },

    // ── Compilation ─────────────────────────────────────────────────────
    #[error("unsupported target '{target}' (available: {})", .available.join(", "))]
    UnsupportedTarget {
        target: String,
        available: Vec<String>,
    },

    // ── Sources ─────────────────────────────────────────────────────────
    #[error("{kind} '{id}' could not be read from any source (tried: {})", .attempted.join(", "))]
    AllAdaptersFailed {
        kind: ArtifactType,
        id: String,
        attempted: Vec<String>,
    },

    #[error("source {adapter}: {message}")]
    Adapter {
        adapter: String,
        message: String,
        suggestion: Option<String>,
    },

    // ── Config / persistence ────────────────────────────────────────────
    #[error("config: {message}")]
    Config {
        message: String,
        suggestion: Option<String>,
    },

    #[error("serialize: {0}")]
    Serialize(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Stable identifier for programmatic handling by front-ends.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidMetadata { .. } => "INVALID_METADATA",
            Self::InvalidReference { .. } => "INVALID_REFERENCE",
            Self::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::UnsupportedTarget { .. } => "UNSUPPORTED_TARGET",
            Self::AllAdaptersFailed { .. } => "ALL_ADAPTERS_FAILED",
            Self::Adapter { .. } => "ADAPTER_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Human hint on how to recover, if there is a useful one.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { kind, .. } => Some(format!(
                "run `forge search <query> --type {kind}` to list available artifacts"
            )),
            Self::InvalidMetadata { path, .. } => {
                Some(format!("fix or remove the metadata file at {path}"))
            }
            Self::InvalidReference { .. } => {
                Some("references look like `[type:]id[@version]`, e.g. `agent:reviewer@^1.0.0`".into())
            }
            Self::CircularDependency { .. } => {
                Some("remove one of the dependency edges listed in the cycle".into())
            }
            Self::VersionMismatch { available, .. } => Some(format!(
                "relax the requested range or pin to the available version {available}"
            )),
            Self::UnsupportedTarget { available, .. } => {
                Some(format!("choose one of: {}", available.join(", ")))
            }
            Self::AllAdaptersFailed { .. } => {
                Some("check the registry sources in forge.toml and the log output above".into())
            }
            Self::Adapter { suggestion, .. } | Self::Config { suggestion, .. } => {
                suggestion.clone()
            }
            Self::Serialize(_) | Self::Io(_) | Self::Other(_) => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            suggestion: None,
        }
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<toml::ser::Error> for ForgeError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ForgeError>;
