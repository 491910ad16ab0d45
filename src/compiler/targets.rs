use std::path::PathBuf;

use super::TargetStrategy;
use crate::artifact::{ArtifactType, ResolvedArtifact};

/// `.claude/` layout.
pub struct ClaudeCodeTarget;

impl TargetStrategy for ClaudeCodeTarget {
    fn target(&self) -> &str {
        "claude-code"
    }

    fn destination(&self, artifact: &ResolvedArtifact) -> PathBuf {
        let id = &artifact.reference.id;
        match artifact.reference.kind {
            ArtifactType::Skill => PathBuf::from(".claude/skills").join(id).join("SKILL.md"),
            ArtifactType::Agent => PathBuf::from(".claude/agents").join(format!("{id}.md")),
            ArtifactType::Plugin => PathBuf::from(".claude/plugins")
                .join(id)
                .join(&artifact.bundle.content_file_name),
            ArtifactType::WorkspaceConfig => PathBuf::from("CLAUDE.md"),
        }
    }
}

/// `.cursor/` layout; skills become rule files.
pub struct CursorTarget;

impl TargetStrategy for CursorTarget {
    fn target(&self) -> &str {
        "cursor"
    }

    fn destination(&self, artifact: &ResolvedArtifact) -> PathBuf {
        let id = &artifact.reference.id;
        match artifact.reference.kind {
            ArtifactType::Skill => PathBuf::from(".cursor/rules").join(format!("{id}.mdc")),
            ArtifactType::Agent => PathBuf::from(".cursor/agents").join(format!("{id}.md")),
            ArtifactType::Plugin => PathBuf::from(".cursor/plugins")
                .join(id)
                .join(&artifact.bundle.content_file_name),
            ArtifactType::WorkspaceConfig => PathBuf::from(".cursorrules"),
        }
    }
}
