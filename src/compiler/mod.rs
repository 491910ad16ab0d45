//! Target-specific emission of resolved artifacts as file writes.
//!
//! Content is opaque: a strategy only decides where each artifact lands for
//! its target. Strategies are supplied at construction; there is no global
//! registration table.

pub mod targets;

pub use targets::{ClaudeCodeTarget, CursorTarget};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::artifact::{ArtifactRef, ResolvedArtifact};
use crate::error::{ForgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Create,
    Update,
}

/// One file to write, relative to the workspace root. Whether it creates or
/// updates a file is decided against the disk at merge time.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOperation {
    pub path: PathBuf,
    pub content: String,
    pub source_ref: ArtifactRef,
}

#[derive(Debug, Clone)]
pub struct CompiledOutput {
    pub target: String,
    pub operations: Vec<FileOperation>,
}

pub trait TargetStrategy: Send + Sync {
    fn target(&self) -> &str;

    /// Where `artifact`'s content is written for this target.
    fn destination(&self, artifact: &ResolvedArtifact) -> PathBuf;

    /// Operations for `artifact` and its dependency tree. Dependencies are
    /// always emitted before their dependents.
    fn emit(&self, artifact: &ResolvedArtifact) -> CompiledOutput {
        let mut operations = Vec::new();
        let mut seen = HashSet::new();
        emit_post_order(self, artifact, &mut seen, &mut operations);
        CompiledOutput {
            target: self.target().to_string(),
            operations,
        }
    }
}

fn emit_post_order<S: TargetStrategy + ?Sized>(
    strategy: &S,
    artifact: &ResolvedArtifact,
    seen: &mut HashSet<String>,
    operations: &mut Vec<FileOperation>,
) {
    if !seen.insert(artifact.key()) {
        return;
    }
    for dependency in &artifact.dependencies {
        emit_post_order(strategy, dependency, seen, operations);
    }
    operations.push(FileOperation {
        path: strategy.destination(artifact),
        content: artifact.bundle.content.clone(),
        source_ref: artifact.bundle.meta.to_ref(),
    });
}

pub struct Compiler {
    strategies: HashMap<String, Box<dyn TargetStrategy>>,
}

impl Compiler {
    pub fn new(strategies: Vec<Box<dyn TargetStrategy>>) -> Self {
        let strategies = strategies
            .into_iter()
            .map(|s| (s.target().to_string(), s))
            .collect();
        Self { strategies }
    }

    /// Compiler with the `claude-code` and `cursor` targets.
    pub fn with_builtin_targets() -> Self {
        Self::new(vec![Box::new(ClaudeCodeTarget), Box::new(CursorTarget)])
    }

    pub fn targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn emit(&self, artifact: &ResolvedArtifact, target: &str) -> Result<CompiledOutput> {
        Ok(self.strategy(target)?.emit(artifact))
    }

    /// Operations for a batch, de-duplicated by destination path. When two
    /// artifacts write the same path, the one later in `artifacts` wins.
    pub fn emit_all(
        &self,
        artifacts: &[Arc<ResolvedArtifact>],
        target: &str,
    ) -> Result<Vec<FileOperation>> {
        let strategy = self.strategy(target)?;
        let mut operations: Vec<FileOperation> = Vec::new();
        let mut by_path: HashMap<PathBuf, usize> = HashMap::new();

        for artifact in artifacts {
            for op in strategy.emit(artifact).operations {
                match by_path.get(&op.path) {
                    Some(&index) => operations[index] = op,
                    None => {
                        by_path.insert(op.path.clone(), operations.len());
                        operations.push(op);
                    }
                }
            }
        }
        Ok(operations)
    }

    fn strategy(&self, target: &str) -> Result<&dyn TargetStrategy> {
        self.strategies
            .get(target)
            .map(|s| &**s)
            .ok_or_else(|| ForgeError::UnsupportedTarget {
                target: target.to_string(),
                available: self.targets().into_iter().map(String::from).collect(),
            })
    }
}
