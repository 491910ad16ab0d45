//! The `Forge` facade: resolve, compile, merge and lock in one call.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::adapters::DataAdapter;
use crate::artifact::{
    ArtifactBundle, ArtifactRef, ArtifactSummary, ArtifactType, ResolvedArtifact,
};
use crate::compiler::Compiler;
use crate::config::WorkspaceConfig;
use crate::error::{ForgeError, Result};
use crate::registry::{Registry, SearchResult};
use crate::resolver::Resolver;
use crate::workspace::{Conflict, ConflictStrategy, LockFile, clean_untracked, merge_files};

#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// References to install. Empty means the `install` list from `forge.toml`.
    pub refs: Vec<ArtifactRef>,
    /// Overrides the configured target.
    pub target: Option<String>,
    /// Overrides the configured conflict strategy.
    pub conflict_strategy: Option<ConflictStrategy>,
    pub dry_run: bool,
    /// Remove files owned by the previous lockfile that this install no
    /// longer produces. `None` prunes only when installing the `install` list
    /// from `forge.toml`, since an explicit subset would otherwise remove
    /// everything else.
    pub clean: Option<bool>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            refs: Vec::new(),
            target: None,
            conflict_strategy: None,
            dry_run: false,
            clean: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub target: String,
    pub installed_refs: Vec<ArtifactRef>,
    pub files_written: Vec<PathBuf>,
    pub conflicts: Vec<Conflict>,
    pub removed: Vec<PathBuf>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

pub struct Forge {
    config: WorkspaceConfig,
    registry: Arc<Registry>,
    resolver: Resolver,
    compiler: Compiler,
}

impl Forge {
    pub fn new(config: WorkspaceConfig, adapter: Box<dyn DataAdapter>, compiler: Compiler) -> Self {
        let registry = Arc::new(Registry::new(adapter));
        Self {
            config,
            resolver: Resolver::new(Arc::clone(&registry)),
            registry,
            compiler,
        }
    }

    /// Builds the adapter stack from `config` and uses the built-in targets.
    pub fn from_config(config: WorkspaceConfig) -> Result<Self> {
        let adapter = config.build_adapter()?;
        Ok(Self::new(config, adapter, Compiler::with_builtin_targets()))
    }

    /// Loads `forge.toml` from `workspace`.
    pub fn open(workspace: &Path) -> Result<Self> {
        Self::from_config(WorkspaceConfig::load(workspace)?)
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.config.workspace_dir
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn install(&mut self, options: InstallOptions) -> Result<InstallReport> {
        let started = Instant::now();
        let from_config = options.refs.is_empty();
        let refs = if from_config {
            self.configured_refs()?
        } else {
            options.refs
        };
        let clean = options.clean.unwrap_or(from_config);
        let target = options.target.unwrap_or_else(|| self.config.target.clone());
        let strategy = options
            .conflict_strategy
            .unwrap_or(self.config.conflict_strategy);
        let workspace = self.config.workspace_dir.clone();

        self.resolver.reset();
        let artifacts = self.resolver.resolve_all(&refs).await?;
        let operations = self.compiler.emit_all(&artifacts, &target)?;
        debug!(artifacts = artifacts.len(), operations = operations.len(), %target, "compiled");

        let previous = LockFile::load(&workspace).await?;
        let merged = merge_files(&workspace, &operations, &previous, strategy, options.dry_run).await?;

        let mut removed = Vec::new();
        if !options.dry_run {
            if clean {
                let current: HashSet<PathBuf> = operations.iter().map(|op| op.path.clone()).collect();
                removed = clean_untracked(&workspace, &previous, &current).await;
            }

            let mut files: HashMap<String, Vec<PathBuf>> = HashMap::new();
            for written in &merged.written {
                files
                    .entry(written.source_ref.key())
                    .or_default()
                    .push(written.path.clone());
            }
            LockFile::rebuild(&artifacts, &files, Utc::now())
                .save(&workspace)
                .await?;
        }

        let report = InstallReport {
            target,
            installed_refs: artifacts.iter().map(|a| a.bundle.meta.to_ref()).collect(),
            files_written: merged.written.into_iter().map(|w| w.path).collect(),
            conflicts: merged.conflicts,
            removed,
            dry_run: options.dry_run,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            installed = report.installed_refs.len(),
            written = report.files_written.len(),
            conflicts = report.conflicts.len(),
            dry_run = report.dry_run,
            "install finished"
        );
        Ok(report)
    }

    /// Resolves a single reference in a fresh run.
    pub async fn resolve(&mut self, reference: &ArtifactRef) -> Result<Arc<ResolvedArtifact>> {
        self.resolver.reset();
        self.resolver.resolve(reference).await
    }

    pub async fn search(&self, query: &str, kind: Option<ArtifactType>) -> Vec<SearchResult> {
        self.registry.search(query, kind).await
    }

    pub async fn list(&self, kind: Option<ArtifactType>) -> Vec<ArtifactSummary> {
        self.registry.list(kind).await
    }

    /// Writes `bundle` through the writable registry source.
    pub async fn publish(&self, kind: ArtifactType, id: &str, bundle: &ArtifactBundle) -> Result<()> {
        if bundle.meta.kind() != kind || bundle.meta.id() != id {
            return Err(ForgeError::InvalidMetadata {
                path: format!("{}/{id}", kind.dir_name()),
                reason: format!(
                    "bundle describes {} but was published as {kind}:{id}",
                    bundle.meta.to_ref().key()
                ),
            });
        }
        bundle
            .meta
            .validate()
            .map_err(|reason| ForgeError::InvalidMetadata {
                path: format!("{}/{id}", kind.dir_name()),
                reason,
            })?;
        self.registry.publish(kind, id, bundle).await
    }

    fn configured_refs(&self) -> Result<Vec<ArtifactRef>> {
        if self.config.install.is_empty() {
            return Err(ForgeError::Config {
                message: "nothing to install".into(),
                suggestion: Some(
                    "pass artifact references or list them under `install` in forge.toml".into(),
                ),
            });
        }
        self.config.install.iter().map(|raw| raw.parse()).collect()
    }
}
