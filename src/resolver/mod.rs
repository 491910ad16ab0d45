//! Recursive dependency resolution.
//!
//! Every `type:id` key is white (never seen), gray (on the current call chain)
//! or black (resolved and cached for the rest of the run). Meeting a gray key
//! again is a cycle. Resolution is strictly sequential, so the marks need no
//! locking; a `Resolver` must not be shared by overlapping runs.
//!
//! The cache key ignores the requested version: the first successful
//! resolution of an id is reused for every later request of that id in the
//! same run, whatever range the later request carries. Call [`Resolver::reset`]
//! between independent runs.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::artifact::metadata::split_dependency_key;
use crate::artifact::{
    ArtifactBundle, ArtifactMeta, ArtifactRef, ArtifactType, ResolvedArtifact, VersionRequest,
};
use crate::error::{ForgeError, Result};
use crate::registry::Registry;


type VisitFuture<'a> = Pin<Box<dyn Future<Output = Result<Arc<ResolvedArtifact>>> + Send + 'a>>;

enum Mark {
    InProgress,
    Resolved(Arc<ResolvedArtifact>),
}

pub struct Resolver {
    registry: Arc<Registry>,
    marks: HashMap<String, Mark>,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            marks: HashMap::new(),
        }
    }

    /// Resolves `reference` and its transitive dependencies.
    pub async fn resolve(&mut self, reference: &ArtifactRef) -> Result<Arc<ResolvedArtifact>> {
        self.visit(reference.clone(), Vec::new()).await
    }

    /// Resolves every reference and flattens the forest so each artifact
    /// appears once, after all of its dependencies. Any failure aborts the
    /// whole batch.
    pub async fn resolve_all(&mut self, refs: &[ArtifactRef]) -> Result<Vec<Arc<ResolvedArtifact>>> {
        let mut roots = Vec::with_capacity(refs.len());
        for reference in refs {
            roots.push(self.resolve(reference).await?);
        }
        Ok(flatten(&roots))
    }

    /// Forgets every cached resolution and in-progress mark.
    pub fn reset(&mut self) {
        self.marks.clear();
    }

    /// Cached resolution for `type:id`, if this run produced one.
    pub fn cached(&self, key: &str) -> Option<Arc<ResolvedArtifact>> {
        match self.marks.get(key) {
            Some(Mark::Resolved(node)) => Some(Arc::clone(node)),
            _ => None,
        }
    }

    fn visit(&mut self, reference: ArtifactRef, chain: Vec<String>) -> VisitFuture<'_> {
        Box::pin(async move {
            let key = reference.key();
            match self.marks.get(&key) {
                Some(Mark::Resolved(node)) => return Ok(Arc::clone(node)),
                Some(Mark::InProgress) => {
                    let start = chain.iter().position(|k| *k == key).unwrap_or(0);
                    let mut cycle = chain[start..].to_vec();
                    cycle.push(key);
                    return Err(ForgeError::CircularDependency { cycle });
                }
                None => {}
            }

            self.marks.insert(key.clone(), Mark::InProgress);
            let result = self.expand(reference, chain, &key).await;
            match &result {
                Ok(node) => {
                    self.marks.insert(key, Mark::Resolved(Arc::clone(node)));
                }
                Err(_) => {
                    self.marks.remove(&key);
                }
            }
            result
        })
    }

    async fn expand(
        &mut self,
        reference: ArtifactRef,
        mut chain: Vec<String>,
        key: &str,
    ) -> Result<Arc<ResolvedArtifact>> {
        let bundle = self.registry.get(&reference).await?;
        check_version(&reference, &bundle)?;

        let wanted = dependency_refs(&bundle.meta);
        debug!(artifact = key, dependencies = wanted.len(), "resolving");

        chain.push(key.to_string());
        let mut dependencies = Vec::with_capacity(wanted.len());
        for dependency in wanted {
            dependencies.push(self.visit(dependency, chain.clone()).await?);
        }

        Ok(Arc::new(ResolvedArtifact {
            reference,
            bundle,
            dependencies,
        }))
    }
}

fn check_version(reference: &ArtifactRef, bundle: &ArtifactBundle) -> Result<()> {
    if reference.is_wildcard() {
        return Ok(());
    }
    let available = bundle.meta.version();
    let satisfied = VersionRequest::parse(&reference.version)
        .map(|request| request.matches(available))
        .unwrap_or(false);
    if satisfied {
        Ok(())
    } else {
        Err(ForgeError::VersionMismatch {
            key: reference.key(),
            requested: reference.version.clone(),
            available: available.to_string(),
        })
    }
}

/// Dependency edges declared by `meta`. Agents additionally depend on every
/// listed skill at any version, unless that skill is already explicit.
pub fn dependency_refs(meta: &ArtifactMeta) -> Vec<ArtifactRef> {
    let mut refs: Vec<ArtifactRef> = meta
        .dependencies()
        .into_iter()
        .flatten()
        .map(|(key, range)| {
            let (kind, id) = split_dependency_key(key);
            ArtifactRef::new(kind, id, range.clone())
        })
        .collect();

    if let ArtifactMeta::Agent(agent) = meta {
        let explicit: HashSet<String> = refs
            .iter()
            .filter(|r| r.kind == ArtifactType::Skill)
            .map(|r| r.id.clone())
            .collect();
        for skill in &agent.skills {
            if !explicit.contains(skill) {
                refs.push(ArtifactRef::any(ArtifactType::Skill, skill.clone()));
            }
        }
    }

    refs
}

/// Depth-first post-order over a resolved forest, de-duplicated by key.
pub fn flatten(roots: &[Arc<ResolvedArtifact>]) -> Vec<Arc<ResolvedArtifact>> {
    fn walk(
        node: &Arc<ResolvedArtifact>,
        seen: &mut HashSet<String>,
        out: &mut Vec<Arc<ResolvedArtifact>>,
    ) {
        if !seen.insert(node.key()) {
            return;
        }
        for dependency in &node.dependencies {
            walk(dependency, seen, out);
        }
        out.push(Arc::clone(node));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for root in roots {
        walk(root, &mut seen, &mut out);
    }
    out
}
