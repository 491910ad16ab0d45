pub mod composite;
pub mod filesystem;
pub mod git;

pub use composite::CompositeAdapter;
pub use filesystem::FilesystemAdapter;
pub use git::{GitAdapter, GitSourceOptions};

use std::future::Future;
use std::pin::Pin;

use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::Result;

pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One origin of raw artifact bundles: a local directory, a git checkout, or
/// a priority-ordered fan-out over several of those.
///
/// Implementations are run-scoped and must not be shared between concurrently
/// overlapping installs.
pub trait DataAdapter: Send + Sync {
    /// Source name used in logs, errors and the lockfile.
    fn name(&self) -> &str;

    /// Metadata of every valid artifact of `kind`. Invalid entries are skipped.
    fn list(&self, kind: ArtifactType) -> AdapterFuture<'_, Vec<ArtifactMeta>>;

    /// Fails with `NotFound` when the artifact is absent.
    fn read<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, ArtifactBundle>;

    fn exists<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, bool>;

    fn write<'a>(
        &'a self,
        kind: ArtifactType,
        id: &'a str,
        bundle: &'a ArtifactBundle,
    ) -> AdapterFuture<'a, ()>;
}
