//! Directory-tree registry: `{root}/{type-dir}/{id}/metadata.toml` plus one
//! fixed content file per type.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{AdapterFuture, DataAdapter};
use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType, is_kebab_case};
use crate::error::{ForgeError, Result};

pub const METADATA_FILE: &str = "metadata.toml";

pub struct FilesystemAdapter {
    name: String,
    root: PathBuf,
}

impl FilesystemAdapter {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn type_dir(&self, kind: ArtifactType) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    fn artifact_dir(&self, kind: ArtifactType, id: &str) -> PathBuf {
        self.type_dir(kind).join(id)
    }

    async fn load_meta(&self, kind: ArtifactType, dir: &Path) -> Result<ArtifactMeta> {
        let path = dir.join(METADATA_FILE);
        let invalid = |reason: String| ForgeError::InvalidMetadata {
            path: path.display().to_string(),
            reason,
        };

        let text = tokio::fs::read_to_string(&path).await?;
        let meta = ArtifactMeta::parse_toml(kind, &text).map_err(invalid)?;

        let dir_name = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if meta.id() != dir_name {
            return Err(invalid(format!(
                "id '{}' does not match directory '{dir_name}'",
                meta.id()
            )));
        }
        Ok(meta)
    }

    async fn list_kind(&self, kind: ArtifactType) -> Result<Vec<ArtifactMeta>> {
        let type_dir = self.type_dir(kind);
        let mut entries = match tokio::fs::read_dir(&type_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut metas = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir = entry.path();
            if !tokio::fs::try_exists(dir.join(METADATA_FILE)).await? {
                debug!(adapter = %self.name, path = %dir.display(), "no metadata file, skipping");
                continue;
            }
            match self.load_meta(kind, &dir).await {
                Ok(meta) => metas.push(meta),
                Err(e) => {
                    warn!(adapter = %self.name, error = %e, "skipping invalid artifact");
                }
            }
        }

        metas.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(metas)
    }

    async fn read_bundle(&self, kind: ArtifactType, id: &str) -> Result<ArtifactBundle> {
        let not_found = || ForgeError::NotFound {
            kind,
            id: id.to_string(),
        };
        if !is_kebab_case(id) {
            return Err(not_found());
        }

        let dir = self.artifact_dir(kind, id);
        if !tokio::fs::try_exists(dir.join(METADATA_FILE)).await? {
            return Err(not_found());
        }
        let meta = self.load_meta(kind, &dir).await?;

        let content_path = dir.join(kind.content_file_name());
        let content = match tokio::fs::read_to_string(&content_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ForgeError::InvalidMetadata {
                    path: content_path.display().to_string(),
                    reason: format!("missing content file {}", kind.content_file_name()),
                });
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ArtifactBundle::new(meta, content).with_source(&self.name))
    }

    async fn write_bundle(
        &self,
        kind: ArtifactType,
        id: &str,
        bundle: &ArtifactBundle,
    ) -> Result<()> {
        if !is_kebab_case(id) {
            return Err(ForgeError::InvalidReference {
                input: id.to_string(),
                reason: "id must be kebab-case".into(),
            });
        }
        let dir = self.artifact_dir(kind, id);
        if bundle.meta.kind() != kind || bundle.meta.id() != id {
            return Err(ForgeError::InvalidMetadata {
                path: dir.join(METADATA_FILE).display().to_string(),
                reason: format!(
                    "bundle describes {}:{} but was published as {kind}:{id}",
                    bundle.meta.kind(),
                    bundle.meta.id()
                ),
            });
        }

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(METADATA_FILE), bundle.meta.to_toml()?).await?;
        tokio::fs::write(dir.join(kind.content_file_name()), &bundle.content).await?;
        debug!(adapter = %self.name, path = %dir.display(), "wrote artifact");
        Ok(())
    }
}

impl DataAdapter for FilesystemAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, kind: ArtifactType) -> AdapterFuture<'_, Vec<ArtifactMeta>> {
        Box::pin(self.list_kind(kind))
    }

    fn read<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, ArtifactBundle> {
        Box::pin(self.read_bundle(kind, id))
    }

    fn exists<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, bool> {
        Box::pin(async move {
            if !is_kebab_case(id) {
                return Ok(false);
            }
            let path = self.artifact_dir(kind, id).join(METADATA_FILE);
            Ok(tokio::fs::try_exists(path).await?)
        })
    }

    fn write<'a>(
        &'a self,
        kind: ArtifactType,
        id: &'a str,
        bundle: &'a ArtifactBundle,
    ) -> AdapterFuture<'a, ()> {
        Box::pin(self.write_bundle(kind, id, bundle))
    }
}
