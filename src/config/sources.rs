//! Turns `[[registries]]` descriptors into a [`DataAdapter`].

use std::path::PathBuf;

use directories::ProjectDirs;

use super::schema::{FilesystemSource, GitSource, RegistryDescriptor, WorkspaceConfig};
use crate::adapters::{CompositeAdapter, DataAdapter, FilesystemAdapter, GitAdapter, GitSourceOptions};
use crate::error::{ForgeError, Result};

impl WorkspaceConfig {
    /// Root under which git sources are checked out.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(self.expand_path(dir));
        }
        ProjectDirs::from("", "", "forge")
            .map(|dirs| dirs.cache_dir().join("registries"))
            .ok_or_else(|| ForgeError::Config {
                message: "could not determine a cache directory".into(),
                suggestion: Some("set cache_dir in forge.toml or FORGE_CACHE_DIR".into()),
            })
    }

    /// One descriptor becomes that adapter; several become a composite in
    /// declared order whose writable member is the first marked `writable`.
    pub fn build_adapter(&self) -> Result<Box<dyn DataAdapter>> {
        if self.registries.is_empty() {
            return Err(ForgeError::Config {
                message: "no registries configured".into(),
                suggestion: Some(
                    "add a [[registries]] entry to forge.toml, e.g. type = \"filesystem\", name = \"local\", path = \"./registry\""
                        .into(),
                ),
            });
        }

        let mut adapters = Vec::with_capacity(self.registries.len());
        for descriptor in &self.registries {
            adapters.push(self.build_one(descriptor)?);
        }

        if adapters.len() == 1 {
            return Ok(adapters.remove(0));
        }
        let writable = self
            .registries
            .iter()
            .position(RegistryDescriptor::writable)
            .unwrap_or(0);
        Ok(Box::new(CompositeAdapter::new(adapters, writable)?))
    }

    fn build_one(&self, descriptor: &RegistryDescriptor) -> Result<Box<dyn DataAdapter>> {
        match descriptor {
            RegistryDescriptor::Filesystem(FilesystemSource { name, path, .. }) => Ok(Box::new(
                FilesystemAdapter::new(name.clone(), self.expand_path(path)),
            )),
            RegistryDescriptor::Git(source) => {
                let options = git_options(source);
                Ok(Box::new(GitAdapter::new(
                    source.name.clone(),
                    options,
                    &self.cache_root()?,
                )))
            }
            RegistryDescriptor::Http(source) => Err(ForgeError::Config {
                message: format!("registry '{}': http sources are not supported", source.name),
                suggestion: Some("use a filesystem or git registry".into()),
            }),
        }
    }

    fn expand_path(&self, raw: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(raw).into_owned());
        if expanded.is_absolute() {
            expanded
        } else {
            self.workspace_dir.join(expanded)
        }
    }
}

fn git_options(source: &GitSource) -> GitSourceOptions {
    let mut options = GitSourceOptions::new(&source.url);
    options.git_ref.clone_from(&source.git_ref);
    options.token_env.clone_from(&source.token_env);
    options.sparse_paths.clone_from(&source.sparse);
    options
}
