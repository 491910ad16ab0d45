//! Workspace configuration: `forge.toml`, `FORGE_*` environment overrides and
//! construction of the registry adapter stack.

mod env_overrides;
mod loader;
pub mod schema;
mod sources;
#[cfg(test)]
mod test_env;

pub use schema::{
    CONFIG_FILE_NAME, DEFAULT_TARGET, FilesystemSource, GitSource, HttpSource,
    RegistryDescriptor, WorkspaceConfig,
};
