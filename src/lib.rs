#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod adapters;
pub mod artifact;
pub mod compiler;
pub mod config;
pub mod error;
pub mod install;
pub mod registry;
pub mod resolver;
pub mod workspace;

pub use artifact::{ArtifactBundle, ArtifactMeta, ArtifactRef, ArtifactType, ResolvedArtifact};
pub use config::WorkspaceConfig;
pub use error::{ForgeError, Result};
pub use install::{Forge, InstallOptions, InstallReport};
