#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use forge::adapters::FilesystemAdapter;
use forge::adapters::filesystem::METADATA_FILE;
use forge::compiler::Compiler;
use forge::{ArtifactType, Forge, WorkspaceConfig};

/// A filesystem registry and an empty workspace, both in temp dirs.
pub struct Harness {
    pub registry: TempDir,
    pub workspace: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            registry: TempDir::new().expect("registry dir"),
            workspace: TempDir::new().expect("workspace dir"),
        }
    }

    pub fn put(&self, kind: ArtifactType, id: &str, meta: &str, content: &str) {
        put_artifact(self.registry.path(), kind, id, meta, content);
    }

    pub fn put_skill(&self, id: &str, version: &str, deps: &[(&str, &str)], content: &str) {
        self.put(ArtifactType::Skill, id, &meta(id, version, "", deps), content);
    }

    pub fn forge(&self) -> Forge {
        self.forge_installing(&[])
    }

    /// Forge whose `forge.toml` install list is `install`.
    pub fn forge_installing(&self, install: &[&str]) -> Forge {
        let config = WorkspaceConfig {
            workspace_dir: self.workspace.path().to_path_buf(),
            install: install.iter().map(ToString::to_string).collect(),
            ..WorkspaceConfig::default()
        };
        Forge::new(
            config,
            Box::new(FilesystemAdapter::new("local", self.registry.path())),
            Compiler::with_builtin_targets(),
        )
    }

    pub fn ws(&self, relative: &str) -> PathBuf {
        self.workspace.path().join(relative)
    }

    pub fn read_ws(&self, relative: &str) -> String {
        std::fs::read_to_string(self.ws(relative)).expect("workspace file")
    }
}

pub fn put_artifact(root: &Path, kind: ArtifactType, id: &str, meta: &str, content: &str) {
    let dir = root.join(kind.dir_name()).join(id);
    std::fs::create_dir_all(&dir).expect("artifact dir");
    std::fs::write(dir.join(METADATA_FILE), meta).expect("metadata");
    std::fs::write(dir.join(kind.content_file_name()), content).expect("content");
}

pub fn meta(id: &str, version: &str, description: &str, deps: &[(&str, &str)]) -> String {
    let mut text = format!(
        "id = \"{id}\"\nname = \"{id}\"\nversion = \"{version}\"\ndescription = \"{description}\"\n"
    );
    if !deps.is_empty() {
        text.push_str("\n[dependencies]\n");
        for (dep, range) in deps {
            text.push_str(&format!("\"{dep}\" = \"{range}\"\n"));
        }
    }
    text
}
