use tempfile::TempDir;

use forge::adapters::{CompositeAdapter, DataAdapter, FilesystemAdapter};
use forge::compiler::Compiler;
use forge::{ArtifactType, Forge, ForgeError, InstallOptions, WorkspaceConfig};

use crate::registry_harness::{meta, put_artifact};

fn two_sources() -> (TempDir, TempDir) {
    let high = TempDir::new().unwrap();
    let low = TempDir::new().unwrap();
    put_artifact(
        high.path(),
        ArtifactType::Skill,
        "shared",
        &meta("shared", "1.0.0", "from-high-priority", &[]),
        "high",
    );
    put_artifact(
        low.path(),
        ArtifactType::Skill,
        "shared",
        &meta("shared", "1.0.0", "from-low-priority", &[]),
        "low",
    );
    put_artifact(
        low.path(),
        ArtifactType::Skill,
        "only-low",
        &meta("only-low", "1.0.0", "", &[]),
        "only low",
    );
    (high, low)
}

fn composite(high: &TempDir, low: &TempDir) -> CompositeAdapter {
    CompositeAdapter::new(
        vec![
            Box::new(FilesystemAdapter::new("high", high.path())),
            Box::new(FilesystemAdapter::new("low", low.path())),
        ],
        0,
    )
    .unwrap()
}

#[tokio::test]
async fn higher_priority_source_wins_list_and_read() {
    let (high, low) = two_sources();
    let adapter = composite(&high, &low);

    let listed = adapter.list(ArtifactType::Skill).await.unwrap();
    let shared: Vec<_> = listed.iter().filter(|m| m.id() == "shared").collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].base().description, "from-high-priority");
    assert_eq!(listed.len(), 2);

    let bundle = adapter.read(ArtifactType::Skill, "shared").await.unwrap();
    assert_eq!(bundle.content, "high");
    assert_eq!(bundle.source, "high");

    let fallback = adapter.read(ArtifactType::Skill, "only-low").await.unwrap();
    assert_eq!(fallback.source, "low");
}

#[tokio::test]
async fn read_missing_everywhere_lists_attempted_sources() {
    let (high, low) = two_sources();
    let adapter = composite(&high, &low);

    let err = adapter.read(ArtifactType::Agent, "ghost").await.unwrap_err();
    let ForgeError::AllAdaptersFailed { attempted, .. } = err else {
        panic!("expected AllAdaptersFailed");
    };
    assert_eq!(attempted, vec!["high", "low"]);
}

#[tokio::test]
async fn lockfile_records_the_source_that_served_each_artifact() {
    let (high, low) = two_sources();
    let workspace = TempDir::new().unwrap();
    let config = WorkspaceConfig {
        workspace_dir: workspace.path().to_path_buf(),
        ..WorkspaceConfig::default()
    };
    let mut forge = Forge::new(
        config,
        Box::new(composite(&high, &low)),
        Compiler::with_builtin_targets(),
    );

    forge
        .install(InstallOptions {
            refs: vec!["shared".parse().unwrap(), "only-low".parse().unwrap()],
            ..InstallOptions::default()
        })
        .await
        .unwrap();

    let lock = forge::workspace::LockFile::load(workspace.path()).await.unwrap();
    assert_eq!(lock.artifacts["skill:shared"].registry_source_name, "high");
    assert_eq!(lock.artifacts["skill:only-low"].registry_source_name, "low");
}

#[tokio::test]
async fn forge_toml_builds_the_same_stack() {
    let (high, low) = two_sources();
    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join("forge.toml"),
        format!(
            "install = [\"shared\"]\n\n[[registries]]\ntype = \"filesystem\"\nname = \"high\"\npath = \"{}\"\n\n[[registries]]\ntype = \"filesystem\"\nname = \"low\"\npath = \"{}\"\n",
            high.path().display(),
            low.path().display()
        ),
    )
    .unwrap();

    let mut forge = Forge::open(workspace.path()).unwrap();
    assert_eq!(forge.registry().source_name(), "composite(high,low)");

    let report = forge.install(InstallOptions::default()).await.unwrap();
    assert_eq!(report.installed_refs.len(), 1);
    let written = std::fs::read_to_string(
        workspace.path().join(".claude/skills/shared/SKILL.md"),
    )
    .unwrap();
    assert_eq!(written, "high");
}
