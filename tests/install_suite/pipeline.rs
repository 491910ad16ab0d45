use std::path::PathBuf;

use forge::artifact::{ArtifactMeta, ArtifactRef, ArtifactType};
use forge::workspace::LockFile;
use forge::{ArtifactBundle, ForgeError, InstallOptions};

use crate::registry_harness::{Harness, meta};

fn refs(raw: &[&str]) -> Vec<ArtifactRef> {
    raw.iter().map(|r| r.parse().unwrap()).collect()
}

#[tokio::test]
async fn dependency_is_installed_before_dependent() {
    let h = Harness::new();
    h.put_skill("b-skill", "1.0.0", &[], "b body");
    h.put_skill("a-skill", "1.0.0", &[("b-skill", "1.0.0")], "a body");

    let mut forge = h.forge();
    let report = forge
        .install(InstallOptions {
            refs: refs(&["skill:a-skill@1.0.0"]),
            ..InstallOptions::default()
        })
        .await
        .unwrap();

    let installed: Vec<String> = report.installed_refs.iter().map(ArtifactRef::key).collect();
    assert_eq!(installed, vec!["skill:b-skill", "skill:a-skill"]);
    assert_eq!(
        report.files_written,
        vec![
            PathBuf::from(".claude/skills/b-skill/SKILL.md"),
            PathBuf::from(".claude/skills/a-skill/SKILL.md"),
        ]
    );
    assert!(report.conflicts.is_empty());
    assert_eq!(h.read_ws(".claude/skills/a-skill/SKILL.md"), "a body");

    let lock = LockFile::load(h.workspace.path()).await.unwrap();
    let entry = &lock.artifacts["skill:b-skill"];
    assert_eq!(entry.registry_source_name, "local");
    assert_eq!(entry.files, vec![PathBuf::from(".claude/skills/b-skill/SKILL.md")]);
}

#[tokio::test]
async fn reinstall_overwrites_owned_files_without_conflict() {
    let h = Harness::new();
    h.put_skill("lint", "1.0.0", &[], "v1");
    let mut forge = h.forge();
    let options = InstallOptions {
        refs: refs(&["lint"]),
        ..InstallOptions::default()
    };
    forge.install(options.clone()).await.unwrap();

    h.put_skill("lint", "1.1.0", &[], "v2");
    let report = forge.install(options).await.unwrap();

    assert!(report.conflicts.is_empty());
    assert_eq!(h.read_ws(".claude/skills/lint/SKILL.md"), "v2");
    let lock = LockFile::load(h.workspace.path()).await.unwrap();
    assert_eq!(lock.artifacts["skill:lint"].version, "1.1.0");
}

#[tokio::test]
async fn files_no_longer_produced_are_pruned() {
    let h = Harness::new();
    h.put_skill("old", "1.0.0", &[], "old");
    h.put_skill("new", "1.0.0", &[], "new");
    let mut forge = h.forge();

    forge
        .install(InstallOptions {
            refs: refs(&["old"]),
            ..InstallOptions::default()
        })
        .await
        .unwrap();
    assert!(h.ws(".claude/skills/old/SKILL.md").exists());

    let report = forge
        .install(InstallOptions {
            refs: refs(&["new"]),
            clean: Some(true),
            ..InstallOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(report.removed, vec![PathBuf::from(".claude/skills/old/SKILL.md")]);
    assert!(!h.ws(".claude/skills/old/SKILL.md").exists());

    let lock = LockFile::load(h.workspace.path()).await.unwrap();
    assert_eq!(lock.artifacts.keys().collect::<Vec<_>>(), vec!["skill:new"]);
}

#[tokio::test]
async fn explicit_refs_keep_other_installed_files_by_default() {
    let h = Harness::new();
    h.put_skill("lint", "1.0.0", &[], "lint");
    h.put_skill("fmt", "1.0.0", &[], "fmt");

    let mut forge = h.forge_installing(&["lint", "fmt"]);
    forge.install(InstallOptions::default()).await.unwrap();

    let report = forge
        .install(InstallOptions {
            refs: refs(&["lint"]),
            ..InstallOptions::default()
        })
        .await
        .unwrap();
    assert!(report.removed.is_empty());
    assert!(h.ws(".claude/skills/fmt/SKILL.md").exists());
}

#[tokio::test]
async fn config_driven_install_prunes_dropped_artifacts() {
    let h = Harness::new();
    h.put_skill("lint", "1.0.0", &[], "lint");
    h.put_skill("fmt", "1.0.0", &[], "fmt");
    h.forge_installing(&["lint", "fmt"])
        .install(InstallOptions::default())
        .await
        .unwrap();

    let report = h
        .forge_installing(&["lint"])
        .install(InstallOptions::default())
        .await
        .unwrap();
    assert_eq!(report.removed, vec![PathBuf::from(".claude/skills/fmt/SKILL.md")]);
    assert!(!h.ws(".claude/skills/fmt/SKILL.md").exists());
    assert!(h.ws(".claude/skills/lint/SKILL.md").exists());
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let h = Harness::new();
    h.put_skill("lint", "1.0.0", &[], "x");
    let mut forge = h.forge();

    let report = forge
        .install(InstallOptions {
            refs: refs(&["lint"]),
            target: Some("cursor".into()),
            dry_run: true,
            ..InstallOptions::default()
        })
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.files_written, vec![PathBuf::from(".cursor/rules/lint.mdc")]);
    assert!(!h.ws(".cursor/rules/lint.mdc").exists());
    assert!(!LockFile::path(h.workspace.path()).exists());
}

#[tokio::test]
async fn agent_pulls_in_listed_skills() {
    let h = Harness::new();
    h.put_skill("review", "2.0.0", &[], "review");
    h.put(
        ArtifactType::Agent,
        "reviewer",
        "id = \"reviewer\"\nname = \"Reviewer\"\nversion = \"1.0.0\"\nskills = [\"review\"]\n",
        "agent body",
    );

    let mut forge = h.forge();
    let resolved = forge.resolve(&"agent:reviewer".parse().unwrap()).await.unwrap();
    assert_eq!(resolved.dependencies.len(), 1);
    assert_eq!(resolved.dependencies[0].key(), "skill:review");
}

#[tokio::test]
async fn cycle_aborts_install_and_writes_nothing() {
    let h = Harness::new();
    h.put_skill("ping", "1.0.0", &[("pong", "*")], "");
    h.put_skill("pong", "1.0.0", &[("ping", "*")], "");

    let mut forge = h.forge();
    let err = forge
        .install(InstallOptions {
            refs: refs(&["ping"]),
            ..InstallOptions::default()
        })
        .await
        .unwrap_err();

    let ForgeError::CircularDependency { cycle } = &err else {
        panic!("expected a cycle, got {err}");
    };
    assert_eq!(cycle, &["skill:ping", "skill:pong", "skill:ping"]);
    assert_eq!(err.code(), "CIRCULAR_DEPENDENCY");
    assert!(!LockFile::path(h.workspace.path()).exists());
}

#[tokio::test]
async fn version_mismatch_reports_requested_and_available() {
    let h = Harness::new();
    h.put_skill("lint", "1.0.0", &[], "");

    let mut forge = h.forge();
    let err = forge
        .resolve(&"lint@>=2.0.0".parse().unwrap())
        .await
        .unwrap_err();
    let ForgeError::VersionMismatch { requested, available, .. } = err else {
        panic!("expected VersionMismatch");
    };
    assert_eq!(requested, ">=2.0.0");
    assert_eq!(available, "1.0.0");
}

#[tokio::test]
async fn empty_install_list_is_a_config_error() {
    let h = Harness::new();
    let mut forge = h.forge();
    let err = forge.install(InstallOptions::default()).await.unwrap_err();
    assert_eq!(err.code(), "CONFIG_ERROR");
    assert!(err.suggestion().is_some());
}

#[tokio::test]
async fn publish_then_discover() {
    let h = Harness::new();
    let forge = h.forge();

    let text = meta("fmt", "0.3.0", "formats code", &[]);
    let bundle = ArtifactBundle::new(ArtifactMeta::parse_toml(ArtifactType::Skill, &text).unwrap(), "fmt body");
    forge.publish(ArtifactType::Skill, "fmt", &bundle).await.unwrap();

    let hits = forge.search("format", None).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].summary.reference.id, "fmt");

    let listed = forge.list(Some(ArtifactType::Skill)).await;
    assert_eq!(listed.len(), 1);

    let mismatched = forge.publish(ArtifactType::Agent, "fmt", &bundle).await.unwrap_err();
    assert_eq!(mismatched.code(), "INVALID_METADATA");
}
