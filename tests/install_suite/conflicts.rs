use std::path::{Path, PathBuf};

use forge::artifact::ArtifactType;
use forge::workspace::{ConflictStrategy, Resolution};
use forge::InstallOptions;

use crate::registry_harness::{Harness, meta};

fn workspace_config_harness() -> Harness {
    let h = Harness::new();
    h.put(
        ArtifactType::WorkspaceConfig,
        "team",
        &meta("team", "1.0.0", "", &[]),
        "forge content",
    );
    std::fs::write(h.ws("CLAUDE.md"), "keep me").unwrap();
    h
}

async fn install_team(h: &Harness, strategy: ConflictStrategy) -> forge::InstallReport {
    h.forge()
        .install(InstallOptions {
            refs: vec!["workspace-config:team".parse().unwrap()],
            conflict_strategy: Some(strategy),
            ..InstallOptions::default()
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn backup_keeps_original_next_to_new_content() {
    let h = workspace_config_harness();
    let report = install_team(&h, ConflictStrategy::Backup).await;

    assert_eq!(h.read_ws("CLAUDE.md"), "forge content");
    assert_eq!(h.read_ws("CLAUDE.md.bak"), "keep me");
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].resolution, Resolution::Backup);
    assert_eq!(
        report.conflicts[0].backup_path.as_deref(),
        Some(Path::new("CLAUDE.md.bak"))
    );
}

#[tokio::test]
async fn skip_and_prompt_leave_unmanaged_file_untouched() {
    for strategy in [ConflictStrategy::Skip, ConflictStrategy::Prompt] {
        let h = workspace_config_harness();
        let report = install_team(&h, strategy).await;

        assert_eq!(h.read_ws("CLAUDE.md"), "keep me");
        assert!(report.files_written.is_empty());
        assert_eq!(report.conflicts[0].resolution, Resolution::Skip);
    }
}

#[tokio::test]
async fn overwrite_replaces_without_backup() {
    let h = workspace_config_harness();
    let report = install_team(&h, ConflictStrategy::Overwrite).await;

    assert_eq!(h.read_ws("CLAUDE.md"), "forge content");
    assert!(!h.ws("CLAUDE.md.bak").exists());
    assert_eq!(report.files_written, vec![PathBuf::from("CLAUDE.md")]);
}

#[tokio::test]
async fn workspace_configs_never_become_owned() {
    let h = workspace_config_harness();
    install_team(&h, ConflictStrategy::Overwrite).await;

    // Not locked, so a second install conflicts again.
    let report = install_team(&h, ConflictStrategy::Skip).await;
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(h.read_ws("CLAUDE.md"), "forge content");
}

#[tokio::test]
async fn skipped_skill_is_not_recorded_as_owned() {
    let h = Harness::new();
    h.put_skill("lint", "1.0.0", &[], "forge content");
    std::fs::create_dir_all(h.ws(".claude/skills/lint")).unwrap();
    std::fs::write(h.ws(".claude/skills/lint/SKILL.md"), "mine").unwrap();

    h.forge()
        .install(InstallOptions {
            refs: vec!["lint".parse().unwrap()],
            ..InstallOptions::default()
        })
        .await
        .unwrap();

    let lock = forge::workspace::LockFile::load(h.workspace.path()).await.unwrap();
    assert!(lock.artifacts["skill:lint"].files.is_empty());
    assert_eq!(h.read_ws(".claude/skills/lint/SKILL.md"), "mine");
}
