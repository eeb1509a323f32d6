// SPDX-License-Identifier: MIT

use super::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Build a throwaway git repository with one commit on `main`, skipping
/// the test entirely if `git` is not on PATH (CI sandboxes may lack it).
fn init_repo() -> Option<TempDir> {
    if Command::new("git").arg("--version").output().is_err() {
        return None;
    }
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    let run = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(root)
            .status()
            .expect("git invocation");
        assert!(status.success(), "git {args:?} failed");
    };
    run(&["init", "-b", "main"]);
    run(&["config", "user.email", "orc@example.com"]);
    run(&["config", "user.name", "orc"]);
    fs::write(root.join("README.md"), "seed\n").unwrap();
    run(&["add", "."]);
    run(&["commit", "-m", "seed"]);
    Some(dir)
}

#[tokio::test]
async fn create_produces_a_checked_out_branch_at_head() {
    let Some(repo) = init_repo() else { return };
    let mgr = WorktreeManager::new(repo.path(), ProcessSupervisor::new());
    let token = CancellationToken::new();
    let task_id = TaskId::from("t-1");

    let info = mgr.create(&token, &task_id, "main").await.unwrap();

    assert!(info.path.exists());
    assert_eq!(info.branch, "task/t-1");
    assert!(!info.head_commit.is_empty());
    assert_eq!(mgr.list().len(), 1);
}

#[tokio::test]
async fn merge_with_no_divergence_is_clean() {
    let Some(repo) = init_repo() else { return };
    let mgr = WorktreeManager::new(repo.path(), ProcessSupervisor::new());
    let token = CancellationToken::new();
    let task_id = TaskId::from("t-1");

    let info = mgr.create(&token, &task_id, "main").await.unwrap();
    fs::write(info.path.join("new_file.txt"), "hello\n").unwrap();
    let commit = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(&info.path)
            .status()
            .unwrap();
        assert!(status.success());
    };
    commit(&["add", "."]);
    commit(&["commit", "-m", "add file"]);

    let outcome = mgr.merge(&token, &info, "main").await.unwrap();
    assert!(!outcome.conflict);
    assert!(repo.path().join("new_file.txt").exists());
}

#[tokio::test]
async fn merge_conflict_is_reported_not_fatal() {
    let Some(repo) = init_repo() else { return };
    let mgr = WorktreeManager::new(repo.path(), ProcessSupervisor::new());
    let token = CancellationToken::new();

    let commit_on = |dir: &Path, text: &str| {
        fs::write(dir.join("README.md"), text).unwrap();
        for args in [vec!["add", "."], vec!["commit", "-m", "conflict"]] {
            let status = Command::new("git").args(&args).current_dir(dir).status().unwrap();
            assert!(status.success());
        }
    };

    // Diverge main itself so the worktree's branch conflicts on merge.
    commit_on(repo.path(), "changed on main\n");

    let task_id = TaskId::from("t-1");
    let info = mgr.create(&token, &task_id, "main~1").await.unwrap();
    commit_on(&info.path, "changed on task branch\n");

    let outcome = mgr.merge(&token, &info, "main").await.unwrap();
    assert!(outcome.conflict);
    assert_eq!(outcome.conflicting_files, vec!["README.md".to_string()]);

    // Repo must be left in a clean, mergeable state afterward.
    let status = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(repo.path())
        .output()
        .unwrap();
    assert!(status.stdout.is_empty());
}

#[tokio::test]
async fn concurrent_merges_are_serialized_through_the_merge_lock() {
    let Some(repo) = init_repo() else { return };
    let mgr = WorktreeManager::new(repo.path(), ProcessSupervisor::new());
    let token = CancellationToken::new();

    let commit = |dir: &Path| {
        for args in [vec!["add", "."], vec!["commit", "-m", "add"]] {
            let status = Command::new("git").args(&args).current_dir(dir).status().unwrap();
            assert!(status.success());
        }
    };

    let info_a = mgr.create(&token, &TaskId::from("t-a"), "main").await.unwrap();
    fs::write(info_a.path.join("a.txt"), "a\n").unwrap();
    commit(&info_a.path);

    let info_b = mgr.create(&token, &TaskId::from("t-b"), "main").await.unwrap();
    fs::write(info_b.path.join("b.txt"), "b\n").unwrap();
    commit(&info_b.path);

    // Both target the same base checkout at once; the merge lock must
    // serialize them so neither's checkout/merge pair races the other's.
    let (outcome_a, outcome_b) = tokio::join!(
        mgr.merge(&token, &info_a, "main"),
        mgr.merge(&token, &info_b, "main"),
    );

    assert!(!outcome_a.unwrap().conflict);
    assert!(!outcome_b.unwrap().conflict);
    assert!(repo.path().join("a.txt").exists());
    assert!(repo.path().join("b.txt").exists());
}

#[tokio::test]
async fn cleanup_removes_worktree_and_branch() {
    let Some(repo) = init_repo() else { return };
    let mgr = WorktreeManager::new(repo.path(), ProcessSupervisor::new());
    let token = CancellationToken::new();
    let task_id = TaskId::from("t-1");

    let info = mgr.create(&token, &task_id, "main").await.unwrap();
    mgr.cleanup(&token, &info).await.unwrap();

    assert!(!info.path.exists());
    assert!(mgr.list().is_empty());
}

#[tokio::test]
async fn force_cleanup_discards_uncommitted_changes() {
    let Some(repo) = init_repo() else { return };
    let mgr = WorktreeManager::new(repo.path(), ProcessSupervisor::new());
    let token = CancellationToken::new();
    let task_id = TaskId::from("t-1");

    let info = mgr.create(&token, &task_id, "main").await.unwrap();
    fs::write(info.path.join("dirty.txt"), "uncommitted\n").unwrap();

    mgr.force_cleanup(&token, &info).await.unwrap();
    assert!(!info.path.exists());
}
