// SPDX-License-Identifier: MIT

//! Worktree Manager (spec §4.E). Every task runs in its own `git worktree`
//! on a disposable branch so parallel agents never collide on the
//! checked-out working tree, only on the files a merge touches.

use crate::error::WorktreeError;
use orc_core::{TaskId, WorktreeInfo};
use orc_adapters::{ExecuteRequest, ProcessSupervisor};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

/// Outcome of merging a task's branch back into the integration branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub conflict: bool,
    /// Paths reported by git as unmerged, populated only when `conflict`
    /// is true.
    pub conflicting_files: Vec<String>,
}

/// Creates, merges, and tears down per-task git worktrees beneath
/// `repo_root`.
pub struct WorktreeManager {
    repo_root: PathBuf,
    worktrees_dir: PathBuf,
    supervisor: ProcessSupervisor,
    known: RwLock<HashMap<TaskId, WorktreeInfo>>,
    /// Serializes every `merge` against the shared base checkout — only
    /// one merge may touch `repo_root`'s working tree at a time.
    merge_lock: AsyncMutex<()>,
}

impl WorktreeManager {
    pub fn new(repo_root: impl Into<PathBuf>, supervisor: ProcessSupervisor) -> Self {
        let repo_root = repo_root.into();
        let worktrees_dir = repo_root.join(".orc").join("worktrees");
        Self {
            repo_root,
            worktrees_dir,
            supervisor,
            known: RwLock::new(HashMap::new()),
            merge_lock: AsyncMutex::new(()),
        }
    }

    async fn git(&self, token: &CancellationToken, args: &[&str]) -> Result<String, WorktreeError> {
        self.git_in(token, &self.repo_root.clone(), args).await
    }

    async fn git_in(
        &self,
        token: &CancellationToken,
        cwd: &Path,
        args: &[&str],
    ) -> Result<String, WorktreeError> {
        let req = ExecuteRequest::new("git", cwd).args(args.iter().map(|s| s.to_string()));
        let out = self.supervisor.execute(token.clone(), req).await?;
        Ok(out.stdout_string())
    }

    /// Create a new worktree for `task_id`, branched from `base_branch`.
    pub async fn create(
        &self,
        token: &CancellationToken,
        task_id: &TaskId,
        base_branch: &str,
    ) -> Result<WorktreeInfo, WorktreeError> {
        let branch = WorktreeInfo::branch_name_for(task_id);
        let path = self.worktrees_dir.join(task_id.as_str());

        self.git(
            token,
            &[
                "worktree",
                "add",
                "-b",
                &branch,
                path.to_string_lossy().as_ref(),
                base_branch,
            ],
        )
        .await?;

        let head = self
            .git_in(token, &path, &["rev-parse", "HEAD"])
            .await?
            .trim()
            .to_string();

        let info = WorktreeInfo::new(path, branch, task_id.clone(), head);
        self.known.write().insert(task_id.clone(), info.clone());
        tracing::info!(task_id = %task_id, branch = %info.branch, "created worktree");
        Ok(info)
    }

    /// Merge a task's branch into `target_branch` inside the main
    /// checkout. Serialized by `merge_lock` so only one merge ever touches
    /// the shared base checkout at a time. Performs a dry-run merge first:
    /// on conflict the merge is cleanly aborted and `conflict` is reported
    /// `true` with the list of conflicting paths — never treated as a
    /// fatal error, per the task lifecycle's soft-failure policy for
    /// review/merge steps.
    pub async fn merge(
        &self,
        token: &CancellationToken,
        info: &WorktreeInfo,
        target_branch: &str,
    ) -> Result<MergeOutcome, WorktreeError> {
        let _merge_guard = tokio::select! {
            guard = self.merge_lock.lock() => guard,
            _ = token.cancelled() => return Err(WorktreeError::Cancelled),
        };

        self.git(token, &["checkout", target_branch]).await?;

        let dry_run = self
            .git(token, &["merge", "--no-commit", "--no-ff", &info.branch])
            .await;

        match dry_run {
            Ok(_) => {
                self.git(token, &["commit", "--no-edit"]).await?;
                tracing::info!(task_id = %info.task_id, "merged worktree branch cleanly");
                Ok(MergeOutcome {
                    conflict: false,
                    conflicting_files: Vec::new(),
                })
            }
            Err(WorktreeError::Git(_)) => {
                let conflicting_files = self.conflicting_files(token).await?;
                tracing::warn!(task_id = %info.task_id, files = ?conflicting_files, "merge conflict, aborting merge");
                self.git(token, &["merge", "--abort"]).await?;
                Ok(MergeOutcome {
                    conflict: true,
                    conflicting_files,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// List paths git considers unmerged in the current working tree.
    async fn conflicting_files(&self, token: &CancellationToken) -> Result<Vec<String>, WorktreeError> {
        let out = self
            .git(token, &["diff", "--name-only", "--diff-filter=U"])
            .await?;
        Ok(out.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    /// Remove a worktree and its branch. Fails if the worktree has
    /// uncommitted changes; use `force_cleanup` to discard those.
    pub async fn cleanup(
        &self,
        token: &CancellationToken,
        info: &WorktreeInfo,
    ) -> Result<(), WorktreeError> {
        self.git(token, &["worktree", "remove", info.path.to_string_lossy().as_ref()])
            .await?;
        self.git(token, &["branch", "-D", &info.branch]).await?;
        self.known.write().remove(&info.task_id);
        Ok(())
    }

    /// Remove a worktree and its branch unconditionally, discarding any
    /// uncommitted changes. Used on shutdown and cancellation.
    pub async fn force_cleanup(
        &self,
        token: &CancellationToken,
        info: &WorktreeInfo,
    ) -> Result<(), WorktreeError> {
        self.git(
            token,
            &["worktree", "remove", "--force", info.path.to_string_lossy().as_ref()],
        )
        .await?;
        self.git(token, &["branch", "-D", &info.branch]).await?;
        self.known.write().remove(&info.task_id);
        Ok(())
    }

    /// Every worktree this manager has created and not yet cleaned up.
    pub fn list(&self) -> Vec<WorktreeInfo> {
        self.known.read().values().cloned().collect()
    }

    /// Ask git to forget worktree administrative files for directories
    /// that were deleted out-of-band (e.g. by an operator). Safe to call
    /// at any time.
    pub async fn prune(&self, token: &CancellationToken) -> Result<(), WorktreeError> {
        self.git(token, &["worktree", "prune"]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
