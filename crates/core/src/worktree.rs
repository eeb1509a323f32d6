// SPDX-License-Identifier: MIT

//! Metadata describing a filesystem-isolated worktree created for one task.
//! Creation, merging, and destruction live in `orc-engine::worktree`; this
//! type is the plain data the manager hands back.

use crate::task::TaskId;
use std::path::PathBuf;

/// A created isolated workspace on its own branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: String,
    pub task_id: TaskId,
    pub head_commit: String,
}

impl WorktreeInfo {
    pub fn new(
        path: PathBuf,
        branch: impl Into<String>,
        task_id: TaskId,
        head_commit: impl Into<String>,
    ) -> Self {
        Self {
            path,
            branch: branch.into(),
            task_id,
            head_commit: head_commit.into(),
        }
    }

    /// The conventional branch name derived from a task ID: `task/<id>`.
    pub fn branch_name_for(task_id: &TaskId) -> String {
        format!("task/{}", task_id.as_str())
    }

    /// Recover the task ID embedded in a branch name produced by
    /// [`branch_name_for`], used only to report existing worktrees — never
    /// as authorization to delete them (see `orc-engine::worktree`).
    pub fn task_id_from_branch(branch: &str) -> Option<TaskId> {
        branch.strip_prefix("task/").map(TaskId::new)
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
