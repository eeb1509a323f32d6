// SPDX-License-Identifier: MIT

//! Task identifier, status machine, and the failure-mode policy that
//! governs dependency resolution (see `orc-engine::dag` for the
//! resolution table itself).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a task, unique within one DAG.
    pub struct TaskId;
}

/// Status of a task within its DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Eligible,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    /// Terminal statuses are never revisited by the scheduler.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Eligible => "eligible",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// Policy controlling how a failed task affects its downstreams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// A failure blocks every downstream forever.
    Hard,
    /// A failure does not block downstreams; they may still run.
    Soft,
    /// A failure is treated as success for dependency-resolution purposes.
    Skip,
}

impl Default for FailureMode {
    fn default() -> Self {
        FailureMode::Soft
    }
}

/// The unit of work scheduled by the DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Configuration lookup key (e.g. `coder`, `reviewer`, `tester`).
    pub agent_role: String,
    pub prompt: String,
    pub depends_on: Vec<TaskId>,
    pub write_files: Vec<PathBuf>,
    pub status: TaskStatus,
    pub failure_mode: FailureMode,
    pub result: Option<String>,
    pub last_error: Option<String>,
}

impl Task {
    /// Build a new task in the `Pending` state, as mandated by the task
    /// lifecycle invariant.
    pub fn new(id: impl Into<TaskId>, agent_role: impl Into<String>, prompt: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            agent_role: agent_role.into(),
            prompt: prompt.into(),
            depends_on: Vec::new(),
            write_files: Vec::new(),
            status: TaskStatus::Pending,
            failure_mode: FailureMode::Soft,
            result: None,
            last_error: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_depends_on(mut self, deps: Vec<TaskId>) -> Self {
        self.depends_on = deps;
        self
    }

    pub fn with_write_files(mut self, files: Vec<PathBuf>) -> Self {
        self.write_files = files;
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
