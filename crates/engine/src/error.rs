// SPDX-License-Identifier: MIT

//! Error taxonomy for the engine (spec §7).

use orc_core::TaskId;
use thiserror::Error;

/// Errors from the DAG store (spec §4.C).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DagError {
    #[error("task already exists: {0}")]
    DuplicateTask(TaskId),
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
    #[error("task {task} depends on missing task {dependency}")]
    MissingDependency { task: TaskId, dependency: TaskId },
    #[error("dependency cycle detected at task {0}")]
    Cycle(TaskId),
    #[error("invalid transition for task {task}: {from} -> {to}")]
    InvalidTransition {
        task: TaskId,
        from: String,
        to: String,
    },
}

/// Errors from the resource lock manager (spec §4.D).
#[derive(Debug, Error)]
pub enum LockError {
    #[error("cancelled while waiting for a resource lock")]
    Cancelled,
}

/// Errors from the worktree manager (spec §4.E). A merge conflict is not
/// represented here — it is a normal, non-fatal outcome of `merge` (see
/// `MergeOutcome`).
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git command failed: {0}")]
    Git(#[from] orc_adapters::ExecuteError),
    #[error("worktree not found for task {0}")]
    NotFound(TaskId),
    #[error("could not parse git output: {0}")]
    UnparsableOutput(String),
    #[error("cancelled while waiting for the merge lock")]
    Cancelled,
}

/// Errors from the Q&A channel (spec §4.F).
#[derive(Debug, Error)]
pub enum QnaError {
    #[error("request channel is full or closed")]
    SendFailed,
    #[error("cancelled while awaiting an answer")]
    Cancelled,
}

/// Errors from the workflow engine (spec §4.G).
#[derive(Debug, Error)]
pub enum WorkflowEngineError {
    #[error(transparent)]
    Dag(#[from] DagError),
}

/// Top-level error surfaced by the parallel runner (spec §4.H / §7).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Dag(#[from] DagError),
    #[error("run was cancelled")]
    Cancelled,
}
