// SPDX-License-Identifier: MIT

//! Lifecycle events published by the runner to a pluggable, non-blocking
//! sink (see `orc-storage::sink`). Serializes with `{"type": "...", ...}`.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// A lifecycle signal emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "task-started")]
    TaskStarted { task_id: TaskId, ts_ms: u64 },

    #[serde(rename = "task-output")]
    TaskOutput {
        task_id: TaskId,
        chunk: String,
        ts_ms: u64,
    },

    #[serde(rename = "task-completed")]
    TaskCompleted {
        task_id: TaskId,
        result: String,
        ts_ms: u64,
    },

    #[serde(rename = "task-failed")]
    TaskFailed {
        task_id: TaskId,
        error: String,
        ts_ms: u64,
    },

    #[serde(rename = "task-merged")]
    TaskMerged {
        task_id: TaskId,
        conflict: bool,
        ts_ms: u64,
    },

    #[serde(rename = "dag-progress")]
    DagProgress {
        completed: usize,
        failed: usize,
        total: usize,
        ts_ms: u64,
    },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
