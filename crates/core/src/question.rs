// SPDX-License-Identifier: MIT

//! Transient record sent from a running task to the coordinator. The
//! reply channel itself is not part of this crate (it isn't data — see
//! `orc-engine::qna`), but the identifying metadata is shared between the
//! task side and the coordinator side, so it lives here.

use crate::task::TaskId;

crate::define_id! {
    /// Unique identifier for one question, scoped to its own reply channel.
    pub struct QuestionId;
}

/// A clarifying question raised by a running task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub task_id: TaskId,
    pub text: String,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, task_id: TaskId, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_id,
            text: text.into(),
        }
    }
}

#[cfg(test)]
#[path = "question_tests.rs"]
mod tests;
