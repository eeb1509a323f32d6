// SPDX-License-Identifier: MIT

//! Q&A Channel (spec §4.F). A running task can pause to ask the operator
//! a clarifying question; the channel carries the question out and the
//! answer back in, without the task needing to know who (or what) answers.

use crate::error::QnaError;
use orc_core::{Question, QuestionId, TaskId};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// One pending question plus the channel its answer arrives on.
pub struct PendingQuestion {
    pub question: Question,
    reply_tx: oneshot::Sender<String>,
}

impl PendingQuestion {
    /// Deliver an answer to the task that asked. Consumes the pending
    /// question; dropping it instead leaves the asker waiting until it is
    /// cancelled.
    pub fn answer(self, text: impl Into<String>) {
        let _ = self.reply_tx.send(text.into());
    }
}

/// Asker-side handle, cloned into every running task.
#[derive(Clone)]
pub struct QnaChannel {
    tx: mpsc::Sender<PendingQuestion>,
    id_gen: orc_core::UuidIdGen,
}

/// Operator-side handle that receives pending questions in arrival order.
pub struct QnaReceiver {
    rx: mpsc::Receiver<PendingQuestion>,
}

/// Bounded request buffer depth, matching the supervisor's own bound on
/// concurrent running tasks (spec §9: one outstanding question per task is
/// the common case, but a small backlog tolerates a slow operator).
const CHANNEL_DEPTH: usize = 64;

/// Build a connected asker/receiver pair.
pub fn channel() -> (QnaChannel, QnaReceiver) {
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    (
        QnaChannel {
            tx,
            id_gen: orc_core::UuidIdGen,
        },
        QnaReceiver { rx },
    )
}

impl QnaChannel {
    /// Ask a question on behalf of `task_id` and await the answer, or
    /// return early if `token` is cancelled.
    pub async fn ask(
        &self,
        token: &CancellationToken,
        task_id: TaskId,
        text: impl Into<String>,
    ) -> Result<String, QnaError> {
        use orc_core::IdGen;

        let question = Question::new(QuestionId::new(self.id_gen.next()), task_id, text);
        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = PendingQuestion {
            question,
            reply_tx,
        };

        tokio::select! {
            send = self.tx.send(pending) => {
                send.map_err(|_| QnaError::SendFailed)?;
            }
            _ = token.cancelled() => return Err(QnaError::Cancelled),
        }

        tokio::select! {
            answer = reply_rx => answer.map_err(|_| QnaError::Cancelled),
            _ = token.cancelled() => Err(QnaError::Cancelled),
        }
    }
}

impl QnaReceiver {
    /// Await the next pending question, or `None` once every `QnaChannel`
    /// clone has been dropped.
    pub async fn recv(&mut self) -> Option<PendingQuestion> {
        self.rx.recv().await
    }
}

#[cfg(test)]
#[path = "qna_tests.rs"]
mod tests;
