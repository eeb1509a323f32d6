// SPDX-License-Identifier: MIT

//! Parallel Runner (spec §4.H). Drives the DAG to completion: repeatedly
//! pulls the next wave of eligible tasks, executes each in its own
//! worktree behind a concurrency bound, merges successes back, and lets
//! the workflow engine extend the DAG as tasks complete.

use crate::dag::Dag;
use crate::error::RunnerError;
use crate::locks::ResourceLockManager;
use crate::qna::QnaChannel;
use crate::workflow::WorkflowEngine;
use crate::worktree::WorktreeManager;
use orc_adapters::{Backend, BackendFactory, ProcessSupervisor};
use orc_core::{Clock, Event, IdGen, Task};
use orc_storage::EventSink;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Tuning knobs for one run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_concurrency: usize,
    pub base_branch: String,
    pub integration_branch: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            base_branch: "main".to_string(),
            integration_branch: "main".to_string(),
        }
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Ties every engine component together and drives one DAG to completion.
pub struct ParallelRunner<C: Clock> {
    dag: Arc<Dag>,
    locks: Arc<ResourceLockManager>,
    worktrees: Arc<WorktreeManager>,
    backends: Arc<dyn BackendFactory>,
    workflow: Arc<WorkflowEngine>,
    sink: Arc<dyn EventSink>,
    clock: C,
    id_gen: Arc<dyn IdGen>,
    qna: QnaChannel,
    supervisor: ProcessSupervisor,
    config: RunnerConfig,
}

impl<C: Clock> ParallelRunner<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dag: Arc<Dag>,
        locks: Arc<ResourceLockManager>,
        worktrees: Arc<WorktreeManager>,
        backends: Arc<dyn BackendFactory>,
        workflow: Arc<WorkflowEngine>,
        sink: Arc<dyn EventSink>,
        clock: C,
        id_gen: Arc<dyn IdGen>,
        qna: QnaChannel,
        supervisor: ProcessSupervisor,
        config: RunnerConfig,
    ) -> Self {
        Self {
            dag,
            locks,
            worktrees,
            backends,
            workflow,
            sink,
            clock,
            id_gen,
            qna,
            supervisor,
            config,
        }
    }

    fn emit_progress(&self) {
        let tasks = self.dag.tasks();
        let completed = tasks.iter().filter(|t| t.status == orc_core::TaskStatus::Completed).count();
        let failed = tasks.iter().filter(|t| t.status == orc_core::TaskStatus::Failed).count();
        self.sink.emit(Event::DagProgress {
            completed,
            failed,
            total: tasks.len(),
            ts_ms: self.clock.now_ms(),
        });
    }

    /// Run every task in the DAG to completion, honoring `token` for
    /// cooperative cancellation. Returns once every task has reached a
    /// terminal status, or the run was cancelled.
    pub async fn run(&self, token: CancellationToken) -> Result<RunSummary, RunnerError> {
        self.dag.validate()?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut joinset: JoinSet<()> = JoinSet::new();

        loop {
            if token.is_cancelled() {
                // Tokio drops an aborted task's future without polling it
                // again, so a task parked in its own `select! { _ =
                // token.cancelled() => guard.kill() }` arm never runs
                // that arm. Killing every tracked process group directly
                // is the only reliable way to guarantee no descendant
                // survives cancellation.
                self.supervisor.shutdown_all();
                joinset.abort_all();
                while joinset.join_next().await.is_some() {}
                self.force_cleanup_everything().await;
                return Err(RunnerError::Cancelled);
            }

            let ready = self.dag.eligible();
            for task in ready {
                let fut = self.run_one(task, semaphore.clone(), token.clone());
                joinset.spawn(fut);
            }

            if joinset.is_empty() {
                if self.dag.is_finished() {
                    break;
                }
                // Nothing running and nothing eligible: every remaining
                // task is blocked forever by a hard failure upstream.
                self.skip_unreachable();
                continue;
            }

            tokio::select! {
                _ = joinset.join_next() => {
                    self.emit_progress();
                }
                _ = token.cancelled() => continue,
            }
        }

        self.emit_progress();
        Ok(self.summarize())
    }

    fn summarize(&self) -> RunSummary {
        let tasks = self.dag.tasks();
        let mut summary = RunSummary {
            total: tasks.len(),
            ..Default::default()
        };
        for task in tasks {
            match task.status {
                orc_core::TaskStatus::Completed => summary.completed += 1,
                orc_core::TaskStatus::Failed => summary.failed += 1,
                orc_core::TaskStatus::Skipped => summary.skipped += 1,
                _ => {}
            }
        }
        summary
    }

    /// Mark every non-terminal task `Skipped` once the scheduler has
    /// proven no further progress is possible (no task running, none
    /// eligible, and the DAG is not finished).
    fn skip_unreachable(&self) {
        for task in self.dag.tasks() {
            if !task.status.is_terminal() {
                if let Err(err) = self.dag.mark_skipped(&task.id) {
                    tracing::error!(task_id = %task.id, error = %err, "failed to skip unreachable task");
                }
            }
        }
    }

    async fn force_cleanup_everything(&self) {
        let cleanup_token = CancellationToken::new();
        for info in self.worktrees.list() {
            if let Err(err) = self.worktrees.force_cleanup(&cleanup_token, &info).await {
                tracing::warn!(task_id = %info.task_id, error = %err, "force cleanup failed during shutdown");
            }
        }
    }

    async fn run_one(&self, task: Task, semaphore: Arc<Semaphore>, token: CancellationToken) {
        let _permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        if let Err(err) = self.dag.mark_running(&task.id) {
            tracing::error!(task_id = %task.id, error = %err, "could not mark task running");
            return;
        }

        self.sink.emit(Event::TaskStarted {
            task_id: task.id.clone(),
            ts_ms: self.clock.now_ms(),
        });

        let outcome = self.execute(&task, &token).await;

        match outcome {
            Ok(reply) => {
                if let Err(err) = self.dag.mark_completed(&task.id, reply.clone()) {
                    tracing::error!(task_id = %task.id, error = %err, "could not mark task completed");
                    return;
                }
                self.sink.emit(Event::TaskCompleted {
                    task_id: task.id.clone(),
                    result: reply,
                    ts_ms: self.clock.now_ms(),
                });

                let completed = self.dag.get(&task.id).unwrap_or(task.clone());
                if let Err(err) = self.workflow.on_task_completed(&self.dag, self.id_gen.as_ref(), &completed) {
                    tracing::error!(task_id = %task.id, error = %err, "workflow engine failed to spawn follow-up");
                }
            }
            Err(message) => {
                if let Err(err) = self.dag.mark_failed(&task.id, message.clone()) {
                    tracing::error!(task_id = %task.id, error = %err, "could not mark task failed");
                    return;
                }
                self.sink.emit(Event::TaskFailed {
                    task_id: task.id.clone(),
                    error: message,
                    ts_ms: self.clock.now_ms(),
                });
            }
        }
    }

    /// Prefix an agent's reply uses to hand a clarifying question to the
    /// Q&A channel instead of treating the turn as its final answer.
    const ASK_OPERATOR_PREFIX: &'static str = "ASK_OPERATOR:";

    /// Caps how many question/answer round-trips one task's turn loop will
    /// honor before proceeding with whatever the agent last said, so a
    /// misbehaving agent that always asks can't stall the run forever.
    const MAX_QUESTION_ROUNDS: usize = 3;

    /// Create a worktree, run the backend turn loop, merge on success, and
    /// tear down — or preserve the worktree for inspection on a merge
    /// conflict. Returns the assistant's final reply on success, or a
    /// human-readable error message on failure (never an error type —
    /// every failure here is a normal, recorded task failure, not an
    /// engine bug).
    ///
    /// An agent asks a clarifying question by prefixing its reply with
    /// `ASK_OPERATOR:`; the remainder is forwarded to the Q&A channel, and
    /// the operator's answer is sent back as the next turn.
    async fn execute(&self, task: &Task, token: &CancellationToken) -> Result<String, String> {
        let worktree = self
            .worktrees
            .create(token, &task.id, &self.config.base_branch)
            .await
            .map_err(|e| e.to_string())?;

        let _lock_guard = if task.write_files.is_empty() {
            None
        } else {
            Some(
                self.locks
                    .lock_all(&task.write_files, token)
                    .await
                    .map_err(|e| e.to_string())?,
            )
        };

        let mut backend = self
            .backends
            .build(&task.agent_role, worktree.path.clone())
            .map_err(|e| e.to_string())?;

        let reply = self.run_turn_loop(&mut backend, task, token).await;
        let _ = backend.close().await;

        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                let _ = self.worktrees.force_cleanup(token, &worktree).await;
                return Err(err);
            }
        };

        let merge = self
            .worktrees
            .merge(token, &worktree, &self.config.integration_branch)
            .await
            .map_err(|e| e.to_string())?;

        self.sink.emit(Event::TaskMerged {
            task_id: task.id.clone(),
            conflict: merge.conflict,
            ts_ms: self.clock.now_ms(),
        });

        if merge.conflict {
            tracing::warn!(task_id = %task.id, path = %worktree.path.display(), "leaving worktree for operator inspection after merge conflict");
        } else if let Err(err) = self.worktrees.cleanup(token, &worktree).await {
            tracing::warn!(task_id = %task.id, error = %err, "worktree cleanup failed after a clean merge");
        }

        Ok(reply)
    }

    /// Send `task.prompt` and keep resuming the conversation through the
    /// Q&A channel for as long as the agent keeps asking clarifying
    /// questions, up to `MAX_QUESTION_ROUNDS`.
    async fn run_turn_loop(
        &self,
        backend: &mut Box<dyn orc_adapters::Backend>,
        task: &Task,
        token: &CancellationToken,
    ) -> Result<String, String> {
        let mut reply = backend
            .send(token.clone(), &task.prompt)
            .await
            .map_err(|e| e.to_string())?;
        let mut rounds = 0;

        while let Some(question) = reply.strip_prefix(Self::ASK_OPERATOR_PREFIX) {
            if rounds >= Self::MAX_QUESTION_ROUNDS {
                tracing::warn!(task_id = %task.id, "exceeded question rounds, proceeding with unanswered turn");
                break;
            }
            rounds += 1;

            let answer = self
                .qna
                .ask(token, task.id.clone(), question.trim())
                .await
                .map_err(|e| e.to_string())?;

            reply = backend.send(token.clone(), &answer).await.map_err(|e| e.to_string())?;
        }

        Ok(reply)
    }

    /// Expose the Q&A asker handle so callers can hand it to tasks that
    /// need to ask a clarifying question out-of-band from this runner.
    pub fn qna(&self) -> QnaChannel {
        self.qna.clone()
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
