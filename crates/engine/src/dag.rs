// SPDX-License-Identifier: MIT

//! DAG Store (spec §4.C). Holds every task in one run, enforces the task
//! lifecycle, and computes eligibility from a per-task resolution table.

use crate::error::DagError;
use orc_core::{FailureMode, Task, TaskId, TaskStatus};
use parking_lot::RwLock;
use std::collections::HashMap;

struct DagInner {
    tasks: HashMap<TaskId, Task>,
    insertion_order: Vec<TaskId>,
}

/// Whether a task's current state counts as "resolved" for the purposes of
/// a downstream task's eligibility. `Hard` failures never resolve; `Soft`
/// and `Skip` failures resolve like a success.
fn is_resolved(task: &Task) -> bool {
    match task.status {
        TaskStatus::Completed | TaskStatus::Skipped => true,
        TaskStatus::Failed => !matches!(task.failure_mode, FailureMode::Hard),
        TaskStatus::Pending | TaskStatus::Eligible | TaskStatus::Running => false,
    }
}

/// Thread-safe store of every task in one run's DAG.
#[derive(Default)]
pub struct Dag {
    inner: RwLock<DagInner>,
}

impl Default for DagInner {
    fn default() -> Self {
        Self {
            tasks: HashMap::new(),
            insertion_order: Vec::new(),
        }
    }
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task in the `Pending` state. Fails if the ID is already
    /// present.
    pub fn add(&self, task: Task) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        if inner.tasks.contains_key(&task.id) {
            return Err(DagError::DuplicateTask(task.id));
        }
        inner.insertion_order.push(task.id.clone());
        inner.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Check referential integrity and acyclicity, returning a
    /// dependency-first topological order of every task's ID. Read-only;
    /// callable repeatedly without side effects.
    pub fn validate(&self) -> Result<Vec<TaskId>, DagError> {
        let inner = self.inner.read();

        for task in inner.tasks.values() {
            for dep in &task.depends_on {
                if !inner.tasks.contains_key(dep) {
                    return Err(DagError::MissingDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: HashMap<TaskId, Color> = inner
            .insertion_order
            .iter()
            .map(|id| (id.clone(), Color::White))
            .collect();
        let mut order = Vec::with_capacity(inner.insertion_order.len());

        fn visit(
            id: &TaskId,
            tasks: &HashMap<TaskId, Task>,
            color: &mut HashMap<TaskId, Color>,
            order: &mut Vec<TaskId>,
        ) -> Result<(), DagError> {
            color.insert(id.clone(), Color::Gray);
            let task = &tasks[id];
            for dep in &task.depends_on {
                match color.get(dep).copied().unwrap_or(Color::White) {
                    Color::Gray => return Err(DagError::Cycle(dep.clone())),
                    Color::Black => continue,
                    Color::White => visit(dep, tasks, color, order)?,
                }
            }
            color.insert(id.clone(), Color::Black);
            order.push(id.clone());
            Ok(())
        }

        for id in &inner.insertion_order {
            if color.get(id).copied().unwrap_or(Color::White) == Color::White {
                visit(id, &inner.tasks, &mut color, &mut order)?;
            }
        }

        Ok(order)
    }

    /// Snapshot of every currently pending task whose upstreams are all
    /// resolved. Atomically flips each returned task to `Eligible` so a
    /// concurrent caller cannot hand out the same task twice before
    /// `mark_running` is called.
    pub fn eligible(&self) -> Vec<Task> {
        let mut inner = self.inner.write();

        let ready: Vec<TaskId> = inner
            .insertion_order
            .iter()
            .filter(|id| {
                let task = &inner.tasks[*id];
                task.status == TaskStatus::Pending
                    && task
                        .depends_on
                        .iter()
                        .all(|dep| inner.tasks.get(dep).is_some_and(is_resolved))
            })
            .cloned()
            .collect();

        let mut out = Vec::with_capacity(ready.len());
        for id in ready {
            if let Some(task) = inner.tasks.get_mut(&id) {
                task.status = TaskStatus::Eligible;
                out.push(task.clone());
            }
        }
        out
    }

    /// Transition a task from `Eligible` (or `Pending`, for callers that
    /// skip the eligibility snapshot) to `Running`.
    pub fn mark_running(&self, id: &TaskId) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownTask(id.clone()))?;
        match task.status {
            TaskStatus::Pending | TaskStatus::Eligible => {
                task.status = TaskStatus::Running;
                Ok(())
            }
            other => Err(DagError::InvalidTransition {
                task: id.clone(),
                from: other.to_string(),
                to: TaskStatus::Running.to_string(),
            }),
        }
    }

    /// Transition a running task to `Completed`, recording its result.
    pub fn mark_completed(&self, id: &TaskId, result: impl Into<String>) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownTask(id.clone()))?;
        if task.status != TaskStatus::Running {
            return Err(DagError::InvalidTransition {
                task: id.clone(),
                from: task.status.to_string(),
                to: TaskStatus::Completed.to_string(),
            });
        }
        task.status = TaskStatus::Completed;
        task.result = Some(result.into());
        Ok(())
    }

    /// Transition a running task to `Failed`, recording its error.
    pub fn mark_failed(&self, id: &TaskId, error: impl Into<String>) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownTask(id.clone()))?;
        if task.status != TaskStatus::Running {
            return Err(DagError::InvalidTransition {
                task: id.clone(),
                from: task.status.to_string(),
                to: TaskStatus::Failed.to_string(),
            });
        }
        task.status = TaskStatus::Failed;
        task.last_error = Some(error.into());
        Ok(())
    }

    /// Mark a task `Skipped` by external policy (e.g. an operator override,
    /// or an upstream-less task the workflow engine decides not to run).
    pub fn mark_skipped(&self, id: &TaskId) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownTask(id.clone()))?;
        if task.status.is_terminal() {
            return Err(DagError::InvalidTransition {
                task: id.clone(),
                from: task.status.to_string(),
                to: TaskStatus::Skipped.to_string(),
            });
        }
        task.status = TaskStatus::Skipped;
        Ok(())
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner.read().tasks.get(id).cloned()
    }

    /// Snapshot of every task currently in the DAG, in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        let inner = self.inner.read();
        inner
            .insertion_order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .cloned()
            .collect()
    }

    /// True once every task has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.inner
            .read()
            .tasks
            .values()
            .all(|t| t.status.is_terminal())
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
