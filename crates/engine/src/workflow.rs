// SPDX-License-Identifier: MIT

//! Workflow Engine (spec §4.G). On each task completion, consults every
//! configured workflow whose pipeline names that task's agent-role and
//! appends the next step as a new, dependent task. A role name containing
//! `test` gets a hard failure mode, matching the "test family" policy that
//! a failing test must block its dependents rather than let a pipeline
//! silently continue past it.

use crate::dag::Dag;
use crate::error::WorkflowEngineError;
use orc_core::{FailureMode, IdGen, Task, TaskId, Workflow};

/// Agent-role substrings that get `FailureMode::Hard` when spawned as a
/// workflow follow-up.
fn failure_mode_for(agent_role: &str) -> FailureMode {
    if agent_role.to_ascii_lowercase().contains("test") {
        FailureMode::Hard
    } else {
        FailureMode::Soft
    }
}

/// Holds the set of declarative `[role] -> [role] -> ...` pipelines
/// loaded from configuration.
pub struct WorkflowEngine {
    workflows: Vec<Workflow>,
}

impl WorkflowEngine {
    pub fn new(workflows: Vec<Workflow>) -> Self {
        Self { workflows }
    }

    /// Produce and register the follow-up task(s) for a just-completed
    /// task, one per workflow whose pipeline both contains this task's
    /// agent-role and has a step after it. Returns the newly added tasks
    /// (already inserted into `dag`) so the caller can emit lifecycle
    /// events for them.
    pub fn on_task_completed(
        &self,
        dag: &Dag,
        _id_gen: &dyn IdGen,
        completed: &Task,
    ) -> Result<Vec<Task>, WorkflowEngineError> {
        let mut spawned = Vec::new();

        for workflow in &self.workflows {
            let Some(next) = workflow.next_after(&completed.agent_role) else {
                continue;
            };

            let follow_up = Task::new(
                TaskId::new(format!("{}-{}", completed.id.as_str(), next.agent_role)),
                next.agent_role.clone(),
                completed.result.clone().unwrap_or_default(),
            )
            .with_name(format!("{}:{}", workflow.name, next.agent_role))
            .with_depends_on(vec![completed.id.clone()])
            .with_write_files(completed.write_files.clone())
            .with_failure_mode(failure_mode_for(&next.agent_role));

            dag.add(follow_up.clone())?;
            spawned.push(follow_up);
        }

        Ok(spawned)
    }
}

#[cfg(test)]
#[path = "workflow_engine_tests.rs"]
mod tests;
