// SPDX-License-Identifier: MIT

//! Workflow metadata: an ordered list of agent-role steps consulted at
//! task completion by the workflow engine. A workflow is stateless
//! metadata — it is never mutated once loaded from configuration.

use serde::{Deserialize, Serialize};

/// A single step in a workflow, naming an agent-role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub agent_role: String,
}

impl WorkflowStep {
    pub fn new(agent_role: impl Into<String>) -> Self {
        Self {
            agent_role: agent_role.into(),
        }
    }
}

/// An ordered pipeline of agent-role steps, e.g. `[coder, reviewer, tester]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Position of `agent_role` in this workflow's steps, if present.
    pub fn position_of(&self, agent_role: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.agent_role == agent_role)
    }

    /// The step that follows `agent_role`, or `None` if `agent_role` is the
    /// last step (terminal) or absent from this workflow.
    pub fn next_after(&self, agent_role: &str) -> Option<&WorkflowStep> {
        let idx = self.position_of(agent_role)?;
        self.steps.get(idx + 1)
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
