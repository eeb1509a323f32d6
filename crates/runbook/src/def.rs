// SPDX-License-Identifier: MIT

//! The runbook's on-disk shape: a declarative description of which
//! backend each agent-role talks to, the workflow pipelines that chain
//! roles together, and the initial set of tasks to seed a run with.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One agent-role's backend configuration. The map key this lives under
/// (in `Runbook::providers`) is the `agent_role` string tasks refer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDef {
    /// Backend tag: `a`, `b`, or `c` (see `orc_adapters::BackendKind`).
    pub kind: String,
    /// External CLI to invoke.
    pub command: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// An ordered pipeline of agent-roles, referenced by name from a task's
/// `workflow` field, or matched implicitly by role as each task completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDef {
    #[serde(default)]
    pub steps: Vec<String>,
}

/// One task to seed the DAG with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDef {
    /// Agent-role this task runs under; must name a `providers` entry.
    pub role: String,
    pub prompt: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub write_files: Vec<String>,
    /// One of `hard`, `soft`, `skip`. Defaults to `soft`.
    #[serde(default)]
    pub failure_mode: Option<String>,
}

/// A fully parsed runbook, before cross-reference validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Runbook {
    #[serde(default, alias = "provider")]
    pub providers: HashMap<String, ProviderDef>,
    #[serde(default, alias = "workflow")]
    pub workflows: HashMap<String, WorkflowDef>,
    #[serde(default, alias = "task")]
    pub tasks: HashMap<String, TaskDef>,
}

#[cfg(test)]
#[path = "def_tests.rs"]
mod tests;
