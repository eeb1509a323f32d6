// SPDX-License-Identifier: MIT

//! Lowers a validated [`Runbook`] into the types `orc-engine` and
//! `orc-adapters` actually schedule against: seed tasks, workflow
//! pipelines, and a role-to-backend-config table.

use crate::def::Runbook;
use orc_adapters::{BackendConfig, BackendKind, BackendError};
use orc_core::task::{FailureMode, Task, TaskId};
use orc_core::workflow::{Workflow, WorkflowStep};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors translating a runbook into engine types. `parse_runbook`
/// already rejects every case these cover, so they should only ever
/// surface when a `Runbook` was built by hand rather than parsed.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("role '{role}' has no provider entry")]
    UnknownRole { role: String },
    #[error("provider '{role}' has invalid backend kind: {source}")]
    InvalidKind { role: String, source: BackendError },
    #[error("task '{task}' has invalid failure_mode '{mode}'")]
    InvalidFailureMode { task: String, mode: String },
}

fn failure_mode_from(task_name: &str, mode: &Option<String>) -> Result<FailureMode, TranslateError> {
    match mode.as_deref() {
        None => Ok(FailureMode::Soft),
        Some("hard") => Ok(FailureMode::Hard),
        Some("soft") => Ok(FailureMode::Soft),
        Some("skip") => Ok(FailureMode::Skip),
        Some(other) => Err(TranslateError::InvalidFailureMode {
            task: task_name.to_string(),
            mode: other.to_string(),
        }),
    }
}

/// Build the `agent_role -> BackendConfig` table. `cwd` is a placeholder;
/// `BackendFactory::build` overrides it with the task's worktree path.
pub fn translate_providers(runbook: &Runbook) -> Result<HashMap<String, BackendConfig>, TranslateError> {
    let mut out = HashMap::with_capacity(runbook.providers.len());
    for (role, provider) in &runbook.providers {
        let kind = BackendKind::from_str(&provider.kind).map_err(|source| TranslateError::InvalidKind {
            role: role.clone(),
            source,
        })?;
        let mut config = BackendConfig::new(kind, provider.command.clone(), PathBuf::from("."));
        config.model = provider.model.clone();
        config.provider = provider.provider.clone();
        config.system_prompt = provider.system_prompt.clone();
        out.insert(role.clone(), config);
    }
    Ok(out)
}

/// Build the seed task set. Task names become `TaskId`s directly, so a
/// runbook's `depends_on` entries resolve without an extra name table.
pub fn translate_tasks(runbook: &Runbook) -> Result<Vec<Task>, TranslateError> {
    let mut tasks = Vec::with_capacity(runbook.tasks.len());
    for (name, def) in &runbook.tasks {
        if !runbook.providers.contains_key(&def.role) {
            return Err(TranslateError::UnknownRole { role: def.role.clone() });
        }
        let failure_mode = failure_mode_from(name, &def.failure_mode)?;
        let depends_on = def.depends_on.iter().map(|d| TaskId::new(d.clone())).collect();
        let write_files = def.write_files.iter().map(PathBuf::from).collect();
        let task = Task::new(TaskId::new(name.clone()), def.role.clone(), def.prompt.clone())
            .with_name(name.clone())
            .with_depends_on(depends_on)
            .with_write_files(write_files)
            .with_failure_mode(failure_mode);
        tasks.push(task);
    }
    Ok(tasks)
}

/// Build the named workflow pipelines consulted by the workflow engine.
pub fn translate_workflows(runbook: &Runbook) -> Vec<Workflow> {
    runbook
        .workflows
        .iter()
        .map(|(name, def)| {
            let steps = def.steps.iter().cloned().map(WorkflowStep::new).collect();
            Workflow::new(name.clone(), steps)
        })
        .collect()
}

/// Translate every part of a validated runbook at once.
pub fn translate(runbook: &Runbook) -> Result<(Vec<Task>, Vec<Workflow>, HashMap<String, BackendConfig>), TranslateError> {
    let tasks = translate_tasks(runbook)?;
    let workflows = translate_workflows(runbook);
    let providers = translate_providers(runbook)?;
    Ok((tasks, workflows, providers))
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
