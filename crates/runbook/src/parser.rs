// SPDX-License-Identifier: MIT

//! Runbook parsing (HCL, TOML, and JSON) and referential-integrity
//! validation.

use crate::def::Runbook;
use std::collections::HashSet;
use thiserror::Error;

/// Runbook file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Hcl,
    Toml,
    Json,
}

/// Errors from parsing or validating a runbook.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid runbook at {location}: {message}")]
    InvalidFormat { location: String, message: String },
}

/// Parse a runbook in the given format, then validate every
/// cross-reference (tasks to roles, roles to providers, workflow steps
/// to roles, task dependencies to other tasks).
pub fn parse_runbook(content: &str, format: Format) -> Result<Runbook, ParseError> {
    let runbook: Runbook = match format {
        Format::Hcl => hcl::from_str(content)?,
        Format::Toml => toml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };
    validate_cross_refs(&runbook)?;
    Ok(runbook)
}

/// Check that every name a runbook entry references actually exists.
fn validate_cross_refs(runbook: &Runbook) -> Result<(), ParseError> {
    for (task_name, task) in &runbook.tasks {
        if !runbook.providers.contains_key(&task.role) {
            return Err(ParseError::InvalidFormat {
                location: format!("task.{task_name}.role"),
                message: format!(
                    "references unknown role '{}'; available roles: {}",
                    task.role,
                    sorted_keys(&runbook.providers),
                ),
            });
        }

        for dep in &task.depends_on {
            if !runbook.tasks.contains_key(dep) {
                return Err(ParseError::InvalidFormat {
                    location: format!("task.{task_name}.depends_on"),
                    message: format!(
                        "references unknown task '{dep}'; available tasks: {}",
                        sorted_keys(&runbook.tasks),
                    ),
                });
            }
        }

        if let Some(mode) = &task.failure_mode {
            if !["hard", "soft", "skip"].contains(&mode.as_str()) {
                return Err(ParseError::InvalidFormat {
                    location: format!("task.{task_name}.failure_mode"),
                    message: format!("unknown failure_mode '{mode}'; expected hard, soft, or skip"),
                });
            }
        }
    }

    for (workflow_name, workflow) in &runbook.workflows {
        let mut seen = HashSet::new();
        for (i, role) in workflow.steps.iter().enumerate() {
            if !runbook.providers.contains_key(role) {
                return Err(ParseError::InvalidFormat {
                    location: format!("workflow.{workflow_name}.steps[{i}]"),
                    message: format!(
                        "references unknown role '{role}'; available roles: {}",
                        sorted_keys(&runbook.providers),
                    ),
                });
            }
            if !seen.insert(role.as_str()) {
                return Err(ParseError::InvalidFormat {
                    location: format!("workflow.{workflow_name}.steps"),
                    message: format!("role '{role}' appears more than once in the same pipeline"),
                });
            }
        }
    }

    for (role_name, provider) in &runbook.providers {
        if !["a", "b", "c"].contains(&provider.kind.as_str()) {
            return Err(ParseError::InvalidFormat {
                location: format!("provider.{role_name}.kind"),
                message: format!("unknown backend kind '{}'; expected a, b, or c", provider.kind),
            });
        }
    }

    Ok(())
}

fn sorted_keys<V>(map: &std::collections::HashMap<String, V>) -> String {
    let mut keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
    keys.sort();
    keys.join(", ")
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
