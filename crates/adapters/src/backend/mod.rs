// SPDX-License-Identifier: MIT

//! Backend Adapters (spec §4.B). A `Backend` exposes `send`/`close`/
//! `session_id`; three concrete adapters translate those calls into one
//! external agent CLI's flags and output grammar.

mod assistant_a;
mod assistant_b;
mod assistant_c;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use assistant_a::AssistantABackend;
pub use assistant_b::AssistantBBackend;
pub use assistant_c::AssistantCBackend;

use crate::supervisor::ProcessSupervisor;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from a backend's `send`/`close` operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("subprocess failed: {0}")]
    Process(#[from] crate::supervisor::ExecuteError),
    #[error("failed to parse {adapter} response: {message}")]
    ParseFailed { adapter: &'static str, message: String },
    #[error("unknown backend type: {0}")]
    UnknownKind(String),
}

/// Which external CLI a `BackendConfig` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    AssistantA,
    AssistantB,
    AssistantC,
}

impl std::str::FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(BackendKind::AssistantA),
            "b" => Ok(BackendKind::AssistantB),
            "c" => Ok(BackendKind::AssistantC),
            other => Err(BackendError::UnknownKind(other.to_string())),
        }
    }
}

/// Configuration for constructing one backend instance. `cwd` is always
/// overridden with the task's worktree path just before construction.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub command: String,
    pub cwd: PathBuf,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub system_prompt: Option<String>,
    /// Caller-chosen session identifier (client-chosen adapters only).
    pub session_id: Option<String>,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            command: command.into(),
            cwd: cwd.into(),
            model: None,
            provider: None,
            system_prompt: None,
            session_id: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }
}

/// Multi-turn text exchange with an external assistant CLI.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Deliver `msg` as one turn; return the assistant's text reply. The
    /// first call may start a session; subsequent calls continue it.
    async fn send(&mut self, ctx: CancellationToken, msg: &str) -> Result<String, BackendError>;

    /// Release adapter resources. Idempotent; safe on never-used adapters.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Current session handle, or empty if none has been established yet.
    fn session_id(&self) -> &str;
}

/// Builds a `Backend` for a given configuration, keyed by `BackendKind`.
/// Unknown tags fail construction with a descriptive error (enforced by
/// `BackendKind::from_str` upstream in configuration parsing).
pub fn construct_backend(
    config: BackendConfig,
    supervisor: ProcessSupervisor,
) -> Box<dyn Backend> {
    match config.kind {
        BackendKind::AssistantA => Box::new(AssistantABackend::new(config, supervisor)),
        BackendKind::AssistantB => Box::new(AssistantBBackend::new(config, supervisor)),
        BackendKind::AssistantC => Box::new(AssistantCBackend::new(config, supervisor)),
    }
}

/// Maps an agent-role to a backend instance, with the working directory
/// overridden to the task's worktree path at construction time. Required
/// for testability (inject mock backends) and future runtime
/// reconfiguration.
pub trait BackendFactory: Send + Sync {
    fn build(&self, agent_role: &str, cwd: PathBuf) -> Result<Box<dyn Backend>, BackendError>;
}

/// A static agent-role → backend-config table, the common case described
/// in spec §9 ("Backend factory indirection").
pub struct StaticBackendFactory {
    roles: std::collections::HashMap<String, BackendConfig>,
    supervisor: ProcessSupervisor,
}

impl StaticBackendFactory {
    pub fn new(
        roles: std::collections::HashMap<String, BackendConfig>,
        supervisor: ProcessSupervisor,
    ) -> Self {
        Self { roles, supervisor }
    }
}

impl BackendFactory for StaticBackendFactory {
    fn build(&self, agent_role: &str, cwd: PathBuf) -> Result<Box<dyn Backend>, BackendError> {
        let config = self
            .roles
            .get(agent_role)
            .cloned()
            .ok_or_else(|| BackendError::UnknownKind(agent_role.to_string()))?
            .with_cwd(cwd);
        Ok(construct_backend(config, self.supervisor.clone()))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
