// SPDX-License-Identifier: MIT

//! Assistant-B adapter: server-issued sessions. The first turn is an
//! `exec` invocation; the adapter parses a newline-delimited event stream,
//! reading the handle from the first `thread_started` event and the reply
//! from a `turn_completed` event. Subsequent turns `resume` the handle.

use super::{Backend, BackendConfig, BackendError};
use crate::supervisor::{ExecuteRequest, ProcessSupervisor};
use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

const ADAPTER: &str = "assistant-b";

pub struct AssistantBBackend {
    config: BackendConfig,
    supervisor: ProcessSupervisor,
    session_id: String,
}

impl AssistantBBackend {
    pub fn new(config: BackendConfig, supervisor: ProcessSupervisor) -> Self {
        Self {
            config,
            supervisor,
            session_id: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    ThreadStarted { thread_id: String },
    TurnCompleted { message: String },
    #[serde(other)]
    Other,
}

/// Parse a newline-delimited event stream, returning `(new_thread_id,
/// reply)`. Fails the whole turn on the first malformed line.
fn parse_events(raw: &str) -> Result<(Option<String>, String), BackendError> {
    let mut thread_id = None;
    let mut reply = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: WireEvent = serde_json::from_str(line).map_err(|e| BackendError::ParseFailed {
            adapter: ADAPTER,
            message: format!("malformed event line: {e}"),
        })?;

        match event {
            WireEvent::ThreadStarted { thread_id: id } => thread_id = Some(id),
            WireEvent::TurnCompleted { message } => reply = Some(message),
            WireEvent::Other => {}
        }
    }

    let reply = reply.ok_or_else(|| BackendError::ParseFailed {
        adapter: ADAPTER,
        message: "no turn_completed event in response stream".to_string(),
    })?;

    Ok((thread_id, reply))
}

#[async_trait]
impl Backend for AssistantBBackend {
    async fn send(&mut self, ctx: CancellationToken, msg: &str) -> Result<String, BackendError> {
        let mut req = ExecuteRequest::new(&self.config.command, &self.config.cwd);

        req = if self.session_id.is_empty() {
            req.arg("exec").arg(msg).arg("--json")
        } else {
            req.arg("resume").arg(&self.session_id).arg(msg).arg("--json")
        };

        if let Some(model) = &self.config.model {
            req = req.arg("--model").arg(model);
        }

        let out = self.supervisor.execute(ctx, req).await?;
        let (new_thread_id, reply) = parse_events(&out.stdout_string())?;

        if let Some(id) = new_thread_id {
            self.session_id = id;
        }

        Ok(reply)
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
#[path = "assistant_b_tests.rs"]
mod tests;
