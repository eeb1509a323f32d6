// SPDX-License-Identifier: MIT

//! Assistant-C adapter: client-chosen session named with a stable literal
//! prefix. Supports per-call model and provider selection (including local
//! models). Output may be a single JSON document or a newline-delimited
//! stream; the adapter tries the strict form first, then the streamed
//! form, and finally falls back to the raw output as content.

use super::{Backend, BackendConfig, BackendError};
use crate::supervisor::{ExecuteRequest, ProcessSupervisor};
use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Stable literal prefix for generated session names.
const SESSION_PREFIX: &str = "orc-session-";

pub struct AssistantCBackend {
    config: BackendConfig,
    supervisor: ProcessSupervisor,
    session_name: String,
    started: bool,
}

impl AssistantCBackend {
    pub fn new(config: BackendConfig, supervisor: ProcessSupervisor) -> Self {
        let session_name = config
            .session_id
            .clone()
            .unwrap_or_else(|| format!("{SESSION_PREFIX}{}", uuid::Uuid::new_v4()));
        Self {
            config,
            supervisor,
            session_name,
            started: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StrictResponse {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    chunk: Option<String>,
}

/// Strict JSON -> newline-delimited JSON -> raw text fallback.
fn parse_response(raw: &str) -> String {
    if let Ok(strict) = serde_json::from_str::<StrictResponse>(raw) {
        return strict.reply;
    }

    let mut assembled = String::new();
    let mut any_line_parsed = false;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamChunk>(line) {
            Ok(chunk) => {
                any_line_parsed = true;
                if let Some(text) = chunk.chunk {
                    assembled.push_str(&text);
                }
            }
            Err(_) => {
                any_line_parsed = false;
                break;
            }
        }
    }
    if any_line_parsed {
        return assembled;
    }

    raw.trim().to_string()
}

#[async_trait]
impl Backend for AssistantCBackend {
    async fn send(&mut self, ctx: CancellationToken, msg: &str) -> Result<String, BackendError> {
        let mut req = ExecuteRequest::new(&self.config.command, &self.config.cwd)
            .arg("run")
            .arg("--text")
            .arg(msg)
            .arg("--output-format")
            .arg("json");

        req = if self.started {
            req.arg("--resume").arg(&self.session_name)
        } else {
            req.arg("--name").arg(&self.session_name)
        };

        if let Some(provider) = &self.config.provider {
            req = req.arg("--provider").arg(provider);
        }
        if let Some(model) = &self.config.model {
            req = req.arg("--model").arg(model);
        }
        if let Some(system_prompt) = &self.config.system_prompt {
            req = req.arg("--system").arg(system_prompt);
        }

        let out = self.supervisor.execute(ctx, req).await?;
        self.started = true;
        Ok(parse_response(&out.stdout_string()))
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_name
    }
}

#[cfg(test)]
#[path = "assistant_c_tests.rs"]
mod tests;
