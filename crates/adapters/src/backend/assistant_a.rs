// SPDX-License-Identifier: MIT

//! Assistant-A adapter: client-chosen sessions. The adapter generates a
//! v4 UUID when the caller supplies none; the first turn passes a
//! create-session flag, every subsequent turn resumes it.

use super::{Backend, BackendConfig, BackendError};
use crate::supervisor::{ExecuteRequest, ProcessSupervisor};
use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

const ADAPTER: &str = "assistant-a";

pub struct AssistantABackend {
    config: BackendConfig,
    supervisor: ProcessSupervisor,
    session_id: String,
    started: bool,
}

impl AssistantABackend {
    pub fn new(config: BackendConfig, supervisor: ProcessSupervisor) -> Self {
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            config,
            supervisor,
            session_id,
            started: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssistantAResponse {
    #[serde(default)]
    #[allow(dead_code)]
    session_id: Option<String>,
    result: AssistantAResult,
}

#[derive(Debug, Deserialize)]
struct AssistantAResult {
    content: Vec<AssistantAContentItem>,
}

#[derive(Debug, Deserialize)]
struct AssistantAContentItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn parse_response(raw: &str) -> Result<String, BackendError> {
    let parsed: AssistantAResponse =
        serde_json::from_str(raw).map_err(|e| BackendError::ParseFailed {
            adapter: ADAPTER,
            message: e.to_string(),
        })?;

    let text = parsed
        .result
        .content
        .iter()
        .filter(|item| item.kind == "text")
        .filter_map(|item| item.text.as_deref())
        .collect::<Vec<_>>()
        .join("");

    Ok(text)
}

#[async_trait]
impl Backend for AssistantABackend {
    async fn send(&mut self, ctx: CancellationToken, msg: &str) -> Result<String, BackendError> {
        let mut req = ExecuteRequest::new(&self.config.command, &self.config.cwd)
            .arg("-p")
            .arg(msg)
            .arg("--output-format")
            .arg("json");

        req = if self.started {
            req.arg("--resume").arg(&self.session_id)
        } else {
            req.arg("--session-id").arg(&self.session_id)
        };

        if let Some(model) = &self.config.model {
            req = req.arg("--model").arg(model);
        }
        if let Some(system_prompt) = &self.config.system_prompt {
            req = req.arg("--system-prompt").arg(system_prompt);
        }

        let out = self.supervisor.execute(ctx, req).await?;
        self.started = true;
        parse_response(&out.stdout_string())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
#[path = "assistant_a_tests.rs"]
mod tests;
