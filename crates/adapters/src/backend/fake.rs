// SPDX-License-Identifier: MIT

//! In-memory fake backend for engine/runner tests — no subprocess, no
//! real CLI. Mirrors the teacher pack's `FakeAgentAdapter` test-support
//! pattern.

use super::{Backend, BackendError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One recorded `send` call, for assertions in tests.
#[derive(Debug, Clone)]
pub struct FakeSendCall {
    pub msg: String,
}

#[derive(Default)]
struct FakeBackendState {
    calls: Vec<FakeSendCall>,
    closed: bool,
}

/// A backend whose replies and latency are scripted by the test.
#[derive(Clone)]
pub struct FakeBackend {
    session_id: String,
    reply: Arc<dyn Fn(&str) -> Result<String, BackendError> + Send + Sync>,
    delay: Duration,
    state: Arc<Mutex<FakeBackendState>>,
}

impl FakeBackend {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            reply: Arc::new(|msg| Ok(format!("echo: {msg}"))),
            delay: Duration::ZERO,
            state: Arc::new(Mutex::new(FakeBackendState::default())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_reply<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        self.reply = Arc::new(f);
        self
    }

    pub fn calls(&self) -> Vec<FakeSendCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn send(&mut self, ctx: CancellationToken, msg: &str) -> Result<String, BackendError> {
        self.state.lock().calls.push(FakeSendCall {
            msg: msg.to_string(),
        });

        if !self.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = ctx.cancelled() => {
                    return Err(BackendError::Process(
                        crate::supervisor::ExecuteError::Cancelled {
                            program: "fake".to_string(),
                        },
                    ));
                }
            }
        }

        (self.reply)(msg)
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
