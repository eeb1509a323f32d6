// SPDX-License-Identifier: MIT

//! Process Supervisor (spec §4.A).
//!
//! Launches every child process in its own process group so that a single
//! terminal signal kills the entire descendant tree, drains stdout/stderr
//! concurrently so a full OS pipe buffer can never deadlock the child, and
//! tracks every running child in a process-wide registry for shutdown.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// Grace period between SIGTERM and SIGKILL when force-killing a process
/// group.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// One subprocess invocation to run to completion.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Additional environment variables; the child also inherits the
    /// supervisor process's environment.
    pub env: Vec<(String, String)>,
}

impl ExecuteRequest {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Captured output of a completed subprocess.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecuteOutput {
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Errors from a supervised subprocess run.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code}")]
    NonZeroExit {
        program: String,
        code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    #[error("{program} was cancelled")]
    Cancelled { program: String },
}

/// Guard that force-kills an entire process group on drop or explicit
/// `kill()`. Safe to call `kill()` more than once — only the first call
/// sends signals.
struct ProcessGroupGuard {
    pid: u32,
    killed: AtomicBool,
}

impl ProcessGroupGuard {
    fn new(pid: u32) -> Self {
        Self {
            pid,
            killed: AtomicBool::new(false),
        }
    }

    #[cfg(unix)]
    fn kill(&self) {
        if self.killed.swap(true, Ordering::SeqCst) {
            return;
        }

        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(self.pid as i32);
        if killpg(pgid, Signal::SIGTERM).is_err() {
            // Process group already gone; nothing left to escalate to.
            return;
        }

        let pid = self.pid;
        std::thread::spawn(move || {
            std::thread::sleep(KILL_GRACE);
            let pgid = Pid::from_raw(pid as i32);
            let _ = killpg(pgid, Signal::SIGKILL);
        });
    }

    #[cfg(not(unix))]
    fn kill(&self) {
        if self.killed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::warn!(pid = self.pid, "process-group kill not supported on this platform");
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Tracks and supervises every child process spawned through `execute`.
#[derive(Clone, Default)]
pub struct ProcessSupervisor {
    registry: Arc<Mutex<HashMap<u32, Arc<ProcessGroupGuard>>>>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `req` to completion, or until `token` is cancelled.
    ///
    /// Stdout and stderr are drained concurrently by two independent
    /// readers started before the process is waited on — the only defense
    /// against the OS pipe buffer filling and deadlocking the child.
    pub async fn execute(
        &self,
        token: CancellationToken,
        req: ExecuteRequest,
    ) -> Result<ExecuteOutput, ExecuteError> {
        let mut cmd = Command::new(&req.program);
        cmd.args(&req.args)
            .current_dir(&req.cwd)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        for (k, v) in &req.env {
            cmd.env(k, v);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child: Child = cmd.spawn().map_err(|source| ExecuteError::SpawnFailed {
            program: req.program.clone(),
            source,
        })?;

        let pid = child.id().unwrap_or(0);
        let guard = Arc::new(ProcessGroupGuard::new(pid));
        if pid != 0 {
            self.registry.lock().insert(pid, guard.clone());
        }

        tracing::debug!(program = %req.program, pid, "spawned supervised process");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_task = tokio::spawn(drain(stdout));
        let stderr_task = tokio::spawn(drain(stderr));

        let wait_result = tokio::select! {
            _ = token.cancelled() => {
                guard.kill();
                let _ = child.wait().await;
                None
            }
            status = child.wait() => Some(status),
        };

        if pid != 0 {
            self.registry.lock().remove(&pid);
        }

        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();

        let status = match wait_result {
            None => {
                return Err(ExecuteError::Cancelled {
                    program: req.program,
                });
            }
            Some(Ok(status)) => status,
            Some(Err(source)) => {
                return Err(ExecuteError::SpawnFailed {
                    program: req.program,
                    source,
                });
            }
        };

        if status.success() {
            Ok(ExecuteOutput {
                stdout: stdout_bytes,
                stderr: stderr_bytes,
            })
        } else {
            Err(ExecuteError::NonZeroExit {
                program: req.program,
                code: status.code().unwrap_or(-1),
                stdout: stdout_bytes,
                stderr: stderr_bytes,
            })
        }
    }

    /// Terminate every registered process group. Idempotent: killing an
    /// already-exited child is not an error.
    pub fn shutdown_all(&self) {
        let guards: Vec<_> = self.registry.lock().values().cloned().collect();
        tracing::info!(count = guards.len(), "shutting down supervised processes");
        for guard in guards {
            guard.kill();
        }
    }

    /// Number of processes currently tracked (test/observability helper).
    pub fn active_count(&self) -> usize {
        self.registry.lock().len()
    }
}

async fn drain<R>(reader: Option<R>) -> Vec<u8>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut r) = reader {
        let _ = r.read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
