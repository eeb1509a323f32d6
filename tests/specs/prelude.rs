//! Test helpers for end-to-end `orc` CLI specifications.
//!
//! These tests are black-box: they invoke the compiled `orc` binary
//! against a scratch git repository and a fake assistant-a CLI script,
//! then verify stdout and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Resolve the compiled `orc` binary, mirroring cargo's own test layout.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

fn orc_binary() -> PathBuf {
    binary_path("orc")
}

pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(orc_binary());
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{expected}'\nstdout: {stdout}",
        );
        self
    }
}

/// A scratch git repository with a fake `assistant-a`-protocol CLI script
/// installed, ready to be the `--repo` for an `orc run` invocation.
pub struct Project {
    dir: tempfile::TempDir,
    scratch: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let scratch = tempfile::tempdir().expect("tempdir");
        let project = Self { dir, scratch };
        project.git(&["init", "-q", "-b", "main"]);
        project.git(&["config", "user.email", "test@example.com"]);
        project.git(&["config", "user.name", "test"]);
        project.file("README.md", "seed\n");
        project.git(&["add", "."]);
        project.git(&["commit", "-q", "-m", "seed"]);
        project.install_fake_agent();
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .status()
            .expect("git should run");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Stage and commit every change on `main`, for tests that need a
    /// specific file committed before the run branches worktrees from it.
    pub fn orc_git_commit_all(&self, message: &str) {
        self.git(&["add", "."]);
        self.git(&["commit", "-q", "-m", message]);
    }

    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    /// Installs `fake-agent.sh`, a shell script speaking the same
    /// `-p <prompt> --output-format json [--session-id|--resume] <id>`
    /// protocol as the assistant-a adapter. The prompt text is a tiny
    /// DSL of `;`-separated directives so tests can make a "turn" write a
    /// file, sleep, or fail without needing a real assistant.
    fn install_fake_agent(&self) {
        let script = r#"#!/bin/sh
prompt=""
while [ $# -gt 0 ]; do
  case "$1" in
    -p) prompt="$2"; shift 2 ;;
    *) shift ;;
  esac
done

old_ifs="$IFS"
IFS=';'
for part in $prompt; do
  case "$part" in
    sleep=*)
      ms="${part#sleep=}"
      secs=$(awk -v ms="$ms" 'BEGIN { printf "%f", ms/1000 }')
      sleep "$secs"
      ;;
    write=*)
      rest="${part#write=}"
      file="${rest%%:*}"
      text="${rest#*:}"
      echo "$text" >> "$file"
      ;;
    extlog=*)
      rest="${part#extlog=}"
      logfile=$(echo "$rest" | cut -d: -f1)
      label=$(echo "$rest" | cut -d: -f2)
      ms=$(echo "$rest" | cut -d: -f3)
      secs=$(awk -v ms="$ms" 'BEGIN { printf "%f", ms/1000 }')
      echo "$label start $(date +%s%N)" >> "$logfile"
      sleep "$secs"
      echo "$label end $(date +%s%N)" >> "$logfile"
      ;;
    fail=*)
      code="${part#fail=}"
      exit "$code"
      ;;
  esac
done
IFS="$old_ifs"

printf '{"result":{"content":[{"type":"text","text":"done:%s"}]}}' "$prompt"
"#;
        let path = self.path().join("fake-agent.sh");
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    pub fn fake_agent_command(&self) -> String {
        self.path().join("fake-agent.sh").to_string_lossy().into_owned()
    }

    pub fn write_runbook(&self, name: &str, content: &str) -> PathBuf {
        self.file(name, content);
        self.path().join(name)
    }

    pub fn orc(&self) -> CliBuilder {
        cli().pwd(self.path())
    }

    /// List worktree directories still present under `.orc/worktrees`.
    pub fn worktree_dirs(&self) -> Vec<PathBuf> {
        let dir = self.path().join(".orc/worktrees");
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    /// Absolute path to a file outside the repository, for the fake
    /// agent's `extlog` directive to record cross-task event ordering.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }
}
