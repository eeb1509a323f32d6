// SPDX-License-Identifier: MIT

//! orc - local, single-user parallel agent orchestrator CLI.

mod exit_error;
mod runbook_load;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exit_error::ExitError;
use orc_adapters::{BackendFactory, ProcessSupervisor, StaticBackendFactory};
use orc_core::{SystemClock, UuidIdGen};
use orc_engine::{Dag, ParallelRunner, ResourceLockManager, RunnerConfig, RunnerError, WorkflowEngine, WorktreeManager};
use orc_runbook::{parse_runbook, translate};
use orc_storage::{EventSink, JsonLinesSink, NullSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "orc", version, about = "Local, single-user parallel agent orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a runbook without running anything
    Validate(ValidateArgs),
    /// Run a runbook's tasks to completion
    Run(RunArgs),
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Path to the runbook file (.hcl, .toml, or .json)
    runbook: PathBuf,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to the runbook file (.hcl, .toml, or .json)
    runbook: PathBuf,

    /// Git repository root tasks are run against
    #[arg(short = 'C', long, default_value = ".")]
    repo: PathBuf,

    /// Maximum number of tasks executed concurrently
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Branch every task worktree is created from
    #[arg(long, default_value = "main")]
    base_branch: String,

    /// Branch completed task branches are merged into
    #[arg(long, default_value = "main")]
    integration_branch: String,

    /// Append lifecycle events as JSON lines to this file
    #[arg(long)]
    events_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        let code = e.downcast_ref::<ExitError>().map_or(1, |c| c.code);
        eprintln!("Error: {e:#}");
        std::process::exit(code);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => validate(args),
        Commands::Run(args) => run_runbook(args).await,
    }
}

fn validate(args: ValidateArgs) -> Result<()> {
    let (content, format) = runbook_load::read(&args.runbook)?;
    let runbook = parse_runbook(&content, format)
        .with_context(|| format!("invalid runbook: {}", args.runbook.display()))
        .map_err(|e| ExitError::wrap(2, e))?;
    let (tasks, workflows, providers) = translate(&runbook).map_err(|e| ExitError::wrap(2, e.into()))?;
    println!(
        "runbook ok: {} provider(s), {} workflow(s), {} task(s)",
        providers.len(),
        workflows.len(),
        tasks.len(),
    );
    Ok(())
}

async fn run_runbook(args: RunArgs) -> Result<()> {
    let (content, format) = runbook_load::read(&args.runbook)?;
    let runbook = parse_runbook(&content, format)
        .with_context(|| format!("invalid runbook: {}", args.runbook.display()))
        .map_err(|e| ExitError::wrap(2, e))?;
    let (tasks, workflows, providers) = translate(&runbook).map_err(|e| ExitError::wrap(2, e.into()))?;

    let repo_root = std::fs::canonicalize(&args.repo)
        .with_context(|| format!("cannot resolve repo root: {}", args.repo.display()))?;

    let dag = Arc::new(Dag::new());
    for task in tasks {
        dag.add(task).map_err(anyhow::Error::from)?;
    }

    let supervisor = ProcessSupervisor::new();
    let locks = Arc::new(ResourceLockManager::new());
    let worktrees = Arc::new(WorktreeManager::new(repo_root, supervisor.clone()));
    let workflow = Arc::new(WorkflowEngine::new(workflows));
    let backends: Arc<dyn BackendFactory> = Arc::new(StaticBackendFactory::new(providers, supervisor.clone()));
    let sink: Arc<dyn EventSink> = match &args.events_file {
        Some(path) => Arc::new(JsonLinesSink::new(path).with_context(|| format!("opening events file: {}", path.display()))?),
        None => Arc::new(NullSink),
    };
    let (qna, mut qna_receiver) = orc_engine::qna_channel();

    tokio::spawn(async move {
        while let Some(pending) = qna_receiver.recv().await {
            eprintln!("[question] {}: {}", pending.question.task_id, pending.question.text);
            pending.answer("");
        }
    });

    let config = RunnerConfig {
        max_concurrency: args.concurrency,
        base_branch: args.base_branch,
        integration_branch: args.integration_branch,
    };

    let runner = ParallelRunner::new(
        dag,
        locks,
        worktrees,
        backends,
        workflow,
        sink,
        SystemClock,
        Arc::new(UuidIdGen),
        qna,
        supervisor,
        config,
    );

    let token = CancellationToken::new();
    let shutdown_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_token.cancel();
        }
    });

    let summary = match runner.run(token).await {
        Ok(summary) => summary,
        Err(RunnerError::Cancelled) => return Err(ExitError::new(130, "run cancelled").into()),
        Err(e) => return Err(anyhow::Error::from(e)),
    };
    println!(
        "completed={} failed={} skipped={} total={}",
        summary.completed, summary.failed, summary.skipped, summary.total,
    );

    if summary.failed > 0 {
        return Err(ExitError::new(1, "one or more tasks failed").into());
    }
    Ok(())
}
