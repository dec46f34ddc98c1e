use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::info;

use crate::config::{self, ScanConfig};
use crate::git::{GitCommand, GitRunner};
use crate::report;
use crate::scan::{self, ScanOptions};
use crate::types::ScanReport;

/// Exit code when at least one repository could not be inspected.
pub const EXIT_FAILED: i32 = 1;
/// Exit code when the scan was interrupted.
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Repositories to scan instead of the configured ones
    pub paths: Vec<PathBuf>,
    /// Fetch from all remotes before scanning
    #[arg(long)]
    pub fetch: bool,
    /// Only scan this configured group (repeatable)
    #[arg(long = "group", short = 'g')]
    pub groups: Vec<String>,
    /// Config file (default: ~/.config/git-scan/config.toml)
    #[arg(long, env = config::CONFIG_ENV)]
    pub config: Option<PathBuf>,
    /// Per git command timeout in seconds, 0 to disable
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Repositories inspected concurrently
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
    /// Print a JSON document instead of text blocks
    #[arg(long)]
    pub json: bool,
}

/// Scan and print; returns the process exit code.
pub fn run(args: ScanArgs) -> Result<i32> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

async fn run_async(args: ScanArgs) -> Result<i32> {
    let config = config::load(args.config.as_deref())?;
    let paths = target_paths(&args, &config)?;

    if paths.is_empty() {
        println!("{}", "No repositories configured".yellow());
        if let Some(path) = config::global_config_path() {
            println!("\nList repositories under `repos` in {}", path.display());
        }
        return Ok(0);
    }

    let runner = GitCommand::new(config.timeout(args.timeout)?);
    ensure_git(&runner).await?;

    let options = ScanOptions {
        refresh_remote: args.fetch || config.fetch,
        jobs: config.jobs(args.jobs),
    };
    info!(
        repositories = paths.len(),
        fetch = options.refresh_remote,
        jobs = options.jobs,
        timeout = ?runner.timeout(),
        "starting scan"
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let report = scan::scan(&runner, &paths, &options, cancel_rx).await;
    print_report(&report, args.json)?;
    Ok(exit_code(&report))
}

/// CLI paths win over config; config entries go through group selection
/// and pattern expansion.
fn target_paths(args: &ScanArgs, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    if !args.paths.is_empty() {
        return Ok(args.paths.clone());
    }
    let entries = config.select(&args.groups)?;
    config::resolve_entries(&entries)
}

async fn ensure_git(runner: &GitCommand) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    if let Err(e) = runner.run(&["--version"], &cwd).await {
        bail!("git is not available: {e}");
    }
    Ok(())
}

fn print_report(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report::render_json(report)?);
    } else if !report.reports.is_empty() {
        println!("{}", report::render(&report.reports));
    }

    if report.cancelled {
        eprintln!(
            "\n{}",
            format!(
                "Scan cancelled: {} repositories inspected",
                report.reports.len()
            )
            .yellow()
        );
    }
    Ok(())
}

pub fn exit_code(report: &ScanReport) -> i32 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if report.has_failures() {
        EXIT_FAILED
    } else {
        0
    }
}
