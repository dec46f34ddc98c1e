use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{ScanError, ScanResult};

/// Runs one git command in a repository and returns its stdout.
pub trait GitRunner: Send + Sync {
    /// Stdout is returned untrimmed. A non-zero exit is a `ProcessFailure`.
    fn run(&self, args: &[&str], repo: &Path) -> impl Future<Output = ScanResult<String>> + Send;
}

/// Spawns the real `git` binary.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl GitCommand {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            program: PathBuf::from("git"),
            timeout,
        }
    }

    /// Use a different executable, e.g. a wrapper script or an absolute path.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GitRunner for GitCommand {
    async fn run(&self, args: &[&str], repo: &Path) -> ScanResult<String> {
        let command = args.join(" ");
        debug!(repo = %repo.display(), command = %command, "running git");

        // Dropping the future (timeout, cancelled scan) kills the child.
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(repo)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = cmd.output();

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output)
                .await
                .map_err(|_| ScanError::Timeout {
                    command: command.clone(),
                    timeout,
                })?,
            None => output.await,
        };

        let output = result.map_err(|e| ScanError::ProcessFailure {
            command: command.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ScanError::ProcessFailure { command, message });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
