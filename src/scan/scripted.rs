//! In-memory `GitRunner` for inspector and coordinator tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ScanError, ScanResult};
use crate::git::GitRunner;

#[derive(Clone)]
struct Response {
    result: ScanResult<String>,
    delay: Option<Duration>,
}

/// Answers git commands from a script; unscripted commands print nothing.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Mutex<HashMap<(PathBuf, String), Response>>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, repo: &str, args: &str, stdout: &str) -> &Self {
        self.insert(repo, args, Ok(stdout.to_string()), None)
    }

    pub(crate) fn fail(&self, repo: &str, args: &str, message: &str) -> &Self {
        let error = ScanError::ProcessFailure {
            command: args.to_string(),
            message: message.to_string(),
        };
        self.insert(repo, args, Err(error), None)
    }

    pub(crate) fn time_out(&self, repo: &str, args: &str) -> &Self {
        let error = ScanError::Timeout {
            command: args.to_string(),
            timeout: Duration::from_secs(1),
        };
        self.insert(repo, args, Err(error), None)
    }

    pub(crate) fn delay(&self, repo: &str, args: &str, stdout: &str, delay: Duration) -> &Self {
        self.insert(repo, args, Ok(stdout.to_string()), Some(delay))
    }

    /// A repository on `main`, in sync with `origin/main`, with nothing pending.
    pub(crate) fn clean_repo(&self, repo: &str) -> &Self {
        self.respond(repo, "rev-parse --show-toplevel", &format!("{repo}\n"))
            .respond(repo, "rev-parse HEAD", "abc\n")
            .respond(repo, "rev-parse @{upstream}", "abc\n")
            .respond(repo, "merge-base HEAD @{upstream}", "abc\n")
            .respond(repo, "for-each-ref --format=%(refname) refs/heads", "refs/heads/main\n")
            .respond(
                repo,
                "for-each-ref --format=%(refname) refs/remotes",
                "refs/remotes/origin/HEAD\nrefs/remotes/origin/main\n",
            )
    }

    pub(crate) fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_for(&self, repo: &str, args: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(r, a)| r == Path::new(repo) && a == args)
            .count()
    }

    fn insert(&self, repo: &str, args: &str, result: ScanResult<String>, delay: Option<Duration>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert((PathBuf::from(repo), args.to_string()), Response { result, delay });
        self
    }
}

impl GitRunner for ScriptedRunner {
    async fn run(&self, args: &[&str], repo: &Path) -> ScanResult<String> {
        let key = (repo.to_path_buf(), args.join(" "));
        self.calls.lock().unwrap().push(key.clone());
        let response = self.responses.lock().unwrap().get(&key).cloned();
        match response {
            Some(Response { result, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(String::new()),
        }
    }
}
