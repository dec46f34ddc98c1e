use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use super::branches;
use super::history::classify;
use crate::error::{ScanError, ScanResult};
use crate::git::{parse, GitRunner};
use crate::types::{
    BranchName, Check, CheckFailure, HistoryState, HistoryStatus, RepositoryPath, RepositoryStatus,
    RevisionId,
};

const TOPLEVEL: &[&str] = &["rev-parse", "--show-toplevel"];
const FETCH: &[&str] = &["fetch", "--all", "--prune", "--quiet"];
const DIFF_WORKTREE: &[&str] = &["diff", "--no-ext-diff", "--name-only"];
const DIFF_STAGED: &[&str] = &["diff", "--no-ext-diff", "--cached", "--name-only"];
const LOCAL_TIP: &[&str] = &["rev-parse", "HEAD"];
const REMOTE_TIP: &[&str] = &["rev-parse", "@{upstream}"];
const MERGE_BASE: &[&str] = &["merge-base", "HEAD", "@{upstream}"];
const UNTRACKED: &[&str] = &["ls-files", "--others", "--exclude-standard"];
const STASH_LIST: &[&str] = &["stash", "list"];
const LOCAL_BRANCHES: &[&str] = &["for-each-ref", "--format=%(refname)", "refs/heads"];
const REMOTE_BRANCHES: &[&str] = &["for-each-ref", "--format=%(refname)", "refs/remotes"];

/// Inspect one working copy.
///
/// Only a path that is not a work tree fails as a whole. Every other
/// check is independent: a failing check is recorded in
/// [`RepositoryStatus::failures`] and its field keeps the neutral value.
pub async fn inspect<R: GitRunner>(
    runner: &R,
    path: &RepositoryPath,
    refresh_remote: bool,
) -> ScanResult<RepositoryStatus> {
    let repo = path.as_path();
    ensure_work_tree(runner, path).await?;

    let mut failures = Vec::new();

    // A failed fetch leaves the refs as they were; the checks below still
    // report against the last known remote state.
    if refresh_remote {
        if let Err(e) = runner.run(FETCH, repo).await {
            warn!(repo = %path, error = %e, "fetch failed, using local refs");
            failures.push(CheckFailure::new(Check::Fetch, &e));
        }
    }

    let (diff, history, untracked, stashes, dangling) = tokio::join!(
        has_uncommitted_diff(runner, repo),
        history_status(runner, repo),
        has_output(runner, UNTRACKED, repo),
        has_output(runner, STASH_LIST, repo),
        dangling_branches(runner, repo),
    );

    let status = RepositoryStatus {
        path: path.clone(),
        has_uncommitted_diff: record(&mut failures, Check::Diff, diff).unwrap_or(false),
        history: record(&mut failures, Check::History, history).unwrap_or(HistoryStatus::Unknown),
        has_untracked_files: record(&mut failures, Check::Untracked, untracked).unwrap_or(false),
        has_stashes: record(&mut failures, Check::Stash, stashes).unwrap_or(false),
        dangling_branches: record(&mut failures, Check::Branches, dangling).unwrap_or_default(),
        failures,
    };

    debug!(repo = %path, clean = status.is_clean(), "inspected");
    Ok(status)
}

fn record<T>(failures: &mut Vec<CheckFailure>, check: Check, result: ScanResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(check = check.as_str(), error = %e, "check failed");
            failures.push(CheckFailure::new(check, &e));
            None
        }
    }
}

/// The path must be the top level of a work tree. A plain directory nested
/// in another working copy is not a repository of its own.
async fn ensure_work_tree<R: GitRunner>(runner: &R, path: &RepositoryPath) -> ScanResult<()> {
    let not_a_repo = || ScanError::NotARepository(path.as_path().to_path_buf());
    let toplevel = match runner.run(TOPLEVEL, path.as_path()).await {
        Ok(out) => out.trim().to_string(),
        Err(ScanError::ProcessFailure { message, .. }) => {
            debug!(repo = %path, %message, "not a work tree");
            return Err(not_a_repo());
        }
        Err(e) => return Err(e),
    };

    if toplevel.is_empty() {
        return Err(not_a_repo());
    }
    if RepositoryPath::new(&toplevel) == *path || same_file(Path::new(&toplevel), path.as_path()).await {
        return Ok(());
    }
    debug!(repo = %path, %toplevel, "path is inside another work tree");
    Err(not_a_repo())
}

/// git prints the resolved top level, so symlinked paths only match once
/// both sides are canonicalized.
async fn same_file(a: &Path, b: &Path) -> bool {
    match tokio::join!(tokio::fs::canonicalize(a), tokio::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn has_output<R: GitRunner>(runner: &R, args: &[&str], repo: &Path) -> ScanResult<bool> {
    let out = runner.run(args, repo).await?;
    Ok(parse::has_output(&out))
}

/// Unstaged or staged changes to tracked files.
async fn has_uncommitted_diff<R: GitRunner>(runner: &R, repo: &Path) -> ScanResult<bool> {
    let (worktree, staged) = tokio::try_join!(
        has_output(runner, DIFF_WORKTREE, repo),
        has_output(runner, DIFF_STAGED, repo),
    )?;
    Ok(worktree || staged)
}

async fn revision<R: GitRunner>(runner: &R, args: &[&str], repo: &Path) -> ScanResult<RevisionId> {
    let out = runner.run(args, repo).await?;
    parse::revision(&out).ok_or_else(|| ScanError::ProcessFailure {
        command: args.join(" "),
        message: "no revision in output".to_string(),
    })
}

async fn history_status<R: GitRunner>(runner: &R, repo: &Path) -> ScanResult<HistoryStatus> {
    let local = revision(runner, LOCAL_TIP, repo).await?;

    let remote = match revision(runner, REMOTE_TIP, repo).await {
        Ok(remote) => remote,
        Err(ScanError::ProcessFailure { .. }) => return Ok(HistoryStatus::NoUpstream),
        Err(e) => return Err(e),
    };

    let state = match revision(runner, MERGE_BASE, repo).await {
        Ok(base) => classify(&local, &remote, &base),
        // merge-base fails when the tips share no ancestor at all.
        Err(ScanError::ProcessFailure { .. }) if local != remote => HistoryState::Diverged,
        Err(e) => return Err(e),
    };
    Ok(HistoryStatus::Tracked(state))
}

async fn dangling_branches<R: GitRunner>(runner: &R, repo: &Path) -> ScanResult<BTreeSet<BranchName>> {
    let (local, remote) = tokio::try_join!(
        runner.run(LOCAL_BRANCHES, repo),
        runner.run(REMOTE_BRANCHES, repo),
    )?;
    Ok(branches::dangling(
        &branches::branch_set(&local),
        &branches::branch_set(&remote),
    ))
}
