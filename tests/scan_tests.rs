mod common;

use common::{commit_file, git, Fixture};
use git_scan_lib::error::ScanError;
use git_scan_lib::git::GitCommand;
use git_scan_lib::scan::{inspect, scan, ScanOptions};
use git_scan_lib::types::{HistoryState, HistoryStatus, RepositoryPath, RepositoryStatus};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

fn runner() -> GitCommand {
    GitCommand::new(Some(Duration::from_secs(30)))
}

async fn status_of(path: &std::path::Path, fetch: bool) -> RepositoryStatus {
    inspect(&runner(), &RepositoryPath::new(path), fetch)
        .await
        .unwrap()
}

fn dangling(status: &RepositoryStatus) -> Vec<&str> {
    status.dangling_branches.iter().map(|b| b.as_str()).collect()
}

#[tokio::test]
async fn test_fresh_clone_is_clean() {
    let fx = Fixture::new();
    let status = status_of(&fx.work, false).await;
    assert!(status.is_clean(), "{status:?}");
}

#[tokio::test]
async fn test_modified_tracked_file_is_a_diff() {
    let fx = Fixture::new();
    fs::write(fx.work.join("README.md"), "changed\n").unwrap();

    let status = status_of(&fx.work, false).await;
    assert!(status.has_uncommitted_diff);
    assert!(!status.has_untracked_files);
}

#[tokio::test]
async fn test_staged_file_is_a_diff() {
    let fx = Fixture::new();
    fs::write(fx.work.join("new.txt"), "staged\n").unwrap();
    git(&fx.work, &["add", "new.txt"]);

    let status = status_of(&fx.work, false).await;
    assert!(status.has_uncommitted_diff);
    assert!(!status.has_untracked_files);
}

#[tokio::test]
async fn test_untracked_excludes_ignored() {
    let fx = Fixture::new();
    commit_file(&fx.work, ".gitignore", "*.log\n");
    git(&fx.work, &["push", "-q"]);
    fs::write(fx.work.join("debug.log"), "noise\n").unwrap();

    let status = status_of(&fx.work, false).await;
    assert!(!status.has_untracked_files);

    fs::write(fx.work.join("notes.txt"), "todo\n").unwrap();
    let status = status_of(&fx.work, false).await;
    assert!(status.has_untracked_files);
}

#[tokio::test]
async fn test_stash_detected() {
    let fx = Fixture::new();
    fs::write(fx.work.join("README.md"), "wip\n").unwrap();
    git(&fx.work, &["stash", "-q"]);

    let status = status_of(&fx.work, false).await;
    assert!(status.has_stashes);
    assert!(!status.has_uncommitted_diff);
}

#[tokio::test]
async fn test_local_commit_needs_push() {
    let fx = Fixture::new();
    commit_file(&fx.work, "local.txt", "local\n");

    let status = status_of(&fx.work, false).await;
    assert_eq!(status.history, HistoryStatus::Tracked(HistoryState::PushNeeded));
}

#[tokio::test]
async fn test_remote_commit_needs_pull_after_fetch() {
    let fx = Fixture::new();
    fx.push_from_elsewhere("remote.txt");

    // Without refreshing, the local view of origin is stale.
    let stale = status_of(&fx.work, false).await;
    assert_eq!(stale.history, HistoryStatus::Tracked(HistoryState::Equal));

    let fresh = status_of(&fx.work, true).await;
    assert_eq!(fresh.history, HistoryStatus::Tracked(HistoryState::PullNeeded));
    assert!(fresh.failures.is_empty(), "{:?}", fresh.failures);
}

#[tokio::test]
async fn test_both_sides_committed_diverges() {
    let fx = Fixture::new();
    fx.push_from_elsewhere("remote.txt");
    commit_file(&fx.work, "local.txt", "local\n");

    let status = status_of(&fx.work, true).await;
    assert_eq!(status.history, HistoryStatus::Tracked(HistoryState::Diverged));
}

#[tokio::test]
async fn test_unpushed_branch_has_no_upstream_and_dangles() {
    let fx = Fixture::new();
    git(&fx.work, &["checkout", "-q", "-b", "topic"]);

    let status = status_of(&fx.work, false).await;
    assert_eq!(status.history, HistoryStatus::NoUpstream);
    assert_eq!(dangling(&status), vec!["topic"]);
    assert!(status.failures.is_empty(), "{:?}", status.failures);
}

#[tokio::test]
async fn test_pushed_branch_no_longer_dangles() {
    let fx = Fixture::new();
    git(&fx.work, &["branch", "feature"]);
    assert_eq!(dangling(&status_of(&fx.work, false).await), vec!["feature"]);

    git(&fx.work, &["push", "-q", "origin", "feature"]);
    assert!(status_of(&fx.work, false).await.dangling_branches.is_empty());
}

#[tokio::test]
async fn test_fetch_failure_keeps_other_checks() {
    let fx = Fixture::new();
    git(&fx.work, &["remote", "set-url", "origin", "/nonexistent/remote.git"]);
    fs::write(fx.work.join("README.md"), "changed\n").unwrap();

    let status = status_of(&fx.work, true).await;
    assert_eq!(status.failures.len(), 1);
    assert!(status.has_uncommitted_diff);
    assert_eq!(status.history, HistoryStatus::Tracked(HistoryState::Equal));
}

#[tokio::test]
async fn test_plain_directory_is_not_a_repository() {
    let dir = TempDir::new().unwrap();
    let err = inspect(&runner(), &RepositoryPath::new(dir.path()), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::NotARepository(_)));

    let missing = dir.path().join("missing");
    let err = inspect(&runner(), &RepositoryPath::new(&missing), false)
        .await
        .unwrap_err();
    assert_eq!(err, ScanError::NotARepository(missing));
}

#[tokio::test]
async fn test_directory_inside_work_tree_is_not_a_repository() {
    let fx = Fixture::new();
    let docs = fx.work.join("docs");
    fs::create_dir_all(&docs).unwrap();

    let err = inspect(&runner(), &RepositoryPath::new(&docs), false)
        .await
        .unwrap_err();
    assert_eq!(err, ScanError::NotARepository(docs));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_to_work_tree_is_a_repository() {
    let fx = Fixture::new();
    let link = fx.dir.path().join("link");
    std::os::unix::fs::symlink(&fx.work, &link).unwrap();

    let status = status_of(&link, false).await;
    assert!(status.is_clean(), "{status:?}");
}

#[tokio::test]
async fn test_scan_dedups_and_reports_bad_paths() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("missing");
    let work_with_slash = format!("{}/", fx.work.display());
    let paths = vec![
        fx.work.display().to_string(),
        work_with_slash,
        missing.display().to_string(),
    ];

    let (_tx, rx) = watch::channel(false);
    let report = scan(&runner(), &paths, &ScanOptions::default(), rx).await;

    assert_eq!(report.reports.len(), 2);
    assert_eq!(report.reports[0].path.as_path(), fx.work.as_path());
    assert!(report.reports[0].outcome.as_ref().unwrap().is_clean());
    assert!(report.reports[1].is_failure());
    assert!(report.has_failures());
    assert!(!report.cancelled);
}
