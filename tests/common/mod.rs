#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git with a fixed identity; panics on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Scan Test")
        .env("GIT_AUTHOR_EMAIL", "scan@example.com")
        .env("GIT_COMMITTER_NAME", "Scan Test")
        .env("GIT_COMMITTER_EMAIL", "scan@example.com")
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn commit_file(repo: &Path, name: &str, contents: &str) {
    fs::write(repo.join(name), contents).unwrap();
    git(repo, &["add", name]);
    git(repo, &["commit", "-q", "-m", &format!("update {name}")]);
}

/// A bare remote and a working clone tracking `origin/main`.
pub struct Fixture {
    pub dir: TempDir,
    pub remote: PathBuf,
    pub work: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("remote.git");
        let work = dir.path().join("work");

        git(dir.path(), &["init", "-q", "--bare", "remote.git"]);
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "-q"]);
        git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);
        commit_file(&work, "README.md", "hello\n");
        git(&work, &["push", "-q", "-u", "origin", "main"]);

        Self { dir, remote, work }
    }

    /// Another clone that pushes a new commit to the remote.
    pub fn push_from_elsewhere(&self, name: &str) {
        let other = self.dir.path().join(format!("other-{name}"));
        git(
            self.dir.path(),
            &["clone", "-q", self.remote.to_str().unwrap(), other.to_str().unwrap()],
        );
        commit_file(&other, name, "remote change\n");
        git(&other, &["push", "-q", "origin", "main"]);
    }
}
