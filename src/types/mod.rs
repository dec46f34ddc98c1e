use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::ScanError;

/// Location of one working copy. Equality is by normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RepositoryPath(PathBuf);

impl RepositoryPath {
    /// Expand a leading `~`, resolve relative paths against the current
    /// directory, and drop `.` components and trailing separators.
    /// The path is not canonicalized, so missing paths keep their spelling.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let expanded = match path.strip_prefix("~") {
            Ok(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => path.to_path_buf(),
            },
            Err(_) => path.to_path_buf(),
        };
        let absolute = if expanded.is_relative() {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(expanded),
                Err(_) => expanded,
            }
        } else {
            expanded
        };
        Self(
            absolute
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect(),
        )
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Last path component, used as the display name of the repository.
    pub fn name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Opaque commit identifier, compared for equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relation between the current branch tip and its upstream tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryState {
    Equal,
    PullNeeded,
    PushNeeded,
    Diverged,
}

/// Outcome of the history check for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    Tracked(HistoryState),
    /// The current branch has no upstream configured.
    NoUpstream,
    /// The history check itself failed; see the status failures.
    Unknown,
}

impl Serialize for HistoryStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HistoryStatus::Tracked(state) => state.serialize(serializer),
            HistoryStatus::NoUpstream => serializer.serialize_str("NO_UPSTREAM"),
            HistoryStatus::Unknown => serializer.serialize_str("UNKNOWN"),
        }
    }
}

/// Independent sub-checks run by the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Fetch,
    Diff,
    History,
    Untracked,
    Stash,
    Branches,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::Fetch => "fetch",
            Check::Diff => "diff",
            Check::History => "history",
            Check::Untracked => "untracked",
            Check::Stash => "stash",
            Check::Branches => "branches",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub check: Check,
    pub message: String,
}

impl CheckFailure {
    pub fn new(check: Check, error: &ScanError) -> Self {
        Self {
            check,
            message: error.to_string(),
        }
    }
}

/// Aggregate result for one repository, built once per scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    pub path: RepositoryPath,
    pub has_uncommitted_diff: bool,
    pub history: HistoryStatus,
    pub has_untracked_files: bool,
    pub has_stashes: bool,
    pub dangling_branches: BTreeSet<BranchName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CheckFailure>,
}

impl RepositoryStatus {
    pub fn is_clean(&self) -> bool {
        !self.has_uncommitted_diff
            && self.history == HistoryStatus::Tracked(HistoryState::Equal)
            && !self.has_untracked_files
            && !self.has_stashes
            && self.dangling_branches.is_empty()
            && self.failures.is_empty()
    }
}

/// Per-repository entry of a scan: a status, or the reason inspection failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    pub path: RepositoryPath,
    pub outcome: Result<RepositoryStatus, ScanError>,
}

impl RepositoryReport {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

impl Serialize for RepositoryReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "result", rename_all = "snake_case")]
        enum Entry<'a> {
            Ok(&'a RepositoryStatus),
            Error { path: &'a RepositoryPath, error: String },
        }

        match &self.outcome {
            Ok(status) => Entry::Ok(status).serialize(serializer),
            Err(e) => Entry::Error {
                path: &self.path,
                error: e.to_string(),
            }
            .serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub reports: Vec<RepositoryReport>,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(RepositoryReport::is_failure)
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failure()).count()
    }
}
