use std::collections::HashSet;
use std::path::Path;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{info, warn};

use super::inspector::inspect;
use crate::git::GitRunner;
use crate::types::{RepositoryPath, RepositoryReport, ScanReport};

/// Knobs for one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Run `git fetch` in every repository before inspecting it.
    pub refresh_remote: bool,
    /// Maximum number of repositories inspected at once.
    pub jobs: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            refresh_remote: false,
            jobs: default_jobs(),
        }
    }
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Normalize paths and drop repeats, keeping first-seen order.
pub fn dedup_paths<I, P>(paths: I) -> Vec<RepositoryPath>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(RepositoryPath::new)
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Inspect every unique path and return one report per path, in input order.
///
/// Inspections run concurrently, at most `options.jobs` at a time. When
/// `cancel` turns `true` the in-flight inspections are dropped, which kills
/// their git processes, and the reports finished so far are returned.
pub async fn scan<R, I, P>(
    runner: &R,
    paths: I,
    options: &ScanOptions,
    mut cancel: watch::Receiver<bool>,
) -> ScanReport
where
    R: GitRunner,
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let unique = dedup_paths(paths);
    let total = unique.len();
    let mut slots: Vec<Option<RepositoryReport>> = (0..total).map(|_| None).collect();
    let mut cancelled = *cancel.borrow();

    if !cancelled {
        let refresh_remote = options.refresh_remote;
        let pending = futures_util::stream::iter(unique.into_iter().enumerate())
            .map(move |(index, path)| async move {
                let outcome = inspect(runner, &path, refresh_remote).await;
                (index, RepositoryReport { path, outcome })
            })
            .buffer_unordered(options.jobs.max(1));
        let mut pending = std::pin::pin!(pending);
        let mut cancel_open = true;

        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some((index, report)) => {
                        if let Err(e) = &report.outcome {
                            warn!(repo = %report.path, error = %e, "inspection failed");
                        }
                        slots[index] = Some(report);
                    }
                    None => break,
                },
                changed = cancel.changed(), if cancel_open => match changed {
                    Ok(()) if *cancel.borrow() => {
                        cancelled = true;
                        break;
                    }
                    Ok(()) => {}
                    // Sender gone: nobody can cancel any more.
                    Err(_) => cancel_open = false,
                },
            }
        }
    }

    let reports: Vec<RepositoryReport> = slots.into_iter().flatten().collect();
    let report = ScanReport { reports, cancelled };
    info!(
        repositories = total,
        completed = report.reports.len(),
        failed = report.failure_count(),
        cancelled,
        "scan finished"
    );
    report
}
