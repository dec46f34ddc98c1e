//! Human-readable and JSON rendering of scan results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::types::{HistoryState, HistoryStatus, RepositoryReport, RepositoryStatus, ScanReport};

/// Label shown for a history status; in-sync and unknown history print nothing.
pub fn history_label(history: HistoryStatus) -> Option<&'static str> {
    match history {
        HistoryStatus::Tracked(HistoryState::Equal) => None,
        HistoryStatus::Tracked(HistoryState::PullNeeded) => Some("PULL_NEEDED"),
        HistoryStatus::Tracked(HistoryState::PushNeeded) => Some("PUSH_NEEDED"),
        HistoryStatus::Tracked(HistoryState::Diverged) => Some("DIVERGED"),
        HistoryStatus::NoUpstream => Some("no-upstream"),
        HistoryStatus::Unknown => None,
    }
}

/// Indented status lines, without styling.
pub fn status_lines(status: &RepositoryStatus) -> Vec<String> {
    let mut lines = Vec::new();
    if status.has_uncommitted_diff {
        lines.push("diffs".to_string());
    }
    if let Some(label) = history_label(status.history) {
        lines.push(label.to_string());
    }
    if status.has_untracked_files {
        lines.push("untracked files".to_string());
    }
    if status.has_stashes {
        lines.push("stashed changes".to_string());
    }
    if !status.dangling_branches.is_empty() {
        let names: Vec<&str> = status.dangling_branches.iter().map(|b| b.as_str()).collect();
        lines.push(format!("branches dangling: {}", names.join(", ")));
    }
    lines
}

/// One block: bold name, path, then tab-indented status lines.
pub fn format_report(report: &RepositoryReport) -> String {
    let mut block = vec![
        report.path.name().bold().to_string(),
        report.path.to_string().dimmed().to_string(),
    ];

    match &report.outcome {
        Ok(status) => {
            block.extend(status_lines(status).into_iter().map(|line| format!("\t{}", line.yellow())));
            for failure in &status.failures {
                let line = format!("{} failed: {}", failure.check.as_str(), failure.message);
                block.push(format!("\t{}", line.red()));
            }
        }
        Err(e) => block.push(format!("\t{}", format!("error: {e}").red().bold())),
    }

    block.join("\n")
}

/// All blocks separated by a blank line, no trailing blank line.
pub fn render(reports: &[RepositoryReport]) -> String {
    reports.iter().map(format_report).collect::<Vec<_>>().join("\n\n")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    cancelled: bool,
    repositories: &'a [RepositoryReport],
}

pub fn render_json(report: &ScanReport) -> Result<String> {
    let doc = JsonReport {
        generated_at: Utc::now(),
        cancelled: report.cancelled,
        repositories: &report.reports,
    };
    serde_json::to_string_pretty(&doc).context("Failed to serialize scan report")
}
