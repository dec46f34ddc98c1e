use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::{self, ScanConfig};

/// Print the configured repositories, grouped the way the config groups them.
pub fn run(config_path: Option<PathBuf>, groups: Vec<String>) -> Result<()> {
    let config = config::load(config_path.as_deref())?;
    let sections = sections(&config, &groups)?;

    if sections.iter().all(|(_, paths)| paths.is_empty()) {
        println!("{}", "No repositories configured".yellow());
        return Ok(());
    }

    let blocks: Vec<String> = sections
        .iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(name, paths)| {
            let mut lines = vec![name.bold().to_string()];
            lines.extend(paths.iter().map(|p| format!("\t{}", describe(p))));
            lines.join("\n")
        })
        .collect();
    println!("{}", blocks.join("\n\n"));

    Ok(())
}

/// (section name, resolved paths) pairs; ungrouped `repos` come first.
fn sections(config: &ScanConfig, groups: &[String]) -> Result<Vec<(String, Vec<PathBuf>)>> {
    let mut out = Vec::new();
    if groups.is_empty() {
        out.push(("repos".to_string(), config::resolve_entries(&config.repos)?));
        for (name, entries) in &config.groups {
            out.push((name.clone(), config::resolve_entries(entries)?));
        }
    } else {
        for name in groups {
            let entries = config.select(std::slice::from_ref(name))?;
            out.push((name.clone(), config::resolve_entries(&entries)?));
        }
    }
    Ok(out)
}

fn describe(path: &Path) -> String {
    if path.join(".git").exists() {
        path.display().to_string()
    } else if path.exists() {
        format!("{} {}", path.display(), "(not a repository)".dimmed())
    } else {
        format!("{} {}", path.display(), "(missing)".red())
    }
}
