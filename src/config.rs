use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::types::RepositoryPath;

pub const CONFIG_ENV: &str = "GIT_SCAN_CONFIG";
pub const TIMEOUT_ENV: &str = "GIT_SCAN_TIMEOUT";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Repository paths or glob patterns scanned when no group is selected.
    pub repos: Vec<String>,
    /// Fetch before scanning unless overridden on the command line.
    pub fetch: bool,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub groups: BTreeMap<String, Vec<String>>,
}

/// Config file location with priority: flag > ENV > global.
/// The flag indicates whether the location was asked for explicitly.
pub fn config_path(flag: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = flag {
        return Some((path.to_path_buf(), true));
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Some((PathBuf::from(env_path), true));
        }
    }
    global_config_path().map(|path| (path, false))
}

/// Global config at ~/.config/git-scan/config.toml
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("git-scan").join("config.toml"))
}

/// Load the config. A missing global file yields the empty default; an
/// explicitly named file must exist and parse.
pub fn load(flag: Option<&Path>) -> Result<ScanConfig> {
    match config_path(flag) {
        Some((path, true)) => load_from(&path),
        Some((path, false)) if path.exists() => load_from(&path),
        _ => {
            debug!("no config file, using defaults");
            Ok(ScanConfig::default())
        }
    }
}

pub fn load_from(path: &Path) -> Result<ScanConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ScanConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    debug!(path = %path.display(), groups = config.groups.len(), "loaded config");
    Ok(config)
}

impl ScanConfig {
    /// Entries for the requested groups, or `repos` followed by every group
    /// when none are requested.
    pub fn select(&self, groups: &[String]) -> Result<Vec<String>> {
        if groups.is_empty() {
            let mut entries = self.repos.clone();
            entries.extend(self.groups.values().flatten().cloned());
            return Ok(entries);
        }

        let mut entries = Vec::new();
        for name in groups {
            match self.groups.get(name) {
                Some(group) => entries.extend(group.iter().cloned()),
                None => bail!(
                    "Unknown group '{}' (configured: {})",
                    name,
                    self.group_names().join(", ")
                ),
            }
        }
        Ok(entries)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Per-command timeout with priority: flag > ENV > config > default.
    /// Zero disables the timeout.
    pub fn timeout(&self, flag: Option<u64>) -> Result<Option<Duration>> {
        let env = std::env::var(TIMEOUT_ENV).ok();
        resolve_timeout(flag, env.as_deref(), self.timeout_secs)
    }

    /// Concurrent repositories with priority: flag > config > available parallelism.
    pub fn jobs(&self, flag: Option<usize>) -> usize {
        flag.or(self.jobs)
            .unwrap_or_else(crate::scan::default_jobs)
            .max(1)
    }
}

fn resolve_timeout(
    flag: Option<u64>,
    env: Option<&str>,
    config: Option<u64>,
) -> Result<Option<Duration>> {
    let secs = match (flag, env) {
        (Some(secs), _) => secs,
        (None, Some(raw)) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {TIMEOUT_ENV} value '{raw}'"))?,
        (None, None) => config.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Expand config entries into repository paths.
///
/// Glob patterns keep only directories holding a `.git`, so a pattern
/// like `~/src/*` discovers every repository under `~/src`. Plain entries
/// are kept as written so that a mistyped path is reported, not skipped.
pub fn resolve_entries(entries: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in entries {
        let expanded = RepositoryPath::new(entry).as_path().to_path_buf();
        if !is_pattern(entry) {
            paths.push(expanded);
            continue;
        }

        let pattern = expanded.to_string_lossy();
        let matches = glob::glob(&pattern).with_context(|| format!("Invalid pattern '{entry}'"))?;
        let mut found = 0;
        for path in matches.flatten() {
            if path.is_dir() && path.join(".git").exists() {
                paths.push(path);
                found += 1;
            }
        }
        debug!(pattern = %entry, found, "expanded pattern");
    }
    Ok(paths)
}
