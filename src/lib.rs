/// The current version of git-scan, sourced from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod report;
pub mod scan;
pub mod types;
