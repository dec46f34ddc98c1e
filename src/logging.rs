use tracing_subscriber::EnvFilter;

/// Filter override, e.g. `GIT_SCAN_LOG=git_scan_lib=debug`.
pub const LOG_ENV: &str = "GIT_SCAN_LOG";

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the stderr subscriber. Stdout stays reserved for the report.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
