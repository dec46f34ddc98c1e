use std::path::PathBuf;
use std::time::Duration;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("git {command} failed: {message}")]
    ProcessFailure { command: String, message: String },

    #[error("git {command} timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

impl ScanError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScanError::Timeout { .. })
    }
}
