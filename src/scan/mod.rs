pub mod branches;
mod coordinator;
pub mod history;
mod inspector;

pub use coordinator::{dedup_paths, default_jobs, scan, ScanOptions};
pub use inspector::inspect;

#[cfg(test)]
pub(crate) mod scripted;
