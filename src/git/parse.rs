//! Helpers for reading plain git command output.

use crate::types::RevisionId;

/// True when a listing command printed anything besides whitespace.
pub fn has_output(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Non-blank lines, trimmed.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// First line of `rev-parse` / `merge-base` output as a revision id.
pub fn revision(text: &str) -> Option<RevisionId> {
    lines(text).next().map(RevisionId::new)
}
