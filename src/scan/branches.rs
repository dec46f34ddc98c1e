use std::collections::BTreeSet;

use crate::git::parse;
use crate::types::BranchName;

/// Branch name of a ref: its final path component.
///
/// `refs/heads/main` and `refs/remotes/origin/main` both become `main`.
/// Symbolic `HEAD` refs are not branches and yield `None`.
pub fn normalize(refname: &str) -> Option<BranchName> {
    let name = refname.trim().rsplit('/').next()?;
    if name.is_empty() || name == "HEAD" {
        return None;
    }
    Some(BranchName::new(name))
}

/// Normalize every line of a `for-each-ref` listing into a set of names.
pub fn branch_set(listing: &str) -> BTreeSet<BranchName> {
    parse::lines(listing).filter_map(normalize).collect()
}

/// Local branches with no same-named branch on the remote side.
pub fn dangling(local: &BTreeSet<BranchName>, remote: &BTreeSet<BranchName>) -> BTreeSet<BranchName> {
    local.difference(remote).cloned().collect()
}
