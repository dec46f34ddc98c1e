use crate::types::{HistoryState, RevisionId};

/// Compare the local tip, its upstream tip and their merge-base.
///
/// Equality is checked first since a synced repository has all three equal.
/// When the tips differ, a base equal to the local tip means the local
/// branch can fast-forward, a base equal to the remote tip means a push can.
pub fn classify(local: &RevisionId, remote: &RevisionId, base: &RevisionId) -> HistoryState {
    if local == remote {
        HistoryState::Equal
    } else if local == base {
        HistoryState::PullNeeded
    } else if remote == base {
        HistoryState::PushNeeded
    } else {
        HistoryState::Diverged
    }
}
