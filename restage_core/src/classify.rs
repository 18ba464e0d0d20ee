use crate::{Classification, IndexState, PathStatus};

/// Map a raw status record to its staging class.
///
/// Checks run in a fixed order because one record can satisfy several raw
/// conditions: unmerged wins over everything, ignored over untracked, and
/// untracked over the staged/unstaged split.
#[must_use]
pub fn classify(status: &PathStatus) -> Classification {
    if status.index == IndexState::Unmerged {
        return Classification::Unmerged;
    }

    if status.ignored {
        return Classification::Ignored;
    }

    if status.untracked && !status.index.is_staged() {
        return Classification::UntrackedOnly;
    }

    match (status.index.is_staged(), status.worktree.is_dirty()) {
        (true, false) => Classification::FullyStaged,
        (true, true) => Classification::PartiallyStaged,
        (false, _) => Classification::Unchanged,
    }
}
