use serde::{Deserialize, Serialize};

/// Difference between HEAD and the index for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    /// Index entry matches HEAD (or no entry exists on either side).
    #[default]
    Unmodified,
    /// Path is new in the index.
    Added,
    /// Index content differs from HEAD.
    Modified,
    /// Path was removed from the index.
    Deleted,
    /// Path was renamed in the index.
    Renamed,
    /// Path was copied from another tracked path.
    Copied,
    /// File type changed (e.g., regular file -> symlink).
    TypeChanged,
    /// Index holds conflict stages for the path.
    Unmerged,
}

impl IndexState {
    /// Returns `true` when the index carries a change relative to HEAD.
    #[must_use]
    pub const fn is_staged(self) -> bool {
        !matches!(self, Self::Unmodified)
    }
}

/// Difference between the index and the working tree for a single path.
///
/// Renames and copies are index-only concepts and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorktreeState {
    /// Working tree content matches the index.
    #[default]
    Unmodified,
    /// Intent-to-add entry whose content is not yet in the index.
    Added,
    /// Working tree content differs from the index.
    Modified,
    /// Path is missing from the working tree.
    Deleted,
    /// File type changed in the working tree.
    TypeChanged,
    /// Path is part of an unresolved conflict.
    Unmerged,
}

impl WorktreeState {
    /// Returns `true` when the working tree has edits outside the index.
    #[must_use]
    pub const fn is_dirty(self) -> bool {
        !matches!(self, Self::Unmodified)
    }
}

/// Two-dimensional staging state for one repository path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStatus {
    /// Path relative to the repository root, using `/` separators.
    pub path: String,
    /// Previous path for renamed or copied index entries.
    #[serde(default)]
    pub original_path: Option<String>,
    /// HEAD versus index.
    #[serde(default)]
    pub index: IndexState,
    /// Index versus working tree.
    #[serde(default)]
    pub worktree: WorktreeState,
    /// Path exists only in the working tree.
    #[serde(default)]
    pub untracked: bool,
    /// Path matches an ignore rule.
    #[serde(default)]
    pub ignored: bool,
}

impl PathStatus {
    /// Status for a tracked path with explicit index and worktree states.
    pub fn tracked(path: impl Into<String>, index: IndexState, worktree: WorktreeState) -> Self {
        Self {
            path: path.into(),
            original_path: None,
            index,
            worktree,
            untracked: false,
            ignored: false,
        }
    }

    /// Status for a path present only in the working tree.
    pub fn untracked(path: impl Into<String>) -> Self {
        Self {
            untracked: true,
            ..Self::tracked(path, IndexState::Unmodified, WorktreeState::Unmodified)
        }
    }

    /// Status for a path excluded by ignore rules.
    pub fn ignored(path: impl Into<String>) -> Self {
        Self {
            ignored: true,
            ..Self::tracked(path, IndexState::Unmodified, WorktreeState::Unmodified)
        }
    }

    /// Status for a path with unresolved conflict stages.
    pub fn unmerged(path: impl Into<String>) -> Self {
        Self::tracked(path, IndexState::Unmerged, WorktreeState::Unmerged)
    }

    /// Attach the source path of a rename or copy.
    #[must_use]
    pub fn with_original_path(mut self, original: impl Into<String>) -> Self {
        self.original_path = Some(original.into());
        self
    }
}

/// Semantic staging class derived from a [`PathStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Staged changes exist and the working tree matches the index exactly.
    FullyStaged,
    /// Staged changes exist and the working tree has diverged further.
    PartiallyStaged,
    /// Path exists only in the working tree.
    UntrackedOnly,
    /// Path is in a conflicted state.
    Unmerged,
    /// Nothing staged for the path.
    Unchanged,
    /// Path matches an ignore rule.
    Ignored,
}
