//! Repository access and staging built on top of libgit2.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use git2::{
    DiffDelta, ErrorClass, ErrorCode, Repository as GitRepository, Status, StatusEntry,
    StatusOptions,
};
use tracing::debug;

use crate::{access::RepositoryAccess, Error, IndexState, PathStatus, Result, WorktreeState};

/// Lightweight handle to a repository that restage operates on.
pub struct Repository {
    inner: GitRepository,
    root: PathBuf,
}

impl Repository {
    /// Open a repository from the given filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARepository`] if the path does not exist or does
    /// not resolve to a git repository, and [`Error::BareRepository`] when
    /// the repository has no working tree.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let original = path.as_ref();
        let canonical = match std::fs::canonicalize(original) {
            Ok(canonical) => canonical,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Err(Error::NotARepository {
                    path: display_path(original),
                })
            }
            Err(source) => {
                return Err(Error::Io {
                    path: display_path(original),
                    source,
                })
            }
        };

        let repo = match GitRepository::discover(&canonical) {
            Ok(repo) => repo,
            Err(err)
                if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound =>
            {
                return Err(Error::NotARepository {
                    path: display_path(&canonical),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::BareRepository {
                path: display_path(&canonical),
            })?;

        debug!(root = %root.display(), "opened repository with libgit2");
        Ok(Self { inner: repo, root })
    }

    /// Returns the absolute path to the repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Access the underlying libgit2 handle.
    #[must_use]
    pub const fn git_repo(&self) -> &GitRepository {
        &self.inner
    }
}

impl RepositoryAccess for Repository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn status_entries(&self) -> Result<Vec<PathStatus>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(true)
            .renames_head_to_index(true);

        let statuses = self
            .inner
            .statuses(Some(&mut opts))
            .map_err(|err| Error::StatusQuery {
                message: err.message().to_owned(),
            })?;

        Ok(statuses.iter().map(|entry| convert_entry(&entry)).collect())
    }

    fn stage(&self, path: &str) -> Result<()> {
        let mut index = self.inner.index()?;
        // The transformation may have written the index itself; start from disk.
        index.read(true)?;
        index.add_path(Path::new(path))?;
        index.write()?;
        Ok(())
    }
}

fn convert_entry(entry: &StatusEntry<'_>) -> PathStatus {
    let status = entry.status();
    let head_to_index = entry.head_to_index();
    let path = head_to_index
        .as_ref()
        .and_then(new_path)
        .or_else(|| entry.index_to_workdir().as_ref().and_then(old_path))
        .unwrap_or_else(|| String::from_utf8_lossy(entry.path_bytes()).into_owned());

    if status.is_conflicted() {
        return PathStatus::unmerged(path);
    }

    if status.is_ignored() {
        return PathStatus::ignored(path);
    }

    let index = index_state(status);
    if status.is_wt_new() && !index.is_staged() {
        return PathStatus::untracked(path);
    }

    let mut converted = PathStatus::tracked(path, index, worktree_state(status));
    // Staged deletion of a file still on disk: the path is also untracked.
    converted.untracked = status.is_wt_new();
    if status.is_index_renamed() {
        converted.original_path = head_to_index.as_ref().and_then(old_path);
    }
    converted
}

fn index_state(status: Status) -> IndexState {
    if status.is_index_new() {
        IndexState::Added
    } else if status.is_index_renamed() {
        IndexState::Renamed
    } else if status.is_index_deleted() {
        IndexState::Deleted
    } else if status.is_index_typechange() {
        IndexState::TypeChanged
    } else if status.is_index_modified() {
        IndexState::Modified
    } else {
        IndexState::Unmodified
    }
}

fn worktree_state(status: Status) -> WorktreeState {
    if status.is_wt_deleted() {
        WorktreeState::Deleted
    } else if status.is_wt_typechange() {
        WorktreeState::TypeChanged
    } else if status.is_wt_modified() || status.is_wt_renamed() {
        WorktreeState::Modified
    } else {
        WorktreeState::Unmodified
    }
}

fn new_path(delta: &DiffDelta<'_>) -> Option<String> {
    delta.new_file().path().map(display_path)
}

fn old_path(delta: &DiffDelta<'_>) -> Option<String> {
    delta.old_file().path().map(display_path)
}

fn display_path(path: &Path) -> String {
    path.to_path_buf()
        .into_os_string()
        .to_string_lossy()
        .into_owned()
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
