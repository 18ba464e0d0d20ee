//! The capability the reconciliation engine needs from a repository.

use std::path::Path;

use crate::{PathStatus, Result};

/// Read two-dimensional status and stage individual paths.
///
/// Implementations must not mutate the index or working tree from
/// [`RepositoryAccess::status_entries`]. Callers are expected to hold
/// exclusive access to the repository for the duration of a run; nothing
/// here takes a lock.
pub trait RepositoryAccess {
    /// Absolute path to the working tree root.
    fn root(&self) -> &Path;

    /// Enumerate per-path status, including untracked and ignored entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StatusQuery`] when the status cannot be read.
    fn status_entries(&self) -> Result<Vec<PathStatus>>;

    /// Add the current working-tree content of `path` to the index.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the path cannot be staged.
    fn stage(&self, path: &str) -> Result<()>;
}

impl<T: RepositoryAccess + ?Sized> RepositoryAccess for &T {
    fn root(&self) -> &Path {
        (**self).root()
    }

    fn status_entries(&self) -> Result<Vec<PathStatus>> {
        (**self).status_entries()
    }

    fn stage(&self, path: &str) -> Result<()> {
        (**self).stage(path)
    }
}
