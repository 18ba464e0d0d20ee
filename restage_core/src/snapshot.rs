//! Immutable point-in-time views of repository staging state.

use std::collections::HashSet;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{access::RepositoryAccess, classify, Classification, Error, PathStatus, Result};

/// When a snapshot was taken relative to the transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPhase {
    /// Captured before the transformation ran.
    Before,
    /// Captured after the transformation ran.
    After,
}

/// Set of per-path statuses captured at one instant.
///
/// Paths are unique. Entries keep the order the backend reported them in,
/// which is the order reconciliation reports regressions in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    phase: SnapshotPhase,
    captured_at: SystemTime,
    entries: Vec<PathStatus>,
}

impl Snapshot {
    /// Build a snapshot from already-collected entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePath`] when two entries share a path.
    pub fn new(phase: SnapshotPhase, entries: Vec<PathStatus>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.path.as_str()) {
                return Err(Error::DuplicatePath {
                    path: entry.path.clone(),
                });
            }
        }

        Ok(Self {
            phase,
            captured_at: SystemTime::now(),
            entries,
        })
    }

    /// Read the current status of a repository.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::StatusQuery`] from the backend and
    /// [`Error::DuplicatePath`] if the backend reports a path twice.
    pub fn capture<A>(access: &A, phase: SnapshotPhase) -> Result<Self>
    where
        A: RepositoryAccess + ?Sized,
    {
        let snapshot = Self::new(phase, access.status_entries()?)?;
        debug!(
            phase = ?phase,
            entries = snapshot.len(),
            captured_at = ?snapshot.captured_at(),
            "captured staging snapshot"
        );
        Ok(snapshot)
    }

    /// When the snapshot was taken relative to the transformation.
    #[must_use]
    pub const fn phase(&self) -> SnapshotPhase {
        self.phase
    }

    /// Wall-clock capture time.
    #[must_use]
    pub const fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    /// All entries in backend order.
    #[must_use]
    pub fn entries(&self) -> &[PathStatus] {
        &self.entries
    }

    /// Look up a single path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&PathStatus> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the repository reported no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify every entry, preserving order.
    pub fn classified(&self) -> impl Iterator<Item = (&PathStatus, Classification)> + '_ {
        self.entries.iter().map(|entry| (entry, classify(entry)))
    }
}
