//! Comparing staging snapshots and re-staging regressed paths.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::{
    access::RepositoryAccess, classify, snapshot::Snapshot, Classification, Error, Outcome,
    PathStatus, ReconciliationResult, RestageError, RestageFailure, WorktreeState,
};

/// Paths whose staging class changed across the transformation.
///
/// Only paths that were fully staged beforehand are considered. Every list
/// keeps the order of the `before` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StagingDiff {
    /// Fully staged before, partially staged after.
    pub regressed: Vec<String>,
    /// Fully staged before, conflicted after.
    pub newly_unmerged: Vec<String>,
    /// Fully staged before, removed from the working tree after.
    pub deleted: Vec<String>,
}

impl StagingDiff {
    /// Returns `true` when no eligible path changed class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regressed.is_empty() && self.newly_unmerged.is_empty() && self.deleted.is_empty()
    }
}

/// Compare two snapshots without touching the repository.
#[must_use]
pub fn diff(before: &Snapshot, after: &Snapshot) -> StagingDiff {
    let current: HashMap<&str, &PathStatus> = after
        .entries()
        .iter()
        .map(|entry| (entry.path.as_str(), entry))
        .collect();

    let mut staging = StagingDiff::default();
    for (entry, class) in before.classified() {
        if class != Classification::FullyStaged {
            continue;
        }

        let path = entry.path.clone();
        let Some(now) = current.get(entry.path.as_str()) else {
            debug!(path = %path, "staged path vanished after transformation");
            staging.deleted.push(path);
            continue;
        };

        match classify(now) {
            Classification::PartiallyStaged if now.worktree == WorktreeState::Deleted => {
                debug!(path = %path, "staged path deleted from working tree");
                staging.deleted.push(path);
            }
            Classification::PartiallyStaged => staging.regressed.push(path),
            Classification::Unmerged => staging.newly_unmerged.push(path),
            other => debug!(path = %path, class = ?other, "staged path did not regress"),
        }
    }

    staging
}

/// Outcome of repairing a [`StagingDiff`].
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Affected paths and the ones that were repaired.
    pub result: ReconciliationResult,
    /// Paths that could not be re-staged.
    pub failures: Vec<RestageError>,
}

impl Reconciliation {
    /// Classify the run as clean, repaired, or needing manual attention.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if !self.result.newly_unmerged.is_empty() || !self.failures.is_empty() {
            Outcome::Unrepairable
        } else if self.result.regressed.is_empty() {
            Outcome::Clean
        } else {
            Outcome::Repaired
        }
    }

    /// Conflicts that were detected and deliberately left alone.
    #[must_use]
    pub fn conflicts(&self) -> Vec<Error> {
        self.result
            .newly_unmerged
            .iter()
            .map(|path| Error::UnmergedConflict { path: path.clone() })
            .collect()
    }

    /// Serializable failure records.
    #[must_use]
    pub fn restage_failures(&self) -> Vec<RestageFailure> {
        self.failures.iter().map(RestageError::to_failure).collect()
    }

    /// Number of paths that need a human to look at them.
    #[must_use]
    pub fn attention_count(&self) -> usize {
        self.result.newly_unmerged.len() + self.failures.len()
    }
}

/// Re-stage every regressed path, continuing past individual failures.
pub fn repair<A>(access: &A, staging: StagingDiff) -> Reconciliation
where
    A: RepositoryAccess + ?Sized,
{
    let mut repaired = Vec::with_capacity(staging.regressed.len());
    let mut failures = Vec::new();

    for path in &staging.regressed {
        match access.stage(path) {
            Ok(()) => {
                info!(path = %path, "re-staged path rewritten by transformation");
                repaired.push(path.clone());
            }
            Err(err) => {
                warn!(path = %path, error = %err, "failed to re-stage path");
                failures.push(RestageError::new(path.as_str(), err));
            }
        }
    }

    for path in &staging.newly_unmerged {
        warn!(path = %path, "path became conflicted; leaving it for manual resolution");
    }

    Reconciliation {
        result: ReconciliationResult {
            regressed: staging.regressed,
            newly_unmerged: staging.newly_unmerged,
            deleted: staging.deleted,
            repaired,
        },
        failures,
    }
}

/// Diff `before` against `after` and repair the regressions.
pub fn reconcile<A>(access: &A, before: &Snapshot, after: &Snapshot) -> Reconciliation
where
    A: RepositoryAccess + ?Sized,
{
    repair(access, diff(before, after))
}
