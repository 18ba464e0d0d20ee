//! Capture, transform, re-capture, and repair in one call.

use tracing::{info, warn};

use crate::{
    access::RepositoryAccess,
    reconcile::{reconcile, Reconciliation},
    snapshot::{Snapshot, SnapshotPhase},
    transform::{TransformOutput, Transformation},
    Classification, Outcome, Result,
};

/// Everything a reporter needs after a run.
#[derive(Debug)]
pub struct RunReport {
    /// Diff and repair results.
    pub reconciliation: Reconciliation,
    /// What the transformation reported.
    pub transformation: TransformOutput,
}

impl RunReport {
    /// Overall outcome of the reconciliation.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.reconciliation.outcome()
    }
}

/// Drives one pre-commit check against a repository.
///
/// The pipeline keeps no state between runs. It assumes nothing else stages
/// or commits in the repository while a run is in progress.
#[derive(Debug)]
pub struct Pipeline<'a, A: ?Sized> {
    access: &'a A,
}

impl<'a, A> Pipeline<'a, A>
where
    A: RepositoryAccess + ?Sized,
{
    /// Bind a pipeline to a repository backend.
    #[must_use]
    pub const fn new(access: &'a A) -> Self {
        Self { access }
    }

    /// Run `transformation` between two snapshots and re-stage regressions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StatusQuery`] when either snapshot cannot be
    /// captured, and [`crate::Error::Transformation`] when the
    /// transformation cannot be run. Individual re-stage failures are not
    /// errors; they are collected in the report.
    pub fn run<T>(&self, transformation: &T) -> Result<RunReport>
    where
        T: Transformation + ?Sized,
    {
        let before = Snapshot::capture(self.access, SnapshotPhase::Before)?;
        let eligible = before
            .classified()
            .filter(|(_, class)| *class == Classification::FullyStaged)
            .count();
        info!(
            eligible,
            transformation = %transformation.describe(),
            "running transformation"
        );

        let output = transformation.run(self.access.root())?;
        if !output.success {
            warn!(
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "transformation reported failure"
            );
        }

        let after = Snapshot::capture(self.access, SnapshotPhase::After)?;
        let reconciliation = reconcile(self.access, &before, &after);
        info!(
            regressed = reconciliation.result.regressed.len(),
            repaired = reconciliation.result.repaired.len(),
            unmerged = reconciliation.result.newly_unmerged.len(),
            failed = reconciliation.failures.len(),
            "reconciliation finished"
        );

        Ok(RunReport {
            reconciliation,
            transformation: output,
        })
    }
}
