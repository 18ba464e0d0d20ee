use serde::{Deserialize, Serialize};

/// Paths affected by comparing the staging state before and after a
/// transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReconciliationResult {
    /// Paths that moved from fully staged to partially staged, in the order
    /// they appeared before the transformation.
    #[serde(default)]
    pub regressed: Vec<String>,
    /// Previously fully staged paths that are now conflicted.
    #[serde(default)]
    pub newly_unmerged: Vec<String>,
    /// Previously fully staged paths the transformation removed.
    #[serde(default)]
    pub deleted: Vec<String>,
    /// Subsequence of `regressed` that was re-staged successfully.
    #[serde(default)]
    pub repaired: Vec<String>,
}

impl ReconciliationResult {
    /// Returns `true` when nothing changed state during the transformation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.regressed.is_empty() && self.newly_unmerged.is_empty()
    }
}

/// Overall result of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing needed repair.
    Clean,
    /// Regressions were found and every one was re-staged.
    Repaired,
    /// At least one path needs manual attention.
    Unrepairable,
}

impl Outcome {
    /// Returns `true` for outcomes that should let the commit proceed.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Clean | Self::Repaired)
    }
}

/// Serializable record of a path that could not be re-staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestageFailure {
    /// Path that failed to stage.
    pub path: String,
    /// Diagnostic text from the backend.
    pub message: String,
}
