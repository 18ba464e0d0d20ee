//! Core library for restage's staged-file reconciliation.
//!
//! The crate is layered around three primary responsibilities:
//! - repository access and staging snapshots
//! - classification and reconciliation of staging state
//! - running the external transformation between two snapshots

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Backend-neutral repository access.
pub mod access;
/// Status classification.
pub mod classify;
/// Repository access through the `git` binary.
pub mod git_cli;
/// End-to-end capture, transform, reconcile driver.
pub mod pipeline;
/// Parser for `git status --porcelain=v2 -z`.
pub mod porcelain;
/// Diffing snapshots and re-staging regressions.
pub mod reconcile;
/// Git repository access built on libgit2.
pub mod repository;
/// Point-in-time staging snapshots.
pub mod snapshot;
/// External transformation invokers.
pub mod transform;

pub use access::RepositoryAccess;
pub use classify::classify;
pub use git_cli::GitCli;
pub use pipeline::{Pipeline, RunReport};
pub use reconcile::{diff, reconcile, repair, Reconciliation, StagingDiff};
pub use repository::Repository;
pub use restage_api::{
    Classification, IndexState, Outcome, PathStatus, ReconciliationResult, RestageFailure,
    WorktreeState,
};
pub use snapshot::{Snapshot, SnapshotPhase};
pub use transform::{CommandTransformation, TransformOutput, Transformation};

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying git operation failed.
    #[error("git error: {source}")]
    Git {
        /// Original libgit2 error bubbled up by the core library.
        #[from]
        source: git2::Error,
    },
    /// Provided path does not correspond to a git repository.
    #[error("path does not reference a git repository: {path}")]
    NotARepository {
        /// Path that failed to resolve to a repository.
        path: String,
    },
    /// Bare repositories have no working tree to reconcile.
    #[error("repository at {path} is bare and unsupported")]
    BareRepository {
        /// Path of the repository lacking a working tree.
        path: String,
    },
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
    /// Reading repository status failed.
    #[error("failed to query repository status: {message}")]
    StatusQuery {
        /// Diagnostic text reported by the backend.
        message: String,
    },
    /// A porcelain status record could not be parsed.
    #[error("malformed porcelain record {record:?}: {reason}")]
    Porcelain {
        /// The offending record.
        record: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// A snapshot listed the same path twice.
    #[error("path {path} appears more than once in a snapshot")]
    DuplicatePath {
        /// Repeated repository-relative path.
        path: String,
    },
    /// A `git` subprocess exited unsuccessfully.
    #[error("`{command}` failed: {message}")]
    Command {
        /// Command line that was run.
        command: String,
        /// Trimmed standard error output.
        message: String,
    },
    /// Re-staging a single path failed.
    #[error(transparent)]
    Restage(#[from] RestageError),
    /// A previously staged path is now conflicted.
    #[error("{path} has unresolved conflicts and must be resolved manually")]
    UnmergedConflict {
        /// Conflicted path.
        path: String,
    },
    /// The transformation could not be run to completion.
    #[error("transformation failed to run: {message}")]
    Transformation {
        /// Description of the failure.
        message: String,
    },
}

/// A path that regressed but could not be added back to the index.
#[derive(Debug, thiserror::Error)]
#[error("failed to re-stage {path}: {cause}")]
pub struct RestageError {
    /// Repository-relative path.
    pub path: String,
    /// Backend error that prevented staging.
    #[source]
    pub cause: Box<Error>,
}

impl RestageError {
    /// Wrap a backend error for the given path.
    pub fn new(path: impl Into<String>, cause: Error) -> Self {
        Self {
            path: path.into(),
            cause: Box::new(cause),
        }
    }

    /// Serializable form used by reporters.
    #[must_use]
    pub fn to_failure(&self) -> RestageFailure {
        RestageFailure {
            path: self.path.clone(),
            message: self.cause.to_string(),
        }
    }
}
