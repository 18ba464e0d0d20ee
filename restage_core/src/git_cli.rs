//! Repository access that shells out to the `git` binary and reads
//! porcelain v2 status.

use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::{access::RepositoryAccess, porcelain, Error, PathStatus, Result};

const DEFAULT_GIT_BINARY: &str = "git";

/// Repository handle backed by a `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: OsString,
    root: PathBuf,
}

impl GitCli {
    /// Open the repository containing `path` using `git` from `PATH`.
    ///
    /// # Errors
    ///
    /// See [`GitCli::open_with_binary`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_binary(path, DEFAULT_GIT_BINARY)
    }

    /// Open the repository containing `path` using an explicit `git` binary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARepository`] when the path is missing or outside
    /// a repository, [`Error::BareRepository`] for bare repositories, and
    /// [`Error::Io`] when the binary cannot be spawned.
    pub fn open_with_binary(path: impl AsRef<Path>, binary: impl Into<OsString>) -> Result<Self> {
        let binary = binary.into();
        let original = path.as_ref();
        let canonical = match std::fs::canonicalize(original) {
            Ok(canonical) => canonical,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Err(Error::NotARepository {
                    path: original.display().to_string(),
                })
            }
            Err(source) => {
                return Err(Error::Io {
                    path: original.display().to_string(),
                    source,
                })
            }
        };

        let bare = run(&binary, &canonical, &["rev-parse", "--is-bare-repository"])?;
        if !bare.status.success() {
            return Err(Error::NotARepository {
                path: canonical.display().to_string(),
            });
        }
        if String::from_utf8_lossy(&bare.stdout).trim() == "true" {
            return Err(Error::BareRepository {
                path: canonical.display().to_string(),
            });
        }

        let toplevel = run(&binary, &canonical, &["rev-parse", "--show-toplevel"])?;
        if !toplevel.status.success() {
            return Err(Error::BareRepository {
                path: canonical.display().to_string(),
            });
        }
        let root = PathBuf::from(String::from_utf8_lossy(&toplevel.stdout).trim_end());

        debug!(root = %root.display(), "opened repository with git binary");
        Ok(Self { binary, root })
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        run(&self.binary, &self.root, args)
    }
}

impl RepositoryAccess for GitCli {
    fn root(&self) -> &Path {
        &self.root
    }

    fn status_entries(&self) -> Result<Vec<PathStatus>> {
        // Optional locks would let `git status` refresh and rewrite the index.
        let output = self
            .git(&[
                "--no-optional-locks",
                "status",
                "--porcelain=v2",
                "-z",
                "--untracked-files=all",
                "--ignored",
            ])
            .map_err(|err| Error::StatusQuery {
                message: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::StatusQuery {
                message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        porcelain::parse(&String::from_utf8_lossy(&output.stdout)).map_err(|err| {
            Error::StatusQuery {
                message: err.to_string(),
            }
        })
    }

    fn stage(&self, path: &str) -> Result<()> {
        let output = self.git(&["add", "--", path])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Command {
                command: format!("git add -- {path}"),
                message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

fn run(binary: &OsStr, dir: &Path, args: &[&str]) -> Result<Output> {
    Command::new(binary)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Io {
            path: binary.to_string_lossy().into_owned(),
            source,
        })
}
