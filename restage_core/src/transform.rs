//! External transformations that may rewrite working-tree files.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wait_timeout::ChildExt;

use crate::{Error, Result};

/// Captured result of running a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOutput {
    /// Whether the transformation reported success.
    pub success: bool,
    /// Process exit code, when one exists.
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
}

impl TransformOutput {
    /// Successful run with no output.
    #[must_use]
    pub const fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Opaque step run between the two snapshots.
pub trait Transformation {
    /// Human-readable name used in logs.
    fn describe(&self) -> String {
        String::from("transformation")
    }

    /// Run against the repository working tree at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transformation`] when the step cannot be run at all.
    /// A step that runs and reports failure returns `Ok` with
    /// [`TransformOutput::success`] set to `false`.
    fn run(&self, root: &Path) -> Result<TransformOutput>;
}

impl<F> Transformation for F
where
    F: Fn(&Path) -> Result<TransformOutput>,
{
    fn run(&self, root: &Path) -> Result<TransformOutput> {
        self(root)
    }
}

/// Transformation that spawns an external program in the repository root.
#[derive(Debug, Clone)]
pub struct CommandTransformation {
    program: OsString,
    args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl CommandTransformation {
    /// Run `program` with no arguments and no timeout.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kill the program if it runs longer than `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Transformation for CommandTransformation {
    fn describe(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn run(&self, root: &Path) -> Result<TransformOutput> {
        let command_line = self.describe();
        debug!(command = %command_line, "spawning transformation");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::Transformation {
                message: format!("failed to spawn `{command_line}`: {err}"),
            })?;

        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Transformation {
                        message: format!(
                            "`{command_line}` timed out after {}s",
                            timeout.as_secs_f64()
                        ),
                    });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Transformation {
                        message: format!("failed waiting on `{command_line}`: {err}"),
                    });
                }
            },
            None => child.wait().map_err(|err| Error::Transformation {
                message: format!("failed waiting on `{command_line}`: {err}"),
            })?,
        };

        let stdout = join_reader(stdout_handle, "stdout")?;
        let stderr = join_reader(stderr_handle, "stderr")?;

        Ok(TransformOutput {
            success: status.success(),
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn spawn_reader<R>(mut stream: R) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn join_reader(handle: Option<JoinHandle<io::Result<Vec<u8>>>>, stream: &str) -> Result<String> {
    match handle {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| Error::Transformation {
                    message: format!("failed to join {stream} reader"),
                })?
                .map_err(|err| Error::Transformation {
                    message: format!("failed to read transformation {stream}: {err}"),
                })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn closures_are_transformations() -> Result<()> {
        let step = |root: &Path| -> Result<TransformOutput> {
            assert!(root.is_absolute());
            Ok(TransformOutput::succeeded())
        };

        let output = step.run(&std::env::temp_dir())?;
        assert!(output.success);
        assert_eq!(step.describe(), "transformation");
        Ok(())
    }

    #[test]
    fn describe_joins_program_and_args() {
        let command = CommandTransformation::new("fix-headers")
            .arg("--year")
            .args(["2026", "."]);
        assert_eq!(command.describe(), "fix-headers --year 2026 .");
    }

    #[test]
    fn missing_program_is_an_error() {
        let temp = TempDir::new().expect("tempdir");
        let result = CommandTransformation::new("restage-no-such-transformation").run(temp.path());
        assert!(matches!(result, Err(Error::Transformation { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_status() -> Result<()> {
        let temp = TempDir::new().expect("tempdir");
        let output = CommandTransformation::new("sh")
            .args(["-c", "echo rewrote; echo warned >&2; exit 3"])
            .run(temp.path())?;

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "rewrote");
        assert_eq!(output.stderr.trim(), "warned");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_repository_root() -> Result<()> {
        let temp = TempDir::new().expect("tempdir");
        CommandTransformation::new("sh")
            .args(["-c", "echo touched > marker.txt"])
            .run(temp.path())?;

        let marker = std::fs::read_to_string(temp.path().join("marker.txt")).expect("marker");
        assert_eq!(marker.trim(), "touched");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_long_running_program() {
        let temp = TempDir::new().expect("tempdir");
        let result = CommandTransformation::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100))
            .run(temp.path());

        assert!(matches!(
            result,
            Err(Error::Transformation { message }) if message.contains("timed out")
        ));
    }
}
