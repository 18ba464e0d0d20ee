//! # restage CLI
//!
//! Pre-commit command that runs a file-rewriting tool (such as a copyright
//! header fixer) and re-stages every fully staged file the tool modified.
//! Run `restage --help` for usage information.

mod cli;
mod report;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
