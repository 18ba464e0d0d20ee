//! CLI definition and dispatch for restage.
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (e.g., `--backend`, `--transform-bin`)
//! 2. Environment variables (`RESTAGE_BACKEND`, `RESTAGE_TRANSFORM_BIN`, ...)
//! 3. Built-in defaults

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use restage_core::{
    CommandTransformation, GitCli, Pipeline, Repository, RepositoryAccess, RunReport,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::report;

/// Exit code when the run itself could not be completed.
pub const EXIT_FATAL: u8 = 2;

/// Re-stage files that a pre-commit rewriting tool left partially staged
#[derive(Parser, Debug)]
#[command(name = "restage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to check (default: current directory)
    pub repo: Option<Utf8PathBuf>,

    /// Backend used to read status and stage files
    #[arg(long, value_enum, env = "RESTAGE_BACKEND", default_value_t = Backend::Git2)]
    pub backend: Backend,

    /// git executable used by the git-cli backend
    #[arg(long, env = "RESTAGE_GIT_BIN", default_value = "git")]
    pub git_bin: String,

    /// Program that rewrites files before the commit
    #[arg(long, env = "RESTAGE_TRANSFORM_BIN", default_value = "fix-copyright-headers")]
    pub transform_bin: String,

    /// Kill the transformation after this many seconds
    #[arg(long, env = "RESTAGE_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long, env = "RESTAGE_VERBOSE")]
    pub verbose: bool,

    /// Arguments passed through to the transformation program
    #[arg(last = true)]
    pub transform_args: Vec<String>,
}

/// How the repository is accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Native libgit2 bindings
    Git2,
    /// The `git` executable and porcelain v2 status
    GitCli,
}

/// Run the CLI application.
///
/// Returns `ExitCode::SUCCESS` when nothing needed repair or every
/// regression was re-staged.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match execute(&cli) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("restage: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let mut stdout = io::stdout().lock();
    let rendered = if cli.json {
        report::render_json(&report, &mut stdout)
    } else {
        report::render_text(&report, &mut stdout)
    };
    if let Err(err) = rendered {
        eprintln!("restage: failed to write report: {err}");
        return ExitCode::from(EXIT_FATAL);
    }

    ExitCode::from(report::exit_code(&report))
}

fn init_tracing(verbose: bool) {
    // Warnings always surface; --verbose adds the per-path debug trail.
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("restage_core={level},restage={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: &Cli) -> anyhow::Result<RunReport> {
    let repo = cli.repo.clone().unwrap_or_else(|| Utf8PathBuf::from("."));
    let transformation = transformation(cli);
    debug!(repo = %repo, backend = ?cli.backend, "starting restage run");

    match cli.backend {
        Backend::Git2 => {
            let repository = Repository::open(&repo)
                .with_context(|| format!("failed to open repository at {repo}"))?;
            reconcile(&repository, &transformation)
        }
        Backend::GitCli => {
            let repository = GitCli::open_with_binary(&repo, &cli.git_bin)
                .with_context(|| format!("failed to open repository at {repo}"))?;
            reconcile(&repository, &transformation)
        }
    }
}

fn reconcile<A: RepositoryAccess>(
    access: &A,
    transformation: &CommandTransformation,
) -> anyhow::Result<RunReport> {
    Pipeline::new(access)
        .run(transformation)
        .context("reconciliation aborted")
}

fn transformation(cli: &Cli) -> CommandTransformation {
    let command = CommandTransformation::new(&cli.transform_bin).args(&cli.transform_args);
    match cli.timeout {
        Some(seconds) => command.timeout(Duration::from_secs(seconds)),
        None => command,
    }
}
