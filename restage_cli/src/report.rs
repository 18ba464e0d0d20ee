//! Human-readable and JSON rendering of a [`RunReport`].

use std::io::{self, Write};

use restage_api::{Outcome, ReconciliationResult, RestageFailure};
use restage_core::{RunReport, TransformOutput};
use serde::Serialize;

/// Exit code when the outcome needs manual attention.
pub const EXIT_UNREPAIRABLE: u8 = 1;
/// Exit code when the transformation ran but reported failure.
pub const EXIT_TRANSFORM_FAILED: u8 = 3;

#[derive(Serialize)]
struct JsonReport<'a> {
    outcome: Outcome,
    result: &'a ReconciliationResult,
    failures: Vec<RestageFailure>,
    transformation: &'a TransformOutput,
}

/// Process exit code for a completed run.
pub fn exit_code(report: &RunReport) -> u8 {
    if report.outcome() == Outcome::Unrepairable {
        EXIT_UNREPAIRABLE
    } else if !report.transformation.success {
        EXIT_TRANSFORM_FAILED
    } else {
        0
    }
}

/// Write the report as pretty-printed JSON followed by a newline.
pub fn render_json(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    let json = JsonReport {
        outcome: report.outcome(),
        result: &report.reconciliation.result,
        failures: report.reconciliation.restage_failures(),
        transformation: &report.transformation,
    };
    serde_json::to_writer_pretty(&mut *out, &json)?;
    writeln!(out)
}

/// Write a short summary for a terminal.
pub fn render_text(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    let reconciliation = &report.reconciliation;
    let result = &reconciliation.result;

    if !report.transformation.success {
        let code = report
            .transformation
            .exit_code
            .map_or_else(|| String::from("signal"), |code| code.to_string());
        writeln!(out, "transformation reported failure (exit {code})")?;
        let stderr = report.transformation.stderr.trim();
        if !stderr.is_empty() {
            for line in stderr.lines() {
                writeln!(out, "  {line}")?;
            }
        }
    }

    match report.outcome() {
        Outcome::Clean => writeln!(out, "nothing needed repair")?,
        Outcome::Repaired => {
            writeln!(out, "re-staged {} file(s):", result.repaired.len())?;
            for path in &result.repaired {
                writeln!(out, "  {path}")?;
            }
        }
        Outcome::Unrepairable => {
            if !result.repaired.is_empty() {
                writeln!(out, "re-staged {} file(s):", result.repaired.len())?;
                for path in &result.repaired {
                    writeln!(out, "  {path}")?;
                }
            }
            writeln!(
                out,
                "{} file(s) need manual attention:",
                reconciliation.attention_count()
            )?;
            for conflict in reconciliation.conflicts() {
                writeln!(out, "  {conflict}")?;
            }
            for failure in &reconciliation.failures {
                writeln!(out, "  {failure}")?;
            }
        }
    }

    if !result.deleted.is_empty() {
        writeln!(
            out,
            "{} staged file(s) were deleted by the transformation and left as staged:",
            result.deleted.len()
        )?;
        for path in &result.deleted {
            writeln!(out, "  {path}")?;
        }
    }

    Ok(())
}
