//! Human and JSON output for a finished run.

use anyhow::{Context, Result};
use std::path::Path;

use crate::engine::tools::display_relative;
use crate::types::PipelineOutcome;
use crate::utils::Colors;

/// One summary line: succeeded / failed (and cancelled), coloured.
pub fn summary_line(outcome: &PipelineOutcome) -> String {
    let mut line = format!(
        "{} | {}",
        Colors::colorize(
            Colors::SUCCEEDED,
            &format!("Succeeded: {}", outcome.succeeded_count())
        ),
        Colors::colorize(Colors::FAILED, &format!("Failed: {}", outcome.failed_count())),
    );
    if outcome.cancelled {
        line.push_str(" | ");
        line.push_str(&Colors::colorize(Colors::CANCELLED, "Cancelled"));
    }
    line
}

/// Summary, then one line per failure and (verbose) per written file, on stdout.
pub fn print_summary(outcome: &PipelineOutcome, output_dir: &Path, verbose: bool) {
    println!(
        "{} ({} files written in {} ms)",
        summary_line(outcome),
        outcome.artifacts.len(),
        outcome.elapsed_ms
    );
    for f in &outcome.failures {
        println!(
            "  {} {} [{}] {}",
            Colors::colorize(Colors::FAILED, "x"),
            f.item.path.display(),
            f.stage,
            f.message
        );
    }
    if verbose {
        for a in &outcome.artifacts {
            println!(
                "  {} {} ({} bytes, {})",
                Colors::colorize(Colors::SUCCEEDED, "+"),
                display_relative(&a.destination, output_dir),
                a.bytes,
                &a.digest[..a.digest.len().min(12)]
            );
        }
    }
}

pub fn outcome_json(outcome: &PipelineOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("serialize outcome")
}
