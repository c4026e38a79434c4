//! # Check Subcommand
//!
//! Evaluates a fact snapshot against the sufficiency thresholds and prints
//! the report, including the question to ask for each missing fact.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use docket_pipeline::PipelineConfig;
use docket_routing::check_sufficiency;

/// Arguments for the `docket check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the fact snapshot (YAML or JSON).
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    sufficient: bool,
    score: f64,
    questions: Vec<String>,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 when sufficient, 1 when facts are missing.
pub fn run_check(args: &CheckArgs, config: &PipelineConfig) -> Result<u8> {
    let snapshot = crate::load_snapshot(&args.snapshot)?;
    let report = check_sufficiency(&snapshot, &config.sufficiency);
    tracing::info!(sufficient = report.sufficient, score = report.score, "sufficiency checked");

    crate::print_json(&CheckOutput {
        sufficient: report.sufficient,
        score: report.score,
        questions: report.missing.iter().map(|m| m.prompt()).collect(),
    })?;
    Ok(if report.sufficient { 0 } else { crate::EXIT_REFUSED })
}
