//! # Route Subcommand
//!
//! Classifies a fact snapshot and runs the gate over the resulting
//! decision. Prints both as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use docket_core::CaseId;
use docket_pipeline::PipelineConfig;
use docket_routing::{
    validate, CaseStrategy, ForumRegistry, GateResult, RoutingDecision, RoutingEngine,
    RoutingRequest,
};

/// Arguments for the `docket route` subcommand.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Path to the fact snapshot (YAML or JSON).
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Forum chosen by the user (overrides the snapshot).
    #[arg(long)]
    pub forum: Option<String>,

    /// Evaluate time limits as of this date (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct RouteOutput {
    decision: RoutingDecision,
    gate: GateResult,
}

#[derive(Debug, Serialize)]
struct FailureOutput {
    error: String,
    message: String,
}

/// Build the routing engine for the configured default jurisdiction.
pub(crate) fn engine(config: &PipelineConfig) -> Result<RoutingEngine> {
    let registry = ForumRegistry::builtin().context("built-in forum registry is invalid")?;
    Ok(RoutingEngine::new(registry, config.default_jurisdiction()?))
}

/// Apply the `--forum` override to a loaded snapshot.
pub(crate) fn with_forum(mut snapshot: CaseStrategy, forum: Option<&str>) -> CaseStrategy {
    if let Some(forum) = forum {
        snapshot.chosen_forum = Some(forum.to_string());
    }
    snapshot
}

/// Execute the route subcommand.
///
/// Returns exit code: 0 when the gate allows generation, 1 when routing
/// failed or the gate blocked.
pub fn run_route(args: &RouteArgs, config: &PipelineConfig) -> Result<u8> {
    let snapshot = with_forum(crate::load_snapshot(&args.snapshot)?, args.forum.as_deref());
    let today = args
        .today
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let engine = engine(config)?;

    let request = RoutingRequest::from_snapshot(CaseId::new(), 1, snapshot);
    let decision = match engine.classify(&request, today) {
        Ok(d) => d,
        Err(failure) => {
            tracing::warn!(%failure, "classification failed");
            crate::print_json(&FailureOutput {
                error: failure.to_string(),
                message: failure.user_message(),
            })?;
            return Ok(crate::EXIT_REFUSED);
        }
    };
    let gate = validate(Some(&decision));
    tracing::info!(
        forum = %decision.forum,
        status = %decision.status,
        gate = %gate.gate,
        "case routed"
    );
    let allowed = gate.allowed;
    crate::print_json(&RouteOutput { decision, gate })?;
    Ok(if allowed { 0 } else { crate::EXIT_REFUSED })
}
