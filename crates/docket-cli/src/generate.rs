//! # Generate Subcommand
//!
//! Runs the whole pipeline in-process against a fact snapshot, using the
//! in-memory store and the development collaborators, and prints the
//! resulting status, decision and documents.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use docket_core::OwnerId;
use docket_pipeline::{
    CaseStatusView, Collaborators, FixedClock, LifecycleController, PipelineConfig,
    PipelineStore, RunOutcome, TriggerOutcome,
};
use docket_routing::{CaseStrategy, GateResult, RoutingDecision, StrategyUpdate};
use docket_state::DocumentJob;

/// Arguments for the `docket generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
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
struct GenerateOutput {
    status: CaseStatusView,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<RoutingDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gate: Option<GateResult>,
    documents: Vec<DocumentJob>,
}

/// Execute the generate subcommand.
///
/// Returns exit code: 0 when the batch ran, 1 when the case was refused
/// or every document failed.
pub fn run_generate(args: &GenerateArgs, config: &PipelineConfig) -> Result<u8> {
    let snapshot = crate::route::with_forum(crate::load_snapshot(&args.snapshot)?, args.forum.as_deref());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(generate(snapshot, args.today, config))
}

async fn generate(
    snapshot: CaseStrategy,
    today: Option<NaiveDate>,
    config: &PipelineConfig,
) -> Result<u8> {
    let store = PipelineStore::new();
    let registry = Arc::new(config.document_registry()?);
    let mut collaborators = Collaborators::development(&store, Arc::clone(&registry));
    if let Some(today) = today {
        collaborators.clock = Arc::new(FixedClock(today));
    }
    // The worker is never spawned: the run below is driven directly. It is
    // held so the queue stays open for the trigger.
    let (controller, _worker) =
        LifecycleController::assemble(config, store, registry, collaborators)?;

    let case = controller.open_case(OwnerId::new());
    controller
        .update_facts(&case.id, into_update(snapshot))
        .await
        .context("failed to record facts")?;

    let attempt = match controller.start_generation(case.id).await? {
        TriggerOutcome::Accepted { attempt } => attempt,
        TriggerOutcome::Insufficient { report } => {
            tracing::warn!(missing = report.missing.len(), "facts insufficient");
            crate::print_json(&report)?;
            return Ok(crate::EXIT_REFUSED);
        }
        TriggerOutcome::AlreadyInProgress { phase } => {
            anyhow::bail!("fresh case unexpectedly in phase {phase}");
        }
    };

    let outcome = controller.run_pipeline(case.id, attempt).await?;
    let code = match &outcome {
        RunOutcome::Generated(batch) if !batch.succeeded.is_empty() => {
            for (document, error) in &batch.failed {
                tracing::warn!(%document, %error, "document failed");
            }
            tracing::info!(
                succeeded = batch.succeeded.len(),
                failed = batch.failed.len(),
                "batch finished"
            );
            0
        }
        other => {
            tracing::warn!(outcome = ?other, "case not generated");
            crate::EXIT_REFUSED
        }
    };

    crate::print_json(&report(&controller, &case.id)?)?;
    Ok(code)
}

fn report(controller: &LifecycleController, case_id: &docket_core::CaseId) -> Result<GenerateOutput> {
    let store = controller.store();
    Ok(GenerateOutput {
        status: controller.status(case_id)?,
        decision: store.decisions.get(case_id),
        gate: store.gates.get(case_id),
        documents: controller.documents(case_id)?,
    })
}

/// A whole snapshot as a single conversational update.
fn into_update(snapshot: CaseStrategy) -> StrategyUpdate {
    StrategyUpdate {
        domain: snapshot.domain,
        key_facts: snapshot.key_facts,
        desired_outcome: Some(snapshot.desired_outcome).filter(|o| !o.trim().is_empty()),
        evidence: snapshot.evidence,
        counterparty: snapshot.counterparty,
        jurisdiction: snapshot.jurisdiction,
        relationship: snapshot.relationship,
        chosen_forum: snapshot.chosen_forum,
        incident_date: snapshot.incident_date,
        claimed_amount: snapshot.claimed_amount,
        procedural_steps: snapshot.procedural_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{snapshot_file, EMPLOYMENT_YAML};

    fn args(file: &tempfile::NamedTempFile) -> GenerateArgs {
        GenerateArgs {
            snapshot: file.path().to_path_buf(),
            forum: None,
            today: Some("2026-06-15".parse().unwrap()),
        }
    }

    #[test]
    fn employment_snapshot_generates() {
        let file = snapshot_file(EMPLOYMENT_YAML, ".yaml");
        assert_eq!(run_generate(&args(&file), &PipelineConfig::default()).unwrap(), 0);
    }

    #[test]
    fn insufficient_snapshot_is_refused() {
        let file = snapshot_file("domain: employment\n", ".yaml");
        assert_eq!(run_generate(&args(&file), &PipelineConfig::default()).unwrap(), 1);
    }

    #[test]
    fn expired_limit_is_refused() {
        let yaml = format!("{EMPLOYMENT_YAML}incident_date: 2026-01-10\n");
        let file = snapshot_file(&yaml, ".yaml");
        assert_eq!(run_generate(&args(&file), &PipelineConfig::default()).unwrap(), 1);
    }

    #[test]
    fn blank_outcome_is_not_recorded() {
        let update = into_update(CaseStrategy {
            desired_outcome: "  ".into(),
            ..Default::default()
        });
        assert_eq!(update.desired_outcome, None);
    }
}
