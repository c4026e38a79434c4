//! # Case Lifecycle Controller
//!
//! Owns the phase machine from trigger to terminal phase:
//!
//! ```text
//! start_generation ─▶ sufficient? ─no─▶ Insufficient (stays GATHERING)
//!                        │yes
//!                        ▼
//!                  GATHERING → ROUTING (attempt += 1) ─▶ enqueue task
//!
//! run_pipeline(task)
//!   ROUTING ─ classify ─┬─ failure ─────────▶ GATHERING
//!                       ├─ gate blocks ─────▶ BLOCKED
//!                       └─ gate passes ─────▶ GENERATING → COMPLETED
//! ```
//!
//! The trigger is idempotent: the attempt counter is bumped under the case
//! write lock, so of two concurrent triggers exactly one is accepted and
//! the other reports the phase it found.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use docket_core::{CaseId, JobId, OwnerId};
use docket_routing::{
    check_sufficiency, validate, CaseStrategy, GateName, RoutingEngine, RoutingRequest,
    StrategyUpdate, SufficiencyReport, SufficiencyThresholds,
};
use docket_state::{BatchSummary, Case, CasePhase, CaseStatus, DocumentJob};

use crate::collaborator::{ArtifactRenderer, Clock, ContentGenerator, FactStore, SystemClock};
use crate::config::{ConfigError, PipelineConfig};
use crate::dev::{InMemoryFactStore, InlineArtifactRenderer, TemplateContentGenerator};
use crate::error::PipelineError;
use crate::orchestrator::{BatchOutcome, Orchestrator};
use crate::queue::{PipelineTask, TaskHandler, WorkQueue, Worker};
use crate::registry::DocumentRegistry;
use crate::store::PipelineStore;

/// Answer to a generation trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// The run was accepted and queued.
    Accepted { attempt: u64 },
    /// A run already started or finished; nothing was queued.
    AlreadyInProgress { phase: CasePhase },
    /// The facts are not yet sufficient.
    Insufficient { report: SufficiencyReport },
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The task's attempt was no longer current.
    Skipped,
    /// The frozen snapshot was insufficient; back to GATHERING.
    NeedsMoreFacts,
    /// Classification failed; back to GATHERING with a question.
    ClassificationFailed { message: String },
    /// The gate blocked generation.
    Blocked { gate: GateName },
    /// The batch ran.
    Generated(BatchOutcome),
}

/// Case status as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStatusView {
    pub case_id: CaseId,
    pub phase: CasePhase,
    pub status: CaseStatus,
    pub message: String,
    pub locked: bool,
    pub lock_reason: Option<String>,
    pub generation_attempt: u64,
    pub gate: Option<GateName>,
    pub progress: Option<BatchSummary>,
    pub headline: Option<String>,
}

/// External collaborators injected into the pipeline.
pub struct Collaborators {
    pub facts: Arc<dyn FactStore>,
    pub generator: Arc<dyn ContentGenerator>,
    pub renderer: Arc<dyn ArtifactRenderer>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// In-memory fact store, template generator and inline renderer.
    pub fn development(store: &PipelineStore, registry: Arc<DocumentRegistry>) -> Self {
        Self {
            facts: Arc::new(InMemoryFactStore::new(store.cases.clone())),
            generator: Arc::new(TemplateContentGenerator::new(registry)),
            renderer: Arc::new(InlineArtifactRenderer::new()),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Drives cases through the pipeline.
pub struct LifecycleController {
    store: PipelineStore,
    facts: Arc<dyn FactStore>,
    engine: RoutingEngine,
    thresholds: SufficiencyThresholds,
    clock: Arc<dyn Clock>,
    orchestrator: Orchestrator,
    queue: WorkQueue,
}

impl LifecycleController {
    /// Wire a controller and the worker that consumes its queue.
    ///
    /// The worker must be spawned (`tokio::spawn(worker.run())`) for
    /// accepted triggers to make progress.
    pub fn assemble(
        config: &PipelineConfig,
        store: PipelineStore,
        registry: Arc<DocumentRegistry>,
        collaborators: Collaborators,
    ) -> Result<(Arc<Self>, Worker<Self>), ConfigError> {
        config.validate()?;
        let engine = RoutingEngine::new(
            docket_routing::ForumRegistry::builtin()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            config.default_jurisdiction()?,
        );
        let orchestrator = Orchestrator::new(
            store.clone(),
            registry,
            Arc::clone(&collaborators.facts),
            collaborators.generator,
            collaborators.renderer,
        )
        .with_timeouts(config.content_timeout(), config.render_timeout());
        let (queue, rx) = WorkQueue::channel(config.queue.capacity);
        let controller = Arc::new(Self {
            store,
            facts: collaborators.facts,
            engine,
            thresholds: config.sufficiency,
            clock: collaborators.clock,
            orchestrator,
            queue: queue.clone(),
        });
        let worker = Worker::new(
            &queue,
            rx,
            Arc::clone(&controller),
            config.queue.max_deliveries,
            std::time::Duration::from_millis(config.queue.redelivery_base_delay_ms),
        );
        Ok((controller, worker))
    }

    pub fn store(&self) -> &PipelineStore {
        &self.store
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    pub fn thresholds(&self) -> &SufficiencyThresholds {
        &self.thresholds
    }

    // ── Intake and facts ─────────────────────────────────────────────

    /// Open a case in GATHERING / DRAFT.
    pub fn open_case(&self, owner: OwnerId) -> Case {
        let case = Case::new(owner);
        self.store.cases.insert(case.id, case.clone());
        tracing::info!(case_id = %case.id, "case opened");
        case
    }

    pub fn case(&self, case_id: &CaseId) -> Result<Case, PipelineError> {
        self.store
            .cases
            .get(case_id)
            .ok_or(PipelineError::CaseNotFound(*case_id))
    }

    pub async fn snapshot(&self, case_id: &CaseId) -> Result<CaseStrategy, PipelineError> {
        Ok(self.facts.snapshot(case_id).await?.unwrap_or_default())
    }

    /// Merge a conversational update. Refused while the case is locked.
    pub async fn update_facts(
        &self,
        case_id: &CaseId,
        update: StrategyUpdate,
    ) -> Result<CaseStrategy, PipelineError> {
        Ok(self.facts.apply(case_id, update).await?)
    }

    // ── Trigger ──────────────────────────────────────────────────────

    /// Fire-and-forget generation trigger.
    pub async fn start_generation(&self, case_id: CaseId) -> Result<TriggerOutcome, PipelineError> {
        let snapshot = self.snapshot(&case_id).await?;
        let report = check_sufficiency(&snapshot, &self.thresholds);

        let outcome = self
            .store
            .cases
            .try_update(&case_id, |case| {
                if case.phase() != CasePhase::Gathering {
                    return Ok(TriggerOutcome::AlreadyInProgress {
                        phase: case.phase(),
                    });
                }
                if !report.sufficient {
                    return Ok(TriggerOutcome::Insufficient {
                        report: report.clone(),
                    });
                }
                let attempt = case.begin_routing(CasePhase::Routing.status_message())?;
                Ok::<_, PipelineError>(TriggerOutcome::Accepted { attempt })
            })
            .ok_or(PipelineError::CaseNotFound(case_id))??;

        match &outcome {
            TriggerOutcome::Accepted { attempt } => {
                tracing::info!(%case_id, attempt, "generation accepted");
                if let Err(e) = self.queue.enqueue(PipelineTask::new(case_id, *attempt)).await {
                    tracing::error!(%case_id, attempt, "could not enqueue pipeline run: {e}");
                    self.orchestrator.fail_case(case_id, *attempt);
                    return Err(e.into());
                }
            }
            TriggerOutcome::AlreadyInProgress { phase } => {
                tracing::debug!(%case_id, %phase, "generation already triggered");
            }
            TriggerOutcome::Insufficient { report } => {
                tracing::debug!(%case_id, missing = report.missing.len(), "facts insufficient");
            }
        }
        Ok(outcome)
    }

    // ── Pipeline run ─────────────────────────────────────────────────

    /// Route, gate and generate for one queued attempt.
    pub async fn run_pipeline(&self, case_id: CaseId, attempt: u64) -> Result<RunOutcome, PipelineError> {
        let case = self.case(&case_id)?;
        if case.generation_attempt() != attempt {
            tracing::info!(%case_id, attempt, current = case.generation_attempt(), "stale pipeline task dropped");
            return Ok(RunOutcome::Skipped);
        }
        match case.phase() {
            CasePhase::Routing => {}
            CasePhase::Generating => {
                return self.generate(case_id, attempt).await;
            }
            CasePhase::Gathering | CasePhase::Completed | CasePhase::Blocked => {
                return Ok(RunOutcome::Skipped);
            }
        }

        let snapshot = match self.facts.snapshot(&case_id).await {
            Ok(s) => s.unwrap_or_default(),
            Err(e) => {
                tracing::error!(%case_id, attempt, error = %e, "fact snapshot unavailable");
                self.orchestrator.fail_case(case_id, attempt);
                return Err(e.into());
            }
        };
        if !check_sufficiency(&snapshot, &self.thresholds).sufficient {
            self.revert(case_id, attempt, CasePhase::Gathering.status_message())?;
            return Ok(RunOutcome::NeedsMoreFacts);
        }

        let request = RoutingRequest::from_snapshot(case_id, attempt, snapshot);
        let decision = match self.engine.classify(&request, self.clock.today()) {
            Ok(d) => d,
            Err(failure) => {
                tracing::warn!(%case_id, attempt, %failure, "classification failed");
                let message = failure.user_message();
                self.revert(case_id, attempt, message.clone())?;
                return Ok(RunOutcome::ClassificationFailed { message });
            }
        };

        let gate = validate(Some(&decision));
        self.store.decisions.insert(case_id, decision);
        self.store.gates.insert(case_id, gate.clone());
        if !gate.allowed {
            tracing::info!(%case_id, attempt, gate = %gate.gate, "generation blocked by gate");
            self.store
                .cases
                .try_update(&case_id, |c| c.block(attempt, gate.user_message.clone()))
                .ok_or(PipelineError::CaseNotFound(case_id))??;
            return Ok(RunOutcome::Blocked { gate: gate.gate });
        }
        self.generate(case_id, attempt).await
    }

    async fn generate(&self, case_id: CaseId, attempt: u64) -> Result<RunOutcome, PipelineError> {
        match self.orchestrator.generate_batch(case_id, attempt).await {
            Ok(outcome) => Ok(RunOutcome::Generated(outcome)),
            Err(PipelineError::GateDenied { gate, .. }) => Ok(RunOutcome::Blocked { gate }),
            Err(e) if e.is_stale() => Ok(RunOutcome::Skipped),
            Err(e) => Err(e),
        }
    }

    fn revert(&self, case_id: CaseId, attempt: u64, reason: impl Into<String>) -> Result<(), PipelineError> {
        self.store
            .cases
            .try_update(&case_id, |c| c.revert_to_gathering(attempt, reason))
            .ok_or(PipelineError::CaseNotFound(case_id))??;
        Ok(())
    }

    /// Re-attempt one FAILED document.
    pub async fn retry_document(
        &self,
        case_id: CaseId,
        job_id: JobId,
    ) -> Result<DocumentJob, PipelineError> {
        self.orchestrator.retry_job(case_id, job_id).await
    }

    // ── Reset and status ─────────────────────────────────────────────

    /// COMPLETED or BLOCKED back to GATHERING. Discards the decision and
    /// batch of the previous attempt while the case row is still locked,
    /// so a trigger for the next attempt cannot interleave.
    pub fn reset_to_gathering(
        &self,
        case_id: CaseId,
        reason: impl Into<String>,
    ) -> Result<Case, PipelineError> {
        let store = &self.store;
        let case = store
            .cases
            .try_update(&case_id, |c| {
                c.reset(reason)?;
                store.clear_derived(&case_id);
                Ok::<_, docket_state::CaseError>(c.clone())
            })
            .ok_or(PipelineError::CaseNotFound(case_id))??;
        tracing::info!(%case_id, "case reset to gathering");
        Ok(case)
    }

    pub fn set_status(&self, case_id: CaseId, to: CaseStatus) -> Result<Case, PipelineError> {
        Ok(self
            .store
            .cases
            .try_update(&case_id, |c| c.set_status(to).map(|_| c.clone()))
            .ok_or(PipelineError::CaseNotFound(case_id))??)
    }

    pub fn status(&self, case_id: &CaseId) -> Result<CaseStatusView, PipelineError> {
        let case = self.case(case_id)?;
        let progress = self
            .store
            .batches
            .get(case_id)
            .filter(|b| b.attempt == case.generation_attempt())
            .map(|b| b.summary());
        let gate = self
            .store
            .gates
            .get(case_id)
            .filter(|g| !g.allowed)
            .map(|g| g.gate);
        Ok(CaseStatusView {
            case_id: case.id,
            phase: case.phase(),
            status: case.status(),
            message: case.status_message().to_string(),
            locked: case.is_locked(),
            lock_reason: case.lock_reason().map(str::to_string),
            generation_attempt: case.generation_attempt(),
            gate,
            headline: progress.map(|p| p.headline()),
            progress,
        })
    }

    pub fn documents(&self, case_id: &CaseId) -> Result<Vec<DocumentJob>, PipelineError> {
        self.case(case_id)?;
        Ok(self
            .store
            .batches
            .get(case_id)
            .map(|b| b.jobs().to_vec())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TaskHandler for LifecycleController {
    async fn handle(&self, task: PipelineTask) {
        match self.run_pipeline(task.case_id, task.attempt).await {
            Ok(outcome) => {
                tracing::debug!(case_id = %task.case_id, attempt = task.attempt, ?outcome, "pipeline run finished");
            }
            Err(e) => {
                tracing::error!(case_id = %task.case_id, attempt = task.attempt, error = %e, "pipeline run failed");
            }
        }
    }

    async fn on_exhausted(&self, task: PipelineTask) {
        self.orchestrator.fail_case(task.case_id, task.attempt);
    }
}
