//! # Document Generation Orchestrator
//!
//! Turns an approved routing decision into a batch of document jobs and
//! runs them.
//!
//! 1. Re-check the gate against the stored decision.
//! 2. Enter GENERATING (from ROUTING) or re-assert the lock (already
//!    GENERATING, e.g. on redelivery).
//! 3. Replace the case's batch with one PENDING job per allowed document.
//! 4. Run the jobs strictly in ordinal order. Each job generates content
//!    under a timeout, validates it, and renders it when the document type
//!    is binary. A failing or panicking job is recorded FAILED and the loop
//!    continues.
//! 5. Move the case to COMPLETED.
//!
//! A batch-level failure moves the case to BLOCKED with the generic
//! [`GENERATION_FAILED`] reason. The detailed error is only logged.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use docket_core::{CaseId, DocumentTypeId, JobId};
use docket_routing::{validate, CaseStrategy, DecisionContext, GateResult};
use docket_state::{CaseError, CasePhase, DocumentJob, JobBatch, JobContent, JobError};

use crate::collaborator::{ArtifactRenderer, ContentGenerator, FactStore};
use crate::error::{PipelineError, RetryRejection};
use crate::registry::{DocumentRegistry, RenderKind};
use crate::store::PipelineStore;

/// Lock reason recorded when a run fails as a whole.
pub const GENERATION_FAILED: &str = "generation failed";

/// Result of one batch run, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub case_id: CaseId,
    pub attempt: u64,
    pub succeeded: Vec<DocumentTypeId>,
    /// Failed documents with the error recorded on the job.
    pub failed: Vec<(DocumentTypeId, String)>,
}

impl BatchOutcome {
    fn new(case_id: CaseId, attempt: u64) -> Self {
        Self {
            case_id,
            attempt,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// "N of M documents generated".
    pub fn headline(&self) -> String {
        format!(
            "{} of {} documents generated",
            self.succeeded.len(),
            self.total()
        )
    }

    fn push(&mut self, document_type: &DocumentTypeId, result: &Result<JobContent, String>) {
        match result {
            Ok(_) => self.succeeded.push(document_type.clone()),
            Err(error) => self.failed.push((document_type.clone(), error.clone())),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("document generation panicked: {detail}")
}

/// Runs document batches and manual retries.
pub struct Orchestrator {
    store: PipelineStore,
    registry: Arc<DocumentRegistry>,
    facts: Arc<dyn FactStore>,
    generator: Arc<dyn ContentGenerator>,
    renderer: Arc<dyn ArtifactRenderer>,
    content_timeout: Duration,
    render_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: PipelineStore,
        registry: Arc<DocumentRegistry>,
        facts: Arc<dyn FactStore>,
        generator: Arc<dyn ContentGenerator>,
        renderer: Arc<dyn ArtifactRenderer>,
    ) -> Self {
        Self {
            store,
            registry,
            facts,
            generator,
            renderer,
            content_timeout: Duration::from_secs(120),
            render_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeouts(mut self, content: Duration, render: Duration) -> Self {
        self.content_timeout = content;
        self.render_timeout = render;
        self
    }

    /// Generate the whole batch for `attempt`.
    pub async fn generate_batch(
        &self,
        case_id: CaseId,
        attempt: u64,
    ) -> Result<BatchOutcome, PipelineError> {
        match self.run_batch(case_id, attempt).await {
            Ok(outcome) => Ok(outcome),
            Err(err @ PipelineError::GateDenied { .. }) => Err(err),
            Err(err) if err.is_stale() => {
                tracing::info!(%case_id, attempt, "dropping stale generation run: {err}");
                Err(err)
            }
            Err(err) => {
                tracing::error!(%case_id, attempt, error = %err, "document generation failed");
                self.fail_case(case_id, attempt);
                Err(err)
            }
        }
    }

    /// Move the case to BLOCKED with the generic failure reason.
    pub fn fail_case(&self, case_id: CaseId, attempt: u64) {
        let blocked = self
            .store
            .cases
            .try_update(&case_id, |case| case.block(attempt, GENERATION_FAILED));
        if let Some(Err(e)) = blocked {
            tracing::warn!(%case_id, attempt, "could not block failed case: {e}");
        }
    }

    async fn run_batch(&self, case_id: CaseId, attempt: u64) -> Result<BatchOutcome, PipelineError> {
        let case = self
            .store
            .cases
            .get(&case_id)
            .ok_or(PipelineError::CaseNotFound(case_id))?;
        let current = case.generation_attempt();
        let decision = self.store.decisions.get(&case_id);
        let presented = decision.as_ref().map_or(attempt, |d| d.attempt);
        if current != attempt || presented != attempt {
            return Err(CaseError::StaleAttempt {
                case_id,
                current,
                presented: if current != attempt { attempt } else { presented },
            }
            .into());
        }
        let gate = validate(decision.as_ref());
        let decision = match decision {
            Some(d) if gate.allowed => d,
            _ => return Err(self.deny(case_id, attempt, gate)),
        };

        self.store
            .cases
            .try_update(&case_id, |case| match case.phase() {
                CasePhase::Generating => case.reassert_lock(attempt, "Generating your documents."),
                _ => case.begin_generation(attempt, "Generating your documents."),
            })
            .ok_or(PipelineError::CaseNotFound(case_id))??;

        let snapshot = self
            .facts
            .snapshot(&case_id)
            .await?
            .ok_or_else(|| PipelineError::Internal(format!("no fact snapshot for {case_id}")))?;

        let batch = JobBatch::new(case_id, attempt, &decision.allowed_documents);
        let jobs: Vec<(JobId, DocumentTypeId, u32)> = batch
            .jobs()
            .iter()
            .map(|j| (j.id, j.document_type.clone(), j.ordinal))
            .collect();
        self.store.batches.insert(case_id, batch);
        tracing::info!(%case_id, attempt, jobs = jobs.len(), "document batch created");

        let mut outcome = BatchOutcome::new(case_id, attempt);
        for (job_id, document_type, ordinal) in jobs {
            self.update_job(case_id, attempt, job_id, |job| job.mark_generating())?;
            let context = DecisionContext::for_document(&decision, ordinal);
            let result = self.produce_isolated(&document_type, &snapshot, &context).await;
            outcome.push(&document_type, &result);
            self.record(case_id, attempt, job_id, &document_type, result)?;
        }

        let headline = outcome.headline();
        self.store
            .cases
            .try_update(&case_id, |case| case.complete(attempt, headline.clone()))
            .ok_or(PipelineError::CaseNotFound(case_id))??;
        tracing::info!(%case_id, attempt, "{headline}");

        Ok(outcome)
    }

    /// Re-attempt one FAILED job of a completed case.
    pub async fn retry_job(
        &self,
        case_id: CaseId,
        job_id: JobId,
    ) -> Result<DocumentJob, PipelineError> {
        let case = self
            .store
            .cases
            .get(&case_id)
            .ok_or(PipelineError::CaseNotFound(case_id))?;
        if case.phase() != CasePhase::Completed {
            return Err(RetryRejection::CaseNotCompleted {
                phase: case.phase(),
            }
            .into());
        }
        let attempt = case.generation_attempt();
        let decision = self
            .store
            .decisions
            .get(&case_id)
            .ok_or_else(|| PipelineError::Internal(format!("no decision for {case_id}")))?;

        let (document_type, ordinal, retry) = self
            .store
            .batches
            .try_update(&case_id, |batch| {
                if batch.attempt != attempt {
                    return Err(PipelineError::BatchNotFound(case_id));
                }
                let job = batch
                    .job_mut(&job_id)
                    .ok_or(PipelineError::JobNotFound { case_id, job_id })?;
                let retry = job.begin_retry().map_err(RetryRejection::from_job_error)?;
                Ok((job.document_type.clone(), job.ordinal, retry))
            })
            .ok_or(PipelineError::BatchNotFound(case_id))??;
        tracing::info!(%case_id, %job_id, %document_type, retry, "retrying document job");

        let outcome = match self.facts.snapshot(&case_id).await {
            Ok(Some(snapshot)) => {
                let context = DecisionContext::for_document(&decision, ordinal);
                self.produce_isolated(&document_type, &snapshot, &context).await
            }
            Ok(None) => Err("no fact snapshot".to_string()),
            Err(e) => Err(e.to_string()),
        };
        self.record(case_id, attempt, job_id, &document_type, outcome)?;

        self.store
            .batches
            .get(&case_id)
            .and_then(|b| b.job(&job_id).cloned())
            .ok_or(PipelineError::JobNotFound { case_id, job_id })
    }

    /// [`Self::produce`] with a collaborator panic turned into a job error.
    async fn produce_isolated(
        &self,
        document_type: &DocumentTypeId,
        snapshot: &CaseStrategy,
        context: &DecisionContext,
    ) -> Result<JobContent, String> {
        AssertUnwindSafe(self.produce(document_type, snapshot, context))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_message(payload)))
    }

    /// Generate, validate and render one document.
    async fn produce(
        &self,
        document_type: &DocumentTypeId,
        snapshot: &CaseStrategy,
        context: &DecisionContext,
    ) -> Result<JobContent, String> {
        let definition = self
            .registry
            .get(document_type)
            .ok_or_else(|| format!("unknown document type {document_type}"))?;

        let text = tokio::time::timeout(
            self.content_timeout,
            self.generator.generate(document_type, snapshot, context),
        )
        .await
        .map_err(|_| format!("content generation timed out after {:?}", self.content_timeout))?
        .map_err(|e| e.to_string())?;

        if text.trim().is_empty() {
            return Err("generated content was empty".to_string());
        }
        definition.validate(&text).map_err(|e| e.to_string())?;

        match definition.render {
            RenderKind::Text => Ok(JobContent::Text { body: text }),
            RenderKind::Binary => {
                let reference = tokio::time::timeout(
                    self.render_timeout,
                    self.renderer.render(&text, document_type),
                )
                .await
                .map_err(|_| format!("rendering timed out after {:?}", self.render_timeout))?
                .map_err(|e| e.to_string())?;
                Ok(JobContent::Artifact { reference })
            }
        }
    }

    fn record(
        &self,
        case_id: CaseId,
        attempt: u64,
        job_id: JobId,
        document_type: &DocumentTypeId,
        result: Result<JobContent, String>,
    ) -> Result<(), PipelineError> {
        match result {
            Ok(content) => {
                self.update_job(case_id, attempt, job_id, |job| job.mark_completed(content))?;
                tracing::debug!(%case_id, %job_id, %document_type, "document generated");
            }
            Err(error) => {
                tracing::warn!(%case_id, %job_id, %document_type, %error, "document job failed");
                self.update_job(case_id, attempt, job_id, |job| job.mark_failed(error))?;
            }
        }
        Ok(())
    }

    fn update_job(
        &self,
        case_id: CaseId,
        attempt: u64,
        job_id: JobId,
        f: impl FnOnce(&mut DocumentJob) -> Result<(), JobError>,
    ) -> Result<(), PipelineError> {
        self.store
            .batches
            .try_update(&case_id, |batch| {
                if batch.attempt != attempt {
                    return Err(PipelineError::BatchNotFound(case_id));
                }
                let job = batch
                    .job_mut(&job_id)
                    .ok_or(PipelineError::JobNotFound { case_id, job_id })?;
                f(job).map_err(PipelineError::from)
            })
            .ok_or(PipelineError::BatchNotFound(case_id))?
    }

    /// Block the case on a gate denial and report it.
    fn deny(&self, case_id: CaseId, attempt: u64, gate: GateResult) -> PipelineError {
        tracing::info!(%case_id, attempt, gate = %gate.gate, "generation gate denied");
        let blocked = self.store.cases.try_update(&case_id, |case| {
            if case.phase() == CasePhase::Routing || case.phase() == CasePhase::Generating {
                case.block(attempt, gate.user_message.clone())
            } else {
                Ok(())
            }
        });
        if let Some(Err(e)) = blocked {
            tracing::warn!(%case_id, attempt, "could not block denied case: {e}");
        }
        let err = PipelineError::GateDenied {
            gate: gate.gate,
            reason: gate.error.clone().unwrap_or_default(),
        };
        self.store.gates.insert(case_id, gate);
        err
    }
}
