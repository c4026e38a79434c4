//! Pipeline error types.

use thiserror::Error;

use docket_core::{CaseId, JobId};
use docket_routing::GateName;
use docket_state::{CaseError, CasePhase, JobError, JobStatus};

use crate::collaborator::FactStoreError;
use crate::queue::QueueError;

/// Errors surfaced by the controller and orchestrator.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("case {0} not found")]
    CaseNotFound(CaseId),

    #[error(transparent)]
    Case(#[from] CaseError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Retry(#[from] RetryRejection),

    #[error(transparent)]
    Facts(#[from] FactStoreError),

    /// The generation gate refused the stored decision.
    #[error("generation gate {gate} denied: {reason}")]
    GateDenied { gate: GateName, reason: String },

    #[error("no document batch for case {0}")]
    BatchNotFound(CaseId),

    #[error("job {job_id} not found in case {case_id}")]
    JobNotFound { case_id: CaseId, job_id: JobId },

    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Batch-level failure. Never shown to the user verbatim.
    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// The caller held an outdated generation attempt.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Case(CaseError::StaleAttempt { .. }))
    }
}

/// Why a manual retry request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryRejection {
    #[error("case is {phase}; documents can only be retried after generation completed")]
    CaseNotCompleted { phase: CasePhase },

    #[error("job {job_id} is {status}, only FAILED jobs can be retried")]
    NotFailed { job_id: JobId, status: JobStatus },

    #[error("job {job_id} has used all {attempts} attempts")]
    Exhausted { job_id: JobId, attempts: u32 },
}

impl RetryRejection {
    /// Map a job-level retry refusal, passing other job errors through.
    pub(crate) fn from_job_error(err: JobError) -> PipelineError {
        match err {
            JobError::NotFailed { job_id, status } => Self::NotFailed { job_id, status }.into(),
            JobError::RetriesExhausted { job_id, attempts } => {
                Self::Exhausted { job_id, attempts }.into()
            }
            other => PipelineError::Job(other),
        }
    }
}
