//! # Document Jobs
//!
//! One [`DocumentJob`] per document the orchestrator attempts, grouped into
//! a [`JobBatch`] per case. A batch is replaced wholesale on every
//! generation run.
//!
//! ## Job States
//!
//! ```text
//! PENDING ──▶ GENERATING ──▶ COMPLETED
//!                 │
//!                 ▼
//!              FAILED ──(manual retry, retry_count < MAX_RETRIES)──▶ GENERATING
//! ```
//!
//! ## Retry ceiling
//!
//! A job gets one initial attempt plus at most [`MAX_RETRIES`] manual
//! retries, so [`MAX_ATTEMPTS`] executions in total. `retry_count` counts
//! retries consumed and is incremented when a retry starts; once it
//! reaches the ceiling a FAILED job is terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docket_core::{CaseId, DocumentTypeId, JobId, Timestamp};

/// Maximum retries after the initial attempt.
pub const MAX_RETRIES: u32 = 2;

/// Maximum executions of one job, initial attempt included.
pub const MAX_ATTEMPTS: u32 = MAX_RETRIES + 1;

/// Status of a document job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Created, not yet started.
    Pending,
    /// Content generation or rendering is in progress.
    Generating,
    /// Finished with a content payload.
    Completed,
    /// The last attempt failed.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Generating => "GENERATING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobContent {
    /// A textual document body.
    Text {
        /// The document text.
        body: String,
    },
    /// A rendered binary artifact held by the artifact store.
    Artifact {
        /// Opaque reference returned by the renderer.
        reference: String,
    },
}

impl JobContent {
    /// Whether the payload carries no usable content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text { body } => body.trim().is_empty(),
            Self::Artifact { reference } => reference.trim().is_empty(),
        }
    }
}

/// Errors raised by job transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The transition is not valid from the job's current status.
    #[error("job {job_id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// A job cannot complete without content.
    #[error("job {job_id}: completed content must not be empty")]
    EmptyContent { job_id: JobId },

    /// Only FAILED jobs can be retried.
    #[error("job {job_id} is {status}, only FAILED jobs can be retried")]
    NotFailed { job_id: JobId, status: JobStatus },

    /// The retry ceiling has been reached.
    #[error("job {job_id} exhausted its retries after {attempts} attempts")]
    RetriesExhausted { job_id: JobId, attempts: u32 },
}

/// One unit of work producing exactly one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentJob {
    pub id: JobId,
    pub case_id: CaseId,
    pub document_type: DocumentTypeId,
    /// 1-based position in the decision's allowed-document list.
    pub ordinal: u32,
    status: JobStatus,
    attempts: u32,
    retry_count: u32,
    last_error: Option<String>,
    content: Option<JobContent>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl DocumentJob {
    /// Create a PENDING job.
    pub fn new(case_id: CaseId, document_type: DocumentTypeId, ordinal: u32) -> Self {
        let now = Timestamp::now();
        Self {
            id: JobId::new(),
            case_id,
            document_type,
            ordinal,
            status: JobStatus::Pending,
            attempts: 0,
            retry_count: 0,
            last_error: None,
            content: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Executions started so far, initial attempt included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Retries consumed so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn content(&self) -> Option<&JobContent> {
        self.content.as_ref()
    }

    /// Whether a manual retry request would be accepted.
    pub fn can_retry(&self) -> bool {
        self.status == JobStatus::Failed && self.retry_count < MAX_RETRIES
    }

    /// Retries still available.
    pub fn retries_remaining(&self) -> u32 {
        MAX_RETRIES.saturating_sub(self.retry_count)
    }

    /// Whether no further transition can happen without a new batch.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            JobStatus::Completed => true,
            JobStatus::Failed => !self.can_retry(),
            JobStatus::Pending | JobStatus::Generating => false,
        }
    }

    /// PENDING → GENERATING for the initial attempt.
    pub fn mark_generating(&mut self) -> Result<(), JobError> {
        self.require(JobStatus::Pending, JobStatus::Generating)?;
        self.start_attempt();
        Ok(())
    }

    /// FAILED → GENERATING for a manual retry. Returns the retry number.
    pub fn begin_retry(&mut self) -> Result<u32, JobError> {
        if self.status != JobStatus::Failed {
            return Err(JobError::NotFailed {
                job_id: self.id,
                status: self.status,
            });
        }
        if self.retry_count >= MAX_RETRIES {
            return Err(JobError::RetriesExhausted {
                job_id: self.id,
                attempts: self.attempts,
            });
        }
        self.retry_count += 1;
        self.start_attempt();
        Ok(self.retry_count)
    }

    /// GENERATING → COMPLETED with a non-empty payload.
    pub fn mark_completed(&mut self, content: JobContent) -> Result<(), JobError> {
        self.require(JobStatus::Generating, JobStatus::Completed)?;
        if content.is_empty() {
            return Err(JobError::EmptyContent { job_id: self.id });
        }
        let now = Timestamp::now();
        self.status = JobStatus::Completed;
        self.content = Some(content);
        self.last_error = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// GENERATING → FAILED, recording the error.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.require(JobStatus::Generating, JobStatus::Failed)?;
        let now = Timestamp::now();
        self.status = JobStatus::Failed;
        self.last_error = Some(error.into());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn start_attempt(&mut self) {
        let now = Timestamp::now();
        self.status = JobStatus::Generating;
        self.attempts += 1;
        self.started_at = Some(now);
        self.completed_at = None;
        self.updated_at = now;
    }

    fn require(&self, expected: JobStatus, to: JobStatus) -> Result<(), JobError> {
        if self.status != expected {
            return Err(JobError::InvalidTransition {
                job_id: self.id,
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}

// ─── Batch ───────────────────────────────────────────────────────────

/// Counts of jobs by outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
}

impl BatchSummary {
    /// "N of M documents generated".
    pub fn headline(&self) -> String {
        format!("{} of {} documents generated", self.completed, self.total)
    }
}

/// The full set of jobs for one generation run of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBatch {
    pub case_id: CaseId,
    /// Generation attempt the batch was created for.
    pub attempt: u64,
    pub created_at: Timestamp,
    jobs: Vec<DocumentJob>,
}

impl JobBatch {
    /// One PENDING job per document type, ordinals following input order.
    pub fn new(case_id: CaseId, attempt: u64, documents: &[DocumentTypeId]) -> Self {
        let jobs = documents
            .iter()
            .zip(1u32..)
            .map(|(doc, ordinal)| DocumentJob::new(case_id, doc.clone(), ordinal))
            .collect();
        Self {
            case_id,
            attempt,
            created_at: Timestamp::now(),
            jobs,
        }
    }

    /// Jobs in ordinal order.
    pub fn jobs(&self) -> &[DocumentJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job(&self, id: &JobId) -> Option<&DocumentJob> {
        self.jobs.iter().find(|j| j.id == *id)
    }

    pub fn job_mut(&mut self, id: &JobId) -> Option<&mut DocumentJob> {
        self.jobs.iter_mut().find(|j| j.id == *id)
    }

    pub fn summary(&self) -> BatchSummary {
        self.jobs.iter().fold(
            BatchSummary {
                total: self.jobs.len(),
                ..BatchSummary::default()
            },
            |mut acc, job| {
                match job.status() {
                    JobStatus::Completed => acc.completed += 1,
                    JobStatus::Failed => acc.failed += 1,
                    JobStatus::Pending | JobStatus::Generating => acc.in_progress += 1,
                }
                acc
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(s: &str) -> DocumentTypeId {
        DocumentTypeId::new(s).unwrap()
    }

    fn failed_job() -> DocumentJob {
        let mut job = DocumentJob::new(CaseId::new(), doc("et1-claim-form"), 1);
        job.mark_generating().unwrap();
        job.mark_failed("generator timed out").unwrap();
        job
    }

    #[test]
    fn new_job_is_pending() {
        let job = DocumentJob::new(CaseId::new(), doc("letter-before-action"), 1);
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.attempts(), 0);
        assert_eq!(job.retry_count(), 0);
        assert!(!job.can_retry());
        assert!(!job.is_terminal());
    }

    #[test]
    fn complete_requires_generating() {
        let mut job = DocumentJob::new(CaseId::new(), doc("letter-before-action"), 1);
        let err = job
            .mark_completed(JobContent::Text {
                body: "Dear Sir".into(),
            })
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
    }

    #[test]
    fn complete_rejects_empty_payload() {
        let mut job = DocumentJob::new(CaseId::new(), doc("letter-before-action"), 1);
        job.mark_generating().unwrap();
        let err = job
            .mark_completed(JobContent::Text { body: "  ".into() })
            .unwrap_err();
        assert_eq!(err, JobError::EmptyContent { job_id: job.id });
        assert_eq!(job.status(), JobStatus::Generating);
    }

    #[test]
    fn completed_job_has_content() {
        let mut job = DocumentJob::new(CaseId::new(), doc("et1-claim-form"), 1);
        job.mark_generating().unwrap();
        job.mark_completed(JobContent::Artifact {
            reference: "artifact://1".into(),
        })
        .unwrap();
        assert!(job.is_terminal());
        assert!(job.content().is_some_and(|c| !c.is_empty()));
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn failure_records_error() {
        let job = failed_job();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.last_error(), Some("generator timed out"));
        assert_eq!(job.attempts(), 1);
        assert!(job.can_retry());
        assert_eq!(job.retries_remaining(), MAX_RETRIES);
    }

    #[test]
    fn retry_ceiling_allows_three_attempts_total() {
        let mut job = failed_job();
        for expected in 1..=MAX_RETRIES {
            assert_eq!(job.begin_retry().unwrap(), expected);
            job.mark_failed("still failing").unwrap();
        }
        assert_eq!(job.attempts(), MAX_ATTEMPTS);
        assert_eq!(job.retry_count(), MAX_RETRIES);
        assert!(!job.can_retry());
        assert!(job.is_terminal());
        assert_eq!(
            job.begin_retry(),
            Err(JobError::RetriesExhausted {
                job_id: job.id,
                attempts: MAX_ATTEMPTS,
            })
        );
    }

    #[test]
    fn retry_rejected_unless_failed() {
        let mut job = DocumentJob::new(CaseId::new(), doc("et1-claim-form"), 1);
        assert!(matches!(
            job.begin_retry(),
            Err(JobError::NotFailed {
                status: JobStatus::Pending,
                ..
            })
        ));
    }

    #[test]
    fn successful_retry_clears_error() {
        let mut job = failed_job();
        job.begin_retry().unwrap();
        job.mark_completed(JobContent::Text {
            body: "Claim form".into(),
        })
        .unwrap();
        assert!(job.last_error().is_none());
        assert_eq!(job.retry_count(), 1);
    }

    #[test]
    fn batch_ordinals_follow_input_order() {
        let docs = vec![doc("n1-claim-form"), doc("particulars-of-claim"), doc("evidence-schedule")];
        let batch = JobBatch::new(CaseId::new(), 1, &docs);
        let got: Vec<_> = batch
            .jobs()
            .iter()
            .map(|j| (j.ordinal, j.document_type.clone()))
            .collect();
        assert_eq!(
            got,
            vec![(1, docs[0].clone()), (2, docs[1].clone()), (3, docs[2].clone())]
        );
    }

    #[test]
    fn batch_summary_counts() {
        let docs = vec![doc("a"), doc("b"), doc("c")];
        let mut batch = JobBatch::new(CaseId::new(), 1, &docs);
        let ids: Vec<_> = batch.jobs().iter().map(|j| j.id).collect();
        {
            let job = batch.job_mut(&ids[0]).unwrap();
            job.mark_generating().unwrap();
            job.mark_completed(JobContent::Text { body: "x".into() }).unwrap();
        }
        {
            let job = batch.job_mut(&ids[1]).unwrap();
            job.mark_generating().unwrap();
            job.mark_failed("boom").unwrap();
        }
        let summary = batch.summary();
        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                completed: 1,
                failed: 1,
                in_progress: 1,
            }
        );
        assert_eq!(summary.headline(), "1 of 3 documents generated");
    }

    #[test]
    fn content_serializes_with_kind_tag() {
        let json = serde_json::to_value(JobContent::Artifact {
            reference: "artifact://x".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "artifact");
        assert_eq!(json["reference"], "artifact://x");
    }
}
