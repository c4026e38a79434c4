//! # docket-state: Case and Job State Machines
//!
//! Validated, enum-based state machines for the dispute pipeline.
//!
//! ## State Machines
//!
//! - **Phase** (`phase.rs`): the pipeline-facing phase of a case
//!   (`GATHERING → ROUTING → GENERATING → COMPLETED`, with `BLOCKED`) and
//!   the user-facing lifecycle status (`DRAFT → DOCUMENT_SENT → ...`).
//!
//! - **Case** (`case.rs`): a dispute case carrying both enums, the derived
//!   conversation lock, the generation attempt counter that guards every
//!   stage transition, and an append-only transition log.
//!
//! - **Job** (`job.rs`): one document generation job and the batch that
//!   owns it, with the fixed retry ceiling.
//!
//! ## Design
//!
//! Transitions are methods returning `Result`; invalid transitions carry
//! the current state, the attempted target, and a reason. The conversation
//! lock is never stored: it is `phase != GATHERING`.

pub mod case;
pub mod job;
pub mod phase;

pub use case::{Case, CaseError, PhaseTransitionRecord, StatusTransitionRecord};
pub use job::{
    BatchSummary, DocumentJob, JobBatch, JobContent, JobError, JobStatus, MAX_ATTEMPTS,
    MAX_RETRIES,
};
pub use phase::{CasePhase, CaseStatus};
