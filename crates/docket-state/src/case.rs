//! # Case Lifecycle
//!
//! A [`Case`] carries the pipeline phase, the user-facing status, the
//! display-only lock reason, and the generation attempt counter.
//!
//! ## Idempotency
//!
//! `generation_attempt` increases by one on every `GATHERING → ROUTING`
//! transition. Work submitted for a case captures the attempt it was
//! started for, and every later stage transition (`begin_generation`,
//! `block`, `complete`, `revert_to_gathering`) must present the same
//! attempt or it is rejected with [`CaseError::StaleAttempt`]. A second
//! trigger racing the first either sees a locked phase or a bumped attempt.
//!
//! ## Lock
//!
//! The conversation lock is `phase != GATHERING`. Entering any other phase
//! records a human-readable lock reason and a lock timestamp; only a
//! transition back to GATHERING clears them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docket_core::{CaseId, OwnerId, Timestamp};

use crate::phase::{CasePhase, CaseStatus};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by case lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// The requested phase transition is not valid from the current phase.
    #[error("invalid phase transition {from} -> {to}: {reason}")]
    InvalidTransition {
        /// Current phase.
        from: CasePhase,
        /// Attempted target phase.
        to: CasePhase,
        /// Why the transition was rejected.
        reason: String,
    },

    /// The requested status transition is not valid from the current status.
    #[error("invalid status transition {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: CaseStatus,
        /// Attempted target status.
        to: CaseStatus,
    },

    /// A stage transition presented an outdated generation attempt.
    #[error("case {case_id} is on generation attempt {current}, not {presented}")]
    StaleAttempt {
        /// The case.
        case_id: CaseId,
        /// The case's current attempt.
        current: u64,
        /// The attempt carried by the caller.
        presented: u64,
    },

    /// The case is closed and cannot re-enter the pipeline.
    #[error("case {case_id} is closed")]
    Closed {
        /// The case.
        case_id: CaseId,
    },
}

// ─── Transition records ──────────────────────────────────────────────

/// Record of a phase transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransitionRecord {
    /// Phase before the transition.
    pub from_phase: CasePhase,
    /// Phase after the transition.
    pub to_phase: CasePhase,
    /// Generation attempt the transition belongs to.
    pub attempt: u64,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Reason for the transition.
    pub reason: String,
}

/// Record of a user-facing status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransitionRecord {
    /// Status before the transition.
    pub from_status: CaseStatus,
    /// Status after the transition.
    pub to_status: CaseStatus,
    /// When the transition occurred.
    pub timestamp: Timestamp,
}

// ─── Case ────────────────────────────────────────────────────────────

/// One dispute being pursued by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    /// Unique case identifier.
    pub id: CaseId,
    /// The user who owns the case.
    pub owner: OwnerId,
    /// User-facing lifecycle status.
    status: CaseStatus,
    /// Pipeline-facing phase.
    phase: CasePhase,
    /// Why the conversation is currently non-interactive.
    lock_reason: Option<String>,
    /// When the current lock was asserted.
    locked_at: Option<Timestamp>,
    /// Monotonic generation attempt counter.
    generation_attempt: u64,
    /// When the case was opened.
    pub created_at: Timestamp,
    /// When the case last changed.
    pub updated_at: Timestamp,
    /// Ordered log of phase transitions.
    phase_history: Vec<PhaseTransitionRecord>,
    /// Ordered log of status transitions.
    status_history: Vec<StatusTransitionRecord>,
}

impl Case {
    /// Open a new case in GATHERING / DRAFT.
    pub fn new(owner: OwnerId) -> Self {
        Self::with_id(CaseId::new(), owner)
    }

    /// Open a new case with a caller-chosen identifier.
    pub fn with_id(id: CaseId, owner: OwnerId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            owner,
            status: CaseStatus::Draft,
            phase: CasePhase::Gathering,
            lock_reason: None,
            locked_at: None,
            generation_attempt: 0,
            created_at: now,
            updated_at: now,
            phase_history: Vec::new(),
            status_history: Vec::new(),
        }
    }

    pub fn phase(&self) -> CasePhase {
        self.phase
    }

    pub fn status(&self) -> CaseStatus {
        self.status
    }

    pub fn generation_attempt(&self) -> u64 {
        self.generation_attempt
    }

    pub fn lock_reason(&self) -> Option<&str> {
        self.lock_reason.as_deref()
    }

    pub fn locked_at(&self) -> Option<Timestamp> {
        self.locked_at
    }

    pub fn phase_history(&self) -> &[PhaseTransitionRecord] {
        &self.phase_history
    }

    pub fn status_history(&self) -> &[StatusTransitionRecord] {
        &self.status_history
    }

    /// Whether the conversation is locked. Derived from the phase.
    pub fn is_locked(&self) -> bool {
        self.phase.is_locked()
    }

    /// Whether the user may add facts to the conversation.
    pub fn is_writable(&self) -> bool {
        self.phase == CasePhase::Gathering && !self.status.is_terminal()
    }

    /// The canonical user-facing message for the current phase.
    ///
    /// A BLOCKED case reports its recorded lock reason (the blocking
    /// gate's user message). A case that routing sent back to GATHERING
    /// reports the question it was sent back with. Otherwise the phase
    /// default.
    pub fn status_message(&self) -> &str {
        match (self.phase, self.lock_reason.as_deref()) {
            (CasePhase::Blocked, Some(reason)) => reason,
            (CasePhase::Gathering, _) => self
                .phase_history
                .last()
                .filter(|r| r.from_phase == CasePhase::Routing)
                .map(|r| r.reason.as_str())
                .unwrap_or_else(|| CasePhase::Gathering.status_message()),
            (phase, _) => phase.status_message(),
        }
    }

    // ── Phase transitions ────────────────────────────────────────────

    /// GATHERING → ROUTING. Returns the new generation attempt.
    pub fn begin_routing(&mut self, reason: impl Into<String>) -> Result<u64, CaseError> {
        if self.status.is_terminal() {
            return Err(CaseError::Closed { case_id: self.id });
        }
        self.require_phase(&[CasePhase::Gathering], CasePhase::Routing)?;
        self.generation_attempt += 1;
        self.do_transition(CasePhase::Routing, reason.into());
        Ok(self.generation_attempt)
    }

    /// ROUTING → GENERATING, after the gate allowed generation.
    pub fn begin_generation(
        &mut self,
        attempt: u64,
        reason: impl Into<String>,
    ) -> Result<(), CaseError> {
        self.require_attempt(attempt)?;
        self.require_phase(&[CasePhase::Routing], CasePhase::Generating)?;
        self.do_transition(CasePhase::Generating, reason.into());
        Ok(())
    }

    /// Refresh the lock reason while GENERATING without changing phase.
    pub fn reassert_lock(&mut self, attempt: u64, reason: impl Into<String>) -> Result<(), CaseError> {
        self.require_attempt(attempt)?;
        if self.phase != CasePhase::Generating {
            return Err(CaseError::InvalidTransition {
                from: self.phase,
                to: CasePhase::Generating,
                reason: "lock can only be re-asserted while generating".to_string(),
            });
        }
        let now = Timestamp::now();
        self.lock_reason = Some(reason.into());
        self.locked_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// ROUTING → BLOCKED (gate block) or GENERATING → BLOCKED (fatal failure).
    pub fn block(&mut self, attempt: u64, reason: impl Into<String>) -> Result<(), CaseError> {
        self.require_attempt(attempt)?;
        self.require_phase(
            &[CasePhase::Routing, CasePhase::Generating],
            CasePhase::Blocked,
        )?;
        self.do_transition(CasePhase::Blocked, reason.into());
        Ok(())
    }

    /// GENERATING → COMPLETED, once the batch loop has finished.
    pub fn complete(&mut self, attempt: u64, reason: impl Into<String>) -> Result<(), CaseError> {
        self.require_attempt(attempt)?;
        self.require_phase(&[CasePhase::Generating], CasePhase::Completed)?;
        self.do_transition(CasePhase::Completed, reason.into());
        Ok(())
    }

    /// ROUTING → GATHERING after a classification failure.
    pub fn revert_to_gathering(
        &mut self,
        attempt: u64,
        reason: impl Into<String>,
    ) -> Result<(), CaseError> {
        self.require_attempt(attempt)?;
        self.require_phase(&[CasePhase::Routing], CasePhase::Gathering)?;
        self.do_transition(CasePhase::Gathering, reason.into());
        Ok(())
    }

    /// COMPLETED or BLOCKED → GATHERING, so new facts can restart the pipeline.
    pub fn reset(&mut self, reason: impl Into<String>) -> Result<(), CaseError> {
        if self.status.is_terminal() {
            return Err(CaseError::Closed { case_id: self.id });
        }
        self.require_phase(
            &[CasePhase::Completed, CasePhase::Blocked],
            CasePhase::Gathering,
        )?;
        self.do_transition(CasePhase::Gathering, reason.into());
        Ok(())
    }

    // ── Status transitions ───────────────────────────────────────────

    /// Move the user-facing status.
    pub fn set_status(&mut self, to: CaseStatus) -> Result<(), CaseError> {
        if !self.status.valid_transitions().contains(&to) {
            return Err(CaseError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        let now = Timestamp::now();
        self.status_history.push(StatusTransitionRecord {
            from_status: self.status,
            to_status: to,
            timestamp: now,
        });
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Close the case. Cases are never deleted.
    pub fn close(&mut self) -> Result<(), CaseError> {
        self.set_status(CaseStatus::Closed)
    }

    // ── Internal helpers ─────────────────────────────────────────────

    fn require_attempt(&self, attempt: u64) -> Result<(), CaseError> {
        if attempt != self.generation_attempt {
            return Err(CaseError::StaleAttempt {
                case_id: self.id,
                current: self.generation_attempt,
                presented: attempt,
            });
        }
        Ok(())
    }

    fn require_phase(&self, allowed: &[CasePhase], to: CasePhase) -> Result<(), CaseError> {
        if !allowed.contains(&self.phase) || !self.phase.can_transition_to(to) {
            return Err(CaseError::InvalidTransition {
                from: self.phase,
                to,
                reason: format!(
                    "expected one of [{}]",
                    allowed
                        .iter()
                        .map(CasePhase::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: CasePhase, reason: String) {
        let now = Timestamp::now();
        self.phase_history.push(PhaseTransitionRecord {
            from_phase: self.phase,
            to_phase: to,
            attempt: self.generation_attempt,
            timestamp: now,
            reason: reason.clone(),
        });
        self.phase = to;
        self.updated_at = now;
        if to.is_locked() {
            self.lock_reason = Some(reason);
            self.locked_at = Some(now);
        } else {
            self.lock_reason = None;
            self.locked_at = None;
        }
    }
}
