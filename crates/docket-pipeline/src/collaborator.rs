//! # Collaborator Seams
//!
//! The pipeline drives four external collaborators through traits:
//!
//! - [`ContentGenerator`]: produces document text (a language model in
//!   production).
//! - [`ArtifactRenderer`]: turns text into a stored binary artifact and
//!   returns its reference.
//! - [`FactStore`]: owns the fact snapshot. The pipeline only reads it;
//!   writes go through the store's merge rule and are refused once the
//!   case is locked.
//! - [`Clock`]: supplies today's date for limitation checks.
//!
//! Development implementations live in [`crate::dev`].

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;

use docket_core::{CaseId, DocumentTypeId};
use docket_routing::{CaseStrategy, DecisionContext, StrategyUpdate};
use docket_state::CasePhase;

/// Failure reported by a content generator or renderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("content generation failed: {0}")]
    Generation(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("{0} is unavailable")]
    Unavailable(String),
}

/// Produces the text of one document.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        document_type: &DocumentTypeId,
        snapshot: &CaseStrategy,
        context: &DecisionContext,
    ) -> Result<String, CollaboratorError>;
}

/// Renders text into a binary artifact and stores it.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    /// Returns an opaque artifact reference.
    async fn render(
        &self,
        text: &str,
        document_type: &DocumentTypeId,
    ) -> Result<String, CollaboratorError>;
}

/// Fact store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactStoreError {
    #[error("case {0} not found")]
    CaseNotFound(CaseId),

    /// Facts are frozen while the case is outside GATHERING.
    #[error("case {case_id} is locked in {phase}; facts cannot change")]
    Locked { case_id: CaseId, phase: CasePhase },

    #[error("fact store unavailable: {0}")]
    Unavailable(String),
}

/// Owner of the per-case fact snapshot.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Current snapshot. `None` when the case has no facts yet.
    async fn snapshot(&self, case_id: &CaseId) -> Result<Option<CaseStrategy>, FactStoreError>;

    /// Merge one update into the snapshot, refusing when locked.
    async fn apply(
        &self,
        case_id: &CaseId,
        update: StrategyUpdate,
    ) -> Result<CaseStrategy, FactStoreError>;
}

/// Source of the current date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The UTC calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
