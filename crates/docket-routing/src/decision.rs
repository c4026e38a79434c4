//! # Routing Decision
//!
//! The outcome of classifying one case for one generation attempt. A
//! decision is computed once per attempt and stored alongside the case. It
//! is only replaced after an explicit reset to GATHERING.
//!
//! Three invariants hold for every well-formed decision:
//!
//! - no document is both allowed and blocked;
//! - `prerequisites_met` is the conjunction of every prerequisite's `met`;
//! - a decision that is not APPROVED carries its explanation (an unmet
//!   prerequisite, an expired limit, a block reason or clarifications).
//!
//! [`RoutingDecision::check_invariants`] reports the first violation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use docket_core::{
    CaseId, DisputeDomain, DocumentTypeId, ForumId, JurisdictionId, LegalRelationship, Timestamp,
};

/// Verdict of the routing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    Approved,
    Blocked,
    RequiresClarification,
    Pending,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Blocked => "BLOCKED",
            Self::RequiresClarification => "REQUIRES_CLARIFICATION",
            Self::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluated prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub description: String,
    pub met: bool,
    /// The facts were silent, so `met` is false pending an answer.
    #[serde(default)]
    pub needs_clarification: bool,
}

impl Prerequisite {
    /// Known to be unmet, as opposed to merely undetermined.
    pub fn is_unmet(&self) -> bool {
        !self.met && !self.needs_clarification
    }
}

/// A computed filing deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLimit {
    /// Last day on which filing is permitted.
    pub deadline: NaiveDate,
    /// `true` while the deadline has not passed.
    pub met: bool,
    pub description: String,
    pub trigger_date: NaiveDate,
}

/// A fallback route offered when the chosen forum is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeRoute {
    pub forum: ForumId,
    pub name: String,
    pub reason: String,
}

/// A violated decision invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionError {
    #[error("document {0} is both allowed and blocked")]
    OverlappingDocuments(DocumentTypeId),

    #[error("prerequisites_met is {flag} but the prerequisite list says {actual}")]
    PrerequisiteFlagMismatch { flag: bool, actual: bool },

    #[error("{status} decision carries no explanation")]
    UnexplainedNonApproval { status: DecisionStatus },

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// The routing decision computed for one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub case_id: CaseId,
    /// Generation attempt this decision was computed for.
    pub attempt: u64,
    pub status: DecisionStatus,
    pub confidence: f64,
    pub jurisdiction: JurisdictionId,
    pub relationship: LegalRelationship,
    pub counterparty: Option<String>,
    pub domain: DisputeDomain,
    pub forum: ForumId,
    pub forum_name: String,
    pub forum_reasoning: String,
    pub forum_chosen_by_user: bool,
    /// Documents that may be generated, in filing order.
    pub allowed_documents: Vec<DocumentTypeId>,
    pub blocked_documents: Vec<DocumentTypeId>,
    pub prerequisites: Vec<Prerequisite>,
    pub prerequisites_met: bool,
    pub time_limit: Option<TimeLimit>,
    pub alternatives: Vec<AlternativeRoute>,
    /// Questions to put to the user before routing can finish.
    pub clarifications: Vec<String>,
    pub block_reason: Option<String>,
    pub reason: String,
    pub decided_at: Timestamp,
}

impl RoutingDecision {
    pub fn is_approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }

    pub fn has_unmet_prerequisite(&self) -> bool {
        self.prerequisites.iter().any(Prerequisite::is_unmet)
    }

    pub fn time_limit_expired(&self) -> bool {
        self.time_limit.as_ref().is_some_and(|t| !t.met)
    }

    /// First document listed as both allowed and blocked.
    pub fn overlapping_document(&self) -> Option<&DocumentTypeId> {
        self.allowed_documents
            .iter()
            .find(|d| self.blocked_documents.contains(d))
    }

    /// Verify the structural invariants.
    pub fn check_invariants(&self) -> Result<(), DecisionError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DecisionError::ConfidenceOutOfRange(self.confidence));
        }
        if let Some(doc) = self.overlapping_document() {
            return Err(DecisionError::OverlappingDocuments(doc.clone()));
        }
        let actual = self.prerequisites.iter().all(|p| p.met);
        if actual != self.prerequisites_met {
            return Err(DecisionError::PrerequisiteFlagMismatch {
                flag: self.prerequisites_met,
                actual,
            });
        }
        if !self.is_approved() {
            let explained = self.has_unmet_prerequisite()
                || self.time_limit_expired()
                || self.block_reason.is_some()
                || !self.clarifications.is_empty();
            if !explained {
                return Err(DecisionError::UnexplainedNonApproval {
                    status: self.status,
                });
            }
        }
        Ok(())
    }
}

/// The slice of a decision handed to the content generator with each
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub case_id: CaseId,
    pub forum: ForumId,
    pub forum_name: String,
    pub jurisdiction: JurisdictionId,
    pub relationship: LegalRelationship,
    pub domain: DisputeDomain,
    pub counterparty: Option<String>,
    pub deadline: Option<NaiveDate>,
    /// 1-based position of the document in the allowed list.
    pub ordinal: u32,
    pub document_count: u32,
}

impl DecisionContext {
    pub fn for_document(decision: &RoutingDecision, ordinal: u32) -> Self {
        Self {
            case_id: decision.case_id,
            forum: decision.forum.clone(),
            forum_name: decision.forum_name.clone(),
            jurisdiction: decision.jurisdiction.clone(),
            relationship: decision.relationship,
            domain: decision.domain,
            counterparty: decision.counterparty.clone(),
            deadline: decision.time_limit.as_ref().map(|t| t.deadline),
            ordinal,
            document_count: u32::try_from(decision.allowed_documents.len()).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn doc(id: &str) -> DocumentTypeId {
        DocumentTypeId::new(id).unwrap()
    }

    /// A minimal, internally consistent APPROVED decision.
    pub fn approved() -> RoutingDecision {
        RoutingDecision {
            case_id: CaseId::new(),
            attempt: 1,
            status: DecisionStatus::Approved,
            confidence: 0.8,
            jurisdiction: JurisdictionId::new("england-and-wales").unwrap(),
            relationship: LegalRelationship::EmployeeEmployer,
            counterparty: Some("Acme Ltd".into()),
            domain: DisputeDomain::Employment,
            forum: ForumId::new("employment-tribunal").unwrap(),
            forum_name: "Employment Tribunal".into(),
            forum_reasoning: "employment dispute".into(),
            forum_chosen_by_user: false,
            allowed_documents: vec![doc("et1-claim-form")],
            blocked_documents: vec![],
            prerequisites: vec![],
            prerequisites_met: true,
            time_limit: None,
            alternatives: vec![],
            clarifications: vec![],
            block_reason: None,
            reason: "approved".into(),
            decided_at: Timestamp::now(),
        }
    }
}
