//! # Routing Engine
//!
//! Classifies a sufficient fact snapshot into a [`RoutingDecision`]:
//!
//! ```text
//! domain label ──► DisputeDomain ──┐
//! relationship hint / key facts ───┼──► forum ──► prerequisites ──► status
//! jurisdiction hint / default ─────┘      ▲       time limit
//!                       user-chosen forum ┘
//! ```
//!
//! A user-chosen forum always wins over the default mapping, but it must
//! exist and sit in the case's jurisdiction. Anything the engine cannot
//! classify is a [`ClassificationFailure`]; failures are never persisted as
//! decisions, the case goes back to gathering instead.
//!
//! Confidence is built from independent signals:
//!
//! | Signal | Weight |
//! |--------|--------|
//! | forum chosen by the user / defaulted | 0.35 / 0.20 |
//! | domain canonical / alias | 0.25 / 0.15 |
//! | relationship explicit / inferred / default | 0.20 / 0.15 / 0.10 |
//! | jurisdiction explicit / default | 0.10 / 0.05 |
//! | fact richness, `min(facts / 10, 1)` | 0.10 |

use chrono::NaiveDate;
use thiserror::Error;

use docket_core::{
    CaseId, DisputeDomain, DocumentTypeId, DomainMatch, ForumId, JurisdictionId,
    LegalRelationship, Timestamp, ValidationError,
};

use crate::decision::{AlternativeRoute, DecisionStatus, Prerequisite, RoutingDecision, TimeLimit};
use crate::forum::{
    default_forum_id, resolve_jurisdiction, ForumProfile, ForumRegistry, PrerequisiteOutcome,
    ENGLAND_AND_WALES,
};
use crate::strategy::CaseStrategy;

const CONTRACTOR_MARKERS: &[&str] = &[
    "self-employed",
    "self employed",
    "contractor",
    "freelance",
    "sole trader",
    "invoiced",
];

const BUSINESS_MARKERS: &[&str] = &["my business", "my company", "our company", "on behalf of the company"];

/// Input to [`RoutingEngine::classify`].
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    pub case_id: CaseId,
    /// Generation attempt the decision is computed for.
    pub attempt: u64,
    pub snapshot: CaseStrategy,
    /// Domain label, overriding the snapshot's when present.
    pub domain_hint: Option<String>,
    pub evidence_summary: String,
    /// Forum the user chose, overriding the snapshot's when present.
    pub forum_hint: Option<String>,
}

impl RoutingRequest {
    /// Build a request whose hints come from the snapshot itself.
    pub fn from_snapshot(case_id: CaseId, attempt: u64, snapshot: CaseStrategy) -> Self {
        Self {
            case_id,
            attempt,
            domain_hint: snapshot.domain.clone(),
            evidence_summary: snapshot.evidence_summary(),
            forum_hint: snapshot.chosen_forum.clone(),
            snapshot,
        }
    }
}

/// The engine could not produce a decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationFailure {
    #[error("no dispute domain label")]
    MissingDomain,

    #[error("dispute domain \"{label}\" does not map to a supported domain")]
    UnmappableDomain { label: String },

    #[error("unknown forum \"{forum}\"")]
    UnknownForum { forum: String },

    #[error("forum {forum} does not sit in {jurisdiction}")]
    ForumOutsideJurisdiction {
        forum: ForumId,
        jurisdiction: JurisdictionId,
    },

    #[error("unsupported jurisdiction \"{label}\"")]
    UnsupportedJurisdiction { label: String },

    #[error("no forum handles {domain} disputes in {jurisdiction}")]
    NoForumForRoute {
        domain: DisputeDomain,
        jurisdiction: JurisdictionId,
    },
}

impl ClassificationFailure {
    /// The question put back to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingDomain => {
                "Tell us what kind of dispute this is, for example about work, a purchase, or a tenancy.".to_string()
            }
            Self::UnmappableDomain { label } => format!(
                "We don't yet handle \"{label}\" disputes. Can you describe the problem differently?"
            ),
            Self::UnknownForum { forum } => format!(
                "We don't recognise \"{forum}\" as a court or tribunal. Which one did you mean?"
            ),
            Self::ForumOutsideJurisdiction { forum, jurisdiction } => format!(
                "{forum} does not hear cases in {jurisdiction}. Please check where the dispute took place."
            ),
            Self::UnsupportedJurisdiction { label } => format!(
                "We can only help with disputes in England, Wales or Scotland, not \"{label}\"."
            ),
            Self::NoForumForRoute { domain, jurisdiction } => format!(
                "We could not find a route for a {domain} dispute in {jurisdiction}. Tell us more about what happened."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Explicit,
    Inferred,
    Default,
}

/// Deterministic jurisdiction and forum classifier.
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    registry: ForumRegistry,
    default_jurisdiction: JurisdictionId,
}

impl RoutingEngine {
    pub fn new(registry: ForumRegistry, default_jurisdiction: JurisdictionId) -> Self {
        Self {
            registry,
            default_jurisdiction,
        }
    }

    /// Built-in forums, defaulting to England and Wales.
    pub fn builtin() -> Result<Self, ValidationError> {
        Ok(Self::new(
            ForumRegistry::builtin()?,
            JurisdictionId::new(ENGLAND_AND_WALES)?,
        ))
    }

    pub fn registry(&self) -> &ForumRegistry {
        &self.registry
    }

    pub fn default_jurisdiction(&self) -> &JurisdictionId {
        &self.default_jurisdiction
    }

    /// Classify a request as of `today`.
    pub fn classify(
        &self,
        request: &RoutingRequest,
        today: NaiveDate,
    ) -> Result<RoutingDecision, ClassificationFailure> {
        let facts = &request.snapshot;

        let label = request
            .domain_hint
            .as_deref()
            .or(facts.domain.as_deref())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(ClassificationFailure::MissingDomain)?;
        let (domain, domain_match) = DisputeDomain::resolve(label).ok_or_else(|| {
            ClassificationFailure::UnmappableDomain {
                label: label.to_string(),
            }
        })?;

        let (jurisdiction, jurisdiction_signal) = self.jurisdiction(facts)?;
        let (relationship, relationship_signal) = infer_relationship(domain, facts);

        let forum_hint = request
            .forum_hint
            .as_deref()
            .or(facts.chosen_forum.as_deref())
            .map(str::trim)
            .filter(|f| !f.is_empty());
        let (forum, chosen_by_user) = match forum_hint {
            Some(hint) => (self.user_forum(hint, &jurisdiction)?, true),
            None => {
                let no_route = || ClassificationFailure::NoForumForRoute {
                    domain,
                    jurisdiction: jurisdiction.clone(),
                };
                let id = default_forum_id(domain, relationship, facts.seeks_monetary_remedy(), &jurisdiction)
                    .ok_or_else(no_route)?;
                let forum = ForumId::new(id)
                    .ok()
                    .and_then(|id| self.registry.get(&id))
                    .ok_or_else(no_route)?;
                (forum, false)
            }
        };

        let mut clarifications = Vec::new();
        let prerequisites: Vec<Prerequisite> = forum
            .prerequisites
            .iter()
            .map(|rule| {
                let outcome = rule.check.evaluate(facts, today);
                if outcome == PrerequisiteOutcome::Unknown {
                    clarifications.push(rule.clarifying_question.clone());
                }
                Prerequisite {
                    description: rule.description.clone(),
                    met: outcome == PrerequisiteOutcome::Met,
                    needs_clarification: outcome == PrerequisiteOutcome::Unknown,
                }
            })
            .collect();
        let prerequisites_met = prerequisites.iter().all(|p| p.met);

        let time_limit = forum.time_limit.as_ref().and_then(|rule| {
            let trigger_date = rule.trigger_date(facts)?;
            let deadline = rule.deadline_from(trigger_date)?;
            Some(TimeLimit {
                deadline,
                met: today <= deadline,
                description: rule.description.clone(),
                trigger_date,
            })
        });

        let unmet = prerequisites.iter().find(|p| p.is_unmet());
        let expired = time_limit.as_ref().filter(|t| !t.met);
        let status = if unmet.is_some() || expired.is_some() {
            DecisionStatus::Blocked
        } else if !clarifications.is_empty() {
            DecisionStatus::RequiresClarification
        } else {
            DecisionStatus::Approved
        };

        let block_reason = match (unmet, expired) {
            (Some(p), _) => Some(format!("Prerequisite not met: {}", p.description)),
            (None, Some(t)) => Some(format!("Time limit expired on {}: {}", t.deadline, t.description)),
            (None, None) => None,
        };

        let (allowed_documents, blocked_documents, alternatives) = if status == DecisionStatus::Approved {
            let allowed = forum.documents.clone();
            let blocked = self.alternative_documents(forum, &allowed);
            (allowed, blocked, Vec::new())
        } else {
            let alternatives = self.alternatives(forum, &jurisdiction, status);
            (Vec::new(), forum.documents.clone(), alternatives)
        };

        let fact_count = facts.meaningful_facts().count();
        let confidence = confidence(
            chosen_by_user,
            domain_match,
            relationship_signal,
            jurisdiction_signal,
            fact_count,
        );

        let forum_reasoning = if chosen_by_user {
            format!("{} was chosen by the user", forum.name)
        } else {
            format!(
                "{} is the usual forum for {} disputes ({}) in {}",
                forum.name, domain, relationship, jurisdiction
            )
        };
        let reason = match status {
            DecisionStatus::Approved => format!(
                "Approved for {} with {} document(s); {}",
                forum.name,
                allowed_documents.len(),
                request.evidence_summary
            ),
            DecisionStatus::Blocked => format!("Blocked from filing with {}", forum.name),
            DecisionStatus::RequiresClarification => format!(
                "{} question(s) must be answered before filing with {}",
                clarifications.len(),
                forum.name
            ),
            DecisionStatus::Pending => format!("Decision for {} is pending", forum.name),
        };

        tracing::info!(
            case_id = %request.case_id,
            attempt = request.attempt,
            forum = %forum.id,
            status = %status,
            confidence,
            "routing decision computed"
        );

        Ok(RoutingDecision {
            case_id: request.case_id,
            attempt: request.attempt,
            status,
            confidence,
            jurisdiction,
            relationship,
            counterparty: facts.counterparty.clone(),
            domain,
            forum: forum.id.clone(),
            forum_name: forum.name.clone(),
            forum_reasoning,
            forum_chosen_by_user: chosen_by_user,
            allowed_documents,
            blocked_documents,
            prerequisites,
            prerequisites_met,
            time_limit,
            alternatives,
            clarifications,
            block_reason,
            reason,
            decided_at: Timestamp::now(),
        })
    }

    fn jurisdiction(
        &self,
        facts: &CaseStrategy,
    ) -> Result<(JurisdictionId, Signal), ClassificationFailure> {
        match facts.jurisdiction.as_deref().map(str::trim).filter(|j| !j.is_empty()) {
            Some(hint) => resolve_jurisdiction(hint)
                .map(|j| (j, Signal::Explicit))
                .ok_or_else(|| ClassificationFailure::UnsupportedJurisdiction {
                    label: hint.to_string(),
                }),
            None => Ok((self.default_jurisdiction.clone(), Signal::Default)),
        }
    }

    fn user_forum(
        &self,
        hint: &str,
        jurisdiction: &JurisdictionId,
    ) -> Result<&ForumProfile, ClassificationFailure> {
        let unknown = || ClassificationFailure::UnknownForum {
            forum: hint.to_string(),
        };
        let id = ForumId::new(hint.to_lowercase()).map_err(|_| unknown())?;
        let forum = self.registry.get(&id).ok_or_else(unknown)?;
        if !forum.sits_in(jurisdiction) {
            return Err(ClassificationFailure::ForumOutsideJurisdiction {
                forum: id,
                jurisdiction: jurisdiction.clone(),
            });
        }
        Ok(forum)
    }

    fn alternatives(
        &self,
        forum: &ForumProfile,
        jurisdiction: &JurisdictionId,
        status: DecisionStatus,
    ) -> Vec<AlternativeRoute> {
        let reason = match status {
            DecisionStatus::RequiresClarification => "Available while the open questions are answered",
            _ => "Available while this route is blocked",
        };
        forum
            .alternatives
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|alt| alt.sits_in(jurisdiction))
            .map(|alt| AlternativeRoute {
                forum: alt.id.clone(),
                name: alt.name.clone(),
                reason: reason.to_string(),
            })
            .collect()
    }

    fn alternative_documents(
        &self,
        forum: &ForumProfile,
        allowed: &[DocumentTypeId],
    ) -> Vec<DocumentTypeId> {
        let mut blocked: Vec<DocumentTypeId> = Vec::new();
        for alt in forum.alternatives.iter().filter_map(|id| self.registry.get(id)) {
            for doc in &alt.documents {
                if !allowed.contains(doc) && !blocked.contains(doc) {
                    blocked.push(doc.clone());
                }
            }
        }
        blocked
    }
}

fn infer_relationship(domain: DisputeDomain, facts: &CaseStrategy) -> (LegalRelationship, Signal) {
    if let Some(parsed) = facts
        .relationship
        .as_deref()
        .and_then(|hint| hint.parse::<LegalRelationship>().ok())
    {
        return (parsed, Signal::Explicit);
    }
    match domain {
        DisputeDomain::Employment if facts.facts_mention(CONTRACTOR_MARKERS) => {
            (LegalRelationship::ContractorClient, Signal::Inferred)
        }
        DisputeDomain::Consumer if facts.facts_mention(BUSINESS_MARKERS) => {
            (LegalRelationship::BusinessToBusiness, Signal::Inferred)
        }
        _ => (LegalRelationship::default_for(domain), Signal::Default),
    }
}

fn confidence(
    chosen_by_user: bool,
    domain_match: DomainMatch,
    relationship: Signal,
    jurisdiction: Signal,
    fact_count: usize,
) -> f64 {
    let forum = if chosen_by_user { 0.35 } else { 0.20 };
    let domain = match domain_match {
        DomainMatch::Canonical => 0.25,
        DomainMatch::Alias => 0.15,
    };
    let relationship = match relationship {
        Signal::Explicit => 0.20,
        Signal::Inferred => 0.15,
        Signal::Default => 0.10,
    };
    let jurisdiction = match jurisdiction {
        Signal::Explicit => 0.10,
        _ => 0.05,
    };
    let richness = (fact_count as f64 / 10.0).min(1.0) * 0.10;
    (forum + domain + relationship + jurisdiction + richness).clamp(0.0, 1.0)
}
