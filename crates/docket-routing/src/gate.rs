//! # Generation Gate
//!
//! The single check standing between a routing decision and document
//! generation. [`validate`] is total and fail-fast: gates run in a fixed
//! order and the first failing gate is reported.
//!
//! ```text
//! NO_DECISION
//!   └─ status != APPROVED
//!        PREREQUISITE_UNMET → TIME_LIMIT_EXPIRED → REQUIRES_CLARIFICATION
//!        → ROUTE_BLOCKED → DECISION_PENDING
//!   └─ status == APPROVED but contradictory
//!        DECISION_INCONSISTENT
//!   └─ NO_ALLOWED_DOCUMENTS
//!   └─ ALL_GATES_PASSED
//! ```

use serde::{Deserialize, Serialize};

use crate::decision::{DecisionStatus, RoutingDecision};

/// Name of the gate that produced a [`GateResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateName {
    NoDecision,
    PrerequisiteUnmet,
    TimeLimitExpired,
    RequiresClarification,
    RouteBlocked,
    DecisionPending,
    DecisionInconsistent,
    NoAllowedDocuments,
    AllGatesPassed,
}

impl GateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDecision => "NO_DECISION",
            Self::PrerequisiteUnmet => "PREREQUISITE_UNMET",
            Self::TimeLimitExpired => "TIME_LIMIT_EXPIRED",
            Self::RequiresClarification => "REQUIRES_CLARIFICATION",
            Self::RouteBlocked => "ROUTE_BLOCKED",
            Self::DecisionPending => "DECISION_PENDING",
            Self::DecisionInconsistent => "DECISION_INCONSISTENT",
            Self::NoAllowedDocuments => "NO_ALLOWED_DOCUMENTS",
            Self::AllGatesPassed => "ALL_GATES_PASSED",
        }
    }
}

impl std::fmt::Display for GateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user (or the pipeline) should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    ProvideMoreFacts,
    CompletePrerequisite,
    ConsiderAlternatives,
    AnswerClarifications,
    WaitForDecision,
    ContactSupport,
    GenerateDocuments,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub allowed: bool,
    pub gate: GateName,
    /// Internal explanation, `None` when allowed.
    pub error: Option<String>,
    pub user_message: String,
    pub next_action: NextAction,
}

impl GateResult {
    fn pass() -> Self {
        Self {
            allowed: true,
            gate: GateName::AllGatesPassed,
            error: None,
            user_message: "Your documents can now be prepared.".to_string(),
            next_action: NextAction::GenerateDocuments,
        }
    }

    fn deny(
        gate: GateName,
        error: impl Into<String>,
        user_message: impl Into<String>,
        next_action: NextAction,
    ) -> Self {
        Self {
            allowed: false,
            gate,
            error: Some(error.into()),
            user_message: user_message.into(),
            next_action,
        }
    }
}

fn with_alternatives(message: String, decision: &RoutingDecision) -> String {
    if decision.alternatives.is_empty() {
        return message;
    }
    let names: Vec<&str> = decision.alternatives.iter().map(|a| a.name.as_str()).collect();
    format!("{message} You may still be able to use: {}.", names.join(", "))
}

/// Decide whether generation may start for `decision`.
pub fn validate(decision: Option<&RoutingDecision>) -> GateResult {
    let Some(d) = decision else {
        return GateResult::deny(
            GateName::NoDecision,
            "no routing decision stored for this case",
            "We haven't worked out your legal route yet.",
            NextAction::ProvideMoreFacts,
        );
    };

    if !d.is_approved() {
        return denied_decision(d);
    }

    let contradictory = d.has_unmet_prerequisite()
        || !d.prerequisites.iter().all(|p| p.met)
        || d.time_limit_expired()
        || d.check_invariants().is_err();
    if contradictory {
        let detail = d
            .check_invariants()
            .err()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "approved decision has unmet conditions".to_string());
        return GateResult::deny(
            GateName::DecisionInconsistent,
            detail,
            "Something went wrong while checking your case. Please contact support.",
            NextAction::ContactSupport,
        );
    }

    if d.allowed_documents.is_empty() {
        return GateResult::deny(
            GateName::NoAllowedDocuments,
            format!("{} permits no documents", d.forum),
            "There are no documents we can prepare for this route.",
            NextAction::ConsiderAlternatives,
        );
    }

    GateResult::pass()
}

fn denied_decision(d: &RoutingDecision) -> GateResult {
    if let Some(p) = d.prerequisites.iter().find(|p| p.is_unmet()) {
        return GateResult::deny(
            GateName::PrerequisiteUnmet,
            format!("prerequisite unmet: {}", p.description),
            with_alternatives(
                format!(
                    "Before filing with {} this step is needed: {}.",
                    d.forum_name, p.description
                ),
                d,
            ),
            NextAction::CompletePrerequisite,
        );
    }
    if let Some(t) = d.time_limit.as_ref().filter(|t| !t.met) {
        return GateResult::deny(
            GateName::TimeLimitExpired,
            format!("time limit expired on {}", t.deadline),
            with_alternatives(
                format!(
                    "The deadline to file with {} passed on {}.",
                    d.forum_name, t.deadline
                ),
                d,
            ),
            NextAction::ConsiderAlternatives,
        );
    }
    if d.status == DecisionStatus::RequiresClarification || !d.clarifications.is_empty() {
        let message = match d.clarifications.first() {
            Some(question) => format!("We need a little more information: {question}"),
            None => "We need a little more information before we can continue.".to_string(),
        };
        return GateResult::deny(
            GateName::RequiresClarification,
            format!("{} clarification(s) outstanding", d.clarifications.len()),
            message,
            NextAction::AnswerClarifications,
        );
    }
    if d.status == DecisionStatus::Blocked {
        let reason = d.block_reason.as_deref().unwrap_or("route blocked");
        return GateResult::deny(
            GateName::RouteBlocked,
            reason.to_string(),
            with_alternatives(
                format!("We can't prepare documents for {} yet.", d.forum_name),
                d,
            ),
            NextAction::ConsiderAlternatives,
        );
    }
    GateResult::deny(
        GateName::DecisionPending,
        "routing decision is pending",
        "Your legal route is still being worked out.",
        NextAction::WaitForDecision,
    )
}
