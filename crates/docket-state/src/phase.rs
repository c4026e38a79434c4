//! # Case Phase and Lifecycle Status
//!
//! Two independent enums describe a case:
//!
//! - [`CasePhase`] is pipeline-facing. It drives routing and generation
//!   and determines whether the conversation is locked.
//! - [`CaseStatus`] is user-facing. It tracks the dispute after documents
//!   exist (sent, awaiting a response, closed).
//!
//! ## Phases
//!
//! ```text
//!  GATHERING ──▶ ROUTING ──▶ GENERATING ──▶ COMPLETED
//!      ▲          │    │          │             │
//!      │          │    ▼          │ fatal       │
//!      │          │  BLOCKED ◀────┘             │
//!      │          │    │                        │
//!      ├──────────┘    │ (classification failure reverts ROUTING)
//!      └───────────────┴──────── reset ─────────┘
//! ```
//!
//! GATHERING never moves directly to BLOCKED.
//!
//! ## Statuses
//!
//! ```text
//! DRAFT ──▶ DOCUMENT_SENT ──▶ AWAITING_RESPONSE ──▶ RESPONSE_RECEIVED
//!                                     │   ▲                 │
//!                                     │   └─────────────────┘
//!                                     ▼
//!                              DEADLINE_MISSED
//! (any non-closed status) ──▶ CLOSED (terminal)
//! ```

use serde::{Deserialize, Serialize};

/// Pipeline-facing phase of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CasePhase {
    /// Facts are being gathered; the conversation is open.
    Gathering,
    /// The routing engine is classifying the case.
    Routing,
    /// Documents are being generated.
    Generating,
    /// The generation batch finished (possibly with failed jobs).
    Completed,
    /// A gate or a fatal pipeline error stopped the case.
    Blocked,
}

impl CasePhase {
    /// All phases in pipeline order.
    pub fn all() -> &'static [CasePhase] {
        &[
            Self::Gathering,
            Self::Routing,
            Self::Generating,
            Self::Completed,
            Self::Blocked,
        ]
    }

    /// Canonical SCREAMING_CASE name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gathering => "GATHERING",
            Self::Routing => "ROUTING",
            Self::Generating => "GENERATING",
            Self::Completed => "COMPLETED",
            Self::Blocked => "BLOCKED",
        }
    }

    /// Whether the conversation is locked in this phase.
    pub fn is_locked(&self) -> bool {
        !matches!(self, Self::Gathering)
    }

    /// Phases reachable from this phase.
    pub fn valid_transitions(&self) -> &'static [CasePhase] {
        match self {
            Self::Gathering => &[Self::Routing],
            Self::Routing => &[Self::Generating, Self::Blocked, Self::Gathering],
            Self::Generating => &[Self::Completed, Self::Blocked],
            Self::Completed => &[Self::Gathering],
            Self::Blocked => &[Self::Gathering],
        }
    }

    /// Whether `to` is reachable from this phase in one step.
    pub fn can_transition_to(&self, to: CasePhase) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// The one canonical user-facing message for this phase.
    ///
    /// For [`CasePhase::Blocked`] this is the fallback used when no gate
    /// message is recorded; see `Case::status_message`.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Gathering => "Tell us more about your situation.",
            Self::Routing => "Analyzing your legal route.",
            Self::Generating => "Generating your documents.",
            Self::Completed => "Your documents are ready.",
            Self::Blocked => "We can't prepare documents for this case yet.",
        }
    }
}

impl std::fmt::Display for CasePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    /// Case opened; no document has been sent.
    Draft,
    /// A generated document was sent to the counterparty.
    DocumentSent,
    /// Waiting for the counterparty to respond.
    AwaitingResponse,
    /// The counterparty responded.
    ResponseReceived,
    /// The response deadline passed without a reply.
    DeadlineMissed,
    /// The dispute is over (terminal).
    Closed,
}

impl CaseStatus {
    /// Canonical SCREAMING_CASE name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::DocumentSent => "DOCUMENT_SENT",
            Self::AwaitingResponse => "AWAITING_RESPONSE",
            Self::ResponseReceived => "RESPONSE_RECEIVED",
            Self::DeadlineMissed => "DEADLINE_MISSED",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Statuses reachable from this status.
    pub fn valid_transitions(&self) -> &'static [CaseStatus] {
        match self {
            Self::Draft => &[Self::DocumentSent, Self::Closed],
            Self::DocumentSent => &[Self::AwaitingResponse, Self::Closed],
            Self::AwaitingResponse => &[
                Self::ResponseReceived,
                Self::DeadlineMissed,
                Self::Closed,
            ],
            Self::ResponseReceived => &[Self::AwaitingResponse, Self::Closed],
            Self::DeadlineMissed => &[Self::DocumentSent, Self::Closed],
            Self::Closed => &[],
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
