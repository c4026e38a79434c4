//! # docket-routing: From Facts to a Gated Legal Route
//!
//! Everything between "the conversation has enough facts" and "documents
//! may be generated":
//!
//! - [`strategy`]: the fact snapshot and its append/merge rule.
//! - [`sufficiency`]: whether a snapshot is complete enough to route.
//! - [`forum`]: the forum registry with prerequisites and time limits.
//! - [`engine`]: classification of a snapshot into a [`RoutingDecision`].
//! - [`decision`]: the decision record and its invariants.
//! - [`gate`]: the fail-fast gate that must pass before generation.
//!
//! All functions here are pure apart from reading the clock for the
//! decision timestamp. The current date is always passed in explicitly.

pub mod decision;
pub mod engine;
pub mod forum;
pub mod gate;
pub mod strategy;
pub mod sufficiency;

pub use decision::{
    AlternativeRoute, DecisionContext, DecisionError, DecisionStatus, Prerequisite,
    RoutingDecision, TimeLimit,
};
pub use engine::{ClassificationFailure, RoutingEngine, RoutingRequest};
pub use forum::{ForumProfile, ForumRegistry};
pub use gate::{validate, GateName, GateResult, NextAction};
pub use strategy::{CaseStrategy, EvidenceRef, ProceduralStep, StepRecord, StrategyUpdate};
pub use sufficiency::{check_sufficiency, MissingFact, SufficiencyReport, SufficiencyThresholds};
