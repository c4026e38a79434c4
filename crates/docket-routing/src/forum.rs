//! # Forum Registry
//!
//! Static profiles of the forums the stack can route to. Each profile lists
//! the jurisdictions it sits in, the documents it accepts (in filing order),
//! the procedural prerequisites it requires before filing, its limitation
//! rule, and fallback routes to offer when it is blocked.
//!
//! ## Built-in forums
//!
//! | Forum | Jurisdictions | Prerequisite | Time limit |
//! |-------|---------------|--------------|------------|
//! | `employment-tribunal` | E&W, Scotland | none | 3 months from incident |
//! | `county-court-money-claim` | E&W | letter before claim, 14 days | 6 years from incident |
//! | `sheriff-court-simple-procedure` | Scotland | letter before claim | 5 years from incident |
//! | `county-court-housing-claim` | E&W | landlord notified | 6 years from incident |
//! | `first-tier-tribunal-housing` | Scotland | landlord notified | none |
//! | `financial-ombudsman` | E&W, Scotland | complaint answered or 8 weeks elapsed | 6 months from final response |
//! | `pre-action-correspondence` | E&W, Scotland | none | none |
//!
//! Prerequisites evaluate to met, unmet or unknown against the fact
//! snapshot. Unknown means the facts are silent, which the engine turns
//! into a clarification request rather than a guess.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use docket_core::{
    DisputeDomain, DocumentTypeId, ForumId, JurisdictionId, LegalRelationship, ValidationError,
};

use crate::strategy::{CaseStrategy, ProceduralStep, StepRecord};

pub const ENGLAND_AND_WALES: &str = "england-and-wales";
pub const SCOTLAND: &str = "scotland";

// ─── Prerequisites ───────────────────────────────────────────────────

/// How a prerequisite is checked against the facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum PrerequisiteCheck {
    /// The step must have been completed.
    StepCompleted { step: ProceduralStep },
    /// The step must have been completed at least `days` days ago.
    StepElapsed { step: ProceduralStep, days: i64 },
    /// Any one of the nested checks suffices.
    AnyOf { checks: Vec<PrerequisiteCheck> },
}

/// Tri-state prerequisite evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteOutcome {
    Met,
    Unmet,
    /// The facts needed to decide are absent.
    Unknown,
}

impl PrerequisiteCheck {
    /// Evaluate against a snapshot as of `today`.
    pub fn evaluate(&self, facts: &CaseStrategy, today: NaiveDate) -> PrerequisiteOutcome {
        match self {
            Self::StepCompleted { step } => match facts.procedural_steps.get(step) {
                Some(StepRecord::Completed { .. }) => PrerequisiteOutcome::Met,
                Some(StepRecord::NotDone) => PrerequisiteOutcome::Unmet,
                None => PrerequisiteOutcome::Unknown,
            },
            Self::StepElapsed { step, days } => match facts.procedural_steps.get(step) {
                Some(StepRecord::Completed { on: Some(date) }) => {
                    if (today - *date).num_days() >= *days {
                        PrerequisiteOutcome::Met
                    } else {
                        PrerequisiteOutcome::Unmet
                    }
                }
                Some(StepRecord::Completed { on: None }) => PrerequisiteOutcome::Unknown,
                Some(StepRecord::NotDone) => PrerequisiteOutcome::Unmet,
                None => PrerequisiteOutcome::Unknown,
            },
            Self::AnyOf { checks } => {
                let outcomes: Vec<_> = checks.iter().map(|c| c.evaluate(facts, today)).collect();
                if outcomes.contains(&PrerequisiteOutcome::Met) {
                    PrerequisiteOutcome::Met
                } else if outcomes.contains(&PrerequisiteOutcome::Unknown) {
                    PrerequisiteOutcome::Unknown
                } else {
                    PrerequisiteOutcome::Unmet
                }
            }
        }
    }
}

/// A procedural precondition of a forum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteRule {
    /// User-facing description.
    pub description: String,
    /// Question to ask when the facts are silent.
    pub clarifying_question: String,
    pub check: PrerequisiteCheck,
}

// ─── Time limits ─────────────────────────────────────────────────────

/// Which fact starts the limitation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum LimitTrigger {
    /// The claim-triggering incident date.
    Incident,
    /// The completion date of a procedural step.
    Step { step: ProceduralStep },
}

/// A hard filing deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLimitRule {
    pub trigger: LimitTrigger,
    /// Length of the limitation period in calendar months.
    pub months: u32,
    pub description: String,
}

impl TimeLimitRule {
    /// The trigger date found in the facts, if any.
    pub fn trigger_date(&self, facts: &CaseStrategy) -> Option<NaiveDate> {
        match self.trigger {
            LimitTrigger::Incident => facts.incident_date,
            LimitTrigger::Step { step } => match facts.procedural_steps.get(&step) {
                Some(StepRecord::Completed { on }) => *on,
                Some(StepRecord::NotDone) | None => None,
            },
        }
    }

    /// Last day on which filing is permitted.
    pub fn deadline_from(&self, trigger: NaiveDate) -> Option<NaiveDate> {
        trigger.checked_add_months(Months::new(self.months))
    }
}

// ─── Forum profiles ──────────────────────────────────────────────────

/// A tribunal, court or body with jurisdiction over a dispute type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumProfile {
    pub id: ForumId,
    pub name: String,
    pub jurisdictions: Vec<JurisdictionId>,
    /// Documents permitted in this forum, in filing order.
    pub documents: Vec<DocumentTypeId>,
    pub prerequisites: Vec<PrerequisiteRule>,
    pub time_limit: Option<TimeLimitRule>,
    /// Forums to suggest when this one is blocked.
    pub alternatives: Vec<ForumId>,
}

impl ForumProfile {
    /// Whether the forum sits in `jurisdiction`.
    pub fn sits_in(&self, jurisdiction: &JurisdictionId) -> bool {
        self.jurisdictions.contains(jurisdiction)
    }
}

/// Lookup over all known forums.
#[derive(Debug, Clone)]
pub struct ForumRegistry {
    forums: Vec<ForumProfile>,
}

impl ForumRegistry {
    pub fn new(forums: Vec<ForumProfile>) -> Self {
        Self { forums }
    }

    /// The built-in forum set.
    pub fn builtin() -> Result<Self, ValidationError> {
        builtin_forums().map(Self::new)
    }

    pub fn get(&self, id: &ForumId) -> Option<&ForumProfile> {
        self.forums.iter().find(|f| f.id == *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForumProfile> {
        self.forums.iter()
    }

    pub fn len(&self) -> usize {
        self.forums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forums.is_empty()
    }
}

/// Default forum for a route, before any user choice.
///
/// Returns `None` when the jurisdiction has no forum for the route.
pub fn default_forum_id(
    domain: DisputeDomain,
    relationship: LegalRelationship,
    monetary_remedy: bool,
    jurisdiction: &JurisdictionId,
) -> Option<&'static str> {
    let scotland = jurisdiction.as_str() == SCOTLAND;
    if !scotland && jurisdiction.as_str() != ENGLAND_AND_WALES {
        return None;
    }
    let money_claim = if scotland {
        "sheriff-court-simple-procedure"
    } else {
        "county-court-money-claim"
    };
    let forum = match (domain, relationship) {
        (DisputeDomain::Employment, LegalRelationship::ContractorClient) => {
            if monetary_remedy {
                money_claim
            } else {
                "pre-action-correspondence"
            }
        }
        (DisputeDomain::Employment, _) => "employment-tribunal",
        (DisputeDomain::Consumer | DisputeDomain::Contract, _) => {
            if monetary_remedy {
                money_claim
            } else {
                "pre-action-correspondence"
            }
        }
        (DisputeDomain::Tenancy, _) => {
            if scotland {
                "first-tier-tribunal-housing"
            } else {
                "county-court-housing-claim"
            }
        }
        (DisputeDomain::FinancialServices, _) => "financial-ombudsman",
    };
    Some(forum)
}

/// Resolve a free-text jurisdiction hint.
pub fn resolve_jurisdiction(label: &str) -> Option<JurisdictionId> {
    let normalized = label.trim().to_lowercase().replace(['_', '-'], " ");
    let id = match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
        "england and wales" | "england" | "wales" | "e&w" => ENGLAND_AND_WALES,
        "scotland" => SCOTLAND,
        _ => return None,
    };
    JurisdictionId::new(id).ok()
}

fn ids<T>(
    items: &[&str],
    make: fn(&str) -> Result<T, ValidationError>,
) -> Result<Vec<T>, ValidationError> {
    items.iter().copied().map(make).collect()
}

fn forum(
    id: &str,
    name: &str,
    jurisdictions: &[&str],
    documents: &[&str],
    prerequisites: Vec<PrerequisiteRule>,
    time_limit: Option<TimeLimitRule>,
    alternatives: &[&str],
) -> Result<ForumProfile, ValidationError> {
    Ok(ForumProfile {
        id: ForumId::new(id)?,
        name: name.to_string(),
        jurisdictions: ids(jurisdictions, |s| JurisdictionId::new(s))?,
        documents: ids(documents, |s| DocumentTypeId::new(s))?,
        prerequisites,
        time_limit,
        alternatives: ids(alternatives, |s| ForumId::new(s))?,
    })
}

fn letter_before_claim(min_days: Option<i64>) -> PrerequisiteRule {
    let step = ProceduralStep::PreActionLetterSent;
    let (description, check) = match min_days {
        Some(days) => (
            format!("A letter before claim was sent at least {days} days ago"),
            PrerequisiteCheck::StepElapsed { step, days },
        ),
        None => (
            "The other party was asked in writing to pay before claiming".to_string(),
            PrerequisiteCheck::StepCompleted { step },
        ),
    };
    PrerequisiteRule {
        description,
        clarifying_question: "Have you sent the other party a letter asking them to put things right, and if so on what date?".to_string(),
        check,
    }
}

fn landlord_notified() -> PrerequisiteRule {
    PrerequisiteRule {
        description: "The landlord was told about the problem in writing".to_string(),
        clarifying_question: "Have you told your landlord about the problem in writing?".to_string(),
        check: PrerequisiteCheck::StepCompleted {
            step: ProceduralStep::LandlordNotified,
        },
    }
}

fn months_from_incident(months: u32, description: &str) -> Option<TimeLimitRule> {
    Some(TimeLimitRule {
        trigger: LimitTrigger::Incident,
        months,
        description: description.to_string(),
    })
}

fn builtin_forums() -> Result<Vec<ForumProfile>, ValidationError> {
    let gb = &[ENGLAND_AND_WALES, SCOTLAND];
    Ok(vec![
        forum(
            "employment-tribunal",
            "Employment Tribunal",
            gb,
            &["et1-claim-form"],
            Vec::new(),
            months_from_incident(3, "Employment tribunal claims must be filed within 3 months of the incident"),
            &["county-court-money-claim"],
        )?,
        forum(
            "county-court-money-claim",
            "County Court (money claim)",
            &[ENGLAND_AND_WALES],
            &["n1-claim-form", "particulars-of-claim", "evidence-schedule"],
            vec![letter_before_claim(Some(14))],
            months_from_incident(72, "Money claims must be issued within 6 years of the breach"),
            &["pre-action-correspondence"],
        )?,
        forum(
            "sheriff-court-simple-procedure",
            "Sheriff Court (simple procedure)",
            &[SCOTLAND],
            &["simple-procedure-claim-form", "evidence-schedule"],
            vec![letter_before_claim(None)],
            months_from_incident(60, "Claims prescribe 5 years after the obligation arose"),
            &["pre-action-correspondence"],
        )?,
        forum(
            "county-court-housing-claim",
            "County Court (housing claim)",
            &[ENGLAND_AND_WALES],
            &["n1-claim-form", "particulars-of-claim", "evidence-schedule"],
            vec![landlord_notified()],
            months_from_incident(72, "Housing claims must be issued within 6 years"),
            &["pre-action-correspondence"],
        )?,
        forum(
            "first-tier-tribunal-housing",
            "First-tier Tribunal (Housing and Property Chamber)",
            &[SCOTLAND],
            &["ftt-housing-application", "evidence-schedule"],
            vec![landlord_notified()],
            None,
            &["pre-action-correspondence"],
        )?,
        forum(
            "financial-ombudsman",
            "Financial Ombudsman Service",
            gb,
            &["ombudsman-complaint-form", "evidence-schedule"],
            vec![PrerequisiteRule {
                description: "The firm issued a final response, or 8 weeks passed since the complaint".to_string(),
                clarifying_question: "Have you complained to the firm, and has it sent a final response?".to_string(),
                check: PrerequisiteCheck::AnyOf {
                    checks: vec![
                        PrerequisiteCheck::StepCompleted {
                            step: ProceduralStep::FinalResponseReceived,
                        },
                        PrerequisiteCheck::StepElapsed {
                            step: ProceduralStep::ComplaintToFirm,
                            days: 56,
                        },
                    ],
                },
            }],
            Some(TimeLimitRule {
                trigger: LimitTrigger::Step {
                    step: ProceduralStep::FinalResponseReceived,
                },
                months: 6,
                description: "Ombudsman complaints must be referred within 6 months of the final response".to_string(),
            }),
            &["county-court-money-claim"],
        )?,
        forum(
            "pre-action-correspondence",
            "Pre-action correspondence",
            gb,
            &["letter-before-action", "evidence-schedule"],
            Vec::new(),
            None,
            &[],
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn with_step(step: ProceduralStep, record: StepRecord) -> CaseStrategy {
        let mut steps = BTreeMap::new();
        steps.insert(step, record);
        CaseStrategy {
            procedural_steps: steps,
            ..Default::default()
        }
    }

    fn ew() -> JurisdictionId {
        JurisdictionId::new(ENGLAND_AND_WALES).unwrap()
    }

    #[test]
    fn builtin_registry_is_well_formed() {
        let registry = ForumRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 7);
        for forum in registry.iter() {
            assert!(!forum.documents.is_empty(), "{} has no documents", forum.id);
            for alt in &forum.alternatives {
                assert!(registry.get(alt).is_some(), "{} alternative {alt} missing", forum.id);
            }
        }
    }

    #[test]
    fn employment_maps_to_tribunal() {
        let id = default_forum_id(
            DisputeDomain::Employment,
            LegalRelationship::EmployeeEmployer,
            true,
            &ew(),
        );
        assert_eq!(id, Some("employment-tribunal"));
    }

    #[test]
    fn consumer_money_claim_depends_on_remedy_and_jurisdiction() {
        let rel = LegalRelationship::ConsumerTrader;
        assert_eq!(
            default_forum_id(DisputeDomain::Consumer, rel, true, &ew()),
            Some("county-court-money-claim")
        );
        assert_eq!(
            default_forum_id(DisputeDomain::Consumer, rel, false, &ew()),
            Some("pre-action-correspondence")
        );
        let scotland = JurisdictionId::new(SCOTLAND).unwrap();
        assert_eq!(
            default_forum_id(DisputeDomain::Consumer, rel, true, &scotland),
            Some("sheriff-court-simple-procedure")
        );
    }

    #[test]
    fn unknown_jurisdiction_has_no_default() {
        let ni = JurisdictionId::new("northern-ireland").unwrap();
        assert_eq!(
            default_forum_id(DisputeDomain::Employment, LegalRelationship::EmployeeEmployer, false, &ni),
            None
        );
    }

    #[test]
    fn resolve_jurisdiction_hints() {
        assert_eq!(resolve_jurisdiction("England"), Some(ew()));
        assert_eq!(resolve_jurisdiction("england_and_wales"), Some(ew()));
        assert_eq!(resolve_jurisdiction(" Scotland ").unwrap().as_str(), SCOTLAND);
        assert_eq!(resolve_jurisdiction("France"), None);
    }

    #[test]
    fn step_completed_is_tri_state() {
        let check = PrerequisiteCheck::StepCompleted {
            step: ProceduralStep::LandlordNotified,
        };
        let today = day(2026, 5, 1);
        assert_eq!(
            check.evaluate(&CaseStrategy::default(), today),
            PrerequisiteOutcome::Unknown
        );
        let done = with_step(ProceduralStep::LandlordNotified, StepRecord::Completed { on: None });
        assert_eq!(check.evaluate(&done, today), PrerequisiteOutcome::Met);
        let not_done = with_step(ProceduralStep::LandlordNotified, StepRecord::NotDone);
        assert_eq!(check.evaluate(&not_done, today), PrerequisiteOutcome::Unmet);
    }

    #[test]
    fn step_elapsed_counts_days() {
        let check = PrerequisiteCheck::StepElapsed {
            step: ProceduralStep::PreActionLetterSent,
            days: 14,
        };
        let sent = with_step(
            ProceduralStep::PreActionLetterSent,
            StepRecord::Completed {
                on: Some(day(2026, 4, 20)),
            },
        );
        assert_eq!(check.evaluate(&sent, day(2026, 5, 3)), PrerequisiteOutcome::Unmet);
        assert_eq!(check.evaluate(&sent, day(2026, 5, 4)), PrerequisiteOutcome::Met);
        let undated = with_step(
            ProceduralStep::PreActionLetterSent,
            StepRecord::Completed { on: None },
        );
        assert_eq!(check.evaluate(&undated, day(2026, 5, 4)), PrerequisiteOutcome::Unknown);
    }

    #[test]
    fn any_of_prefers_met_then_unknown() {
        let check = PrerequisiteCheck::AnyOf {
            checks: vec![
                PrerequisiteCheck::StepCompleted {
                    step: ProceduralStep::FinalResponseReceived,
                },
                PrerequisiteCheck::StepCompleted {
                    step: ProceduralStep::ComplaintToFirm,
                },
            ],
        };
        let today = day(2026, 5, 1);
        let answered = with_step(
            ProceduralStep::FinalResponseReceived,
            StepRecord::Completed { on: None },
        );
        assert_eq!(check.evaluate(&answered, today), PrerequisiteOutcome::Met);
        let refused = with_step(ProceduralStep::FinalResponseReceived, StepRecord::NotDone);
        assert_eq!(check.evaluate(&refused, today), PrerequisiteOutcome::Unknown);
    }

    #[test]
    fn time_limit_deadline_adds_calendar_months() {
        let rule = months_from_incident(3, "3 months").unwrap();
        assert_eq!(rule.deadline_from(day(2026, 1, 31)), Some(day(2026, 4, 30)));
        let facts = CaseStrategy {
            incident_date: Some(day(2026, 1, 31)),
            ..Default::default()
        };
        assert_eq!(rule.trigger_date(&facts), Some(day(2026, 1, 31)));
    }
}
