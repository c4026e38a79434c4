//! # Sufficiency Checker
//!
//! Decides whether a fact snapshot is complete enough to route. Four
//! conditions must all hold:
//!
//! 1. a dispute domain label is present;
//! 2. at least `min_key_facts` non-blank key facts exist;
//! 3. the desired outcome is longer than `min_outcome_chars` and is not a
//!    placeholder such as "tbd";
//! 4. at least `min_evidence_items` evidence references exist.
//!
//! Every unmet condition is reported, never only the first, so the
//! conversation can explain the whole gap at once. The check is pure.

use serde::{Deserialize, Serialize};

use crate::strategy::CaseStrategy;

const PLACEHOLDER_OUTCOMES: &[&str] = &[
    "tbd", "tbc", "todo", "n/a", "na", "none", "unknown", "not sure", "?", "-", "null",
    "don't know", "dont know",
];

/// Tunable thresholds for [`check_sufficiency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SufficiencyThresholds {
    /// Minimum number of non-blank key facts.
    pub min_key_facts: usize,
    /// The desired outcome must be strictly longer than this many characters.
    pub min_outcome_chars: usize,
    /// Minimum number of evidence items.
    pub min_evidence_items: usize,
}

impl Default for SufficiencyThresholds {
    fn default() -> Self {
        Self {
            min_key_facts: 5,
            min_outcome_chars: 15,
            min_evidence_items: 1,
        }
    }
}

/// One unmet sufficiency condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum MissingFact {
    /// No dispute domain label has been extracted.
    Domain,
    /// Fewer key facts than required.
    KeyFacts { have: usize, need: usize },
    /// The desired outcome is too short.
    DesiredOutcome { have: usize, need: usize },
    /// The desired outcome is a placeholder.
    PlaceholderOutcome,
    /// Fewer evidence items than required.
    Evidence { have: usize, need: usize },
}

impl MissingFact {
    /// A question the conversation can put to the user.
    pub fn prompt(&self) -> String {
        match self {
            Self::Domain => "What kind of dispute is this (for example work, a purchase, or a tenancy)?".to_string(),
            Self::KeyFacts { have, need } => format!(
                "Tell us more about what happened: we have {have} key facts and need at least {need}."
            ),
            Self::DesiredOutcome { .. } | Self::PlaceholderOutcome => {
                "What outcome do you want (for example an amount of money or a specific action)?".to_string()
            }
            Self::Evidence { need, .. } => format!(
                "Add at least {need} piece(s) of evidence, such as letters, emails, receipts or payslips."
            ),
        }
    }
}

/// Result of [`check_sufficiency`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyReport {
    /// All conditions hold.
    pub sufficient: bool,
    /// Progress towards sufficiency in `[0, 1]`.
    pub score: f64,
    /// Every unmet condition, in rule order.
    pub missing: Vec<MissingFact>,
}

fn is_placeholder(outcome: &str) -> bool {
    let normalized = outcome.trim().to_lowercase();
    PLACEHOLDER_OUTCOMES.contains(&normalized.as_str())
}

fn ratio(have: usize, need: usize) -> f64 {
    if need == 0 {
        1.0
    } else {
        (have as f64 / need as f64).min(1.0)
    }
}

/// Check a snapshot against the thresholds.
pub fn check_sufficiency(
    snapshot: &CaseStrategy,
    thresholds: &SufficiencyThresholds,
) -> SufficiencyReport {
    let mut missing = Vec::new();

    let has_domain = snapshot
        .domain
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !has_domain {
        missing.push(MissingFact::Domain);
    }

    let facts = snapshot.meaningful_facts().count();
    if facts < thresholds.min_key_facts {
        missing.push(MissingFact::KeyFacts {
            have: facts,
            need: thresholds.min_key_facts,
        });
    }

    let outcome_len = snapshot.desired_outcome.trim().chars().count();
    let placeholder = is_placeholder(&snapshot.desired_outcome);
    let outcome_score = if placeholder {
        missing.push(MissingFact::PlaceholderOutcome);
        0.0
    } else if outcome_len <= thresholds.min_outcome_chars {
        missing.push(MissingFact::DesiredOutcome {
            have: outcome_len,
            need: thresholds.min_outcome_chars + 1,
        });
        ratio(outcome_len, thresholds.min_outcome_chars + 1)
    } else {
        1.0
    };

    let evidence = snapshot.evidence.len();
    if evidence < thresholds.min_evidence_items {
        missing.push(MissingFact::Evidence {
            have: evidence,
            need: thresholds.min_evidence_items,
        });
    }

    let score = (if has_domain { 1.0 } else { 0.0 }
        + ratio(facts, thresholds.min_key_facts)
        + outcome_score
        + ratio(evidence, thresholds.min_evidence_items))
        / 4.0;

    SufficiencyReport {
        sufficient: missing.is_empty(),
        score,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::EvidenceRef;

    fn complete_snapshot() -> CaseStrategy {
        CaseStrategy {
            domain: Some("employment".into()),
            key_facts: (1..=6).map(|i| format!("fact {i}")).collect(),
            desired_outcome: "reinstatement and £4,000 back pay".into(),
            evidence: vec![
                EvidenceRef {
                    id: "e1".into(),
                    description: "payslips".into(),
                },
                EvidenceRef {
                    id: "e2".into(),
                    description: "dismissal letter".into(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn complete_snapshot_is_sufficient() {
        let report = check_sufficiency(&complete_snapshot(), &SufficiencyThresholds::default());
        assert!(report.sufficient);
        assert!(report.missing.is_empty());
        assert!((report.score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_snapshot_lists_every_condition() {
        let report = check_sufficiency(&CaseStrategy::default(), &SufficiencyThresholds::default());
        assert!(!report.sufficient);
        assert_eq!(
            report.missing,
            vec![
                MissingFact::Domain,
                MissingFact::KeyFacts { have: 0, need: 5 },
                MissingFact::DesiredOutcome { have: 0, need: 16 },
                MissingFact::Evidence { have: 0, need: 1 },
            ]
        );
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn placeholder_outcome_is_rejected() {
        let mut s = complete_snapshot();
        s.desired_outcome = " TBD ".into();
        let report = check_sufficiency(&s, &SufficiencyThresholds::default());
        assert_eq!(report.missing, vec![MissingFact::PlaceholderOutcome]);
    }

    #[test]
    fn outcome_must_exceed_threshold() {
        let thresholds = SufficiencyThresholds {
            min_outcome_chars: 5,
            ..Default::default()
        };
        let mut s = complete_snapshot();
        s.desired_outcome = "12345".into();
        assert!(!check_sufficiency(&s, &thresholds).sufficient);
        s.desired_outcome = "123456".into();
        assert!(check_sufficiency(&s, &thresholds).sufficient);
    }

    #[test]
    fn blank_facts_do_not_count() {
        let mut s = complete_snapshot();
        s.key_facts = vec!["one".into(), " ".into(), "two".into()];
        let report = check_sufficiency(&s, &SufficiencyThresholds::default());
        assert_eq!(report.missing, vec![MissingFact::KeyFacts { have: 2, need: 5 }]);
    }

    #[test]
    fn thresholds_are_tunable() {
        let lenient = SufficiencyThresholds {
            min_key_facts: 1,
            min_outcome_chars: 3,
            min_evidence_items: 0,
        };
        let s = CaseStrategy {
            domain: Some("consumer".into()),
            key_facts: vec!["kettle broke".into()],
            desired_outcome: "refund".into(),
            ..Default::default()
        };
        assert!(check_sufficiency(&s, &lenient).sufficient);
        assert!(!check_sufficiency(&s, &SufficiencyThresholds::default()).sufficient);
    }

    #[test]
    fn prompts_are_user_facing() {
        assert!(MissingFact::Evidence { have: 0, need: 1 }
            .prompt()
            .contains("evidence"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn removing_any_condition_is_reported(which in 0usize..4) {
                let mut s = complete_snapshot();
                match which {
                    0 => s.domain = None,
                    1 => s.key_facts.truncate(2),
                    2 => s.desired_outcome = "money".into(),
                    _ => s.evidence.clear(),
                }
                let report = check_sufficiency(&s, &SufficiencyThresholds::default());
                prop_assert!(!report.sufficient);
                let hit = report.missing.iter().any(|m| match (which, m) {
                    (0, MissingFact::Domain) => true,
                    (1, MissingFact::KeyFacts { .. }) => true,
                    (2, MissingFact::DesiredOutcome { .. }) => true,
                    (3, MissingFact::Evidence { .. }) => true,
                    _ => false,
                });
                prop_assert!(hit);
                prop_assert_eq!(report.missing.len(), 1);
            }

            #[test]
            fn score_is_bounded(facts in 0usize..20, evidence in 0usize..4, outcome in ".{0,40}") {
                let s = CaseStrategy {
                    domain: Some("contract".into()),
                    key_facts: (0..facts).map(|i| format!("f{i}")).collect(),
                    desired_outcome: outcome,
                    evidence: (0..evidence)
                        .map(|i| EvidenceRef { id: format!("e{i}"), description: "doc".into() })
                        .collect(),
                    ..Default::default()
                };
                let report = check_sufficiency(&s, &SufficiencyThresholds::default());
                prop_assert!((0.0..=1.0).contains(&report.score));
                prop_assert_eq!(report.sufficient, report.missing.is_empty());
            }
        }
    }
}
