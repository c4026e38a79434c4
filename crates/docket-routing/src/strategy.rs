//! # Case Strategy: the Fact Snapshot
//!
//! [`CaseStrategy`] is the extracted understanding of a case: the domain
//! label, ordered key facts, desired outcome, evidence, and the structured
//! facts routing needs (counterparty, jurisdiction hint, incident date,
//! procedural history).
//!
//! The routing side only reads snapshots. [`CaseStrategy::merge`] is the
//! append/merge rule applied by fact stores while the case is gathering:
//! key facts and evidence are appended in order without duplicates, and
//! scalar fields are only replaced by non-empty values.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference to one piece of evidence held outside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Stable identifier (upload id, message id).
    pub id: String,
    /// Short human description ("dismissal letter").
    pub description: String,
}

/// Procedural steps a forum may require before filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProceduralStep {
    /// A letter before claim was sent to the counterparty.
    PreActionLetterSent,
    /// A formal complaint was made to the firm.
    ComplaintToFirm,
    /// The firm issued its final response to the complaint.
    FinalResponseReceived,
    /// The landlord was notified of the problem in writing.
    LandlordNotified,
}

impl ProceduralStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreActionLetterSent => "pre_action_letter_sent",
            Self::ComplaintToFirm => "complaint_to_firm",
            Self::FinalResponseReceived => "final_response_received",
            Self::LandlordNotified => "landlord_notified",
        }
    }
}

impl std::fmt::Display for ProceduralStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the facts say about one procedural step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepRecord {
    /// The step was done, optionally on a known date.
    Completed {
        #[serde(default)]
        on: Option<NaiveDate>,
    },
    /// The user confirmed the step was not done.
    NotDone,
}

/// The fact snapshot for one case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseStrategy {
    /// Free-text dispute domain label, `None` until extracted.
    pub domain: Option<String>,
    /// Ordered key facts.
    pub key_facts: Vec<String>,
    /// What the user wants to achieve.
    pub desired_outcome: String,
    /// Evidence references.
    pub evidence: Vec<EvidenceRef>,
    /// Name of the other party.
    pub counterparty: Option<String>,
    /// Jurisdiction hint ("england", "Scotland").
    pub jurisdiction: Option<String>,
    /// Relationship hint ("self-employed", "tenant").
    pub relationship: Option<String>,
    /// Forum the user explicitly chose, if any.
    pub chosen_forum: Option<String>,
    /// Date of the claim-triggering event.
    pub incident_date: Option<NaiveDate>,
    /// Amount claimed, in whole currency units.
    pub claimed_amount: Option<u64>,
    /// Known procedural history.
    pub procedural_steps: BTreeMap<ProceduralStep, StepRecord>,
}

/// Partial update produced by one conversational turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyUpdate {
    pub domain: Option<String>,
    pub key_facts: Vec<String>,
    pub desired_outcome: Option<String>,
    pub evidence: Vec<EvidenceRef>,
    pub counterparty: Option<String>,
    pub jurisdiction: Option<String>,
    pub relationship: Option<String>,
    pub chosen_forum: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub claimed_amount: Option<u64>,
    pub procedural_steps: BTreeMap<ProceduralStep, StepRecord>,
}

const MONEY_WORDS: &[&str] = &[
    "back pay",
    "compensation",
    "refund",
    "damages",
    "repayment",
    "owed",
    "unpaid",
    "arrears",
    "deposit back",
];

impl CaseStrategy {
    /// Key facts with blank entries removed.
    pub fn meaningful_facts(&self) -> impl Iterator<Item = &str> {
        self.key_facts
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
    }

    /// One-line description of the evidence held.
    pub fn evidence_summary(&self) -> String {
        match self.evidence.len() {
            0 => "no evidence items".to_string(),
            n => {
                let names: Vec<&str> = self
                    .evidence
                    .iter()
                    .map(|e| e.description.as_str())
                    .collect();
                let noun = if n == 1 { "item" } else { "items" };
                format!("{n} evidence {noun}: {}", names.join(", "))
            }
        }
    }

    /// Whether the case seeks money rather than only another remedy.
    pub fn seeks_monetary_remedy(&self) -> bool {
        if self.claimed_amount.is_some_and(|a| a > 0) {
            return true;
        }
        let outcome = self.desired_outcome.to_lowercase();
        let has_sum = outcome.char_indices().any(|(i, c)| {
            matches!(c, '£' | '$' | '€')
                && outcome[i + c.len_utf8()..].starts_with(|d: char| d.is_ascii_digit())
        });
        has_sum || MONEY_WORDS.iter().any(|w| outcome.contains(w))
    }

    /// Whether any key fact mentions one of `needles` (case-insensitive).
    pub fn facts_mention(&self, needles: &[&str]) -> bool {
        self.meaningful_facts().any(|fact| {
            let fact = fact.to_lowercase();
            needles.iter().any(|n| fact.contains(n))
        })
    }

    /// Apply one turn's update using append/merge semantics.
    pub fn merge(&mut self, update: StrategyUpdate) {
        merge_scalar(&mut self.domain, update.domain);
        for fact in update.key_facts {
            let fact = fact.trim().to_string();
            if !fact.is_empty() && !self.key_facts.iter().any(|f| f.trim() == fact) {
                self.key_facts.push(fact);
            }
        }
        if let Some(outcome) = update.desired_outcome {
            if !outcome.trim().is_empty() {
                self.desired_outcome = outcome.trim().to_string();
            }
        }
        for item in update.evidence {
            if !self.evidence.iter().any(|e| e.id == item.id) {
                self.evidence.push(item);
            }
        }
        merge_scalar(&mut self.counterparty, update.counterparty);
        merge_scalar(&mut self.jurisdiction, update.jurisdiction);
        merge_scalar(&mut self.relationship, update.relationship);
        merge_scalar(&mut self.chosen_forum, update.chosen_forum);
        if update.incident_date.is_some() {
            self.incident_date = update.incident_date;
        }
        if update.claimed_amount.is_some() {
            self.claimed_amount = update.claimed_amount;
        }
        self.procedural_steps.extend(update.procedural_steps);
    }
}

fn merge_scalar(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        let v = v.trim();
        if !v.is_empty() {
            *slot = Some(v.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(id: &str, description: &str) -> EvidenceRef {
        EvidenceRef {
            id: id.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn merge_appends_facts_without_duplicates() {
        let mut s = CaseStrategy {
            key_facts: vec!["Dismissed on 3 March".into()],
            ..Default::default()
        };
        s.merge(StrategyUpdate {
            key_facts: vec![
                "Dismissed on 3 March".into(),
                "  ".into(),
                "No warning given".into(),
            ],
            ..Default::default()
        });
        assert_eq!(s.key_facts, vec!["Dismissed on 3 March", "No warning given"]);
    }

    #[test]
    fn merge_keeps_scalars_when_update_is_blank() {
        let mut s = CaseStrategy {
            domain: Some("employment".into()),
            desired_outcome: "reinstatement".into(),
            ..Default::default()
        };
        s.merge(StrategyUpdate {
            domain: Some("   ".into()),
            desired_outcome: Some(String::new()),
            counterparty: Some("Acme Ltd".into()),
            ..Default::default()
        });
        assert_eq!(s.domain.as_deref(), Some("employment"));
        assert_eq!(s.desired_outcome, "reinstatement");
        assert_eq!(s.counterparty.as_deref(), Some("Acme Ltd"));
    }

    #[test]
    fn merge_dedupes_evidence_by_id() {
        let mut s = CaseStrategy::default();
        s.merge(StrategyUpdate {
            evidence: vec![evidence("e1", "payslip"), evidence("e1", "payslip again")],
            ..Default::default()
        });
        assert_eq!(s.evidence.len(), 1);
    }

    #[test]
    fn merge_records_procedural_steps() {
        let mut s = CaseStrategy::default();
        let mut steps = BTreeMap::new();
        steps.insert(ProceduralStep::PreActionLetterSent, StepRecord::NotDone);
        s.merge(StrategyUpdate {
            procedural_steps: steps,
            ..Default::default()
        });
        assert_eq!(
            s.procedural_steps.get(&ProceduralStep::PreActionLetterSent),
            Some(&StepRecord::NotDone)
        );
    }

    #[test]
    fn monetary_remedy_detection() {
        let mut s = CaseStrategy {
            desired_outcome: "reinstatement and £4,000 back pay".into(),
            ..Default::default()
        };
        assert!(s.seeks_monetary_remedy());
        s.desired_outcome = "an apology and a reference".into();
        assert!(!s.seeks_monetary_remedy());
        s.claimed_amount = Some(250);
        assert!(s.seeks_monetary_remedy());
    }

    #[test]
    fn evidence_summary_lists_descriptions() {
        let s = CaseStrategy {
            evidence: vec![evidence("e1", "payslips"), evidence("e2", "dismissal letter")],
            ..Default::default()
        };
        assert_eq!(
            s.evidence_summary(),
            "2 evidence items: payslips, dismissal letter"
        );
        assert_eq!(CaseStrategy::default().evidence_summary(), "no evidence items");
    }

    #[test]
    fn snapshot_deserializes_with_defaults() {
        let s: CaseStrategy = serde_json::from_str(
            r#"{"domain":"consumer","procedural_steps":{"pre_action_letter_sent":{"state":"completed","on":"2026-01-02"}}}"#,
        )
        .unwrap();
        assert!(s.key_facts.is_empty());
        assert_eq!(
            s.procedural_steps.get(&ProceduralStep::PreActionLetterSent),
            Some(&StepRecord::Completed {
                on: NaiveDate::from_ymd_opt(2026, 1, 2)
            })
        );
    }
}
