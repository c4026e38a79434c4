//! Scripted collaborators and fixtures shared by the crate's tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use docket_core::{
    CaseId, DisputeDomain, DocumentTypeId, ForumId, JurisdictionId, LegalRelationship, OwnerId,
    Timestamp,
};
use docket_routing::{
    CaseStrategy, DecisionContext, DecisionStatus, EvidenceRef, RoutingDecision, StrategyUpdate,
};
use docket_state::Case;

use crate::collaborator::{CollaboratorError, ContentGenerator, FactStore, FactStoreError};
use crate::dev::InMemoryFactStore;
use crate::store::PipelineStore;

const BODY: &str = "This scripted document body is long enough to satisfy the minimum length rule.";

/// Content generator whose behaviour per document type is scripted.
#[derive(Default)]
pub struct ScriptedGenerator {
    fail: HashSet<String>,
    slow: HashSet<String>,
    delay: Duration,
    body: Option<String>,
    fail_first: AtomicU32,
    panic_on: HashSet<String>,
    pub calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn failing(docs: &[&str]) -> Self {
        Self {
            fail: docs.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn slow(mut self, docs: &[&str], delay: Duration) -> Self {
        self.slow = docs.iter().map(|d| d.to_string()).collect();
        self.delay = delay;
        self
    }

    pub fn returning(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Fail the first `n` calls regardless of document type.
    pub fn failing_first(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Panic whenever one of `docs` is generated.
    pub fn panicking_on(docs: &[&str]) -> Self {
        Self {
            panic_on: docs.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        document_type: &DocumentTypeId,
        _snapshot: &CaseStrategy,
        context: &DecisionContext,
    ) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.contains(document_type.as_str()) {
            panic!("scripted generator panic for {document_type}");
        }
        if take_one(&self.fail_first) || self.fail.contains(document_type.as_str()) {
            return Err(CollaboratorError::Generation(format!(
                "scripted failure for {document_type}"
            )));
        }
        if self.slow.contains(document_type.as_str()) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self
            .body
            .clone()
            .unwrap_or_else(|| format!("{BODY} Document {} for {}.", context.ordinal, document_type)))
    }
}

/// Fact store that panics on snapshot reads `skip + 1 ..= skip + panics`.
pub struct PanickingFacts {
    inner: Arc<dyn FactStore>,
    skip: AtomicU32,
    panics: AtomicU32,
}

impl PanickingFacts {
    pub fn new(inner: Arc<dyn FactStore>, skip: u32, panics: u32) -> Self {
        Self {
            inner,
            skip: AtomicU32::new(skip),
            panics: AtomicU32::new(panics),
        }
    }
}

#[async_trait]
impl FactStore for PanickingFacts {
    async fn snapshot(&self, case_id: &CaseId) -> Result<Option<CaseStrategy>, FactStoreError> {
        if !take_one(&self.skip) && take_one(&self.panics) {
            panic!("scripted fact store panic");
        }
        self.inner.snapshot(case_id).await
    }

    async fn apply(
        &self,
        case_id: &CaseId,
        update: StrategyUpdate,
    ) -> Result<CaseStrategy, FactStoreError> {
        self.inner.apply(case_id, update).await
    }
}

/// Facts that satisfy the default sufficiency thresholds and route to the
/// employment tribunal.
pub fn employment_facts() -> StrategyUpdate {
    StrategyUpdate {
        domain: Some("employment".into()),
        key_facts: vec![
            "Worked at Acme Ltd for four years".into(),
            "Dismissed without warning".into(),
            "No disciplinary process was followed".into(),
            "Final two months of wages unpaid".into(),
            "Manager gave no written reasons".into(),
            "Colleagues witnessed the dismissal meeting".into(),
        ],
        desired_outcome: Some("reinstatement and £4,000 back pay".into()),
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
        counterparty: Some("Acme Ltd".into()),
        ..Default::default()
    }
}

/// A GATHERING case whose fact store holds [`employment_facts`].
pub async fn gathering_case(store: &PipelineStore) -> (CaseId, Arc<dyn FactStore>) {
    let case = Case::new(OwnerId::new());
    let id = case.id;
    store.cases.insert(id, case);
    let facts = InMemoryFactStore::new(store.cases.clone());
    facts.apply(&id, employment_facts()).await.unwrap();
    (id, Arc::new(facts))
}

/// An internally consistent APPROVED decision allowing `docs`.
pub fn approved_decision(case_id: CaseId, attempt: u64, docs: &[&str]) -> RoutingDecision {
    RoutingDecision {
        case_id,
        attempt,
        status: DecisionStatus::Approved,
        confidence: 0.7,
        jurisdiction: JurisdictionId::new("england-and-wales").unwrap(),
        relationship: LegalRelationship::EmployeeEmployer,
        counterparty: Some("Acme Ltd".into()),
        domain: DisputeDomain::Employment,
        forum: ForumId::new("employment-tribunal").unwrap(),
        forum_name: "Employment Tribunal".into(),
        forum_reasoning: "scripted".into(),
        forum_chosen_by_user: false,
        allowed_documents: docs.iter().map(|d| DocumentTypeId::new(d).unwrap()).collect(),
        blocked_documents: Vec::new(),
        prerequisites: Vec::new(),
        prerequisites_met: true,
        time_limit: None,
        alternatives: Vec::new(),
        clarifications: Vec::new(),
        block_reason: None,
        reason: "scripted".into(),
        decided_at: Timestamp::now(),
    }
}
