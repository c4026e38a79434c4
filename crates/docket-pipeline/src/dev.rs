//! Development collaborators.
//!
//! Deterministic stand-ins used by the dev server, the CLI and tests:
//! a template-filling content generator, an in-memory artifact store and
//! an in-memory fact store.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use docket_core::{CaseId, DocumentTypeId};
use docket_routing::{CaseStrategy, DecisionContext, StrategyUpdate};
use docket_state::Case;

use crate::collaborator::{
    ArtifactRenderer, CollaboratorError, ContentGenerator, FactStore, FactStoreError,
};
use crate::registry::DocumentRegistry;
use crate::store::Store;

/// Fills the registry's prompt template with snapshot facts.
#[derive(Debug, Clone)]
pub struct TemplateContentGenerator {
    registry: Arc<DocumentRegistry>,
}

impl TemplateContentGenerator {
    pub fn new(registry: Arc<DocumentRegistry>) -> Self {
        Self { registry }
    }

    /// Single pass over the template, so inserted values are never expanded.
    fn fill(template: &str, fields: &[(&str, String)]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let value = tail.find('}').and_then(|end| {
                let name = &tail[1..end];
                fields
                    .iter()
                    .find(|(field, _)| *field == name)
                    .map(|(_, value)| (value, end))
            });
            match value {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn generate(
        &self,
        document_type: &DocumentTypeId,
        snapshot: &CaseStrategy,
        context: &DecisionContext,
    ) -> Result<String, CollaboratorError> {
        let definition = self.registry.get(document_type).ok_or_else(|| {
            CollaboratorError::Generation(format!("no template for {document_type}"))
        })?;
        let facts = snapshot
            .meaningful_facts()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n");
        let evidence = if snapshot.evidence.is_empty() {
            "none listed".to_string()
        } else {
            snapshot
                .evidence
                .iter()
                .map(|e| e.description.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let fields = [
            ("title", definition.title.clone()),
            ("forum", context.forum_name.clone()),
            ("jurisdiction", context.jurisdiction.to_string()),
            (
                "counterparty",
                context
                    .counterparty
                    .clone()
                    .unwrap_or_else(|| "the respondent".to_string()),
            ),
            ("facts", facts),
            ("outcome", snapshot.desired_outcome.clone()),
            ("evidence", evidence),
            (
                "deadline",
                context
                    .deadline
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "not applicable".to_string()),
            ),
            ("ordinal", context.ordinal.to_string()),
            ("count", context.document_count.to_string()),
        ];
        Ok(Self::fill(&definition.template, &fields))
    }
}

/// A rendered artifact held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub document_type: DocumentTypeId,
    pub body: String,
}

/// Keeps rendered bodies in memory under `artifact://<uuid>` references.
#[derive(Debug, Clone, Default)]
pub struct InlineArtifactRenderer {
    artifacts: Store<String, StoredArtifact>,
}

impl InlineArtifactRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact(&self, reference: &str) -> Option<StoredArtifact> {
        self.artifacts.get(&reference.to_string())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[async_trait]
impl ArtifactRenderer for InlineArtifactRenderer {
    async fn render(
        &self,
        text: &str,
        document_type: &DocumentTypeId,
    ) -> Result<String, CollaboratorError> {
        let reference = format!("artifact://{}", Uuid::new_v4());
        self.artifacts.insert(
            reference.clone(),
            StoredArtifact {
                document_type: document_type.clone(),
                body: text.to_string(),
            },
        );
        Ok(reference)
    }
}

/// Fact snapshots kept beside the case table.
///
/// Writes take the case's write lock first, so a write can never land
/// between a lock check and a GATHERING → ROUTING transition.
#[derive(Debug, Clone)]
pub struct InMemoryFactStore {
    cases: Store<CaseId, Case>,
    snapshots: Store<CaseId, CaseStrategy>,
}

impl InMemoryFactStore {
    pub fn new(cases: Store<CaseId, Case>) -> Self {
        Self {
            cases,
            snapshots: Store::new(),
        }
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    async fn snapshot(&self, case_id: &CaseId) -> Result<Option<CaseStrategy>, FactStoreError> {
        if !self.cases.contains(case_id) {
            return Err(FactStoreError::CaseNotFound(*case_id));
        }
        Ok(self.snapshots.get(case_id))
    }

    async fn apply(
        &self,
        case_id: &CaseId,
        update: StrategyUpdate,
    ) -> Result<CaseStrategy, FactStoreError> {
        let snapshots = &self.snapshots;
        self.cases
            .try_update(case_id, |case| {
                if !case.is_writable() {
                    return Err(FactStoreError::Locked {
                        case_id: case.id,
                        phase: case.phase(),
                    });
                }
                Ok(snapshots.upsert(*case_id, |s| s.merge(update)))
            })
            .unwrap_or(Err(FactStoreError::CaseNotFound(*case_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use docket_core::{DisputeDomain, ForumId, JurisdictionId, LegalRelationship, OwnerId};
    use docket_routing::EvidenceRef;

    fn context() -> DecisionContext {
        DecisionContext {
            case_id: CaseId::new(),
            forum: ForumId::new("employment-tribunal").unwrap(),
            forum_name: "Employment Tribunal".into(),
            jurisdiction: JurisdictionId::new("england-and-wales").unwrap(),
            relationship: LegalRelationship::EmployeeEmployer,
            domain: DisputeDomain::Employment,
            counterparty: Some("Acme Ltd".into()),
            deadline: NaiveDate::from_ymd_opt(2026, 9, 1),
            ordinal: 1,
            document_count: 1,
        }
    }

    #[tokio::test]
    async fn template_generator_fills_every_placeholder() {
        let registry = Arc::new(DocumentRegistry::builtin().unwrap());
        let generator = TemplateContentGenerator::new(Arc::clone(&registry));
        let snapshot = CaseStrategy {
            key_facts: vec!["Dismissed without notice".into()],
            desired_outcome: "£4,000 back pay".into(),
            evidence: vec![EvidenceRef {
                id: "e1".into(),
                description: "payslips".into(),
            }],
            ..Default::default()
        };
        let doc = DocumentTypeId::new("et1-claim-form").unwrap();
        let text = generator.generate(&doc, &snapshot, &context()).await.unwrap();
        assert!(text.starts_with("ET1 Claim Form"));
        assert!(text.contains("against Acme Ltd"));
        assert!(text.contains("- Dismissed without notice"));
        assert!(text.contains("2026-09-01"));
        assert_eq!(registry.get(&doc).unwrap().validate(&text), Ok(()));
    }

    #[tokio::test]
    async fn braces_in_facts_pass_through_untouched() {
        let registry = Arc::new(DocumentRegistry::builtin().unwrap());
        let generator = TemplateContentGenerator::new(Arc::clone(&registry));
        let snapshot = CaseStrategy {
            key_facts: vec!["Payslip read {outcome} where the total belonged".into()],
            desired_outcome: "£4,000 back pay".into(),
            ..Default::default()
        };
        let doc = DocumentTypeId::new("particulars-of-claim").unwrap();
        let text = generator.generate(&doc, &snapshot, &context()).await.unwrap();
        assert!(text.contains("- Payslip read {outcome} where the total belonged"));
        assert!(text.contains("The claimant seeks £4,000 back pay."));
        assert_eq!(registry.get(&doc).unwrap().validate(&text), Ok(()));
    }

    #[tokio::test]
    async fn generator_rejects_unknown_type() {
        let generator = TemplateContentGenerator::new(Arc::new(DocumentRegistry::new()));
        let doc = DocumentTypeId::new("et1-claim-form").unwrap();
        let err = generator
            .generate(&doc, &CaseStrategy::default(), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Generation(_)));
    }

    #[tokio::test]
    async fn inline_renderer_stores_body() {
        let renderer = InlineArtifactRenderer::new();
        let doc = DocumentTypeId::new("n1-claim-form").unwrap();
        let reference = renderer.render("claim text", &doc).await.unwrap();
        assert!(reference.starts_with("artifact://"));
        assert_eq!(renderer.artifact(&reference).unwrap().body, "claim text");
    }

    #[tokio::test]
    async fn fact_store_freezes_locked_cases() {
        let cases = Store::new();
        let case = Case::new(OwnerId::new());
        let id = case.id;
        cases.insert(id, case);
        let facts = InMemoryFactStore::new(cases.clone());

        let update = StrategyUpdate {
            key_facts: vec!["first fact".into()],
            ..Default::default()
        };
        let merged = facts.apply(&id, update.clone()).await.unwrap();
        assert_eq!(merged.key_facts, vec!["first fact"]);

        cases.update(&id, |c| {
            c.begin_routing("routing").unwrap();
        });
        let err = facts.apply(&id, update).await.unwrap_err();
        assert!(matches!(err, FactStoreError::Locked { .. }));
        assert_eq!(
            facts.snapshot(&id).await.unwrap().unwrap().key_facts.len(),
            1
        );
    }

    #[tokio::test]
    async fn fact_store_reports_unknown_case() {
        let facts = InMemoryFactStore::new(Store::new());
        let id = CaseId::new();
        assert_eq!(
            facts.snapshot(&id).await.unwrap_err(),
            FactStoreError::CaseNotFound(id)
        );
    }
}
