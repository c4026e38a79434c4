//! # Document Type Registry
//!
//! Maps each document type id to its title, prompt template, content
//! validation rules and renderer kind. The built-in set covers every
//! document the built-in forums permit. Deployments can add or replace
//! entries from configuration.
//!
//! Templates use `{placeholder}` fields filled by the content generator,
//! drawn from [`TEMPLATE_FIELDS`]. Templates are checked when the registry
//! is assembled. Generated text is not scanned for braces, since user facts
//! may contain them verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docket_core::{DocumentTypeId, ValidationError};

/// Placeholder names a template may use.
pub const TEMPLATE_FIELDS: [&str; 10] = [
    "title",
    "forum",
    "jurisdiction",
    "counterparty",
    "facts",
    "outcome",
    "evidence",
    "deadline",
    "ordinal",
    "count",
];

/// How the finished document is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    /// The generated text is the deliverable.
    Text,
    /// The text is rendered into a binary artifact (a filled court form).
    Binary,
}

/// One content validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ContentRule {
    /// At least `chars` non-whitespace characters.
    MinLength { chars: usize },
    /// The phrase must appear (case-insensitive).
    MustContain { phrase: String },
}

/// Generated content failed a validation rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentViolation {
    #[error("content has {have} characters, at least {need} required")]
    TooShort { have: usize, need: usize },

    #[error("content must mention \"{0}\"")]
    MissingPhrase(String),
}

/// A template refers to a field the generator cannot fill.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template for {document} uses unknown placeholder {{{field}}}")]
pub struct TemplateError {
    pub document: DocumentTypeId,
    pub field: String,
}

/// Registry entry for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDefinition {
    pub id: DocumentTypeId,
    pub title: String,
    pub template: String,
    pub render: RenderKind,
    #[serde(default)]
    pub rules: Vec<ContentRule>,
}

impl DocumentDefinition {
    /// Every placeholder in the template must be a [`TEMPLATE_FIELDS`] name.
    pub fn check_template(&self) -> Result<(), TemplateError> {
        match placeholders(&self.template).find(|name| !TEMPLATE_FIELDS.contains(name)) {
            Some(field) => Err(TemplateError {
                document: self.id.clone(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Check generated text against this type's rules.
    pub fn validate(&self, text: &str) -> Result<(), ContentViolation> {
        for rule in &self.rules {
            match rule {
                ContentRule::MinLength { chars } => {
                    let have = text.chars().filter(|c| !c.is_whitespace()).count();
                    if have < *chars {
                        return Err(ContentViolation::TooShort { have, need: *chars });
                    }
                }
                ContentRule::MustContain { phrase } => {
                    if !text.to_lowercase().contains(&phrase.to_lowercase()) {
                        return Err(ContentViolation::MissingPhrase(phrase.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Names of the `{field}` placeholders in `template`, in order.
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    let mut rest = template;
    std::iter::from_fn(move || loop {
        let start = rest.find('{')?;
        let tail = &rest[start + 1..];
        let Some(end) = tail.find(|c: char| c == '}' || c == '{') else {
            rest = "";
            return None;
        };
        let name = &tail[..end];
        let closed = tail[end..].starts_with('}');
        rest = if closed { &tail[end + 1..] } else { &tail[end..] };
        if closed && !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
            return Some(name);
        }
    })
}

/// Lookup of document definitions by type id.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    definitions: BTreeMap<DocumentTypeId, DocumentDefinition>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definitions for every document the built-in forums permit.
    pub fn builtin() -> Result<Self, ValidationError> {
        let mut registry = Self::new();
        for (id, title, render, body) in BUILTIN {
            registry.register(DocumentDefinition {
                id: DocumentTypeId::new(id)?,
                title: (*title).to_string(),
                template: format!("{{title}}\n\n{body}"),
                render: *render,
                rules: vec![ContentRule::MinLength { chars: 40 }],
            });
        }
        Ok(registry)
    }

    /// Add or replace a definition. Returns the replaced one.
    pub fn register(&mut self, definition: DocumentDefinition) -> Option<DocumentDefinition> {
        self.definitions.insert(definition.id.clone(), definition)
    }

    pub fn extend(&mut self, definitions: impl IntoIterator<Item = DocumentDefinition>) {
        for d in definitions {
            self.register(d);
        }
    }

    pub fn get(&self, id: &DocumentTypeId) -> Option<&DocumentDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &DocumentTypeId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

const BUILTIN: &[(&str, &str, RenderKind, &str)] = &[
    (
        "et1-claim-form",
        "ET1 Claim Form",
        RenderKind::Binary,
        "Claim to the {forum} ({jurisdiction}) against {counterparty}.\n\nDetails of claim:\n{facts}\n\nRemedy sought: {outcome}\n\nSupporting evidence: {evidence}\nFiling deadline: {deadline}",
    ),
    (
        "n1-claim-form",
        "Form N1 Claim Form",
        RenderKind::Binary,
        "Claim issued in the {forum} ({jurisdiction}) against {counterparty}.\n\nBrief details of claim:\n{facts}\n\nValue and remedy: {outcome}",
    ),
    (
        "particulars-of-claim",
        "Particulars of Claim",
        RenderKind::Text,
        "In the {forum}. Claimant against {counterparty}.\n\n{facts}\n\nThe claimant seeks {outcome}.\n\nDocument {ordinal} of {count}.",
    ),
    (
        "evidence-schedule",
        "Schedule of Evidence",
        RenderKind::Text,
        "Evidence relied on in the claim against {counterparty} before the {forum}:\n{evidence}",
    ),
    (
        "simple-procedure-claim-form",
        "Simple Procedure Claim Form (Form 3A)",
        RenderKind::Binary,
        "Claim in the {forum} against {counterparty}.\n\nWhat happened:\n{facts}\n\nWhat the claimant wants: {outcome}",
    ),
    (
        "ftt-housing-application",
        "First-tier Tribunal Housing Application",
        RenderKind::Binary,
        "Application to the {forum} concerning {counterparty}.\n\nGrounds:\n{facts}\n\nOrder sought: {outcome}\n\nEvidence: {evidence}",
    ),
    (
        "ombudsman-complaint-form",
        "Financial Ombudsman Complaint Form",
        RenderKind::Binary,
        "Complaint to the {forum} about {counterparty}.\n\nWhat went wrong:\n{facts}\n\nPutting it right: {outcome}\n\nReferral deadline: {deadline}",
    ),
    (
        "letter-before-action",
        "Letter Before Action",
        RenderKind::Text,
        "To {counterparty}.\n\nWe write about the following matters:\n{facts}\n\nWe ask that you provide {outcome} within 14 days, failing which proceedings may be issued in the {forum} without further notice.\n\nEnclosed: {evidence}",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(rules: Vec<ContentRule>) -> DocumentDefinition {
        DocumentDefinition {
            id: DocumentTypeId::new("custom-letter").unwrap(),
            title: "Custom".into(),
            template: "{title}".into(),
            render: RenderKind::Text,
            rules,
        }
    }

    #[test]
    fn builtin_covers_forum_documents() {
        let registry = DocumentRegistry::builtin().unwrap();
        assert_eq!(registry.len(), BUILTIN.len());
        let et1 = registry
            .get(&DocumentTypeId::new("et1-claim-form").unwrap())
            .unwrap();
        assert_eq!(et1.render, RenderKind::Binary);
        assert!(et1.template.starts_with("{title}"));
    }

    #[test]
    fn min_length_ignores_whitespace() {
        let d = definition(vec![ContentRule::MinLength { chars: 5 }]);
        assert_eq!(
            d.validate("a b c"),
            Err(ContentViolation::TooShort { have: 3, need: 5 })
        );
        assert_eq!(d.validate("abcde"), Ok(()));
    }

    #[test]
    fn must_contain_is_case_insensitive() {
        let d = definition(vec![ContentRule::MustContain {
            phrase: "Acme".into(),
        }]);
        assert_eq!(d.validate("dear ACME ltd"), Ok(()));
        assert!(d.validate("dear sir").is_err());
    }

    #[test]
    fn builtin_templates_use_known_fields() {
        let registry = DocumentRegistry::builtin().unwrap();
        for d in registry.iter() {
            assert_eq!(d.check_template(), Ok(()), "{}", d.id);
        }
    }

    #[test]
    fn unknown_template_field_is_rejected() {
        let mut d = definition(vec![]);
        d.template = "{title} for {claimant_name}".into();
        let err = d.check_template().unwrap_err();
        assert_eq!(err.field, "claimant_name");
        assert!(err.to_string().contains("{claimant_name}"));
    }

    #[test]
    fn placeholder_scan_skips_non_fields() {
        let names: Vec<&str> = placeholders("{title} {x, y} {{forum}} {Bad} {count").collect();
        assert_eq!(names, vec!["title", "forum"]);
    }

    #[test]
    fn braces_in_generated_text_are_not_violations() {
        let d = definition(vec![ContentRule::MinLength { chars: 5 }]);
        assert_eq!(d.validate("The invoice said {paid} in the margin"), Ok(()));
    }

    #[test]
    fn register_replaces_existing() {
        let mut registry = DocumentRegistry::builtin().unwrap();
        let before = registry.len();
        let mut d = definition(vec![]);
        d.id = DocumentTypeId::new("evidence-schedule").unwrap();
        assert!(registry.register(d).is_some());
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn definitions_deserialize_from_yaml() {
        let yaml = r#"
id: witness-statement
title: Witness Statement
template: "{title} by {counterparty}"
render: text
rules:
  - rule: min_length
    chars: 10
"#;
        let d: DocumentDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(d.id.as_str(), "witness-statement");
        assert_eq!(d.rules, vec![ContentRule::MinLength { chars: 10 }]);
    }
}
