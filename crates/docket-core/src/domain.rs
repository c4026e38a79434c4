//! # Dispute Domain: Single Source of Truth
//!
//! Defines [`DisputeDomain`], the taxonomy of disputes the stack can route,
//! and [`LegalRelationship`], the relationship between the user and the
//! counterparty. Every `match` on these enums is exhaustive: adding a
//! domain forces the forum mapping, the document registry and the CLI to
//! handle it at compile time.
//!
//! Fact extraction produces free-text domain labels ("unfair dismissal",
//! "Consumer", "landlord dispute"). [`DisputeDomain::resolve`] maps those to
//! a domain and reports whether the label was the canonical name or an
//! alias, which the routing engine feeds into its confidence score.
//! Labels that resolve to nothing are a classification failure upstream.
//!
//! | Domain | Typical relationship | Canonical label |
//! |--------|----------------------|-----------------|
//! | Employment | employee / employer | `employment` |
//! | Consumer | consumer / trader | `consumer` |
//! | Contract | business / business | `contract` |
//! | Tenancy | tenant / landlord | `tenancy` |
//! | FinancialServices | customer / regulated firm | `financial_services` |

use serde::{Deserialize, Serialize};

/// The dispute taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeDomain {
    /// Dismissal, unpaid wages, workplace treatment.
    Employment,
    /// Faulty goods or services bought from a trader.
    Consumer,
    /// Breach of a contract between parties acting in business.
    Contract,
    /// Deposits, disrepair and other landlord disputes.
    Tenancy,
    /// Complaints about banks, lenders and insurers.
    FinancialServices,
}

/// How a free-text domain label matched a [`DisputeDomain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainMatch {
    /// The label was the canonical domain name.
    Canonical,
    /// The label matched a known alias.
    Alias,
}

const EMPLOYMENT_ALIASES: &[&str] = &[
    "work",
    "workplace",
    "employer",
    "unfair dismissal",
    "dismissal",
    "wrongful dismissal",
    "unpaid wages",
    "wages",
    "redundancy",
];
const CONSUMER_ALIASES: &[&str] = &[
    "consumer rights",
    "faulty goods",
    "faulty product",
    "refund",
    "purchase",
    "trader",
];
const CONTRACT_ALIASES: &[&str] = &[
    "breach of contract",
    "commercial",
    "unpaid invoice",
    "invoice",
    "services contract",
    "debt",
];
const TENANCY_ALIASES: &[&str] = &[
    "housing",
    "landlord",
    "rent",
    "tenancy deposit",
    "deposit",
    "disrepair",
];
const FINANCIAL_ALIASES: &[&str] = &[
    "financial",
    "banking",
    "bank",
    "insurance",
    "loan",
    "mis selling",
    "mis sold",
];

impl DisputeDomain {
    /// All domains in declaration order.
    pub fn all() -> &'static [DisputeDomain] {
        &[
            Self::Employment,
            Self::Consumer,
            Self::Contract,
            Self::Tenancy,
            Self::FinancialServices,
        ]
    }

    /// Canonical snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employment => "employment",
            Self::Consumer => "consumer",
            Self::Contract => "contract",
            Self::Tenancy => "tenancy",
            Self::FinancialServices => "financial_services",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Employment => EMPLOYMENT_ALIASES,
            Self::Consumer => CONSUMER_ALIASES,
            Self::Contract => CONTRACT_ALIASES,
            Self::Tenancy => TENANCY_ALIASES,
            Self::FinancialServices => FINANCIAL_ALIASES,
        }
    }

    /// Resolve a free-text domain label.
    ///
    /// Matching is case-insensitive and treats `_`, `-` and runs of
    /// whitespace as a single space. Returns `None` for unknown labels.
    pub fn resolve(label: &str) -> Option<(DisputeDomain, DomainMatch)> {
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }
        for domain in Self::all() {
            if normalize_label(domain.as_str()) == normalized {
                return Some((*domain, DomainMatch::Canonical));
            }
        }
        for domain in Self::all() {
            if domain.aliases().iter().any(|a| *a == normalized) {
                return Some((*domain, DomainMatch::Alias));
            }
        }
        None
    }
}

impl std::fmt::Display for DisputeDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisputeDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
            .map(|(domain, _)| domain)
            .ok_or_else(|| format!("unknown dispute domain: \"{s}\""))
    }
}

fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Legal relationship ──────────────────────────────────────────────

/// The legal relationship between the user and the counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalRelationship {
    /// User is (or was) an employee of the counterparty.
    EmployeeEmployer,
    /// User supplied services as a self-employed contractor.
    ContractorClient,
    /// User bought goods or services as a consumer.
    ConsumerTrader,
    /// Both parties acted in the course of business.
    BusinessToBusiness,
    /// User rents from the counterparty.
    TenantLandlord,
    /// User is a customer of a regulated financial firm.
    CustomerFirm,
}

impl LegalRelationship {
    /// Canonical snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmployeeEmployer => "employee_employer",
            Self::ContractorClient => "contractor_client",
            Self::ConsumerTrader => "consumer_trader",
            Self::BusinessToBusiness => "business_to_business",
            Self::TenantLandlord => "tenant_landlord",
            Self::CustomerFirm => "customer_firm",
        }
    }

    /// The relationship assumed for a domain when nothing more specific is known.
    pub fn default_for(domain: DisputeDomain) -> Self {
        match domain {
            DisputeDomain::Employment => Self::EmployeeEmployer,
            DisputeDomain::Consumer => Self::ConsumerTrader,
            DisputeDomain::Contract => Self::BusinessToBusiness,
            DisputeDomain::Tenancy => Self::TenantLandlord,
            DisputeDomain::FinancialServices => Self::CustomerFirm,
        }
    }
}

impl std::fmt::Display for LegalRelationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LegalRelationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "employee employer" | "employee" | "worker" => Ok(Self::EmployeeEmployer),
            "contractor client" | "contractor" | "self employed" | "freelancer" => {
                Ok(Self::ContractorClient)
            }
            "consumer trader" | "consumer" | "customer of trader" => Ok(Self::ConsumerTrader),
            "business to business" | "business" | "b2b" => Ok(Self::BusinessToBusiness),
            "tenant landlord" | "tenant" => Ok(Self::TenantLandlord),
            "customer firm" | "customer" | "policyholder" | "borrower" => Ok(Self::CustomerFirm),
            _ => Err(format!("unknown legal relationship: \"{s}\"")),
        }
    }
}
