//! # docket-core: Foundational Types for the Docket Stack
//!
//! This crate defines the primitives every other Docket crate builds on.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `CaseId`, `OwnerId`, `JobId`,
//!    `DocumentTypeId`, `ForumId`, `JurisdictionId`. You cannot pass a
//!    `JobId` where a `CaseId` is expected, and slug identifiers are
//!    validated at construction.
//!
//! 2. **Single `DisputeDomain` enum.** One definition of the dispute
//!    taxonomy with exhaustive `match` everywhere. Raw domain strings from
//!    fact extraction are resolved through [`DisputeDomain::resolve`].
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `docket-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod domain;
pub mod error;
pub mod identity;
pub mod temporal;

pub use domain::{DisputeDomain, DomainMatch, LegalRelationship};
pub use error::{DocketError, ValidationError};
pub use identity::{CaseId, DocumentTypeId, ForumId, JobId, JurisdictionId, OwnerId};
pub use temporal::Timestamp;
